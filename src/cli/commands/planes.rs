//! `bmt planes` - orientation of the hexagon flatness planes
//!
//! Lists every specimen of the twelve `Flatness_HX{1,2}_Plane{1..6}`
//! characteristics with its derived `angle_z`, or one line per plane with
//! `--summary`.

use miette::Result;
use serde::Serialize;

use crate::cli::output::print_structured;
use crate::cli::table::{CellValue, ColumnDef, TableConfig, TableFormatter, TableRow};
use crate::cli::GlobalOpts;
use crate::core::stats::{mean, std_dev};
use crate::core::add_plane_orientation;

use super::{load_dataset, output_format};

#[derive(clap::Args, Debug)]
pub struct PlanesArgs {
    /// One line per plane instead of one per specimen
    #[arg(long, short = 's')]
    pub summary: bool,
}

const DETAIL_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("plane", "PLANE", 22),
    ColumnDef::new("part", "SPECIMEN", 12),
    ColumnDef::new("angle", "ANGLE", 8),
    ColumnDef::new("angle_z", "ANGLE Z", 8),
    ColumnDef::new("error", "ERROR", 10),
];

const SUMMARY_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("plane", "PLANE", 22),
    ColumnDef::new("count", "N", 5),
    ColumnDef::new("min_angle_z", "MIN ANGLE Z", 11),
    ColumnDef::new("max_angle_z", "MAX ANGLE Z", 11),
    ColumnDef::new("mean", "MEAN ERROR", 10),
    ColumnDef::new("std", "STD", 10),
];

#[derive(Debug, Serialize)]
struct PlaneRow {
    plane: String,
    part_name: String,
    angle: Option<f64>,
    angle_z: Option<f64>,
    error: f64,
}

#[derive(Debug, Serialize)]
struct PlaneSummary {
    plane: String,
    count: usize,
    min_angle_z: Option<f64>,
    max_angle_z: Option<f64>,
    mean_error: Option<f64>,
    std_error: Option<f64>,
}

pub fn run(args: PlanesArgs, global: &GlobalOpts) -> Result<()> {
    let data = load_dataset(global)?;
    let planes = add_plane_orientation(&data.index)?;
    let format = output_format(global, &data.config);
    let config = if global.quiet {
        TableConfig::for_pipe()
    } else {
        TableConfig::default()
    };

    if args.summary {
        let entries: Vec<PlaneSummary> = planes
            .iter()
            .map(|t| {
                let angles: Vec<f64> = t.iter().filter_map(|r| r.angle_z).collect();
                let errors = t.errors();
                PlaneSummary {
                    plane: t.name().to_string(),
                    count: t.len(),
                    min_angle_z: angles.iter().copied().reduce(f64::min),
                    max_angle_z: angles.iter().copied().reduce(f64::max),
                    mean_error: mean(&errors),
                    std_error: std_dev(&errors),
                }
            })
            .collect();

        if print_structured(&entries, format)? {
            return Ok(());
        }
        let rows: Vec<TableRow> = entries
            .iter()
            .map(|e| {
                TableRow::new()
                    .cell("plane", CellValue::Text(e.plane.clone()))
                    .cell("count", CellValue::Number(e.count as i64))
                    .cell("min_angle_z", CellValue::OptionalFloat(e.min_angle_z, 1))
                    .cell("max_angle_z", CellValue::OptionalFloat(e.max_angle_z, 1))
                    .cell("mean", CellValue::OptionalFloat(e.mean_error, 4))
                    .cell("std", CellValue::OptionalFloat(e.std_error, 4))
            })
            .collect();
        TableFormatter::new(SUMMARY_COLUMNS, "plane")
            .with_config(config)
            .output(&rows, format);
        return Ok(());
    }

    let entries: Vec<PlaneRow> = planes
        .iter()
        .flat_map(|t| {
            t.iter().map(move |r| PlaneRow {
                plane: t.name().to_string(),
                part_name: r.part_name.clone(),
                angle: r.layout.as_ref().map(|l| l.angle),
                angle_z: r.angle_z,
                error: r.error,
            })
        })
        .collect();

    if print_structured(&entries, format)? {
        return Ok(());
    }
    let rows: Vec<TableRow> = entries
        .iter()
        .map(|e| {
            TableRow::new()
                .cell("plane", CellValue::Text(e.plane.clone()))
                .cell("part", CellValue::Text(e.part_name.clone()))
                .cell("angle", CellValue::OptionalFloat(e.angle, 1))
                .cell("angle_z", CellValue::OptionalFloat(e.angle_z, 1))
                .cell("error", CellValue::Float(e.error, 4))
        })
        .collect();
    TableFormatter::new(DETAIL_COLUMNS, "specimen")
        .with_config(config)
        .output(&rows, format);
    Ok(())
}
