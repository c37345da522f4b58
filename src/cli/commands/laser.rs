//! `bmt laser` - angle of incidence of the laser on rotated features
//!
//! # Examples
//!
//! ```bash
//! # Top faces of the 8 mm cylinders
//! bmt laser Flatness_Cyl_8mm_Top
//!
//! # A side face whose normal points along +Y before rotation
//! bmt laser Flatness_Block_Side --normal 0,1,0
//! ```

use miette::Result;
use nalgebra::Vector3;
use serde::Serialize;

use crate::cli::helpers::parse_vector;
use crate::cli::output::print_structured;
use crate::cli::table::{CellValue, ColumnDef, TableConfig, TableFormatter, TableRow};
use crate::cli::GlobalOpts;
use crate::core::add_laser_angle;

use super::{load_dataset, output_format};

#[derive(clap::Args, Debug)]
pub struct LaserArgs {
    /// Characteristics to evaluate
    #[arg(required = true)]
    pub chars: Vec<String>,

    /// Feature normal before rotation, as X,Y,Z
    #[arg(long, short = 'n', default_value = "0,0,1", value_parser = parse_vector)]
    pub normal: Vector3<f64>,
}

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("char", "CHARACTERISTIC", 28),
    ColumnDef::new("part", "SPECIMEN", 12),
    ColumnDef::new("angle", "ANGLE", 8),
    ColumnDef::new("laser", "LASER ANGLE", 11),
    ColumnDef::new("error", "ERROR", 10),
];

#[derive(Debug, Serialize)]
struct LaserRow {
    characteristic: String,
    part_name: String,
    angle: Option<f64>,
    laser_angle: Option<f64>,
    error: f64,
}

pub fn run(args: LaserArgs, global: &GlobalOpts) -> Result<()> {
    let data = load_dataset(global)?;

    let mut entries = Vec::new();
    for table in data.index.select_keys(args.chars.as_slice())? {
        let enriched = add_laser_angle(&table, &args.normal)?;
        entries.extend(enriched.iter().map(|r| LaserRow {
            characteristic: r.characteristic.clone(),
            part_name: r.part_name.clone(),
            angle: r.layout.as_ref().map(|l| l.angle),
            laser_angle: r.laser_angle,
            error: r.error,
        }));
    }

    let format = output_format(global, &data.config);
    if print_structured(&entries, format)? {
        return Ok(());
    }

    let rows: Vec<TableRow> = entries
        .iter()
        .map(|e| {
            TableRow::new()
                .cell("char", CellValue::Text(e.characteristic.clone()))
                .cell("part", CellValue::Text(e.part_name.clone()))
                .cell("angle", CellValue::OptionalFloat(e.angle, 1))
                .cell("laser", CellValue::OptionalFloat(e.laser_angle, 3))
                .cell("error", CellValue::Float(e.error, 4))
        })
        .collect();

    let config = if global.quiet {
        TableConfig::for_pipe()
    } else {
        TableConfig::default()
    };
    TableFormatter::new(COLUMNS, "specimen")
        .with_config(config)
        .output(&rows, format);
    Ok(())
}
