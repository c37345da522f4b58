//! `bmt repeat` - repeatability of the measuring device
//!
//! Every specimen is measured several times; the spread of those repeats
//! is summarized per characteristic (or per family with `--by-type`) and
//! fitted with a log-normal distribution.

use console::style;
use miette::Result;

use crate::cli::output::print_structured;
use crate::cli::table::{CellValue, ColumnDef, TableConfig, TableFormatter, TableRow};
use crate::cli::GlobalOpts;
use crate::core::repeatability::{
    exclude_outliers, spreads, summarize_by_characteristic, summarize_by_type,
};

use super::{load_dataset, output_format};

#[derive(clap::Args, Debug)]
pub struct RepeatArgs {
    /// Restrict to these characteristics
    pub chars: Vec<String>,

    /// Group by characteristic family (Diameter, Flatness, ...) instead of name
    #[arg(long, short = 't')]
    pub by_type: bool,

    /// List the spread of every specimen instead of the summary
    #[arg(long, short = 'd')]
    pub detail: bool,

    /// Leave out spreads at or above five standard deviations of all spreads
    #[arg(long, short = 'x')]
    pub exclude_outliers: bool,
}

const SUMMARY_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("group", "GROUP", 30),
    ColumnDef::new("count", "N", 5),
    ColumnDef::new("mean", "MEAN", 10),
    ColumnDef::new("median", "MEDIAN", 10),
    ColumnDef::new("max", "MAX", 10),
    ColumnDef::new("std", "STD", 10),
    ColumnDef::new("three_sigma", "3 SIGMA", 10),
    ColumnDef::new("five_sigma", "5 SIGMA", 10),
    ColumnDef::new("shape", "SHAPE", 8),
    ColumnDef::new("scale", "SCALE", 10),
    ColumnDef::new("mode", "MODE", 10),
];

const DETAIL_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("char", "CHARACTERISTIC", 30),
    ColumnDef::new("part", "SPECIMEN", 12),
    ColumnDef::new("repeats", "REPEATS", 7),
    ColumnDef::new("spread", "SPREAD", 10),
];

pub fn run(args: RepeatArgs, global: &GlobalOpts) -> Result<()> {
    let data = load_dataset(global)?;
    for name in &args.chars {
        data.index.require(name)?;
    }

    let all = spreads(&data.measurements);
    let selected: Vec<_> = if args.chars.is_empty() {
        all
    } else {
        all.into_iter()
            .filter(|s| args.chars.contains(&s.characteristic))
            .collect()
    };

    let selected = if args.exclude_outliers {
        let before = selected.len();
        let (kept, limits) = exclude_outliers(selected);
        if let (Some(limits), false) = (limits, global.quiet) {
            eprintln!(
                "{} excluded {} of {} spreads at or above 5 sigma ({:.4})",
                style("Note:").yellow(),
                before - kept.len(),
                before,
                limits.five_sigma
            );
        }
        kept
    } else {
        selected
    };

    let format = output_format(global, &data.config);
    let config = if global.quiet {
        TableConfig::for_pipe()
    } else {
        TableConfig::default()
    };

    if args.detail {
        if print_structured(&selected, format)? {
            return Ok(());
        }
        let rows: Vec<TableRow> = selected
            .iter()
            .map(|s| {
                TableRow::new()
                    .cell("char", CellValue::Text(s.characteristic.clone()))
                    .cell("part", CellValue::Text(s.part_name.clone()))
                    .cell("repeats", CellValue::Number(s.repeats as i64))
                    .cell("spread", CellValue::Float(s.spread, 4))
            })
            .collect();
        TableFormatter::new(DETAIL_COLUMNS, "specimen")
            .with_config(config)
            .output(&rows, format);
        return Ok(());
    }

    let summaries = if args.by_type {
        summarize_by_type(&selected)
    } else {
        summarize_by_characteristic(&selected)
    };
    if print_structured(&summaries, format)? {
        return Ok(());
    }

    let rows: Vec<TableRow> = summaries
        .iter()
        .map(|s| {
            TableRow::new()
                .cell("group", CellValue::Text(s.group.clone()))
                .cell("count", CellValue::Number(s.summary.count as i64))
                .cell("mean", CellValue::OptionalFloat(s.summary.mean, 4))
                .cell("median", CellValue::OptionalFloat(s.summary.median, 4))
                .cell("max", CellValue::OptionalFloat(s.summary.max, 4))
                .cell("std", CellValue::OptionalFloat(s.limits.map(|l| l.std), 4))
                .cell("three_sigma", CellValue::OptionalFloat(s.limits.map(|l| l.three_sigma), 4))
                .cell("five_sigma", CellValue::OptionalFloat(s.limits.map(|l| l.five_sigma), 4))
                .cell("shape", CellValue::OptionalFloat(s.fit.map(|f| f.shape), 3))
                .cell("scale", CellValue::OptionalFloat(s.fit.map(|f| f.scale), 4))
                .cell("mode", CellValue::OptionalFloat(s.fit.map(|f| f.mode()), 4))
        })
        .collect();
    TableFormatter::new(SUMMARY_COLUMNS, "group")
        .with_config(config)
        .output(&rows, format);
    Ok(())
}
