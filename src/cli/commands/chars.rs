//! `bmt chars` - list characteristics in the index

use miette::Result;
use serde::Serialize;

use crate::cli::output::print_structured;
use crate::cli::table::{CellValue, ColumnDef, TableConfig, TableFormatter, TableRow};
use crate::cli::GlobalOpts;
use crate::core::describe;

use super::{load_dataset, output_format};

#[derive(clap::Args, Debug)]
pub struct CharsArgs {
    /// Only list characteristics whose name contains this text
    #[arg(long, short = 'm')]
    pub matching: Option<String>,
}

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("char", "CHARACTERISTIC", 34),
    ColumnDef::new("specimens", "SPECIMENS", 9),
    ColumnDef::new("unmatched", "NO LAYOUT", 9),
    ColumnDef::new("mean", "MEAN ERROR", 12),
    ColumnDef::new("std", "STD", 12),
];

#[derive(Debug, Serialize)]
struct CharEntry {
    characteristic: String,
    specimens: usize,
    unmatched: usize,
    mean_error: Option<f64>,
    std_error: Option<f64>,
}

pub fn run(args: CharsArgs, global: &GlobalOpts) -> Result<()> {
    let data = load_dataset(global)?;

    let entries: Vec<CharEntry> = data
        .index
        .iter()
        .filter(|(name, _)| args.matching.as_deref().map_or(true, |m| name.contains(m)))
        .map(|(name, table)| {
            let summary = describe(table);
            CharEntry {
                characteristic: name.to_string(),
                specimens: table.len(),
                unmatched: table.iter().filter(|r| r.layout.is_none()).count(),
                mean_error: summary.mean,
                std_error: summary.std,
            }
        })
        .collect();

    let format = output_format(global, &data.config);
    if print_structured(&entries, format)? {
        return Ok(());
    }

    let rows: Vec<TableRow> = entries
        .iter()
        .map(|e| {
            TableRow::new()
                .cell("char", CellValue::Text(e.characteristic.clone()))
                .cell("specimens", CellValue::Number(e.specimens as i64))
                .cell("unmatched", CellValue::Number(e.unmatched as i64))
                .cell("mean", CellValue::OptionalFloat(e.mean_error, 4))
                .cell("std", CellValue::OptionalFloat(e.std_error, 4))
        })
        .collect();

    let config = if global.quiet {
        TableConfig::for_pipe()
    } else {
        TableConfig::default()
    };
    TableFormatter::new(COLUMNS, "characteristic")
        .with_config(config)
        .output(&rows, format);
    Ok(())
}
