//! `bmt describe` - error summaries per characteristic or per stratum

use miette::Result;
use serde::Serialize;

use crate::cli::output::print_structured;
use crate::cli::table::{CellValue, ColumnDef, TableConfig, TableFormatter, TableRow};
use crate::cli::GlobalOpts;
use crate::core::{describe, describe_by, Summary};

use super::{load_dataset, output_format, stratify_column, tables_for};

#[derive(clap::Args, Debug)]
pub struct DescribeArgs {
    /// Characteristics to summarize
    #[arg(required = true)]
    pub chars: Vec<String>,

    /// Summarize per stratum of this column
    #[arg(long, short = 'b')]
    pub by: Option<String>,

    /// Summarize absolute errors
    #[arg(long)]
    pub abs: bool,
}

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("char", "CHARACTERISTIC", 30),
    ColumnDef::new("stratum", "STRATUM", 10),
    ColumnDef::new("count", "N", 5),
    ColumnDef::new("mean", "MEAN", 10),
    ColumnDef::new("std", "STD", 10),
    ColumnDef::new("min", "MIN", 10),
    ColumnDef::new("q1", "Q1", 10),
    ColumnDef::new("median", "MEDIAN", 10),
    ColumnDef::new("q3", "Q3", 10),
    ColumnDef::new("max", "MAX", 10),
];

#[derive(Debug, Serialize)]
struct DescribeEntry {
    characteristic: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    column: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stratum: Option<String>,
    #[serde(flatten)]
    summary: Summary,
}

pub fn run(args: DescribeArgs, global: &GlobalOpts) -> Result<()> {
    let data = load_dataset(global)?;
    let column = stratify_column(args.by, &data.config);

    let mut tables = tables_for(&data.index, &args.chars, column.as_deref())?;
    if args.abs {
        tables = tables.iter().map(|t| t.with_absolute_error()).collect();
    }

    let mut entries = Vec::new();
    for table in &tables {
        match &column {
            Some(col) => {
                for s in describe_by(table, col)? {
                    entries.push(DescribeEntry {
                        characteristic: table.name().to_string(),
                        column: Some(col.clone()),
                        stratum: Some(s.label.to_string()),
                        summary: s.summary,
                    });
                }
            }
            None => entries.push(DescribeEntry {
                characteristic: table.name().to_string(),
                column: None,
                stratum: None,
                summary: describe(table),
            }),
        }
    }

    let format = output_format(global, &data.config);
    if print_structured(&entries, format)? {
        return Ok(());
    }

    let rows: Vec<TableRow> = entries
        .iter()
        .map(|e| {
            let s = &e.summary;
            TableRow::new()
                .cell("char", CellValue::Text(e.characteristic.clone()))
                .cell(
                    "stratum",
                    e.stratum
                        .clone()
                        .map(CellValue::Text)
                        .unwrap_or(CellValue::Empty),
                )
                .cell("count", CellValue::Number(s.count as i64))
                .cell("mean", CellValue::OptionalFloat(s.mean, 4))
                .cell("std", CellValue::OptionalFloat(s.std, 4))
                .cell("min", CellValue::OptionalFloat(s.min, 4))
                .cell("q1", CellValue::OptionalFloat(s.q1, 4))
                .cell("median", CellValue::OptionalFloat(s.median, 4))
                .cell("q3", CellValue::OptionalFloat(s.q3, 4))
                .cell("max", CellValue::OptionalFloat(s.max, 4))
        })
        .collect();

    let config = if global.quiet {
        TableConfig::for_pipe()
    } else {
        TableConfig::default()
    };
    TableFormatter::new(COLUMNS, "row")
        .with_config(config)
        .output(&rows, format);
    Ok(())
}
