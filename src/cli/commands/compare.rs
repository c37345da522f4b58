//! `bmt compare` - all-pairs t tests across the strata of a column
//!
//! # Examples
//!
//! ```bash
//! # Does the layer level matter for the 8 mm cylinders?
//! bmt compare Diameter_Cyl_8mm_Pos --by z_pos
//!
//! # p-values only, first build excluded, both cylinder sizes pooled
//! bmt compare Diameter_Cyl_8mm_Pos Diameter_Cyl_16mm_Pos --by angle --p-only --exclude build=1
//! ```

use console::style;
use miette::{miette, Result};

use crate::cli::helpers::parse_assignment;
use crate::cli::output::print_structured;
use crate::cli::table::{CellValue, MatrixTable, TableConfig};
use crate::cli::GlobalOpts;
use crate::core::pairwise::strata;
use crate::core::{all_pairs_test_with, concat, filter_equals, filter_excludes, StudentT};
use crate::entities::Value;

use super::{load_dataset, output_format, stratify_column, tables_for};

#[derive(clap::Args, Debug)]
pub struct CompareArgs {
    /// Characteristics to compare (several are pooled)
    #[arg(required = true)]
    pub chars: Vec<String>,

    /// Stratification column (build, x_pos, y_pos, z_pos, angle, angle_z, ...)
    #[arg(long, short = 'b')]
    pub by: Option<String>,

    /// Only report p-values
    #[arg(long, short = 'p')]
    pub p_only: bool,

    /// Keep only rows where COLUMN equals VALUE (repeatable)
    #[arg(long = "where", short = 'w', value_name = "COLUMN=VALUE", value_parser = parse_assignment)]
    pub where_eq: Vec<(String, Value)>,

    /// Drop rows where COLUMN equals VALUE (repeatable)
    #[arg(long, short = 'x', value_name = "COLUMN=VALUE", value_parser = parse_assignment)]
    pub exclude: Vec<(String, Value)>,

    /// Use every stratum of the layout, not only those present after filtering
    #[arg(long)]
    pub all_strata: bool,

    /// Compare absolute errors
    #[arg(long)]
    pub abs: bool,
}

pub fn run(args: CompareArgs, global: &GlobalOpts) -> Result<()> {
    let data = load_dataset(global)?;
    let column = stratify_column(args.by, &data.config).ok_or_else(|| {
        miette!(
            help = "pass --by COLUMN or set `stratify:` in bmt.yaml",
            "no stratification column given"
        )
    })?;

    let mut tables = tables_for(&data.index, &args.chars, Some(column.as_str()))?;
    for (col, value) in &args.where_eq {
        tables = filter_equals(col, value, &tables)?;
    }
    for (col, value) in &args.exclude {
        tables = filter_excludes(col, value, &tables)?;
    }
    if args.abs {
        tables = tables.iter().map(|t| t.with_absolute_error()).collect();
    }

    let table = match tables.as_slice() {
        [single] => single.clone(),
        many => concat(args.chars.join("+"), many),
    };

    let labels = if args.all_strata {
        data.layout.strata(&column)?
    } else {
        strata(&table, &column)?
    };

    if !global.quiet {
        eprintln!(
            "{} {} by {}: {} specimen(s) in {} stratum/strata",
            style("Comparing").green(),
            style(table.name()).cyan(),
            style(&column).cyan(),
            table.len(),
            labels.len()
        );
        if labels.len() < 2 {
            eprintln!(
                "{} fewer than two strata, nothing to compare",
                style("Note:").yellow()
            );
        }
    }

    let result = all_pairs_test_with(&table, &column, labels, &StudentT)?;

    let format = output_format(global, &data.config);
    let printed = if args.p_only {
        print_structured(&result.p_values(), format)?
    } else {
        print_structured(&result, format)?
    };
    if printed {
        return Ok(());
    }

    let n = result.len();
    let cells: Vec<Vec<CellValue>> = (0..n)
        .map(|i| {
            (0..n)
                .map(|j| match result.get(i, j) {
                    Some(o) if args.p_only => CellValue::PValue(o.p_value),
                    Some(o) => CellValue::Outcome(o.statistic, o.p_value),
                    None => CellValue::Empty,
                })
                .collect()
        })
        .collect();
    let labels: Vec<String> = result.labels().iter().map(|l| l.to_string()).collect();

    MatrixTable::new(column, labels, cells)
        .with_config(TableConfig::default().with_alpha(data.config.alpha()))
        .output(format);
    Ok(())
}
