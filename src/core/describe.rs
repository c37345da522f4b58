//! Five-number summaries of the per-specimen error, overall and per stratum

use serde::Serialize;

use crate::core::error::Result;
use crate::core::pairwise::strata;
use crate::core::stats::{mean, quantile, std_dev};
use crate::entities::{CharacteristicTable, Value};

/// Summary statistics of a set of errors
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub count: usize,
    pub mean: Option<f64>,
    /// Sample standard deviation; `None` below two specimens
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q1: Option<f64>,
    pub median: Option<f64>,
    pub q3: Option<f64>,
    pub max: Option<f64>,
}

impl Summary {
    pub fn of(values: &[f64]) -> Self {
        Self {
            count: values.len(),
            mean: mean(values),
            std: std_dev(values),
            min: quantile(values, 0.0),
            q1: quantile(values, 0.25),
            median: quantile(values, 0.5),
            q3: quantile(values, 0.75),
            max: quantile(values, 1.0),
        }
    }

    /// Interquartile range
    pub fn iqr(&self) -> Option<f64> {
        Some(self.q3? - self.q1?)
    }
}

/// Summary of one stratum
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StratumSummary {
    pub label: Value,
    #[serde(flatten)]
    pub summary: Summary,
}

/// Summary of all errors in `table`
pub fn describe(table: &CharacteristicTable) -> Summary {
    Summary::of(&table.errors())
}

/// Summary of the errors per distinct non-null value of `column`
pub fn describe_by(table: &CharacteristicTable, column: &str) -> Result<Vec<StratumSummary>> {
    let labels = strata(table, column)?;
    let values = table.column(column)?;

    Ok(labels
        .into_iter()
        .map(|label| {
            let errors: Vec<f64> = table
                .iter()
                .zip(&values)
                .filter(|(_, v)| v.total_cmp(&label).is_eq() && !v.is_null())
                .map(|(r, _)| r.error)
                .collect();
            StratumSummary {
                summary: Summary::of(&errors),
                label,
            }
        })
        .collect())
}
