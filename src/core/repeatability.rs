//! Repeatability of the measuring device
//!
//! Each specimen is measured several times per characteristic. The spread
//! `max(error) - min(error)` over those repeats is a direct read of the
//! instrument's repeatability; its distribution is summarized and fitted
//! with a two-parameter log-normal (location fixed at zero). Spreads at or
//! above five standard deviations of the pooled spreads are outliers and
//! can be left out before summarizing.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::core::describe::Summary;
use crate::core::stats::std_dev;
use crate::entities::MeasurementTable;

/// Spread of the repeated measurements of one specimen
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Spread {
    pub characteristic: String,
    pub part_name: String,
    pub repeats: usize,
    pub spread: f64,
}

/// Log-normal distribution with zero location
///
/// `ln(X) ~ N(ln(scale), shape²)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LogNormalFit {
    pub shape: f64,
    pub scale: f64,
}

impl LogNormalFit {
    /// Maximum-likelihood fit over the strictly positive samples
    ///
    /// Zero spreads have no logarithm and are left out. Returns `None` when
    /// fewer than two positive samples remain or they are all identical.
    pub fn fit(samples: &[f64]) -> Option<Self> {
        let logs: Vec<f64> = samples
            .iter()
            .filter(|x| **x > 0.0 && x.is_finite())
            .map(|x| x.ln())
            .collect();
        if logs.len() < 2 {
            return None;
        }
        let n = logs.len() as f64;
        let mu = logs.iter().sum::<f64>() / n;
        let shape = (logs.iter().map(|l| (l - mu).powi(2)).sum::<f64>() / n).sqrt();
        if shape == 0.0 {
            return None;
        }
        Some(Self {
            shape,
            scale: mu.exp(),
        })
    }

    pub fn pdf(&self, x: f64) -> f64 {
        if x <= 0.0 {
            return 0.0;
        }
        let z = (x / self.scale).ln() / self.shape;
        (-0.5 * z * z).exp() / (x * self.shape * (2.0 * std::f64::consts::PI).sqrt())
    }

    pub fn median(&self) -> f64 {
        self.scale
    }

    pub fn mean(&self) -> f64 {
        self.scale * (0.5 * self.shape * self.shape).exp()
    }

    /// Most likely spread
    pub fn mode(&self) -> f64 {
        self.scale * (-self.shape * self.shape).exp()
    }
}

/// Sigma bands of a set of spreads
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpreadLimits {
    /// Sample standard deviation of the spreads
    pub std: f64,
    pub three_sigma: f64,
    /// Outlier threshold
    pub five_sigma: f64,
}

impl SpreadLimits {
    /// `None` below two spreads
    pub fn of(values: &[f64]) -> Option<Self> {
        std_dev(values).map(|std| Self {
            std,
            three_sigma: 3.0 * std,
            five_sigma: 5.0 * std,
        })
    }

    /// Limits over every spread, regardless of characteristic
    pub fn pooled(spreads: &[Spread]) -> Option<Self> {
        let values: Vec<f64> = spreads.iter().map(|s| s.spread).collect();
        Self::of(&values)
    }

    pub fn is_outlier(&self, spread: f64) -> bool {
        spread >= self.five_sigma
    }
}

/// Spread distribution of one group of specimens
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepeatabilitySummary {
    pub group: String,
    pub summary: Summary,
    pub limits: Option<SpreadLimits>,
    pub fit: Option<LogNormalFit>,
}

/// Drop spreads at or above the pooled five-sigma threshold
///
/// Returns the kept spreads and the limits used. With fewer than two
/// spreads there is no deviation to judge by and everything is kept.
pub fn exclude_outliers(spreads: Vec<Spread>) -> (Vec<Spread>, Option<SpreadLimits>) {
    let Some(limits) = SpreadLimits::pooled(&spreads) else {
        return (spreads, None);
    };
    let before = spreads.len();
    let kept: Vec<Spread> = spreads
        .into_iter()
        .filter(|s| !limits.is_outlier(s.spread))
        .collect();
    if kept.len() < before {
        tracing::debug!(
            removed = before - kept.len(),
            threshold = limits.five_sigma,
            "excluded repeatability outliers"
        );
    }
    (kept, Some(limits))
}

/// Characteristic family: the name up to the first underscore
///
/// `Cylindricity_Cyl_8mm_Pos` belongs to `Cylindricity`.
pub fn characteristic_type(name: &str) -> &str {
    name.split(['_', '-']).next().unwrap_or(name)
}

/// Spread of every specimen with at least two repeats, sorted by characteristic then specimen
pub fn spreads(measurements: &MeasurementTable) -> Vec<Spread> {
    let mut groups: BTreeMap<(&str, &str), Vec<f64>> = BTreeMap::new();
    for r in measurements {
        groups
            .entry((r.char_name.as_str(), r.part_name.as_str()))
            .or_default()
            .push(r.error);
    }

    let single = groups.values().filter(|e| e.len() < 2).count();
    if single > 0 {
        tracing::debug!(specimens = single, "specimens with a single measurement have no spread");
    }

    groups
        .into_iter()
        .filter(|(_, errors)| errors.len() >= 2)
        .map(|((characteristic, part_name), errors)| {
            let max = errors.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let min = errors.iter().copied().fold(f64::INFINITY, f64::min);
            Spread {
                characteristic: characteristic.to_string(),
                part_name: part_name.to_string(),
                repeats: errors.len(),
                spread: max - min,
            }
        })
        .collect()
}

/// Summarize spreads grouped by `key`
pub fn summarize<F>(spreads: &[Spread], key: F) -> Vec<RepeatabilitySummary>
where
    F: Fn(&Spread) -> String,
{
    let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for s in spreads {
        groups.entry(key(s)).or_default().push(s.spread);
    }
    groups
        .into_iter()
        .map(|(group, values)| RepeatabilitySummary {
            summary: Summary::of(&values),
            limits: SpreadLimits::of(&values),
            fit: LogNormalFit::fit(&values),
            group,
        })
        .collect()
}

/// Summary per characteristic
pub fn summarize_by_characteristic(spreads: &[Spread]) -> Vec<RepeatabilitySummary> {
    summarize(spreads, |s| s.characteristic.clone())
}

/// Summary per characteristic family (cylindricity, diameter, flatness, ...)
pub fn summarize_by_type(spreads: &[Spread]) -> Vec<RepeatabilitySummary> {
    summarize(spreads, |s| characteristic_type(&s.characteristic).to_string())
}
