//! All-pairs two-sample testing across the strata of a layout column
//!
//! For `n` distinct labels the engine runs the test once per unordered pair
//! `i < j` and fills both halves of an `n × n` matrix:
//!
//! ```text
//!            label_0       label_1       label_2
//! label_0    -             (t01, p01)    (t02, p02)
//! label_1    (-t01, p01)   -             (t12, p12)
//! label_2    (-t02, p02)   (-t12, p12)   -
//! ```
//!
//! The statistic is antisymmetric and the p-value symmetric; the diagonal
//! holds no comparison.

use serde::Serialize;

use crate::core::error::{AnalysisError, Result};
use crate::core::stats::{mean, student_t_two_sided_p};
use crate::entities::{CharacteristicTable, Value};

/// Result of one two-sample comparison
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TestOutcome {
    pub statistic: f64,
    pub p_value: f64,
}

impl TestOutcome {
    /// The same comparison with the samples swapped
    pub fn swapped(self) -> Self {
        Self {
            statistic: -self.statistic,
            p_value: self.p_value,
        }
    }
}

/// A two-sample hypothesis test
///
/// `Err` carries the reason the statistic is undefined for these samples.
pub trait TwoSampleTest {
    fn test(&self, a: &[f64], b: &[f64]) -> std::result::Result<TestOutcome, String>;
}

/// Classic two-sided Student t test with pooled variance
#[derive(Debug, Clone, Copy, Default)]
pub struct StudentT;

impl TwoSampleTest for StudentT {
    fn test(&self, a: &[f64], b: &[f64]) -> std::result::Result<TestOutcome, String> {
        let (n1, n2) = (a.len(), b.len());
        let (Some(m1), Some(m2)) = (mean(a), mean(b)) else {
            return Err("no specimens in one of the groups".to_string());
        };
        if n1 + n2 < 3 {
            return Err(format!(
                "{} specimens leave no degrees of freedom",
                n1 + n2
            ));
        }

        let df = (n1 + n2 - 2) as f64;
        let ss = |xs: &[f64], m: f64| xs.iter().map(|x| (x - m).powi(2)).sum::<f64>();
        let pooled = (ss(a, m1) + ss(b, m2)) / df;
        let se = (pooled * (1.0 / n1 as f64 + 1.0 / n2 as f64)).sqrt();

        let statistic = (m1 - m2) / se;
        if statistic.is_nan() {
            return Err("zero variance with equal means".to_string());
        }

        Ok(TestOutcome {
            statistic,
            p_value: student_t_two_sided_p(statistic, df),
        })
    }
}

/// Square matrix of pairwise outcomes indexed by stratum label
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairwiseResult {
    column: String,
    labels: Vec<Value>,
    cells: Vec<Option<TestOutcome>>,
}

impl PairwiseResult {
    /// Stratification column the labels come from
    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn labels(&self) -> &[Value] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Outcome of row label `i` against column label `j`; `None` on the diagonal
    pub fn get(&self, i: usize, j: usize) -> Option<TestOutcome> {
        let n = self.labels.len();
        if i >= n || j >= n {
            return None;
        }
        self.cells[i * n + j]
    }

    pub fn statistic(&self, i: usize, j: usize) -> Option<f64> {
        self.get(i, j).map(|o| o.statistic)
    }

    pub fn p_value(&self, i: usize, j: usize) -> Option<f64> {
        self.get(i, j).map(|o| o.p_value)
    }

    /// Drop the statistics, keeping the symmetric p-value matrix
    pub fn p_values(&self) -> PValueMatrix {
        PValueMatrix {
            column: self.column.clone(),
            labels: self.labels.clone(),
            cells: self.cells.iter().map(|c| c.map(|o| o.p_value)).collect(),
        }
    }
}

/// Symmetric matrix of p-values; the diagonal holds `None`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PValueMatrix {
    column: String,
    labels: Vec<Value>,
    cells: Vec<Option<f64>>,
}

impl PValueMatrix {
    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn labels(&self) -> &[Value] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        let n = self.labels.len();
        if i >= n || j >= n {
            return None;
        }
        self.cells[i * n + j]
    }

    /// Dense rows with `sentinel` in place of the missing diagonal
    pub fn filled(&self, sentinel: f64) -> Vec<Vec<f64>> {
        let n = self.labels.len();
        (0..n)
            .map(|i| (0..n).map(|j| self.get(i, j).unwrap_or(sentinel)).collect())
            .collect()
    }
}

/// Sorted distinct non-null values of `column` in `table`
pub fn strata(table: &CharacteristicTable, column: &str) -> Result<Vec<Value>> {
    let mut labels: Vec<Value> = table
        .column(column)?
        .into_iter()
        .filter(|v| !v.is_null())
        .collect();
    labels.sort_by(|a, b| a.total_cmp(b));
    labels.dedup_by(|a, b| a.total_cmp(b).is_eq());
    Ok(labels)
}

/// Pairwise Student t tests over every stratum present in `table`
pub fn all_pairs_test(table: &CharacteristicTable, column: &str) -> Result<PairwiseResult> {
    let labels = strata(table, column)?;
    all_pairs_test_with(table, column, labels, &StudentT)
}

/// Pairwise p-values over every stratum present in `table`
pub fn all_pairs_p_values(table: &CharacteristicTable, column: &str) -> Result<PValueMatrix> {
    all_pairs_test(table, column).map(|r| r.p_values())
}

/// Pairwise tests over an explicit label set with any test implementation
///
/// Rows whose stratum value is null, or not among `labels`, take part in
/// no comparison. A label with no specimens, or a pair whose statistic is
/// undefined, aborts the whole batch with [`AnalysisError::DegenerateGroup`].
pub fn all_pairs_test_with<T>(
    table: &CharacteristicTable,
    column: &str,
    labels: Vec<Value>,
    test: &T,
) -> Result<PairwiseResult>
where
    T: TwoSampleTest + ?Sized,
{
    let groups = partition(table, column, &labels)?;
    let n = labels.len();
    let mut cells = vec![None; n * n];

    if n >= 2 {
        if let Some(empty) = groups.iter().position(|g| g.is_empty()) {
            return Err(AnalysisError::DegenerateGroup {
                column: column.to_string(),
                label: labels[empty].to_string(),
                reason: "no specimens in this stratum".to_string(),
            });
        }
    }

    for i in 0..n {
        for j in (i + 1)..n {
            let outcome = test.test(&groups[i], &groups[j]).map_err(|reason| {
                AnalysisError::DegenerateGroup {
                    column: column.to_string(),
                    label: format!("{} vs {}", labels[i], labels[j]),
                    reason,
                }
            })?;
            cells[i * n + j] = Some(outcome);
            cells[j * n + i] = Some(outcome.swapped());
        }
    }

    tracing::debug!(
        characteristic = table.name(),
        column,
        strata = n,
        tests = n * n.saturating_sub(1) / 2,
        "pairwise tests complete"
    );

    Ok(PairwiseResult {
        column: column.to_string(),
        labels,
        cells,
    })
}

/// Split the errors of `table` by the label each row carries in `column`
fn partition(table: &CharacteristicTable, column: &str, labels: &[Value]) -> Result<Vec<Vec<f64>>> {
    table.require_column(column)?;

    let mut groups = vec![Vec::new(); labels.len()];
    let mut skipped_null = 0usize;
    let mut unlabelled = 0usize;

    for row in table {
        let value = row.get(column)?;
        if value.is_null() {
            skipped_null += 1;
            continue;
        }
        match labels.iter().position(|l| l.total_cmp(&value).is_eq()) {
            Some(idx) => groups[idx].push(row.error),
            None => unlabelled += 1,
        }
    }

    if skipped_null > 0 {
        tracing::warn!(
            characteristic = table.name(),
            column,
            rows = skipped_null,
            "rows with a null stratum take part in no comparison"
        );
    }
    if unlabelled > 0 {
        tracing::debug!(rows = unlabelled, column, "rows outside the requested strata");
    }

    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{CharacteristicRow, LayoutRecord};
    use approx::assert_abs_diff_eq;
    use std::cell::Cell;

    fn row(part: &str, z_pos: Option<i64>, error: f64) -> CharacteristicRow {
        CharacteristicRow {
            part_name: part.to_string(),
            characteristic: "Diameter_Cyl_8mm_Pos".to_string(),
            error,
            repeats: 3,
            layout: z_pos.map(|z| LayoutRecord {
                part_name: part.to_string(),
                build: 1,
                x_pos: 1,
                y_pos: 1,
                z_pos: z,
                angle: 0.0,
                center_x: None,
                center_y: None,
                center_z: None,
            }),
            angle_z: None,
            laser_angle: None,
        }
    }

    fn three_levels() -> CharacteristicTable {
        let mut rows = Vec::new();
        for (i, e) in [1.0, 2.0, 3.0, 4.0, 5.0].into_iter().enumerate() {
            rows.push(row(&format!("A{}", i), Some(1), e));
        }
        for (i, e) in [2.0, 4.0, 6.0, 8.0, 11.0].into_iter().enumerate() {
            rows.push(row(&format!("B{}", i), Some(2), e));
        }
        for (i, e) in [0.5, 1.5, 1.0].into_iter().enumerate() {
            rows.push(row(&format!("C{}", i), Some(3), e));
        }
        CharacteristicTable::new("Diameter_Cyl_8mm_Pos", rows)
    }

    struct Counting<'a> {
        calls: &'a Cell<usize>,
    }

    impl TwoSampleTest for Counting<'_> {
        fn test(&self, a: &[f64], b: &[f64]) -> std::result::Result<TestOutcome, String> {
            self.calls.set(self.calls.get() + 1);
            StudentT.test(a, b)
        }
    }

    #[test]
    fn test_student_t_reference_values() {
        let outcome = StudentT
            .test(&[1.0, 2.0, 3.0, 4.0, 5.0], &[2.0, 4.0, 6.0, 8.0, 11.0])
            .unwrap();
        assert_abs_diff_eq!(outcome.statistic, -1.866_277_899_263_374, epsilon = 1e-12);
        assert_abs_diff_eq!(outcome.p_value, 0.098_971_499_531_313_98, epsilon = 1e-10);
    }

    #[test]
    fn test_student_t_separated_constants() {
        let outcome = StudentT.test(&[1.0, 1.0], &[2.0, 2.0]).unwrap();
        assert!(outcome.statistic.is_infinite());
        assert_eq!(outcome.p_value, 0.0);
    }

    #[test]
    fn test_student_t_undefined() {
        assert!(StudentT.test(&[1.0, 1.0], &[1.0, 1.0]).is_err());
        assert!(StudentT.test(&[1.0], &[2.0]).is_err());
        assert!(StudentT.test(&[], &[2.0, 3.0]).is_err());
    }

    #[test]
    fn test_labels_sorted_distinct() {
        let result = all_pairs_test(&three_levels(), "z_pos").unwrap();
        let labels: Vec<String> = result.labels().iter().map(|l| l.to_string()).collect();
        assert_eq!(labels, vec!["1", "2", "3"]);
        assert_eq!(result.column(), "z_pos");
    }

    #[test]
    fn test_antisymmetric_statistic_symmetric_p() {
        let result = all_pairs_test(&three_levels(), "z_pos").unwrap();
        for i in 0..3 {
            assert!(result.get(i, i).is_none());
            for j in 0..3 {
                if i == j {
                    continue;
                }
                assert_eq!(result.statistic(i, j).unwrap(), -result.statistic(j, i).unwrap());
                assert_eq!(result.p_value(i, j), result.p_value(j, i));
            }
        }
        assert_abs_diff_eq!(
            result.statistic(0, 1).unwrap(),
            -1.866_277_899_263_374,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_exactly_one_test_per_pair() {
        let calls = Cell::new(0);
        let table = three_levels();
        let labels = strata(&table, "z_pos").unwrap();
        all_pairs_test_with(&table, "z_pos", labels, &Counting { calls: &calls }).unwrap();
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_single_stratum_is_not_an_error() {
        let table = CharacteristicTable::new(
            "F",
            vec![row("P1", Some(1), 0.1), row("P2", Some(1), 0.2)],
        );
        let result = all_pairs_test(&table, "z_pos").unwrap();
        assert_eq!(result.len(), 1);
        assert!(result.get(0, 0).is_none());

        let empty = CharacteristicTable::new("F", Vec::new());
        assert!(all_pairs_test(&empty, "z_pos").unwrap().is_empty());
    }

    #[test]
    fn test_empty_stratum_is_degenerate() {
        let table = three_levels();
        let labels = vec![Value::Int(1), Value::Int(2), Value::Int(4)];
        let err = all_pairs_test_with(&table, "z_pos", labels, &StudentT).unwrap_err();
        match err {
            AnalysisError::DegenerateGroup { column, label, .. } => {
                assert_eq!(column, "z_pos");
                assert_eq!(label, "4");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_null_strata_are_skipped() {
        let mut rows = three_levels().rows().to_vec();
        rows.push(row("P9", None, 100.0));
        let table = CharacteristicTable::new("Diameter_Cyl_8mm_Pos", rows);
        let with_null = all_pairs_test(&table, "z_pos").unwrap();
        let without = all_pairs_test(&three_levels(), "z_pos").unwrap();
        assert_eq!(with_null, without);
    }

    #[test]
    fn test_unknown_column() {
        let err = all_pairs_test(&three_levels(), "colour").unwrap_err();
        assert!(matches!(err, AnalysisError::Schema { .. }));
    }

    #[test]
    fn test_p_value_matrix_filled() {
        let p = all_pairs_p_values(&three_levels(), "z_pos").unwrap();
        let dense = p.filled(-1.0);
        assert_eq!(dense.len(), 3);
        for (i, row) in dense.iter().enumerate() {
            assert_eq!(row[i], -1.0);
            for (j, cell) in row.iter().enumerate() {
                assert_eq!(*cell, dense[j][i]);
            }
        }
    }
}
