//! Characteristic tables - one row per specimen for a single characteristic
//!
//! A characteristic table is produced by the index (mean of repeated
//! measurements joined with layout) and is never mutated afterwards: every
//! enrichment or selection step returns a new table.

use serde::{Deserialize, Serialize};

use crate::core::error::{AnalysisError, Result};
use crate::entities::layout::{LayoutRecord, LAYOUT_COLUMNS};
use crate::entities::value::Value;

/// Every column a characteristic table can expose, in output order
pub const COLUMNS: [&str; 14] = [
    "part_name",
    "char",
    "error",
    "repeats",
    "build",
    "x_pos",
    "y_pos",
    "z_pos",
    "angle",
    "center_x",
    "center_y",
    "center_z",
    "angle_z",
    "laser_angle",
];

/// Measurement columns removed by the per-specimen reduction
pub const REDUCED_COLUMNS: [&str; 4] = ["rep", "actual", "nominal", "char_number"];

/// One specimen's reduced measurement joined with its layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacteristicRow {
    /// Specimen identifier
    pub part_name: String,

    /// Characteristic this row belongs to
    pub characteristic: String,

    /// Mean error over the repeated measurements [mm]
    pub error: f64,

    /// Number of repeated measurements collapsed into `error`
    pub repeats: usize,

    /// Layout of the specimen; `None` when the join found no match
    pub layout: Option<LayoutRecord>,

    /// Angle between the rotated plane normal and the vertical axis [degrees]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angle_z: Option<f64>,

    /// Angle between the rotated feature normal and the laser source [degrees]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub laser_angle: Option<f64>,
}

impl CharacteristicRow {
    /// Look up a cell by column name
    pub fn get(&self, column: &str) -> Result<Value> {
        match column {
            "part_name" => Ok(Value::Text(self.part_name.clone())),
            "char" => Ok(Value::Text(self.characteristic.clone())),
            "error" => Ok(Value::Float(self.error)),
            "repeats" => Ok(Value::Int(self.repeats as i64)),
            "angle_z" => Ok(self.angle_z.into()),
            "laser_angle" => Ok(self.laser_angle.into()),
            c if LAYOUT_COLUMNS.contains(&c) => Ok(self
                .layout
                .as_ref()
                .and_then(|l| l.get(c))
                .unwrap_or(Value::Null)),
            c if REDUCED_COLUMNS.contains(&c) => Err(AnalysisError::schema(format!(
                "column '{}' is dropped by the per-specimen reduction",
                c
            ))),
            c => Err(AnalysisError::unknown_column(c)),
        }
    }
}

/// All specimens measured for one characteristic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacteristicTable {
    name: String,
    rows: Vec<CharacteristicRow>,
    #[serde(default)]
    has_angle_z: bool,
    #[serde(default)]
    has_laser_angle: bool,
}

impl CharacteristicTable {
    /// Create a table from reduced rows
    pub fn new(name: impl Into<String>, rows: Vec<CharacteristicRow>) -> Self {
        let has_angle_z = rows.iter().any(|r| r.angle_z.is_some());
        let has_laser_angle = rows.iter().any(|r| r.laser_angle.is_some());
        Self {
            name: name.into(),
            rows,
            has_angle_z,
            has_laser_angle,
        }
    }

    /// Characteristic name (the index key)
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rows(&self) -> &[CharacteristicRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CharacteristicRow> {
        self.rows.iter()
    }

    /// Whether the `angle_z` covariate has been derived for this table
    pub fn has_angle_z(&self) -> bool {
        self.has_angle_z
    }

    /// Whether the `laser_angle` covariate has been derived for this table
    pub fn has_laser_angle(&self) -> bool {
        self.has_laser_angle
    }

    /// Columns worth printing for this table, in output order
    ///
    /// Surveyed centers are listed only when some row carries one.
    pub fn columns(&self) -> Vec<&'static str> {
        COLUMNS
            .iter()
            .copied()
            .filter(|c| match *c {
                "center_x" | "center_y" | "center_z" => self.rows.iter().any(|r| {
                    r.layout
                        .as_ref()
                        .and_then(|l| l.get(c))
                        .is_some_and(|v| !v.is_null())
                }),
                _ => self.has_column(c),
            })
            .collect()
    }

    /// Whether a column can be read from this table
    ///
    /// Layout columns are always readable and hold nulls where unknown.
    pub fn has_column(&self, column: &str) -> bool {
        match column {
            "angle_z" => self.has_angle_z,
            "laser_angle" => self.has_laser_angle,
            c => COLUMNS.contains(&c),
        }
    }

    /// Check that a column exists, with a schema error naming it otherwise
    pub fn require_column(&self, column: &str) -> Result<()> {
        if self.has_column(column) {
            return Ok(());
        }
        if REDUCED_COLUMNS.contains(&column) {
            return Err(AnalysisError::schema(format!(
                "column '{}' is dropped by the per-specimen reduction",
                column
            )));
        }
        if COLUMNS.contains(&column) {
            return Err(AnalysisError::schema(format!(
                "column '{}' is not available on '{}'",
                column, self.name
            )));
        }
        Err(AnalysisError::unknown_column(column))
    }

    /// All values of one column, in row order
    pub fn column(&self, column: &str) -> Result<Vec<Value>> {
        self.require_column(column)?;
        self.rows.iter().map(|r| r.get(column)).collect()
    }

    /// Mean errors in row order
    pub fn errors(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.error).collect()
    }

    /// A new table with the same name and derived-column flags but other rows
    pub fn with_rows(&self, rows: Vec<CharacteristicRow>) -> Self {
        Self {
            name: self.name.clone(),
            rows,
            has_angle_z: self.has_angle_z,
            has_laser_angle: self.has_laser_angle,
        }
    }

    /// A new table keeping the rows for which `keep` returns true
    pub fn retain_rows<F>(&self, mut keep: F) -> Result<Self>
    where
        F: FnMut(&CharacteristicRow) -> Result<bool>,
    {
        let mut rows = Vec::with_capacity(self.rows.len());
        for row in &self.rows {
            if keep(row)? {
                rows.push(row.clone());
            }
        }
        Ok(self.with_rows(rows))
    }

    /// A new table whose errors are replaced by their absolute values
    pub fn with_absolute_error(&self) -> Self {
        let rows = self
            .rows
            .iter()
            .map(|r| CharacteristicRow {
                error: r.error.abs(),
                ..r.clone()
            })
            .collect();
        self.with_rows(rows)
    }

    pub(crate) fn mark_angle_z(mut self) -> Self {
        self.has_angle_z = true;
        self
    }

    pub(crate) fn mark_laser_angle(mut self) -> Self {
        self.has_laser_angle = true;
        self
    }
}

impl<'a> IntoIterator for &'a CharacteristicTable {
    type Item = &'a CharacteristicRow;
    type IntoIter = std::slice::Iter<'a, CharacteristicRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
