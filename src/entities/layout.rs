//! Layout records - static placement of each specimen in the build volume

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::error::{AnalysisError, Result};
use crate::entities::value::Value;

/// Column names carried by a layout record, in output order
pub const LAYOUT_COLUMNS: [&str; 8] = [
    "build", "x_pos", "y_pos", "z_pos", "angle", "center_x", "center_y", "center_z",
];

/// Placement of one specimen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutRecord {
    /// Specimen identifier (unique key)
    pub part_name: String,

    /// Build job index
    pub build: i64,

    /// Discrete grid position along X
    pub x_pos: i64,

    /// Discrete grid position along Y
    pub y_pos: i64,

    /// Discrete grid position along Z (layer level)
    pub z_pos: i64,

    /// Rotation about the reference X axis [degrees]
    pub angle: f64,

    /// Continuous center coordinates [mm], when surveyed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center_x: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center_y: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center_z: Option<f64>,
}

impl LayoutRecord {
    /// Look up a layout column by name
    ///
    /// Returns `None` for names that are not layout columns.
    pub fn get(&self, column: &str) -> Option<Value> {
        let value = match column {
            "build" => Value::Int(self.build),
            "x_pos" => Value::Int(self.x_pos),
            "y_pos" => Value::Int(self.y_pos),
            "z_pos" => Value::Int(self.z_pos),
            "angle" => Value::Float(self.angle),
            "center_x" => self.center_x.into(),
            "center_y" => self.center_y.into(),
            "center_z" => self.center_z.into(),
            _ => return None,
        };
        Some(value)
    }
}

/// All layout records, keyed by `part_name`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LayoutTable {
    records: BTreeMap<String, LayoutRecord>,
}

impl LayoutTable {
    /// Build a table; a repeated `part_name` is a schema error
    pub fn new(records: Vec<LayoutRecord>) -> Result<Self> {
        let mut map = BTreeMap::new();
        for record in records {
            if map.contains_key(&record.part_name) {
                return Err(AnalysisError::schema(format!(
                    "duplicate part_name '{}' in layout",
                    record.part_name
                )));
            }
            map.insert(record.part_name.clone(), record);
        }
        Ok(Self { records: map })
    }

    pub fn get(&self, part_name: &str) -> Option<&LayoutRecord> {
        self.records.get(part_name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LayoutRecord> {
        self.records.values()
    }

    /// Sorted distinct values of a layout column across all specimens
    ///
    /// This is the full set of strata the experiment was designed with,
    /// independent of which specimens survive later filtering.
    pub fn strata(&self, column: &str) -> Result<Vec<Value>> {
        if !LAYOUT_COLUMNS.contains(&column) {
            return Err(AnalysisError::unknown_column(column));
        }
        let mut values: Vec<Value> = self
            .records
            .values()
            .filter_map(|r| r.get(column))
            .filter(|v| !v.is_null())
            .collect();
        values.sort_by(|a, b| a.total_cmp(b));
        values.dedup_by(|a, b| a.total_cmp(b).is_eq());
        Ok(values)
    }
}
