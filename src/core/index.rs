//! Characteristic index - the measurement log reshaped per characteristic
//!
//! For each characteristic the repeated measurements of every specimen are
//! collapsed to their arithmetic mean and left-joined with the layout:
//!
//! ```text
//! measurements ──group(char_name)──► group(part_name) ──mean(error)──► ⟕ layout
//! ```
//!
//! A specimen with no layout entry keeps its row with `layout: None`.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::core::error::{AnalysisError, Result};
use crate::entities::{
    CharacteristicRow, CharacteristicTable, LayoutTable, MeasurementRecord, MeasurementTable,
};

/// Typed mapping from characteristic name to its reduced table
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CharacteristicIndex {
    tables: BTreeMap<String, CharacteristicTable>,
}

impl CharacteristicIndex {
    /// Build the index from a measurement log and the layout
    pub fn build(measurements: &MeasurementTable, layout: &LayoutTable) -> Result<Self> {
        // char_name -> part_name -> measurements
        let mut groups: BTreeMap<&str, BTreeMap<&str, Vec<&MeasurementRecord>>> = BTreeMap::new();
        for record in measurements {
            record.validate()?;
            groups
                .entry(record.char_name.as_str())
                .or_default()
                .entry(record.part_name.as_str())
                .or_default()
                .push(record);
        }

        let mut tables = BTreeMap::new();
        let mut unmatched = 0usize;

        for (char_name, parts) in groups {
            let rows: Vec<CharacteristicRow> = parts
                .into_iter()
                .map(|(part_name, reps)| {
                    let error = reps.iter().map(|r| r.error).sum::<f64>() / reps.len() as f64;
                    let layout = layout.get(part_name).cloned();
                    if layout.is_none() {
                        unmatched += 1;
                    }
                    CharacteristicRow {
                        part_name: part_name.to_string(),
                        characteristic: char_name.to_string(),
                        error,
                        repeats: reps.len(),
                        layout,
                        angle_z: None,
                        laser_angle: None,
                    }
                })
                .collect();

            tables.insert(
                char_name.to_string(),
                CharacteristicTable::new(char_name, rows),
            );
        }

        if unmatched > 0 {
            tracing::debug!(
                unmatched,
                "specimen rows without a layout entry (left-join nulls)"
            );
        }
        tracing::debug!(characteristics = tables.len(), "built characteristic index");

        Ok(Self { tables })
    }

    /// Build an index directly from already reduced tables
    pub fn from_tables(tables: impl IntoIterator<Item = CharacteristicTable>) -> Self {
        Self {
            tables: tables
                .into_iter()
                .map(|t| (t.name().to_string(), t))
                .collect(),
        }
    }

    /// Look up one characteristic
    pub fn get(&self, key: &str) -> Option<&CharacteristicTable> {
        self.tables.get(key)
    }

    /// Look up one characteristic, failing with the missing key named
    pub fn require(&self, key: &str) -> Result<&CharacteristicTable> {
        self.tables.get(key).ok_or_else(|| AnalysisError::KeyNotFound {
            key: key.to_string(),
        })
    }

    /// Retrieve the requested characteristics, in the order requested
    pub fn select_keys<S: AsRef<str>>(&self, keys: &[S]) -> Result<Vec<CharacteristicTable>> {
        keys.iter()
            .map(|k| self.require(k.as_ref()).cloned())
            .collect()
    }

    /// Characteristic names in sorted order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CharacteristicTable)> {
        self.tables.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
