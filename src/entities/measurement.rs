//! Measurement records - one reading of one characteristic on one specimen repetition

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::core::error::{AnalysisError, Result};

/// One row of the measurement log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    /// Opaque unique identifier of the measurement
    pub uuid: String,

    /// Specimen identifier (foreign key into the layout)
    pub part_name: String,

    /// Repetition index, typically 1-3
    pub rep: u32,

    /// Characteristic identifier (e.g. "Cylindricity_Cyl_4mm_Pos")
    pub char_name: String,

    /// Measured value [mm]
    pub actual: f64,

    /// Design value [mm]
    pub nominal: f64,

    /// `actual - nominal` [mm]
    pub error: f64,

    /// Time of measurement
    pub time: NaiveDateTime,

    /// Integer characteristic index
    pub char_number: u32,
}

impl MeasurementRecord {
    /// Create a record, deriving `error` from `actual` and `nominal`
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        uuid: impl Into<String>,
        part_name: impl Into<String>,
        rep: u32,
        char_name: impl Into<String>,
        actual: f64,
        nominal: f64,
        time: NaiveDateTime,
        char_number: u32,
    ) -> Self {
        Self {
            uuid: uuid.into(),
            part_name: part_name.into(),
            rep,
            char_name: char_name.into(),
            actual,
            nominal,
            error: actual - nominal,
            time,
            char_number,
        }
    }

    /// Check the error identity `error == actual - nominal` (exact)
    pub fn validate(&self) -> Result<()> {
        if self.error == self.actual - self.nominal {
            Ok(())
        } else {
            Err(AnalysisError::CorruptMeasurement {
                uuid: self.uuid.clone(),
                actual: self.actual,
                nominal: self.nominal,
                error: self.error,
            })
        }
    }
}

/// The full measurement log, validated at construction
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MeasurementTable {
    records: Vec<MeasurementRecord>,
}

impl MeasurementTable {
    /// Build a table, rejecting any record that violates the error identity
    pub fn new(records: Vec<MeasurementRecord>) -> Result<Self> {
        for record in &records {
            record.validate()?;
        }
        Ok(Self { records })
    }

    pub fn records(&self) -> &[MeasurementRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MeasurementRecord> {
        self.records.iter()
    }

    /// Distinct characteristic names in order of first appearance
    pub fn char_names(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        self.records
            .iter()
            .map(|r| r.char_name.as_str())
            .filter(|name| seen.insert(*name))
            .collect()
    }
}

impl<'a> IntoIterator for &'a MeasurementTable {
    type Item = &'a MeasurementRecord;
    type IntoIter = std::slice::Iter<'a, MeasurementRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
