//! Readers for the measurement log and the layout
//!
//! The measurement reader accepts two header sets and maps them onto the
//! same record:
//!
//! | raw export                    | canonical     |
//! |-------------------------------|---------------|
//! | `Uuid`                        | `uuid`        |
//! | `K53 Order number`            | `part_name`   |
//! | `K14 Part ident`              | `rep`         |
//! | `Characteristic`              | `char_name`   |
//! | `K1 Measured value`           | `actual`      |
//! | `K2101 Nominal value`         | `nominal`     |
//! | `K4 Time/Date`                | `time`        |
//! | `K2001 Characteristic number` | `char_number` |
//!
//! Headers are matched case-insensitively. Other columns are ignored.

use chrono::{NaiveDate, NaiveDateTime};
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use super::{IoError, Result};
use crate::entities::{LayoutRecord, LayoutTable, MeasurementRecord, MeasurementTable};

/// Raw export header and the canonical name it maps to
const RAW_HEADERS: [(&str, &str); 8] = [
    ("uuid", "uuid"),
    ("k53 order number", "part_name"),
    ("k14 part ident", "rep"),
    ("characteristic", "char_name"),
    ("k1 measured value", "actual"),
    ("k2101 nominal value", "nominal"),
    ("k4 time/date", "time"),
    ("k2001 characteristic number", "char_number"),
];

const MEASUREMENT_COLUMNS: [&str; 8] = [
    "uuid",
    "part_name",
    "rep",
    "char_name",
    "actual",
    "nominal",
    "time",
    "char_number",
];

const LAYOUT_REQUIRED: [&str; 6] = ["part_name", "build", "x_pos", "y_pos", "z_pos", "angle"];

const DATETIME_FORMATS: [&str; 7] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d.%m.%Y", "%m/%d/%Y"];

/// Read the measurement log from a file
pub fn read_measurements(path: &Path, delimiter: u8) -> Result<MeasurementTable> {
    let file = File::open(path).map_err(|e| IoError::io(path, e))?;
    let table = read_measurements_from(BufReader::new(file), delimiter)?;
    tracing::debug!(path = %path.display(), rows = table.len(), "read measurements");
    Ok(table)
}

/// Read the measurement log from any reader
pub fn read_measurements_from<R: Read>(reader: R, delimiter: u8) -> Result<MeasurementTable> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .delimiter(delimiter)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let header_map = canonical_header_map(&headers);
    for column in MEASUREMENT_COLUMNS {
        require_column(&header_map, column)?;
    }
    let has_error = header_map.contains_key("error");

    let mut records = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let record = result?;
        // Header is line 1
        let row = i + 2;
        let field = |name: &str| get_field(&record, &header_map, name);
        let required = |name: &str| {
            field(name).ok_or_else(|| IoError::Parse {
                row,
                message: format!("empty '{}'", name),
            })
        };

        let actual = parse_f64(&required("actual")?, row, "actual")?;
        let nominal = parse_f64(&required("nominal")?, row, "nominal")?;
        let mut measurement = MeasurementRecord::new(
            required("uuid")?,
            required("part_name")?,
            parse_count(&required("rep")?, row, "rep")?,
            required("char_name")?,
            actual,
            nominal,
            parse_time(&required("time")?, row)?,
            parse_count(&required("char_number")?, row, "char_number")?,
        );
        if has_error {
            if let Some(error) = field("error") {
                measurement.error = parse_f64(&error, row, "error")?;
            }
        }
        records.push(measurement);
    }

    Ok(MeasurementTable::new(records)?)
}

/// Read the layout from a file
pub fn read_layout(path: &Path, delimiter: u8) -> Result<LayoutTable> {
    let file = File::open(path).map_err(|e| IoError::io(path, e))?;
    let table = read_layout_from(BufReader::new(file), delimiter)?;
    tracing::debug!(path = %path.display(), specimens = table.len(), "read layout");
    Ok(table)
}

/// Read the layout from any reader
pub fn read_layout_from<R: Read>(reader: R, delimiter: u8) -> Result<LayoutTable> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .delimiter(delimiter)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let header_map = build_header_map(&headers);
    for column in LAYOUT_REQUIRED {
        require_column(&header_map, column)?;
    }

    let mut records = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let record = result?;
        let row = i + 2;
        let field = |name: &str| get_field(&record, &header_map, name);
        let required = |name: &str| {
            field(name).ok_or_else(|| IoError::Parse {
                row,
                message: format!("empty '{}'", name),
            })
        };
        let optional = |name: &str| -> Result<Option<f64>> {
            field(name).map(|s| parse_f64(&s, row, name)).transpose()
        };

        records.push(LayoutRecord {
            part_name: required("part_name")?,
            build: parse_int(&required("build")?, row, "build")?,
            x_pos: parse_int(&required("x_pos")?, row, "x_pos")?,
            y_pos: parse_int(&required("y_pos")?, row, "y_pos")?,
            z_pos: parse_int(&required("z_pos")?, row, "z_pos")?,
            angle: parse_f64(&required("angle")?, row, "angle")?,
            center_x: optional("center_x")?,
            center_y: optional("center_y")?,
            center_z: optional("center_z")?,
        });
    }

    Ok(LayoutTable::new(records)?)
}

/// Build a map from lowercase header name to column index
fn build_header_map(headers: &csv::StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.to_lowercase().trim().to_string(), i))
        .collect()
}

/// Header map with raw export names renamed to canonical ones
fn canonical_header_map(headers: &csv::StringRecord) -> HashMap<String, usize> {
    let mut map = build_header_map(headers);
    for (raw, canonical) in RAW_HEADERS {
        if raw == canonical || map.contains_key(canonical) {
            continue;
        }
        if let Some(idx) = map.remove(raw) {
            map.insert(canonical.to_string(), idx);
        }
    }
    map
}

fn require_column(header_map: &HashMap<String, usize>, column: &str) -> Result<()> {
    if header_map.contains_key(column) {
        Ok(())
    } else {
        Err(IoError::MissingColumn {
            column: column.to_string(),
        })
    }
}

/// Get a non-empty field value from a CSV record
fn get_field(
    record: &csv::StringRecord,
    header_map: &HashMap<String, usize>,
    field: &str,
) -> Option<String> {
    header_map
        .get(field)
        .and_then(|&idx| record.get(idx))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn parse_f64(s: &str, row: usize, column: &str) -> Result<f64> {
    s.parse::<f64>().map_err(|_| IoError::Parse {
        row,
        message: format!("'{}' is not a number in '{}'", s, column),
    })
}

/// Integer column; integral floats such as `3.0` are accepted
fn parse_int(s: &str, row: usize, column: &str) -> Result<i64> {
    if let Ok(i) = s.parse::<i64>() {
        return Ok(i);
    }
    match s.parse::<f64>() {
        Ok(f) if f.fract() == 0.0 && f.is_finite() => Ok(f as i64),
        _ => Err(IoError::Parse {
            row,
            message: format!("'{}' is not an integer in '{}'", s, column),
        }),
    }
}

fn parse_count(s: &str, row: usize, column: &str) -> Result<u32> {
    let i = parse_int(s, row, column)?;
    u32::try_from(i).map_err(|_| IoError::Parse {
        row,
        message: format!("'{}' is out of range in '{}'", s, column),
    })
}

fn parse_time(s: &str, row: usize) -> Result<NaiveDateTime> {
    for format in DATETIME_FORMATS {
        if let Ok(t) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(t);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, format) {
            if let Some(t) = d.and_hms_opt(0, 0, 0) {
                return Ok(t);
            }
        }
    }
    Err(IoError::Parse {
        row,
        message: format!("unrecognized timestamp '{}'", s),
    })
}
