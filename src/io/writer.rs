//! Persist characteristic tables as delimited text

use csv::WriterBuilder;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::{IoError, Result};
use crate::core::index::CharacteristicIndex;
use crate::entities::{CharacteristicTable, Value};

/// File name used for one characteristic
pub fn table_file_name(characteristic: &str) -> String {
    format!("{}_mean.csv", characteristic)
}

/// Write one table to any writer; null cells are left empty
pub fn write_table_to<W: Write>(
    writer: W,
    table: &CharacteristicTable,
    delimiter: u8,
) -> Result<()> {
    let mut wtr = WriterBuilder::new().delimiter(delimiter).from_writer(writer);
    let columns = table.columns();
    wtr.write_record(&columns)?;

    for row in table {
        let cells = columns
            .iter()
            .map(|c| row.get(c).map(|v| cell(&v)))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        wtr.write_record(&cells)?;
    }
    wtr.flush().map_err(|e| IoError::io("<output>", e))?;
    Ok(())
}

/// Write one table to `path`
pub fn write_table(path: &Path, table: &CharacteristicTable, delimiter: u8) -> Result<()> {
    let file = File::create(path).map_err(|e| IoError::io(path, e))?;
    write_table_to(file, table, delimiter)
}

/// Write every characteristic of the index into `dir`, one file each
///
/// Returns the written paths in key order. `dir` is created if needed.
pub fn write_index(dir: &Path, index: &CharacteristicIndex, delimiter: u8) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).map_err(|e| IoError::io(dir, e))?;

    let mut written = Vec::with_capacity(index.len());
    for (name, table) in index.iter() {
        let path = dir.join(table_file_name(name));
        write_table(&path, table, delimiter)?;
        written.push(path);
    }
    tracing::debug!(dir = %dir.display(), files = written.len(), "wrote characteristic index");
    Ok(written)
}

fn cell(value: &Value) -> String {
    if value.is_null() {
        String::new()
    } else {
        value.to_string()
    }
}
