//! CSV ingestion of the measurement log and layout, and persistence of the index

pub mod reader;
pub mod writer;

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

use crate::core::error::AnalysisError;

pub use reader::{read_layout, read_layout_from, read_measurements, read_measurements_from};
pub use writer::{write_index, write_table, write_table_to};

/// Errors raised while reading or writing tables
#[derive(Debug, Error, Diagnostic)]
pub enum IoError {
    #[error("Cannot access {path}")]
    #[diagnostic(code(bmt::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed CSV")]
    #[diagnostic(code(bmt::csv), help("check the delimiter (--results-delimiter / --layout-delimiter)"))]
    Csv(#[from] csv::Error),

    #[error("Row {row}: {message}")]
    #[diagnostic(code(bmt::parse))]
    Parse { row: usize, message: String },

    #[error("Missing column '{column}'")]
    #[diagnostic(code(bmt::missing_column))]
    MissingColumn { column: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Analysis(#[from] AnalysisError),
}

impl IoError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        IoError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, IoError>;
