//! Error taxonomy for the analysis core
//!
//! Every fallible operation in `core` returns [`AnalysisError`]. Errors are
//! surfaced to the immediate caller; nothing in the core logs and swallows.
//! A left-join miss between measurements and layout is *not* an error.

use miette::Diagnostic;
use thiserror::Error;

/// Errors raised by the aggregation, geometry and pairwise-test engines
#[derive(Debug, Clone, PartialEq, Error, Diagnostic)]
pub enum AnalysisError {
    /// Input table is missing a required column or uses the wrong key type
    #[error("Schema error: {message}")]
    #[diagnostic(
        code(bmt::schema),
        help("characteristic tables expose: part_name, char, error, repeats, build, x_pos, y_pos, z_pos, angle, center_x, center_y, center_z, angle_z, laser_angle")
    )]
    Schema { message: String },

    /// A measurement row whose `error` is not exactly `actual - nominal`
    #[error("Corrupt measurement {uuid}: error {error} != actual {actual} - nominal {nominal}")]
    #[diagnostic(code(bmt::corrupt_measurement))]
    CorruptMeasurement {
        uuid: String,
        actual: f64,
        nominal: f64,
        error: f64,
    },

    /// A stratum subset cannot be tested
    #[error("Degenerate group for {column} = {label}: {reason}")]
    #[diagnostic(
        code(bmt::degenerate_group),
        help("filter the table or choose a coarser stratification column")
    )]
    DegenerateGroup {
        column: String,
        label: String,
        reason: String,
    },

    /// A characteristic requested from the index does not exist
    #[error("Characteristic not found: {key}")]
    #[diagnostic(code(bmt::key_not_found), help("run `bmt chars` to list characteristics"))]
    KeyNotFound { key: String },

    /// Zero-norm vector handed to an angle computation
    #[error("Geometry domain error: {message}")]
    #[diagnostic(code(bmt::geometry_domain))]
    GeometryDomain { message: String },

    /// Neither continuous nor grid coordinates are available for a specimen
    #[error("No layout coordinates for specimen {part_name}")]
    #[diagnostic(
        code(bmt::missing_coordinates),
        help("add the specimen to the layout file")
    )]
    MissingCoordinates { part_name: String },
}

impl AnalysisError {
    /// Shorthand for a [`AnalysisError::Schema`] error
    pub fn schema(message: impl Into<String>) -> Self {
        AnalysisError::Schema {
            message: message.into(),
        }
    }

    /// Shorthand for an unknown column
    pub fn unknown_column(column: &str) -> Self {
        AnalysisError::Schema {
            message: format!("unknown column '{}'", column),
        }
    }
}

/// Result alias used throughout the analysis core
pub type Result<T> = std::result::Result<T, AnalysisError>;
