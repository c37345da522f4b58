//! BMT: Build Metrology Toolkit
//!
//! Data reduction and statistics for additive-manufacturing measurement
//! experiments: repeated coordinate-measuring readings are collapsed per
//! specimen, joined with the build layout, enriched with orientation
//! covariates and compared across layout strata with all-pairs t tests.

pub mod cli;
pub mod core;
pub mod entities;
pub mod io;
