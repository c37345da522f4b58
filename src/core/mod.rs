//! Core module - reduction, geometry and statistics engines

pub mod config;
pub mod describe;
pub mod enrich;
pub mod error;
pub mod geometry;
pub mod index;
pub mod pairwise;
pub mod repeatability;
pub mod select;
pub mod stats;

pub use config::Config;
pub use describe::{describe, describe_by, StratumSummary, Summary};
pub use enrich::{
    add_angle_z, add_laser_angle, add_plane_orientation, parse_plane_name, plane_normal, Fixture,
};
pub use error::{AnalysisError, Result};
pub use geometry::{angle_between, laser_angle, rotate_vector, LASER_SOURCE};
pub use index::CharacteristicIndex;
pub use pairwise::{
    all_pairs_p_values, all_pairs_test, all_pairs_test_with, PValueMatrix, PairwiseResult,
    StudentT, TestOutcome, TwoSampleTest,
};
pub use repeatability::{
    exclude_outliers, LogNormalFit, RepeatabilitySummary, Spread, SpreadLimits,
};
pub use select::{concat, filter_equals, filter_excludes, project_columns, Projection};
