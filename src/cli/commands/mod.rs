//! CLI command implementations

pub mod chars;
pub mod compare;
pub mod completions;
pub mod describe;
pub mod export;
pub mod laser;
pub mod planes;
pub mod repeat;

use console::style;
use miette::{miette, Result};
use std::path::PathBuf;

use crate::cli::output::effective_format;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::geometry::z_axis;
use crate::core::{
    add_angle_z, add_laser_angle, parse_plane_name, AnalysisError, CharacteristicIndex, Config,
};
use crate::entities::{CharacteristicTable, LayoutTable, MeasurementTable};
use crate::io::{read_layout, read_measurements};

/// Measurement log, layout and the index built from them
pub(crate) struct Dataset {
    pub config: Config,
    pub measurements: MeasurementTable,
    pub layout: LayoutTable,
    pub index: CharacteristicIndex,
}

/// Resolve configuration with command-line flags on top
pub(crate) fn resolve_config(global: &GlobalOpts) -> Config {
    let mut config = Config::load();
    config.merge(Config {
        results: global.results.clone(),
        layout: global.layout.clone(),
        results_delimiter: global.results_delimiter,
        layout_delimiter: global.layout_delimiter,
        ..Config::default()
    });
    config
}

fn require_path(path: Option<PathBuf>, what: &str, flag: &str, env: &str) -> Result<PathBuf> {
    path.ok_or_else(|| {
        miette!(
            help = format!("pass {} or set {} (or `{}:` in bmt.yaml)", flag, env, what),
            "no {} file configured",
            what
        )
    })
}

/// Read both input files and build the characteristic index
pub(crate) fn load_dataset(global: &GlobalOpts) -> Result<Dataset> {
    let config = resolve_config(global);
    let results = require_path(config.results.clone(), "results", "--results", "BMT_RESULTS")?;
    let layout_path = require_path(config.layout.clone(), "layout", "--layout", "BMT_LAYOUT")?;

    let measurements = read_measurements(&results, config.results_delimiter())?;
    let layout = read_layout(&layout_path, config.layout_delimiter())?;
    let index = CharacteristicIndex::build(&measurements, &layout)?;

    if !global.quiet {
        eprintln!(
            "{} {} measurement(s), {} specimen(s), {} characteristic(s)",
            style("Loaded").green(),
            measurements.len(),
            layout.len(),
            index.len()
        );
    }

    Ok(Dataset {
        config,
        measurements,
        layout,
        index,
    })
}

/// Stratification column from the flag or the config
pub(crate) fn stratify_column(flag: Option<String>, config: &Config) -> Option<String> {
    flag.or_else(|| config.stratify.clone())
}

/// Output format from the flag, falling back to `default_format` in the config
pub(crate) fn output_format(global: &GlobalOpts, config: &Config) -> OutputFormat {
    let requested = match (global.format, config.default_format.as_deref()) {
        (OutputFormat::Auto, Some(name)) => {
            <OutputFormat as clap::ValueEnum>::from_str(name, true).unwrap_or_else(|_| {
                tracing::warn!(format = name, "unknown default_format in config");
                OutputFormat::Auto
            })
        }
        (format, _) => format,
    };
    effective_format(requested)
}

/// Look up characteristics, deriving the covariate `column` when it is one
///
/// `angle_z` is defined for hexagon planes only; `laser_angle` is derived for
/// a vertical feature normal.
pub(crate) fn tables_for(
    index: &CharacteristicIndex,
    chars: &[String],
    column: Option<&str>,
) -> Result<Vec<CharacteristicTable>> {
    let tables = index.select_keys(chars)?;
    match column {
        Some("angle_z") => tables
            .iter()
            .map(|t| -> Result<CharacteristicTable> {
                let (fixture, plane) = parse_plane_name(t.name()).ok_or_else(|| {
                    AnalysisError::schema(format!(
                        "angle_z is only defined for hexagon planes, not '{}'",
                        t.name()
                    ))
                })?;
                Ok(add_angle_z(t, fixture, plane))
            })
            .collect(),
        Some("laser_angle") => tables
            .iter()
            .map(|t| -> Result<CharacteristicTable> { Ok(add_laser_angle(t, &z_axis())?) })
            .collect(),
        _ => Ok(tables),
    }
}
