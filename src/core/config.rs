//! Configuration management with layered hierarchy
//!
//! Sources, lowest priority first:
//!
//! 1. built-in defaults
//! 2. global user config (`~/.config/bmt/config.yaml`)
//! 3. project config (`./bmt.yaml`)
//! 4. environment (`BMT_RESULTS`, `BMT_LAYOUT`, `BMT_STRATIFY`)
//! 5. command-line flags (applied by the CLI)

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default delimiter of the metrology results export
pub const DEFAULT_RESULTS_DELIMITER: char = ',';

/// Default delimiter of the layout file
pub const DEFAULT_LAYOUT_DELIMITER: char = ';';

/// Default significance level for highlighting p-values
pub const DEFAULT_ALPHA: f64 = 0.05;

/// Project config file name, looked up in the working directory
pub const PROJECT_CONFIG_FILE: &str = "bmt.yaml";

/// BMT configuration with layered hierarchy
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Measurement results file (raw export or canonical CSV)
    pub results: Option<PathBuf>,

    /// Layout file
    pub layout: Option<PathBuf>,

    pub results_delimiter: Option<char>,

    pub layout_delimiter: Option<char>,

    /// Default stratification column for `describe` and `compare`
    pub stratify: Option<String>,

    /// Significance level used to highlight p-values
    pub alpha: Option<f64>,

    /// Default output format
    pub default_format: Option<String>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load() -> Self {
        let mut config = Config::default();

        // Global user config
        if let Some(global_path) = Self::global_config_path() {
            if let Some(global) = Self::read_file(&global_path) {
                config.merge(global);
            }
        }

        // Project config
        if let Some(project) = Self::read_file(Path::new(PROJECT_CONFIG_FILE)) {
            config.merge(project);
        }

        // Environment variables
        if let Ok(results) = std::env::var("BMT_RESULTS") {
            config.results = Some(PathBuf::from(results));
        }
        if let Ok(layout) = std::env::var("BMT_LAYOUT") {
            config.layout = Some(PathBuf::from(layout));
        }
        if let Ok(stratify) = std::env::var("BMT_STRATIFY") {
            config.stratify = Some(stratify);
        }

        config
    }

    /// Parse a config file; a missing file is silently skipped
    fn read_file(path: &Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "cannot read config file");
                return None;
            }
        };
        match serde_yml::from_str::<Config>(&contents) {
            Ok(config) => {
                tracing::debug!(path = %path.display(), "loaded config file");
                Some(config)
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring malformed config file");
                None
            }
        }
    }

    /// Get the path to the global config file
    fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "bmt")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: Config) {
        if other.results.is_some() {
            self.results = other.results;
        }
        if other.layout.is_some() {
            self.layout = other.layout;
        }
        if other.results_delimiter.is_some() {
            self.results_delimiter = other.results_delimiter;
        }
        if other.layout_delimiter.is_some() {
            self.layout_delimiter = other.layout_delimiter;
        }
        if other.stratify.is_some() {
            self.stratify = other.stratify;
        }
        if other.alpha.is_some() {
            self.alpha = other.alpha;
        }
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }
    }

    pub fn results_delimiter(&self) -> u8 {
        delimiter_byte(self.results_delimiter.unwrap_or(DEFAULT_RESULTS_DELIMITER))
    }

    pub fn layout_delimiter(&self) -> u8 {
        delimiter_byte(self.layout_delimiter.unwrap_or(DEFAULT_LAYOUT_DELIMITER))
    }

    pub fn alpha(&self) -> f64 {
        self.alpha.unwrap_or(DEFAULT_ALPHA)
    }
}

/// CSV delimiters are single bytes; anything else falls back to a comma
fn delimiter_byte(c: char) -> u8 {
    if c.is_ascii() {
        c as u8
    } else {
        tracing::warn!(delimiter = %c, "non-ASCII delimiter, using ','");
        b','
    }
}
