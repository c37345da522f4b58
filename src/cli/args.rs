//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    chars::CharsArgs, compare::CompareArgs, completions::CompletionsArgs,
    describe::DescribeArgs, export::ExportArgs, laser::LaserArgs, planes::PlanesArgs,
    repeat::RepeatArgs,
};

#[derive(Parser)]
#[command(name = "bmt")]
#[command(author, version, about = "Build Metrology Toolkit")]
#[command(long_about = "Reduce repeated CMM measurements per specimen, join them with the build layout, and compare error distributions across layout strata.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug, Default)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output (library diagnostics on stderr)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Measurement results file (default: from config or BMT_RESULTS)
    #[arg(long, short = 'r', global = true)]
    pub results: Option<PathBuf>,

    /// Layout file (default: from config or BMT_LAYOUT)
    #[arg(long, short = 'l', global = true)]
    pub layout: Option<PathBuf>,

    /// Delimiter of the results file
    #[arg(long, global = true)]
    pub results_delimiter: Option<char>,

    /// Delimiter of the layout file
    #[arg(long, global = true)]
    pub layout_delimiter: Option<char>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List characteristics with specimen counts and error summary
    Chars(CharsArgs),

    /// Summary statistics of the error, per stratum
    Describe(DescribeArgs),

    /// All-pairs t tests of the error across the strata of a layout column
    #[clap(alias = "cmp")]
    Compare(CompareArgs),

    /// Orientation of the twelve hexagon flatness planes (angle_z)
    Planes(PlanesArgs),

    /// Angle of incidence between feature normals and the laser
    Laser(LaserArgs),

    /// Repeatability of the measuring device (spread of repeated readings)
    Repeat(RepeatArgs),

    /// Write one reduced CSV per characteristic
    Export(ExportArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Automatically detect based on context (table on a terminal, tsv when piped)
    #[default]
    Auto,
    /// Boxed table for reading
    Table,
    /// Tab-separated values (for piping)
    Tsv,
    /// CSV format (for spreadsheets)
    Csv,
    /// Markdown tables
    Md,
    /// JSON format (for programming)
    Json,
    /// YAML format (full fidelity)
    Yaml,
}
