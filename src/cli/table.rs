//! Table formatting utilities for CLI commands
//!
//! Row-oriented listings go through [`TableFormatter`]; square comparison
//! matrices go through [`MatrixTable`]. Both render TSV, CSV, Markdown or a
//! boxed table. TSV and CSV carry machine-readable numbers; Markdown and the
//! boxed table carry rounded values with significant p-values starred.

use console::style;
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{escape_csv, format_opt, format_p_percent, truncate_str};
use crate::cli::OutputFormat;

/// Configuration for table output
#[derive(Debug, Clone)]
pub struct TableConfig {
    /// Show summary line after table (e.g., "26 characteristic(s)")
    pub show_summary: bool,
    /// p-values below this level are starred
    pub alpha: f64,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            show_summary: true,
            alpha: crate::core::config::DEFAULT_ALPHA,
        }
    }
}

impl TableConfig {
    /// Create config optimized for piping (no summary)
    pub fn for_pipe() -> Self {
        Self {
            show_summary: false,
            ..Self::default()
        }
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }
}

/// A typed cell value with semantic meaning for formatting
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Plain text
    Text(String),
    /// Integer count
    Number(i64),
    /// Float value with display precision
    Float(f64, usize),
    /// Optional float, `-` when absent
    OptionalFloat(Option<f64>, usize),
    /// p-value rendered as a percentage
    PValue(f64),
    /// t statistic and p-value in one cell
    Outcome(f64, f64),
    /// Empty/placeholder (matrix diagonal, missing data)
    Empty,
}

impl CellValue {
    /// Rounded rendering for people
    pub fn display(&self, alpha: f64) -> String {
        let star = |p: f64| if p < alpha { " *" } else { "" };
        match self {
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => n.to_string(),
            CellValue::Float(f, precision) => format!("{:.prec$}", f, prec = precision),
            CellValue::OptionalFloat(opt, precision) => format_opt(*opt, *precision),
            CellValue::PValue(p) => format!("{}{}", format_p_percent(*p), star(*p)),
            CellValue::Outcome(t, p) => {
                format!("{:.3} ({}){}", t, format_p_percent(*p), star(*p))
            }
            CellValue::Empty => "-".to_string(),
        }
    }

    /// Machine-readable value for CSV/TSV (full precision, no percent sign)
    pub fn plain(&self) -> String {
        match self {
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => n.to_string(),
            CellValue::Float(f, _) => f.to_string(),
            CellValue::OptionalFloat(opt, _) => opt.map(|f| f.to_string()).unwrap_or_default(),
            CellValue::PValue(p) => p.to_string(),
            CellValue::Outcome(t, p) => format!("{} {}", t, p),
            CellValue::Empty => String::new(),
        }
    }
}

/// Column definition with header label and maximum width
#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub key: &'static str,
    pub header: &'static str,
    pub width: usize,
}

impl ColumnDef {
    pub const fn new(key: &'static str, header: &'static str, width: usize) -> Self {
        Self { key, header, width }
    }
}

/// A row of cell values for table output
#[derive(Debug, Clone, Default)]
pub struct TableRow {
    pub cells: Vec<(&'static str, CellValue)>,
}

impl TableRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cell(mut self, key: &'static str, value: CellValue) -> Self {
        self.cells.push((key, value));
        self
    }

    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.cells.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }
}

fn escape_for(sep: &str, s: &str) -> String {
    if sep == "," {
        escape_csv(s)
    } else {
        s.to_string()
    }
}

/// Table formatter that outputs rows in various formats
pub struct TableFormatter<'a> {
    columns: &'a [ColumnDef],
    noun: &'static str,
    config: TableConfig,
}

impl<'a> TableFormatter<'a> {
    pub fn new(columns: &'a [ColumnDef], noun: &'static str) -> Self {
        Self {
            columns,
            noun,
            config: TableConfig::default(),
        }
    }

    /// Configure the formatter with custom settings
    pub fn with_config(mut self, config: TableConfig) -> Self {
        self.config = config;
        self
    }

    /// Render rows in the specified format
    pub fn render(&self, rows: &[TableRow], format: OutputFormat) -> String {
        match format {
            OutputFormat::Csv => self.render_delimited(rows, ","),
            OutputFormat::Md => self.render_built(rows, true),
            OutputFormat::Table => self.render_built(rows, false),
            _ => self.render_delimited(rows, "\t"),
        }
    }

    /// Print rows in the specified format
    pub fn output(&self, rows: &[TableRow], format: OutputFormat) {
        print!("{}", self.render(rows, format));

        // Summary goes to stderr so stdout stays a clean table
        if self.config.show_summary && format == OutputFormat::Table {
            eprintln!("{} {}(s)", style(rows.len()).cyan(), self.noun);
        }
    }

    fn render_delimited(&self, rows: &[TableRow], sep: &str) -> String {
        let mut out = String::new();
        let header: Vec<String> = self.columns.iter().map(|c| escape_for(sep, c.key)).collect();
        out.push_str(&header.join(sep));
        out.push('\n');
        for row in rows {
            let cells: Vec<String> = self
                .columns
                .iter()
                .map(|c| {
                    let text = row.get(c.key).map(CellValue::plain).unwrap_or_default();
                    escape_for(sep, &text)
                })
                .collect();
            out.push_str(&cells.join(sep));
            out.push('\n');
        }
        out
    }

    fn render_built(&self, rows: &[TableRow], markdown: bool) -> String {
        let mut builder = Builder::default();
        builder.push_record(self.columns.iter().map(|c| c.header));
        for row in rows {
            builder.push_record(self.columns.iter().map(|c| {
                let text = row
                    .get(c.key)
                    .map_or_else(|| "-".to_string(), |v| v.display(self.config.alpha));
                let text = truncate_str(&text, c.width);
                if markdown {
                    // Escape pipe characters for markdown tables
                    text.replace('|', "\\|")
                } else {
                    text
                }
            }));
        }
        finish(builder, markdown)
    }
}

fn finish(builder: Builder, markdown: bool) -> String {
    let mut table = builder.build();
    if markdown {
        table.with(Style::markdown());
    } else {
        table.with(Style::rounded());
    }
    let mut out = table.to_string();
    out.push('\n');
    out
}

/// Square comparison matrix with labelled rows and columns
pub struct MatrixTable {
    corner: String,
    labels: Vec<String>,
    cells: Vec<Vec<CellValue>>,
    config: TableConfig,
}

impl MatrixTable {
    /// `cells[i][j]` compares row label `i` against column label `j`
    pub fn new(corner: impl Into<String>, labels: Vec<String>, cells: Vec<Vec<CellValue>>) -> Self {
        Self {
            corner: corner.into(),
            labels,
            cells,
            config: TableConfig::default(),
        }
    }

    pub fn with_config(mut self, config: TableConfig) -> Self {
        self.config = config;
        self
    }

    pub fn render(&self, format: OutputFormat) -> String {
        match format {
            OutputFormat::Csv => self.render_delimited(","),
            OutputFormat::Md => self.render_built(true),
            OutputFormat::Table => self.render_built(false),
            _ => self.render_delimited("\t"),
        }
    }

    pub fn output(&self, format: OutputFormat) {
        print!("{}", self.render(format));
    }

    fn render_delimited(&self, sep: &str) -> String {
        let mut out = String::new();
        let mut header = vec![escape_for(sep, &self.corner)];
        header.extend(self.labels.iter().map(|l| escape_for(sep, l)));
        out.push_str(&header.join(sep));
        out.push('\n');
        for (label, row) in self.labels.iter().zip(&self.cells) {
            let mut line = vec![escape_for(sep, label)];
            line.extend(row.iter().map(|c| escape_for(sep, &c.plain())));
            out.push_str(&line.join(sep));
            out.push('\n');
        }
        out
    }

    fn render_built(&self, markdown: bool) -> String {
        let mut builder = Builder::default();
        let mut header = vec![self.corner.clone()];
        header.extend(self.labels.iter().cloned());
        builder.push_record(header);
        for (label, row) in self.labels.iter().zip(&self.cells) {
            let mut line = vec![label.clone()];
            line.extend(row.iter().map(|c| c.display(self.config.alpha)));
            builder.push_record(line);
        }
        finish(builder, markdown)
    }
}
