//! Shared helper functions for CLI commands
//!
//! This module contains utility functions that are used across multiple
//! command modules to avoid code duplication.

use nalgebra::Vector3;

use crate::entities::Value;

/// Truncate a string to max_len, adding "..." if truncated
///
/// Useful for table columns that need fixed-width output.
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Escape a string for CSV output
///
/// Handles commas, quotes, and newlines according to RFC 4180.
pub fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Parse a `COLUMN=VALUE` filter argument
pub fn parse_assignment(s: &str) -> Result<(String, Value), String> {
    let (column, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected COLUMN=VALUE, got '{}'", s))?;
    let column = column.trim();
    if column.is_empty() {
        return Err(format!("missing column name in '{}'", s));
    }
    Ok((column.to_string(), Value::parse(value)))
}

/// Parse a vector given as `X,Y,Z`
pub fn parse_vector(s: &str) -> Result<Vector3<f64>, String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(format!("expected X,Y,Z, got '{}'", s));
    }
    let mut xyz = [0.0; 3];
    for (slot, part) in xyz.iter_mut().zip(&parts) {
        *slot = part
            .parse::<f64>()
            .map_err(|_| format!("'{}' is not a number", part))?;
    }
    Ok(Vector3::new(xyz[0], xyz[1], xyz[2]))
}

/// Render a p-value as a percentage with two decimals
pub fn format_p_percent(p: f64) -> String {
    format!("{:.2}%", p * 100.0)
}

/// Render an optional float with fixed precision, `-` when absent
pub fn format_opt(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.prec$}", v, prec = precision))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 8), "hello...");
        assert_eq!(truncate_str("hi", 2), "hi");
    }

    #[test]
    fn test_escape_csv() {
        assert_eq!(escape_csv("simple"), "simple");
        assert_eq!(escape_csv("with,comma"), "\"with,comma\"");
        assert_eq!(escape_csv("with\"quote"), "\"with\"\"quote\"");
    }

    #[test]
    fn test_parse_assignment() {
        let (col, val) = parse_assignment("z_pos=3").unwrap();
        assert_eq!(col, "z_pos");
        assert_eq!(val, Value::Int(3));
        assert!(parse_assignment("z_pos").is_err());
        assert!(parse_assignment("=3").is_err());
    }

    #[test]
    fn test_parse_vector() {
        let v = parse_vector("0, 1,-0.5").unwrap();
        assert_eq!(v, Vector3::new(0.0, 1.0, -0.5));
        assert!(parse_vector("0,1").is_err());
        assert!(parse_vector("0,a,1").is_err());
    }

    #[test]
    fn test_format_p_percent() {
        assert_eq!(format_p_percent(0.0734), "7.34%");
    }

    #[test]
    fn test_format_opt() {
        assert_eq!(format_opt(None, 3), "-");
        assert_eq!(format_opt(Some(1.23456), 3), "1.235");
    }
}
