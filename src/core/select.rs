//! Row filters and column projections applied element-wise to table lists
//!
//! Every function returns new tables in the input order; an input with no
//! matching rows yields an empty table rather than an error.

use serde::Serialize;

use crate::core::error::Result;
use crate::entities::{CharacteristicRow, CharacteristicTable, Value};

/// Keep the rows whose `column` equals `value`
///
/// Nulls never compare equal, so null rows are always dropped.
pub fn filter_equals(
    column: &str,
    value: &Value,
    tables: &[CharacteristicTable],
) -> Result<Vec<CharacteristicTable>> {
    tables
        .iter()
        .map(|t| {
            t.require_column(column)?;
            t.retain_rows(|r| Ok(r.get(column)? == *value))
        })
        .collect()
}

/// Keep the rows whose `column` differs from `value` (null rows included)
pub fn filter_excludes(
    column: &str,
    value: &Value,
    tables: &[CharacteristicTable],
) -> Result<Vec<CharacteristicTable>> {
    tables
        .iter()
        .map(|t| {
            t.require_column(column)?;
            t.retain_rows(|r| Ok(r.get(column)? != *value))
        })
        .collect()
}

/// Columns of one table, indexed by `part_name`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Projection {
    /// A single column
    Series {
        name: String,
        index: Vec<String>,
        values: Vec<Value>,
    },
    /// Several columns, one row per specimen
    Frame {
        index: Vec<String>,
        columns: Vec<String>,
        rows: Vec<Vec<Value>>,
    },
}

impl Projection {
    /// Specimen names the projection is indexed by
    pub fn index(&self) -> &[String] {
        match self {
            Projection::Series { index, .. } | Projection::Frame { index, .. } => index,
        }
    }
}

/// Project each table onto `columns`
///
/// One column gives a [`Projection::Series`], more give a [`Projection::Frame`].
pub fn project_columns<S: AsRef<str>>(
    columns: &[S],
    tables: &[CharacteristicTable],
) -> Result<Vec<Projection>> {
    tables.iter().map(|t| project(columns, t)).collect()
}

fn project<S: AsRef<str>>(columns: &[S], table: &CharacteristicTable) -> Result<Projection> {
    for c in columns {
        table.require_column(c.as_ref())?;
    }
    let index: Vec<String> = table.iter().map(|r| r.part_name.clone()).collect();

    if let [single] = columns {
        return Ok(Projection::Series {
            name: single.as_ref().to_string(),
            index,
            values: table.column(single.as_ref())?,
        });
    }

    let rows = table
        .iter()
        .map(|r| columns.iter().map(|c| r.get(c.as_ref())).collect::<Result<Vec<Value>>>())
        .collect::<Result<Vec<Vec<Value>>>>()?;

    Ok(Projection::Frame {
        index,
        columns: columns.iter().map(|c| c.as_ref().to_string()).collect(),
        rows,
    })
}

/// Stack several tables into one, keeping each row's characteristic tag
///
/// Derived columns survive only if every input carries them.
pub fn concat(name: impl Into<String>, tables: &[CharacteristicTable]) -> CharacteristicTable {
    let rows: Vec<CharacteristicRow> = tables.iter().flat_map(|t| t.iter().cloned()).collect();
    let mut joined = CharacteristicTable::new(name, rows);
    if !tables.is_empty() && tables.iter().all(|t| t.has_angle_z()) {
        joined = joined.mark_angle_z();
    }
    if !tables.is_empty() && tables.iter().all(|t| t.has_laser_angle()) {
        joined = joined.mark_laser_angle();
    }
    joined
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::AnalysisError;
    use crate::entities::LayoutRecord;

    fn row(part: &str, ch: &str, build: Option<i64>, error: f64) -> CharacteristicRow {
        CharacteristicRow {
            part_name: part.to_string(),
            characteristic: ch.to_string(),
            error,
            repeats: 2,
            layout: build.map(|b| LayoutRecord {
                part_name: part.to_string(),
                build: b,
                x_pos: 2,
                y_pos: 3,
                z_pos: 1,
                angle: 45.0,
                center_x: None,
                center_y: None,
                center_z: None,
            }),
            angle_z: None,
            laser_angle: None,
        }
    }

    fn tables() -> Vec<CharacteristicTable> {
        vec![
            CharacteristicTable::new(
                "Diameter_Cyl_8mm_Pos",
                vec![
                    row("P1", "Diameter_Cyl_8mm_Pos", Some(1), 0.1),
                    row("P2", "Diameter_Cyl_8mm_Pos", Some(2), 0.2),
                    row("P3", "Diameter_Cyl_8mm_Pos", None, 0.3),
                ],
            ),
            CharacteristicTable::new(
                "Diameter_Cyl_4mm_Pos",
                vec![row("P1", "Diameter_Cyl_4mm_Pos", Some(1), -0.1)],
            ),
        ]
    }

    fn parts(t: &CharacteristicTable) -> Vec<&str> {
        t.iter().map(|r| r.part_name.as_str()).collect()
    }

    #[test]
    fn test_filter_equals_elementwise() {
        let out = filter_equals("build", &Value::Int(1), &tables()).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(parts(&out[0]), vec!["P1"]);
        assert_eq!(parts(&out[1]), vec!["P1"]);
    }

    #[test]
    fn test_filter_equals_numeric_cross_type() {
        let out = filter_equals("build", &Value::Float(2.0), &tables()).unwrap();
        assert_eq!(parts(&out[0]), vec!["P2"]);
        assert!(out[1].is_empty());
        assert_eq!(out[1].name(), "Diameter_Cyl_4mm_Pos");
    }

    #[test]
    fn test_filter_equals_idempotent() {
        let once = filter_equals("build", &Value::Int(1), &tables()).unwrap();
        let twice = filter_equals("build", &Value::Int(1), &once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_filter_on_center_with_no_match_stays_empty() {
        let mut surveyed = row("P1", "Flatness_HX1_Plane1", Some(1), 0.1);
        if let Some(layout) = surveyed.layout.as_mut() {
            layout.center_x = Some(70.0);
            layout.center_y = Some(170.0);
        }
        let tables = vec![CharacteristicTable::new("Flatness_HX1_Plane1", vec![surveyed])];

        let once = filter_equals("center_x", &Value::Float(999.0), &tables).unwrap();
        assert!(once[0].is_empty());
        let twice = filter_equals("center_x", &Value::Float(999.0), &once).unwrap();
        assert_eq!(once, twice);

        let kept = filter_excludes("center_x", &Value::Float(999.0), &once).unwrap();
        assert!(kept[0].is_empty());
    }

    #[test]
    fn test_filter_on_center_without_survey() {
        let out = filter_excludes("center_x", &Value::Float(70.0), &tables()).unwrap();
        assert_eq!(parts(&out[0]), vec!["P1", "P2", "P3"]);
    }

    #[test]
    fn test_filter_excludes_keeps_nulls() {
        let out = filter_excludes("build", &Value::Int(1), &tables()).unwrap();
        assert_eq!(parts(&out[0]), vec!["P2", "P3"]);
        assert!(out[1].is_empty());
    }

    #[test]
    fn test_filter_unknown_column() {
        let err = filter_equals("colour", &Value::Int(1), &tables()).unwrap_err();
        assert!(matches!(err, AnalysisError::Schema { .. }));
    }

    #[test]
    fn test_project_single_column_is_series() {
        let out = project_columns(&["error"], &tables()).unwrap();
        match &out[0] {
            Projection::Series { name, index, values } => {
                assert_eq!(name, "error");
                assert_eq!(index, &vec!["P1", "P2", "P3"]);
                assert_eq!(values[1], Value::Float(0.2));
            }
            other => panic!("expected a series, got {other:?}"),
        }
    }

    #[test]
    fn test_project_several_columns_is_frame() {
        let out = project_columns(&["build", "error"], &tables()).unwrap();
        match &out[0] {
            Projection::Frame { columns, rows, .. } => {
                assert_eq!(columns, &vec!["build", "error"]);
                assert_eq!(rows[0], vec![Value::Int(1), Value::Float(0.1)]);
                assert!(rows[2][0].is_null());
            }
            other => panic!("expected a frame, got {other:?}"),
        }
        assert_eq!(out[1].index(), &["P1".to_string()]);
    }

    #[test]
    fn test_project_dropped_column() {
        assert!(project_columns(&["nominal"], &tables()).is_err());
    }

    #[test]
    fn test_concat_keeps_characteristic_tag() {
        let joined = concat("joined", &tables());
        assert_eq!(joined.len(), 4);
        assert_eq!(joined.rows()[3].characteristic, "Diameter_Cyl_4mm_Pos");
        assert!(!joined.has_angle_z());
    }
}
