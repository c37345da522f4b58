//! End-to-end tests of the library: read, reduce, enrich, select, test

use approx::assert_abs_diff_eq;
use bmt::core::{
    add_angle_z, add_laser_angle, add_plane_orientation, all_pairs_p_values, all_pairs_test,
    concat, describe_by, filter_equals, filter_excludes, project_columns, AnalysisError,
    CharacteristicIndex, Fixture, Projection,
};
use bmt::core::geometry::z_axis;
use bmt::entities::{CharacteristicRow, CharacteristicTable, LayoutRecord, Value};
use bmt::io::{read_layout_from, read_measurements_from, IoError};
use nalgebra::Vector3;

const RAW_EXPORT: &str = "\
Uuid,K53 Order number,K14 Part ident,Characteristic,K1 Measured value,K2101 Nominal value,K4 Time/Date,K2001 Characteristic number,Operator
a1,S1,1,Diameter_Cyl_8mm_Pos,8.012,8.0,01.03.2024 10:00:00,1,jd
a2,S1,2,Diameter_Cyl_8mm_Pos,8.014,8.0,01.03.2024 10:01:00,1,jd
a3,S2,1,Diameter_Cyl_8mm_Pos,8.021,8.0,01.03.2024 10:02:00,1,jd
a4,S2,2,Diameter_Cyl_8mm_Pos,8.023,8.0,01.03.2024 10:03:00,1,jd
a5,S3,1,Diameter_Cyl_8mm_Pos,7.995,8.0,01.03.2024 10:04:00,1,jd
a6,S1,1,Flatness_HX1_Plane3,0.031,0.0,01.03.2024 10:05:00,2,jd
a7,S2,1,Flatness_HX1_Plane3,0.027,0.0,01.03.2024 10:06:00,2,jd
";

const LAYOUT: &str = "\
part_name;build;x_pos;y_pos;z_pos;angle;center_x;center_y;center_z
S1;1;1;1;1;90;70;70;5
S2;2;2;1;3;45;;;
";

fn index() -> CharacteristicIndex {
    let measurements = read_measurements_from(RAW_EXPORT.as_bytes(), b',').unwrap();
    let layout = read_layout_from(LAYOUT.as_bytes(), b';').unwrap();
    CharacteristicIndex::build(&measurements, &layout).unwrap()
}

fn row(part: &str, build: i64, error: f64) -> CharacteristicRow {
    CharacteristicRow {
        part_name: part.to_string(),
        characteristic: "Diameter_Cyl_8mm_Pos".to_string(),
        error,
        repeats: 1,
        layout: Some(LayoutRecord {
            part_name: part.to_string(),
            build,
            x_pos: 1,
            y_pos: 1,
            z_pos: 1,
            angle: 0.0,
            center_x: None,
            center_y: None,
            center_z: None,
        }),
        angle_z: None,
        laser_angle: None,
    }
}

#[test]
fn test_raw_export_is_reduced_per_specimen() {
    let index = index();
    assert_eq!(
        index.keys().collect::<Vec<_>>(),
        vec!["Diameter_Cyl_8mm_Pos", "Flatness_HX1_Plane3"]
    );

    let diameter = index.require("Diameter_Cyl_8mm_Pos").unwrap();
    assert_eq!(diameter.len(), 3);

    let s1 = &diameter.rows()[0];
    assert_eq!(s1.part_name, "S1");
    assert_eq!(s1.repeats, 2);
    assert_abs_diff_eq!(s1.error, 0.013, epsilon = 1e-9);

    // S3 is not in the layout: kept, with null layout columns
    let s3 = &diameter.rows()[2];
    assert!(s3.layout.is_none());
    assert!(s3.get("build").unwrap().is_null());
}

#[test]
fn test_missing_key_is_reported() {
    let err = index().select_keys(&["Roundness"]).unwrap_err();
    assert_eq!(
        err,
        AnalysisError::KeyNotFound {
            key: "Roundness".to_string()
        }
    );
}

#[test]
fn test_corrupt_error_column_is_rejected() {
    let csv = "\
uuid,part_name,rep,char_name,actual,nominal,time,char_number,error
u1,S1,1,Diameter,8.01,8.0,2024-03-01 10:00:00,1,0.5
";
    let err = read_measurements_from(csv.as_bytes(), b',').unwrap_err();
    assert!(matches!(
        err,
        IoError::Analysis(AnalysisError::CorruptMeasurement { .. })
    ));
}

#[test]
fn test_missing_measurement_column() {
    let csv = "uuid,part_name,rep,char_name,actual\nu1,S1,1,D,8.0\n";
    let err = read_measurements_from(csv.as_bytes(), b',').unwrap_err();
    assert!(matches!(err, IoError::MissingColumn { .. }));
}

#[test]
fn test_student_t_reference_values() {
    let a = [1.0, 2.0, 3.0, 4.0, 5.0];
    let b = [2.0, 4.0, 6.0, 8.0, 11.0];
    let rows: Vec<CharacteristicRow> = a
        .iter()
        .enumerate()
        .map(|(i, e)| row(&format!("A{}", i), 1, *e))
        .chain(b.iter().enumerate().map(|(i, e)| row(&format!("B{}", i), 2, *e)))
        .collect();
    let table = CharacteristicTable::new("Diameter_Cyl_8mm_Pos", rows);

    let result = all_pairs_test(&table, "build").unwrap();
    assert_eq!(result.labels(), &[Value::Int(1), Value::Int(2)]);
    assert_abs_diff_eq!(result.statistic(0, 1).unwrap(), -1.866277899263374, epsilon = 1e-9);
    assert_abs_diff_eq!(result.statistic(1, 0).unwrap(), 1.866277899263374, epsilon = 1e-9);
    assert_abs_diff_eq!(result.p_value(0, 1).unwrap(), 0.09897149953131398, epsilon = 1e-9);

    let p = all_pairs_p_values(&table, "build").unwrap();
    assert_eq!(p.get(0, 1), p.get(1, 0));
    assert_eq!(p.get(1, 1), None);
    let dense = p.filled(f64::NAN);
    assert!(dense[0][0].is_nan());
}

#[test]
fn test_filters_then_pairwise() {
    let table = CharacteristicTable::new(
        "Diameter_Cyl_8mm_Pos",
        vec![
            row("P1", 1, 0.010),
            row("P2", 1, 0.012),
            row("P3", 2, 0.020),
            row("P4", 2, 0.024),
            row("P5", 3, 0.030),
            row("P6", 3, 0.031),
        ],
    );

    let kept = filter_excludes("build", &Value::Int(3), &[table.clone()]).unwrap();
    let result = all_pairs_test(&kept[0], "build").unwrap();
    assert_eq!(result.len(), 2);

    let only = filter_equals("build", &Value::Float(2.0), &[table]).unwrap();
    let result = all_pairs_test(&only[0], "build").unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result.get(0, 0), None);
}

#[test]
fn test_singleton_strata_are_degenerate() {
    let table = CharacteristicTable::new(
        "Diameter_Cyl_8mm_Pos",
        vec![row("P1", 1, 0.01), row("P2", 2, 0.02)],
    );
    let err = all_pairs_test(&table, "build").unwrap_err();
    assert!(matches!(err, AnalysisError::DegenerateGroup { .. }));
}

#[test]
fn test_laser_angle_uses_surveyed_center() {
    let index = index();
    let table = index.require("Flatness_HX1_Plane3").unwrap();
    let enriched = add_laser_angle(table, &z_axis()).unwrap();
    assert!(enriched.has_column("laser_angle"));

    // S1 is tilted 90° about X, so its face normal points along -Y
    let s1 = enriched.rows()[0].laser_angle.unwrap();
    assert_abs_diff_eq!(s1, 99.335859, epsilon = 1e-5);

    // A +Y side face tilted 90° about X faces straight up
    let side = add_laser_angle(table, &Vector3::new(0.0, 1.0, 0.0)).unwrap();
    let upright = side.rows()[0].laser_angle.unwrap();
    assert_abs_diff_eq!(upright, 13.262676, epsilon = 1e-5);
    assert!(table.rows()[0].laser_angle.is_none(), "input table is untouched");
}

#[test]
fn test_laser_angle_missing_layout() {
    let index = index();
    let table = index.require("Diameter_Cyl_8mm_Pos").unwrap();
    let err = add_laser_angle(table, &z_axis()).unwrap_err();
    assert_eq!(
        err,
        AnalysisError::MissingCoordinates {
            part_name: "S3".to_string()
        }
    );
}

#[test]
fn test_angle_z_then_describe() {
    let index = index();
    let plane = add_angle_z(
        index.require("Flatness_HX1_Plane3").unwrap(),
        Fixture::Hx1,
        3,
    );
    let by_angle = describe_by(&plane, "angle_z").unwrap();
    assert_eq!(by_angle.len(), 2);
    // angle 45 -> acos(0.5 · sin 45°), angle 90 -> 60°
    assert_abs_diff_eq!(by_angle[1].label.as_f64().unwrap(), 69.295188, epsilon = 1e-5);
    assert_abs_diff_eq!(by_angle[0].label.as_f64().unwrap(), 60.0, epsilon = 1e-9);
}

#[test]
fn test_plane_orientation_needs_all_planes() {
    let err = add_plane_orientation(&index()).unwrap_err();
    assert!(matches!(err, AnalysisError::KeyNotFound { .. }));
}

#[test]
fn test_project_and_concat() {
    let index = index();
    let tables = index
        .select_keys(&["Diameter_Cyl_8mm_Pos", "Flatness_HX1_Plane3"])
        .unwrap();

    let projected = project_columns(&["part_name", "error", "build"], &tables).unwrap();
    match &projected[1] {
        Projection::Frame { columns, rows, .. } => {
            assert_eq!(columns.len(), 3);
            assert_eq!(rows.len(), 2);
        }
        other => panic!("expected a frame, got {other:?}"),
    }

    let joined = concat("all", &tables);
    assert_eq!(joined.len(), 5);
    let chars: Vec<Value> = joined.column("char").unwrap();
    assert_eq!(chars[4], Value::from("Flatness_HX1_Plane3"));
}
