//! Layout-derived covariates: laser incidence and plane orientation
//!
//! Both enrichers return new tables; the input tables are left untouched.

use nalgebra::Vector3;

use crate::core::error::{AnalysisError, Result};
use crate::core::geometry::{laser_angle, rotate_vector};
use crate::core::index::CharacteristicIndex;
use crate::entities::{CharacteristicRow, CharacteristicTable};

/// Hexagonal fixtures carrying the flatness planes
pub const FIXTURES: [Fixture; 2] = [Fixture::Hx1, Fixture::Hx2];

/// Planes per hexagonal fixture
pub const PLANES_PER_FIXTURE: u32 = 6;

/// Grid pitch and offset used when a specimen has no surveyed center [mm]
const GRID_PITCH: f64 = 100.0;
const GRID_OFFSET: f64 = 30.0;

/// One of the two hexagonal flatness fixtures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fixture {
    Hx1,
    Hx2,
}

impl Fixture {
    /// Azimuth of plane 0 before any specimen rotation [degrees]
    pub fn base_azimuth(self) -> f64 {
        match self {
            Fixture::Hx1 => 210.0,
            Fixture::Hx2 => 240.0,
        }
    }

    /// Characteristic name of a plane on this fixture (plane is 1-based)
    pub fn plane_name(self, plane: u32) -> String {
        format!("Flatness_{}_Plane{}", self, plane)
    }
}

impl std::fmt::Display for Fixture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Fixture::Hx1 => write!(f, "HX1"),
            Fixture::Hx2 => write!(f, "HX2"),
        }
    }
}

/// Fixture and 1-based plane number encoded in a plane characteristic name
///
/// `Flatness_HX2_Plane4` parses to `(Fixture::Hx2, 4)`.
pub fn parse_plane_name(name: &str) -> Option<(Fixture, u32)> {
    let rest = name.strip_prefix("Flatness_")?;
    let (fixture, plane) = rest.split_once("_Plane")?;
    let fixture = match fixture {
        "HX1" => Fixture::Hx1,
        "HX2" => Fixture::Hx2,
        _ => return None,
    };
    let plane: u32 = plane.parse().ok()?;
    (1..=PLANES_PER_FIXTURE)
        .contains(&plane)
        .then_some((fixture, plane))
}

/// Initial azimuth of a plane normal: `(base + 60·plane) mod 360`
pub fn plane_azimuth(fixture: Fixture, plane: u32) -> f64 {
    (fixture.base_azimuth() + 60.0 * plane as f64) % 360.0
}

/// Unit normal of an un-rotated plane, lying in the XY plane
///
/// Only the Y component enters `angle_z`; X is kept so a full 3-D
/// correction can be built on the same normal.
pub fn plane_normal(fixture: Fixture, plane: u32) -> Vector3<f64> {
    let (s, c) = plane_azimuth(fixture, plane).to_radians().sin_cos();
    Vector3::new(c, s, 0.0)
}

/// Angle between a plane normal with Y component `normal_y` and the vertical
/// after the specimen is rotated by `angle` degrees about X
pub fn angle_from_vertical(normal_y: f64, angle: f64) -> f64 {
    let cos = (normal_y * angle.to_radians().sin()).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}

/// Planar position of a specimen: surveyed center if known, grid position otherwise
fn planar_position(row: &CharacteristicRow) -> Result<(f64, f64)> {
    let layout = row
        .layout
        .as_ref()
        .ok_or_else(|| AnalysisError::MissingCoordinates {
            part_name: row.part_name.clone(),
        })?;

    match (layout.center_x, layout.center_y) {
        (Some(x), Some(y)) => Ok((x, y)),
        _ => Ok((
            layout.x_pos as f64 * GRID_PITCH - GRID_OFFSET,
            layout.y_pos as f64 * GRID_PITCH - GRID_OFFSET,
        )),
    }
}

/// Append `laser_angle`: the incidence of the rotated feature normal
///
/// The feature vector is rotated about X only, by the specimen's layout
/// `angle`; the rig has a single rotational degree of freedom. An existing
/// `laser_angle` is replaced by the one computed for `feature`.
pub fn add_laser_angle(
    table: &CharacteristicTable,
    feature: &Vector3<f64>,
) -> Result<CharacteristicTable> {
    let rows = table
        .iter()
        .map(|row| -> Result<CharacteristicRow> {
            let (x, y) = planar_position(row)?;
            // planar_position guarantees a layout is present
            let angle = row.layout.as_ref().map_or(0.0, |l| l.angle);
            let normal = rotate_vector(*feature, angle, 0.0, 0.0);
            let incidence = laser_angle(x, y, &normal)?;
            Ok(CharacteristicRow {
                laser_angle: Some(incidence),
                ..row.clone()
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(table.with_rows(rows).mark_laser_angle())
}

/// Append `angle_z` to one plane table
///
/// Rows without layout get no angle. A row that already carries `angle_z`
/// keeps its first value.
pub fn add_angle_z(table: &CharacteristicTable, fixture: Fixture, plane: u32) -> CharacteristicTable {
    let normal_y = plane_normal(fixture, plane).y;
    let rows = table
        .iter()
        .map(|row| CharacteristicRow {
            characteristic: fixture.plane_name(plane),
            angle_z: row.angle_z.or_else(|| {
                row.layout
                    .as_ref()
                    .map(|l| angle_from_vertical(normal_y, l.angle))
            }),
            ..row.clone()
        })
        .collect();

    table.with_rows(rows).mark_angle_z()
}

/// Derive `angle_z` for all twelve hexagon planes
///
/// Returns the tables in fixture order (HX1 planes 1-6, then HX2 planes 1-6),
/// each tagged with its characteristic name.
pub fn add_plane_orientation(index: &CharacteristicIndex) -> Result<Vec<CharacteristicTable>> {
    let mut planes = Vec::with_capacity(FIXTURES.len() * PLANES_PER_FIXTURE as usize);
    for fixture in FIXTURES {
        for plane in 1..=PLANES_PER_FIXTURE {
            let table = index.require(&fixture.plane_name(plane))?;
            planes.push(add_angle_z(table, fixture, plane));
        }
    }
    Ok(planes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::{angle_between, z_axis};
    use crate::entities::LayoutRecord;
    use approx::assert_abs_diff_eq;

    fn row(part: &str, angle: f64, center: Option<(f64, f64)>) -> CharacteristicRow {
        CharacteristicRow {
            part_name: part.to_string(),
            characteristic: "Flatness_HX1_Plane3".to_string(),
            error: 0.02,
            repeats: 3,
            layout: Some(LayoutRecord {
                part_name: part.to_string(),
                build: 1,
                x_pos: 1,
                y_pos: 1,
                z_pos: 1,
                angle,
                center_x: center.map(|c| c.0),
                center_y: center.map(|c| c.1),
                center_z: None,
            }),
            angle_z: None,
            laser_angle: None,
        }
    }

    #[test]
    fn test_plane_azimuth() {
        assert_eq!(plane_azimuth(Fixture::Hx1, 3), 30.0);
        assert_eq!(plane_azimuth(Fixture::Hx1, 1), 270.0);
        assert_eq!(plane_azimuth(Fixture::Hx2, 2), 0.0);
        assert_eq!(plane_azimuth(Fixture::Hx2, 6), 240.0);
    }

    #[test]
    fn test_parse_plane_name() {
        assert_eq!(parse_plane_name("Flatness_HX2_Plane4"), Some((Fixture::Hx2, 4)));
        assert_eq!(parse_plane_name("Flatness_HX1_Plane7"), None);
        assert_eq!(parse_plane_name("Flatness_HX3_Plane1"), None);
        assert_eq!(parse_plane_name("Diameter_Cyl_8mm_Pos"), None);
        for fixture in FIXTURES {
            for plane in 1..=PLANES_PER_FIXTURE {
                assert_eq!(parse_plane_name(&fixture.plane_name(plane)), Some((fixture, plane)));
            }
        }
    }

    #[test]
    fn test_angle_z_hx1_plane3_upright() {
        let table = CharacteristicTable::new("Flatness_HX1_Plane3", vec![row("P1", 90.0, None)]);
        let out = add_angle_z(&table, Fixture::Hx1, 3);
        assert_abs_diff_eq!(out.rows()[0].angle_z.unwrap(), 60.0, epsilon = 1e-9);
        assert!(table.rows()[0].angle_z.is_none());
    }

    #[test]
    fn test_angle_z_matches_rotated_normal() {
        for (fixture, plane, angle) in [(Fixture::Hx1, 2, 35.0), (Fixture::Hx2, 5, -90.0)] {
            let normal = plane_normal(fixture, plane);
            let rotated = rotate_vector(normal, angle, 0.0, 0.0);
            let geometric = angle_between(&rotated, &z_axis()).unwrap();
            assert_abs_diff_eq!(
                angle_from_vertical(normal.y, angle),
                geometric,
                epsilon = 1e-9
            );
        }
    }

    #[test]
    fn test_angle_z_keeps_first_value() {
        let mut r = row("P1", 90.0, None);
        r.angle_z = Some(12.0);
        let table = CharacteristicTable::new("Flatness_HX1_Plane3", vec![r]);
        let out = add_angle_z(&table, Fixture::Hx1, 3);
        assert_eq!(out.rows()[0].angle_z, Some(12.0));
    }

    #[test]
    fn test_laser_angle_prefers_surveyed_center() {
        let table = CharacteristicTable::new(
            "Flatness_HX1_Plane3",
            vec![row("P1", 0.0, Some((70.0, 70.0))), row("P2", 0.0, None)],
        );
        let out = add_laser_angle(&table, &z_axis()).unwrap();
        assert!(out.has_laser_angle());

        let surveyed = laser_angle(70.0, 70.0, &z_axis()).unwrap();
        assert_abs_diff_eq!(out.rows()[0].laser_angle.unwrap(), surveyed, epsilon = 1e-12);

        // Grid position (1, 1) maps to (70, 70)
        assert_abs_diff_eq!(out.rows()[1].laser_angle.unwrap(), surveyed, epsilon = 1e-12);
    }

    #[test]
    fn test_laser_angle_rotates_feature() {
        let table =
            CharacteristicTable::new("F", vec![row("P1", 90.0, Some((170.0, 170.0)))]);
        let out = add_laser_angle(&table, &z_axis()).unwrap();
        // Vertical normal tipped 90 degrees about X is horizontal; source is overhead
        assert_abs_diff_eq!(out.rows()[0].laser_angle.unwrap(), 90.0, epsilon = 1e-9);
    }

    #[test]
    fn test_laser_angle_recomputed_for_new_feature() {
        let table = CharacteristicTable::new("F", vec![row("P1", 0.0, Some((70.0, 70.0)))]);
        let x_axis = Vector3::new(1.0, 0.0, 0.0);

        let vertical = add_laser_angle(&table, &z_axis()).unwrap();
        let fresh = add_laser_angle(&table, &x_axis).unwrap();
        let again = add_laser_angle(&vertical, &x_axis).unwrap();

        assert_ne!(vertical.rows()[0].laser_angle, fresh.rows()[0].laser_angle);
        assert_eq!(again.rows()[0].laser_angle, fresh.rows()[0].laser_angle);
    }

    #[test]
    fn test_laser_angle_requires_layout() {
        let mut r = row("P7", 0.0, None);
        r.layout = None;
        let table = CharacteristicTable::new("F", vec![r]);
        let err = add_laser_angle(&table, &z_axis()).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::MissingCoordinates {
                part_name: "P7".to_string()
            }
        );
    }

    #[test]
    fn test_add_plane_orientation_requires_all_planes() {
        let index = CharacteristicIndex::from_tables(vec![CharacteristicTable::new(
            "Flatness_HX1_Plane1",
            vec![row("P1", 0.0, None)],
        )]);
        let err = add_plane_orientation(&index).unwrap_err();
        assert!(matches!(err, AnalysisError::KeyNotFound { ref key } if key == "Flatness_HX1_Plane2"));
    }

    #[test]
    fn test_add_plane_orientation_all_twelve() {
        let tables = FIXTURES.iter().flat_map(|&f| {
            (1..=PLANES_PER_FIXTURE)
                .map(move |p| CharacteristicTable::new(f.plane_name(p), vec![row("P1", 90.0, None)]))
        });
        let index = CharacteristicIndex::from_tables(tables);
        let planes = add_plane_orientation(&index).unwrap();

        assert_eq!(planes.len(), 12);
        assert_eq!(planes[2].name(), "Flatness_HX1_Plane3");
        assert_eq!(planes[2].rows()[0].characteristic, "Flatness_HX1_Plane3");
        assert_abs_diff_eq!(planes[2].rows()[0].angle_z.unwrap(), 60.0, epsilon = 1e-9);
        assert!(planes.iter().all(|t| t.has_angle_z()));
    }
}
