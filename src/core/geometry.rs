//! Rigid rotation and angle-of-incidence geometry
//!
//! Vectors live in the build-volume frame: X and Y span the build plate,
//! Z points up. Specimens sit in the `z = 0` plane and the laser is a fixed
//! point source above the plate.

use nalgebra::{Matrix3, Vector3};

use crate::core::error::{AnalysisError, Result};

/// Position of the laser source in the build-volume frame [mm]
pub const LASER_SOURCE: [f64; 3] = [170.0, 170.0, 600.0];

/// Vertical unit vector, the default feature normal
pub fn z_axis() -> Vector3<f64> {
    Vector3::new(0.0, 0.0, 1.0)
}

/// Right-handed rotation about X by `degrees`
///
/// ```text
/// Rx = | 1   0    0  |
///      | 0   c   -s  |
///      | 0   s    c  |
/// ```
pub fn rotation_x(degrees: f64) -> Matrix3<f64> {
    let (s, c) = degrees.to_radians().sin_cos();
    Matrix3::new(1.0, 0.0, 0.0, 0.0, c, -s, 0.0, s, c)
}

/// Right-handed rotation about Y by `degrees`
///
/// ```text
/// Ry = |  c   0   s |
///      |  0   1   0 |
///      | -s   0   c |
/// ```
pub fn rotation_y(degrees: f64) -> Matrix3<f64> {
    let (s, c) = degrees.to_radians().sin_cos();
    Matrix3::new(c, 0.0, s, 0.0, 1.0, 0.0, -s, 0.0, c)
}

/// Right-handed rotation about Z by `degrees`
///
/// ```text
/// Rz = | c  -s   0 |
///      | s   c   0 |
///      | 0   0   1 |
/// ```
pub fn rotation_z(degrees: f64) -> Matrix3<f64> {
    let (s, c) = degrees.to_radians().sin_cos();
    Matrix3::new(c, -s, 0.0, s, c, 0.0, 0.0, 0.0, 1.0)
}

/// Rotate `v` about X, then Y, then Z (angles in degrees)
///
/// A rotation whose angle is exactly zero is skipped, so
/// `rotate_vector(v, 0.0, 0.0, 0.0)` returns `v` bit-for-bit.
pub fn rotate_vector(v: Vector3<f64>, angle_x: f64, angle_y: f64, angle_z: f64) -> Vector3<f64> {
    let mut out = v;
    if angle_x != 0.0 {
        out = rotation_x(angle_x) * out;
    }
    if angle_y != 0.0 {
        out = rotation_y(angle_y) * out;
    }
    if angle_z != 0.0 {
        out = rotation_z(angle_z) * out;
    }
    out
}

/// Angle between two vectors in degrees, in `[0, 180]`
///
/// The cosine is clamped to `[-1, 1]` so rounding drift never fails the
/// inverse cosine. A zero-norm vector has no direction and is an error.
pub fn angle_between(a: &Vector3<f64>, b: &Vector3<f64>) -> Result<f64> {
    let norms_sq = a.norm_squared() * b.norm_squared();
    if norms_sq == 0.0 || !norms_sq.is_finite() {
        return Err(AnalysisError::GeometryDomain {
            message: format!(
                "cannot take the angle between [{}, {}, {}] and [{}, {}, {}]",
                a.x, a.y, a.z, b.x, b.y, b.z
            ),
        });
    }
    let cos = (a.dot(b) / norms_sq.sqrt()).clamp(-1.0, 1.0);
    Ok(cos.acos().to_degrees())
}

/// Angle between a feature normal and the direction to the laser source
///
/// The specimen is taken to lie at `(x, y, 0)`.
pub fn laser_angle(x: f64, y: f64, normal: &Vector3<f64>) -> Result<f64> {
    let [lx, ly, lz] = LASER_SOURCE;
    let to_laser = Vector3::new(lx - x, ly - y, lz);
    angle_between(normal, &to_laser)
}
