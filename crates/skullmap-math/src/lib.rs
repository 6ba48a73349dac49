#![warn(missing_docs)]

//! Math types for skullmap.
//!
//! Thin wrappers around nalgebra providing the point, vector and direction
//! types shared by the mesh, ray tracing and thickness crates, plus the two
//! small solvers the rainfall cast needs: a three-point plane fit and an
//! angle between vectors.

mod bbox;

pub use bbox::Aabb3;

use nalgebra::{Unit, Vector3};

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A unit (normalized) direction vector in 3D space.
pub type Dir3 = Unit<Vector3<f64>>;

/// A 3x3 matrix.
pub type Matrix3 = nalgebra::Matrix3<f64>;

/// Distance tolerance for intersection queries.
///
/// Face boxes are padded by it and hits closer together than it along a
/// segment count as one crossing.
#[derive(Debug, Clone, Copy)]
pub struct Tolerance {
    /// Linear distance tolerance in mesh units.
    pub linear: f64,
}

impl Tolerance {
    /// Default tolerance (1e-7 mesh units).
    pub const DEFAULT: Self = Self { linear: 1e-7 };

    /// Check if a scalar distance is effectively zero.
    pub fn is_zero(&self, d: f64) -> bool {
        d.abs() < self.linear
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Fit the plane `n · x = 1` through three points and return its unit normal.
///
/// The rows of the system matrix are the point coordinates, so the sign of
/// the normal follows from which side of the plane the origin lies on.
/// Returns `None` when the plane passes through the origin, when the points
/// are collinear, or when the solve is numerically unusable.
pub fn fit_plane_normal(a: &Point3, b: &Point3, c: &Point3) -> Option<Vec3> {
    let m = Matrix3::from_rows(&[
        a.coords.transpose(),
        b.coords.transpose(),
        c.coords.transpose(),
    ]);
    let scale = a.coords.norm() * b.coords.norm() * c.coords.norm();
    if scale == 0.0 || m.determinant().abs() <= 1e-12 * scale {
        return None;
    }
    let raw = m.lu().solve(&Vec3::new(1.0, 1.0, 1.0))?;
    let len = raw.norm();
    if !len.is_finite() || len < 1e-12 {
        return None;
    }
    Some(raw / len)
}

/// Angle between two vectors in degrees, in `[0, 180]`.
///
/// Computed as `atan2(|a x b|, a . b)`, which stays accurate near 0 and 180.
pub fn angle_between_degrees(a: &Vec3, b: &Vec3) -> f64 {
    a.cross(b).norm().atan2(a.dot(b)).to_degrees()
}
