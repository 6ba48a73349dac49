//! Ray-triangle intersection.

use skullmap_mesh::Triangle;

use crate::Ray;

/// Barycentric slack so a ray through a shared edge hits both neighbours
/// instead of slipping between them.
const BARYCENTRIC_EPS: f64 = 1e-9;

/// Determinant threshold below which the ray is treated as parallel.
const PARALLEL_EPS: f64 = 1e-12;

/// Möller–Trumbore ray-triangle intersection.
///
/// Returns the ray parameter `t >= 0` of the hit, or `None` if the ray is
/// parallel to the triangle, misses it, or hits it behind the origin. Both
/// windings are hit.
#[allow(clippy::many_single_char_names)]
pub fn intersect_triangle(ray: &Ray, tri: &Triangle) -> Option<f64> {
    let direction = ray.direction.as_ref();
    let edge1 = tri.v1 - tri.v0;
    let edge2 = tri.v2 - tri.v0;

    let h = direction.cross(&edge2);
    let a = edge1.dot(&h);

    if a.abs() < PARALLEL_EPS {
        return None;
    }

    let f = 1.0 / a;
    let s = ray.origin - tri.v0;
    let u = f * s.dot(&h);
    if !(-BARYCENTRIC_EPS..=1.0 + BARYCENTRIC_EPS).contains(&u) {
        return None;
    }

    let q = s.cross(&edge1);
    let v = f * direction.dot(&q);
    if v < -BARYCENTRIC_EPS || u + v > 1.0 + BARYCENTRIC_EPS {
        return None;
    }

    let t = f * edge2.dot(&q);
    if t >= 0.0 {
        Some(t)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use skullmap_math::{Point3, Vec3};

    fn tri() -> Triangle {
        Triangle::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        )
    }

    #[test]
    fn test_hit() {
        let ray = Ray::new(Point3::new(0.25, 0.25, 1.0), Vec3::new(0.0, 0.0, -1.0));
        assert_relative_eq!(intersect_triangle(&ray, &tri()).unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_hit_from_back_side() {
        let ray = Ray::new(Point3::new(0.25, 0.25, -2.0), Vec3::new(0.0, 0.0, 1.0));
        assert_relative_eq!(intersect_triangle(&ray, &tri()).unwrap(), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_miss() {
        let ray = Ray::new(Point3::new(5.0, 5.0, 1.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(intersect_triangle(&ray, &tri()).is_none());
    }

    #[test]
    fn test_behind_origin() {
        let ray = Ray::new(Point3::new(0.25, 0.25, 1.0), Vec3::new(0.0, 0.0, 1.0));
        assert!(intersect_triangle(&ray, &tri()).is_none());
    }

    #[test]
    fn test_parallel() {
        let ray = Ray::new(Point3::new(-1.0, 0.25, 0.0), Vec3::new(1.0, 0.0, 0.0));
        assert!(intersect_triangle(&ray, &tri()).is_none());
    }

    #[test]
    fn test_shared_edge_hits_both_sides() {
        let other = Triangle::new(
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        );
        let ray = Ray::new(Point3::new(0.5, 0.5, 1.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(intersect_triangle(&ray, &tri()).is_some());
        assert!(intersect_triangle(&ray, &other).is_some());
    }
}
