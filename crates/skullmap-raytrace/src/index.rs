//! Segment queries against a spatial index.

use skullmap_math::{Point3, Tolerance};

use crate::{Bvh, RayHit, Segment};

/// Intersection queries along the segment between two points.
///
/// Hits are ordered from `start` towards `end`, and only hits that lie on the
/// segment are reported.
pub trait SpatialIndex {
    /// The hit closest to `start`, if any.
    fn first_intersection(&self, start: &Point3, end: &Point3) -> Option<RayHit>;

    /// Every distinct crossing of the surface, ordered from `start`.
    ///
    /// A crossing through a shared edge or vertex touches several faces at
    /// the same point; it is reported once.
    fn all_intersections(&self, start: &Point3, end: &Point3) -> Vec<RayHit>;
}

impl SpatialIndex for Bvh {
    fn first_intersection(&self, start: &Point3, end: &Point3) -> Option<RayHit> {
        let (ray, length) = Segment::new(*start, *end).to_ray()?;
        self.trace_closest(&ray, length)
    }

    fn all_intersections(&self, start: &Point3, end: &Point3) -> Vec<RayHit> {
        let Some((ray, length)) = Segment::new(*start, *end).to_ray() else {
            return Vec::new();
        };
        dedup_hits(self.trace(&ray, length))
    }
}

/// Collapse hits closer than the linear tolerance along the ray.
///
/// Input must be sorted by `t`. The first hit of each cluster is kept.
fn dedup_hits(hits: Vec<RayHit>) -> Vec<RayHit> {
    let tol = Tolerance::DEFAULT.linear;
    let mut out: Vec<RayHit> = Vec::with_capacity(hits.len());
    for hit in hits {
        match out.last() {
            Some(prev) if hit.t - prev.t < tol => {}
            _ => out.push(hit),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use skullmap_mesh::primitives::{make_box, make_hollow_box};

    fn cube_index() -> Bvh {
        Bvh::build(&make_box(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(10.0, 10.0, 10.0),
        ))
    }

    #[test]
    fn test_first_intersection() {
        let bvh = cube_index();
        let hit = bvh
            .first_intersection(&Point3::new(-5.0, 3.0, 4.0), &Point3::new(15.0, 3.0, 4.0))
            .unwrap();
        assert_relative_eq!(hit.point.x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(hit.t, 5.0, epsilon = 1e-9);
    }

    #[test]
    fn test_first_intersection_reversed() {
        let bvh = cube_index();
        let hit = bvh
            .first_intersection(&Point3::new(15.0, 3.0, 4.0), &Point3::new(-5.0, 3.0, 4.0))
            .unwrap();
        assert_relative_eq!(hit.point.x, 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_segment_stops_at_end() {
        let bvh = cube_index();
        let hits = bvh.all_intersections(&Point3::new(-5.0, 3.0, 4.0), &Point3::new(5.0, 3.0, 4.0));
        assert_eq!(hits.len(), 1);
        assert!(bvh
            .first_intersection(&Point3::new(-5.0, 3.0, 4.0), &Point3::new(-1.0, 3.0, 4.0))
            .is_none());
    }

    #[test]
    fn test_segment_starting_inside() {
        let bvh = cube_index();
        let hits = bvh.all_intersections(&Point3::new(5.0, 3.0, 4.0), &Point3::new(5.0, 3.0, 40.0));
        assert_eq!(hits.len(), 1);
        assert_relative_eq!(hits[0].point.z, 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_shared_diagonal_counted_once() {
        // (y, z) = (5, 5) lies on the diagonal splitting each x side of the box.
        let bvh = cube_index();
        let hits = bvh.all_intersections(&Point3::new(-5.0, 5.0, 5.0), &Point3::new(15.0, 5.0, 5.0));
        assert_eq!(hits.len(), 2);
        assert_relative_eq!(hits[0].point.x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(hits[1].point.x, 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_hollow_box_ordering() {
        let bvh = Bvh::build(&make_hollow_box(
            (Point3::new(0.0, 0.0, 0.0), Point3::new(4.0, 4.0, 4.0)),
            (Point3::new(1.0, 1.0, 1.0), Point3::new(3.0, 3.0, 3.0)),
        ));
        let hits = bvh.all_intersections(&Point3::new(8.0, 2.2, 1.7), &Point3::new(-8.0, 2.2, 1.7));
        let xs: Vec<f64> = hits.iter().map(|h| h.point.x).collect();
        assert_eq!(xs.len(), 4);
        for (x, expected) in xs.iter().zip([4.0, 3.0, 1.0, 0.0]) {
            assert_relative_eq!(*x, expected, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_degenerate_segment() {
        let bvh = cube_index();
        let p = Point3::new(0.0, 5.0, 5.0);
        assert!(bvh.all_intersections(&p, &p).is_empty());
        assert!(bvh.first_intersection(&p, &p).is_none());
    }

    #[test]
    fn test_dedup_hits_keeps_first_of_cluster() {
        let p = Point3::origin();
        let hits = vec![
            RayHit::new(1.0, p, 3),
            RayHit::new(1.0 + 1e-9, p, 1),
            RayHit::new(2.0, p, 0),
        ];
        let out = dedup_hits(hits);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].face, 3);
        assert_eq!(out[1].face, 0);
    }
}
