//! Ray and segment representation and basic ray-geometry tests.

use skullmap_math::{Aabb3, Dir3, Point3, Tolerance, Vec3};

/// A ray in 3D space defined by origin and direction.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// Origin point of the ray.
    pub origin: Point3,
    /// Unit direction of the ray.
    pub direction: Dir3,
    /// Precomputed reciprocal of direction components for fast AABB tests.
    inv_direction: Vec3,
    /// Sign of direction components (0 if positive, 1 if negative).
    sign: [usize; 3],
}

impl Ray {
    /// Create a new ray from origin and direction.
    ///
    /// The direction will be normalized.
    pub fn new(origin: Point3, direction: Vec3) -> Self {
        let dir = Dir3::new_normalize(direction);
        let inv = Vec3::new(1.0 / dir.x, 1.0 / dir.y, 1.0 / dir.z);
        let sign = [
            usize::from(inv.x < 0.0),
            usize::from(inv.y < 0.0),
            usize::from(inv.z < 0.0),
        ];
        Self {
            origin,
            direction: dir,
            inv_direction: inv,
            sign,
        }
    }

    /// Evaluate the ray at parameter `t`: `origin + t * direction`.
    #[inline]
    pub fn at(&self, t: f64) -> Point3 {
        self.origin + t * self.direction.as_ref()
    }

    /// Entry and exit parameters of the ray through `aabb`, clamped to
    /// `t >= 0`, or `None` when the box is missed or lies behind the origin.
    ///
    /// Slab test per axis. Infinite reciprocals from axis-aligned directions
    /// give infinite slab bounds, so flat boxes still register hits.
    #[inline]
    pub fn intersect_aabb(&self, aabb: &Aabb3) -> Option<(f64, f64)> {
        let bounds = [aabb.min, aabb.max];
        let mut t_enter = f64::NEG_INFINITY;
        let mut t_exit = f64::INFINITY;

        for axis in 0..3 {
            let near = bounds[self.sign[axis]][axis];
            let far = bounds[1 - self.sign[axis]][axis];
            let origin = self.origin[axis];
            let inv = self.inv_direction[axis];
            t_enter = t_enter.max((near - origin) * inv);
            t_exit = t_exit.min((far - origin) * inv);
        }

        (t_exit >= t_enter && t_exit >= 0.0).then(|| (t_enter.max(0.0), t_exit))
    }
}

/// A finite line segment used as an intersection query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    /// Query start; hits are ordered from here.
    pub start: Point3,
    /// Query end.
    pub end: Point3,
}

impl Segment {
    /// Create a segment between two points.
    pub fn new(start: Point3, end: Point3) -> Self {
        Self { start, end }
    }

    /// Length of the segment.
    pub fn length(&self) -> f64 {
        (self.end - self.start).norm()
    }

    /// The ray from `start` towards `end` and the parameter of `end`.
    ///
    /// Returns `None` for segments shorter than the linear tolerance, which
    /// have no direction and therefore no hits.
    pub fn to_ray(&self) -> Option<(Ray, f64)> {
        let length = self.length();
        if !length.is_finite() || Tolerance::DEFAULT.is_zero(length) {
            return None;
        }
        Some((Ray::new(self.start, self.end - self.start), length))
    }
}

/// Result of a ray-triangle intersection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Parameter along the ray where intersection occurs.
    pub t: f64,
    /// 3D intersection point.
    pub point: Point3,
    /// Index of the mesh face that was hit.
    pub face: usize,
}

impl RayHit {
    /// Create a new ray hit.
    pub fn new(t: f64, point: Point3, face: usize) -> Self {
        Self { t, point, face }
    }
}
