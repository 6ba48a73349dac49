//! Bounding Volume Hierarchy for accelerated ray tracing.
//!
//! Uses Surface Area Heuristic (SAH) for construction.

use skullmap_math::{Aabb3, Point3, Tolerance};
use skullmap_mesh::{Triangle, TriangleMesh};
use tracing::debug;

use crate::triangle::intersect_triangle;
use crate::{Ray, RayHit};

/// Faces per leaf before a node is split.
const MAX_LEAF_FACES: usize = 4;

/// A BVH node - either a leaf containing faces or an internal node with children.
#[derive(Debug, Clone)]
pub enum BvhNode {
    /// Leaf node containing face indices.
    Leaf {
        /// Axis-aligned bounding box of this node.
        aabb: Aabb3,
        /// Face indices contained in this leaf.
        faces: Vec<usize>,
    },
    /// Internal node with two children.
    Internal {
        /// Axis-aligned bounding box of this node.
        aabb: Aabb3,
        /// Left child node.
        left: Box<BvhNode>,
        /// Right child node.
        right: Box<BvhNode>,
    },
}

impl BvhNode {
    /// Bounding box of this node.
    pub fn aabb(&self) -> &Aabb3 {
        match self {
            BvhNode::Leaf { aabb, .. } | BvhNode::Internal { aabb, .. } => aabb,
        }
    }
}

/// Per-face build record: face index, bounds, centroid.
type FaceData = (usize, Aabb3, Point3);

/// Bounding Volume Hierarchy for accelerated ray-mesh intersection.
///
/// Owns a copy of the mesh triangles so it stays valid independently of the
/// mesh it was built from.
#[derive(Debug, Clone)]
pub struct Bvh {
    root: Option<BvhNode>,
    triangles: Vec<Triangle>,
}

impl Bvh {
    /// Build a BVH over every face of a mesh using SAH construction.
    ///
    /// A mesh without faces yields an empty hierarchy that never reports hits.
    ///
    /// # Panics
    ///
    /// Panics if a face references a point outside the mesh. Call
    /// [`TriangleMesh::validate`] first on untrusted input.
    pub fn build(mesh: &TriangleMesh) -> Self {
        let triangles: Vec<Triangle> = mesh.triangles().collect();

        let mut face_data: Vec<FaceData> = triangles
            .iter()
            .enumerate()
            .map(|(i, tri)| {
                let mut aabb = tri.aabb();
                aabb.expand(Tolerance::DEFAULT.linear);
                (i, aabb, tri.centroid())
            })
            .collect();

        let root = if face_data.is_empty() {
            None
        } else {
            Some(build_node(&mut face_data))
        };

        debug!(faces = triangles.len(), "built BVH");
        Self { root, triangles }
    }

    /// Number of faces indexed.
    pub fn num_faces(&self) -> usize {
        self.triangles.len()
    }

    /// Bounding box of the indexed geometry.
    pub fn bounds(&self) -> Aabb3 {
        self.root.as_ref().map_or_else(Aabb3::empty, |n| *n.aabb())
    }

    /// Get a reference to the root node, if any.
    pub fn root(&self) -> Option<&BvhNode> {
        self.root.as_ref()
    }

    /// Trace a ray, returning all intersections with `t <= t_max` sorted by t.
    pub fn trace(&self, ray: &Ray, t_max: f64) -> Vec<RayHit> {
        let mut hits = Vec::new();

        if let Some(ref root) = self.root {
            self.trace_node(ray, t_max, root, &mut hits);
        }

        hits.sort_by(|a, b| a.t.total_cmp(&b.t));
        hits
    }

    /// Trace a ray and return only the closest hit with `t <= t_max`.
    pub fn trace_closest(&self, ray: &Ray, t_max: f64) -> Option<RayHit> {
        let mut closest: Option<RayHit> = None;
        let mut closest_t = t_max;

        if let Some(ref root) = self.root {
            self.trace_node_closest(ray, root, &mut closest, &mut closest_t);
        }

        closest
    }

    /// Trace a ray through a single node.
    fn trace_node(&self, ray: &Ray, t_max: f64, node: &BvhNode, hits: &mut Vec<RayHit>) {
        match ray.intersect_aabb(node.aabb()) {
            Some((t_enter, _)) if t_enter <= t_max => {}
            _ => return,
        }

        match node {
            BvhNode::Leaf { faces, .. } => {
                for &face in faces {
                    if let Some(t) = intersect_triangle(ray, &self.triangles[face]) {
                        if t <= t_max {
                            hits.push(RayHit::new(t, ray.at(t), face));
                        }
                    }
                }
            }
            BvhNode::Internal { left, right, .. } => {
                self.trace_node(ray, t_max, left, hits);
                self.trace_node(ray, t_max, right, hits);
            }
        }
    }

    /// Closest-hit descent; nearer children are visited first so the
    /// running bound prunes more of the far subtree.
    fn trace_node_closest(
        &self,
        ray: &Ray,
        node: &BvhNode,
        closest: &mut Option<RayHit>,
        closest_t: &mut f64,
    ) {
        match ray.intersect_aabb(node.aabb()) {
            Some((t_enter, _)) if t_enter <= *closest_t => {}
            _ => return,
        }

        match node {
            BvhNode::Leaf { faces, .. } => {
                for &face in faces {
                    let Some(t) = intersect_triangle(ray, &self.triangles[face]) else {
                        continue;
                    };
                    // Ties keep the lower face index.
                    let better = t < *closest_t
                        || (t == *closest_t && closest.map_or(true, |c| face < c.face));
                    if better {
                        *closest_t = t;
                        *closest = Some(RayHit::new(t, ray.at(t), face));
                    }
                }
            }
            BvhNode::Internal { left, right, .. } => {
                let entry = |n: &BvhNode| ray.intersect_aabb(n.aabb()).map(|(t, _)| t);
                let (near, far) = match (entry(left), entry(right)) {
                    (Some(lt), Some(rt)) if rt < lt => (right, left),
                    _ => (left, right),
                };
                self.trace_node_closest(ray, near, closest, closest_t);
                self.trace_node_closest(ray, far, closest, closest_t);
            }
        }
    }
}

/// Build a BVH node recursively using SAH.
fn build_node(face_data: &mut [FaceData]) -> BvhNode {
    let mut bounds = Aabb3::empty();
    for (_, aabb, _) in face_data.iter() {
        bounds.include_aabb(aabb);
    }

    if face_data.len() <= MAX_LEAF_FACES {
        return BvhNode::Leaf {
            aabb: bounds,
            faces: face_data.iter().map(|(id, _, _)| *id).collect(),
        };
    }

    let (best_axis, best_pos) = find_best_split(face_data, &bounds);
    let mut mid = partition_faces(face_data, best_axis, best_pos);

    // Fallback if partition fails: split the sorted centroids in the middle.
    if mid == 0 || mid == face_data.len() {
        face_data.sort_by(|a, b| a.2[best_axis].total_cmp(&b.2[best_axis]));
        mid = face_data.len() / 2;
    }

    let (left_data, right_data) = face_data.split_at_mut(mid);

    BvhNode::Internal {
        aabb: bounds,
        left: Box::new(build_node(left_data)),
        right: Box::new(build_node(right_data)),
    }
}

/// SAH buckets per axis.
const NUM_BUCKETS: usize = 12;

/// Relative cost of one traversal step against one triangle test.
const TRAVERSAL_COST: f64 = 0.125;

/// Pick the split axis and position with the lowest SAH cost.
///
/// Centroids are binned per axis; a suffix sweep accumulates the right-hand
/// bounds so each candidate plane is scored in one forward pass.
fn find_best_split(face_data: &[FaceData], bounds: &Aabb3) -> (usize, f64) {
    let extent = bounds.extent();
    let total_area = bounds.surface_area();

    let mut best = (f64::INFINITY, 0, 0.0);

    for axis in 0..3 {
        if extent[axis] < 1e-10 {
            continue;
        }
        let origin = bounds.min[axis];
        let bucket_of = |c: &Point3| {
            (((c[axis] - origin) / extent[axis] * NUM_BUCKETS as f64) as usize).min(NUM_BUCKETS - 1)
        };

        let mut counts = [0usize; NUM_BUCKETS];
        let mut boxes = [Aabb3::empty(); NUM_BUCKETS];
        for (_, aabb, centroid) in face_data {
            let b = bucket_of(centroid);
            counts[b] += 1;
            boxes[b].include_aabb(aabb);
        }

        // right[i] covers buckets i.. NUM_BUCKETS
        let mut right = [(0usize, Aabb3::empty()); NUM_BUCKETS];
        let mut acc = (0usize, Aabb3::empty());
        for i in (0..NUM_BUCKETS).rev() {
            acc.0 += counts[i];
            acc.1.include_aabb(&boxes[i]);
            right[i] = acc;
        }

        let mut left = (0usize, Aabb3::empty());
        for split in 1..NUM_BUCKETS {
            left.0 += counts[split - 1];
            left.1.include_aabb(&boxes[split - 1]);
            let (right_count, right_box) = right[split];
            if left.0 == 0 || right_count == 0 {
                continue;
            }

            let cost = TRAVERSAL_COST
                + (left.1.surface_area() * left.0 as f64
                    + right_box.surface_area() * right_count as f64)
                    / total_area;
            if cost < best.0 {
                let pos = origin + extent[axis] * split as f64 / NUM_BUCKETS as f64;
                best = (cost, axis, pos);
            }
        }
    }

    (best.1, best.2)
}

/// Move faces with centroid below `pos` to the front; returns the split index.
fn partition_faces(face_data: &mut [FaceData], axis: usize, pos: f64) -> usize {
    let mut split = 0;
    for i in 0..face_data.len() {
        if face_data[i].2[axis] < pos {
            face_data.swap(split, i);
            split += 1;
        }
    }
    split
}

#[cfg(test)]
mod tests {
    use super::*;
    use skullmap_math::Vec3;
    use skullmap_mesh::primitives::{make_box, make_hollow_box};

    fn cube() -> TriangleMesh {
        make_box(Point3::new(0.0, 0.0, 0.0), Point3::new(10.0, 10.0, 10.0))
    }

    /// A 20x20 grid of small boxes, enough faces to force internal nodes.
    fn box_field() -> TriangleMesh {
        let mut mesh = TriangleMesh::new();
        for i in 0..20 {
            for j in 0..20 {
                let min = Point3::new(i as f64 * 2.0, j as f64 * 2.0, 0.0);
                let b = make_box(min, min + Vec3::new(1.0, 1.0, 1.0 + (i + j) as f64 * 0.1));
                let offset = mesh.points.len() as u32;
                mesh.points.extend(b.points);
                mesh.faces
                    .extend(b.faces.iter().map(|f| [f[0] + offset, f[1] + offset, f[2] + offset]));
            }
        }
        mesh
    }

    fn count_leaf_faces(node: &BvhNode) -> usize {
        match node {
            BvhNode::Leaf { faces, .. } => faces.len(),
            BvhNode::Internal { left, right, .. } => count_leaf_faces(left) + count_leaf_faces(right),
        }
    }

    #[test]
    fn test_bvh_build() {
        let bvh = Bvh::build(&cube());
        assert!(bvh.root().is_some());
        assert_eq!(bvh.num_faces(), 12);
        assert_eq!(count_leaf_faces(bvh.root().unwrap()), 12);
    }

    #[test]
    fn test_bvh_empty_mesh() {
        let bvh = Bvh::build(&TriangleMesh::new());
        assert!(bvh.root().is_none());
        assert!(bvh.bounds().is_empty());
        let ray = Ray::new(Point3::origin(), Vec3::new(1.0, 0.0, 0.0));
        assert!(bvh.trace(&ray, f64::INFINITY).is_empty());
    }

    #[test]
    #[should_panic]
    fn test_bvh_build_panics_on_bad_index() {
        let mut mesh = cube();
        mesh.faces.push([0, 1, 99]);
        assert!(mesh.validate().is_err());
        Bvh::build(&mesh);
    }

    #[test]
    fn test_bvh_trace_cube() {
        let bvh = Bvh::build(&cube());
        let ray = Ray::new(Point3::new(5.0, 4.0, -5.0), Vec3::new(0.0, 0.0, 1.0));

        let hits = bvh.trace(&ray, f64::INFINITY);
        assert_eq!(hits.len(), 2);
        assert!((hits[0].point.z - 0.0).abs() < 1e-8);
        assert!((hits[1].point.z - 10.0).abs() < 1e-8);
    }

    #[test]
    fn test_bvh_trace_respects_t_max() {
        let bvh = Bvh::build(&cube());
        let ray = Ray::new(Point3::new(5.0, 4.0, -5.0), Vec3::new(0.0, 0.0, 1.0));
        let hits = bvh.trace(&ray, 10.0);
        assert_eq!(hits.len(), 1);
        assert!(bvh.trace(&ray, 4.0).is_empty());
    }

    #[test]
    fn test_bvh_trace_miss() {
        let bvh = Bvh::build(&cube());
        let ray = Ray::new(Point3::new(50.0, 50.0, -5.0), Vec3::new(0.0, 0.0, 1.0));
        assert!(bvh.trace(&ray, f64::INFINITY).is_empty());
    }

    #[test]
    fn test_bvh_trace_closest() {
        let bvh = Bvh::build(&cube());
        let ray = Ray::new(Point3::new(5.0, 4.0, -5.0), Vec3::new(0.0, 0.0, 1.0));
        let closest = bvh.trace_closest(&ray, f64::INFINITY).unwrap();
        assert!((closest.point.z - 0.0).abs() < 1e-8);
        assert!((closest.t - 5.0).abs() < 1e-8);
    }

    #[test]
    fn test_bvh_hollow_box_four_crossings() {
        let mesh = make_hollow_box(
            (Point3::new(0.0, 0.0, 0.0), Point3::new(4.0, 4.0, 4.0)),
            (Point3::new(1.0, 1.0, 1.0), Point3::new(3.0, 3.0, 3.0)),
        );
        let bvh = Bvh::build(&mesh);
        let ray = Ray::new(Point3::new(-1.0, 2.2, 1.7), Vec3::new(1.0, 0.0, 0.0));
        let xs: Vec<f64> = bvh.trace(&ray, f64::INFINITY).iter().map(|h| h.point.x).collect();
        assert_eq!(xs.len(), 4);
        for (x, expected) in xs.iter().zip([0.0, 1.0, 3.0, 4.0]) {
            assert!((x - expected).abs() < 1e-8);
        }
    }

    #[test]
    fn test_bvh_many_faces_matches_brute_force() {
        let mesh = box_field();
        let bvh = Bvh::build(&mesh);
        assert!(matches!(bvh.root(), Some(BvhNode::Internal { .. })));
        assert_eq!(count_leaf_faces(bvh.root().unwrap()), mesh.num_faces());

        for (x, y) in [(0.5, 0.5), (12.3, 20.7), (38.6, 38.2), (7.0, 7.0)] {
            let ray = Ray::new(Point3::new(x, y, 20.0), Vec3::new(0.0, 0.0, -1.0));
            let fast = bvh.trace(&ray, f64::INFINITY);
            let brute: Vec<f64> = {
                let mut ts: Vec<f64> = mesh
                    .triangles()
                    .filter_map(|t| intersect_triangle(&ray, &t))
                    .collect();
                ts.sort_by(f64::total_cmp);
                ts
            };
            assert_eq!(fast.len(), brute.len());
            for (h, t) in fast.iter().zip(brute) {
                assert!((h.t - t).abs() < 1e-12);
            }
            let closest = bvh.trace_closest(&ray, f64::INFINITY).map(|h| h.t);
            assert_eq!(closest, fast.first().map(|h| h.t));
        }
    }
}
