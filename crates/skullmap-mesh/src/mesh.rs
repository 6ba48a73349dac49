//! Indexed triangle surface meshes.

use std::collections::{BTreeSet, HashMap};

use skullmap_math::{Aabb3, Point3, Vec3};

use crate::error::{MeshError, Result};

/// A triangle with resolved vertex positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    /// First vertex.
    pub v0: Point3,
    /// Second vertex.
    pub v1: Point3,
    /// Third vertex.
    pub v2: Point3,
}

impl Triangle {
    /// Create a triangle from three vertices.
    pub fn new(v0: Point3, v1: Point3, v2: Point3) -> Self {
        Self { v0, v1, v2 }
    }

    /// Bounding box of the three vertices.
    pub fn aabb(&self) -> Aabb3 {
        Aabb3::from_points([&self.v0, &self.v1, &self.v2])
    }

    /// Centroid of the triangle.
    pub fn centroid(&self) -> Point3 {
        Point3::from((self.v0.coords + self.v1.coords + self.v2.coords) / 3.0)
    }

    /// Unit normal following the winding order, or `None` if degenerate.
    pub fn normal(&self) -> Option<Vec3> {
        let n = (self.v1 - self.v0).cross(&(self.v2 - self.v0));
        let len = n.norm();
        if len > 1e-12 {
            Some(n / len)
        } else {
            None
        }
    }

    /// Triangle area.
    pub fn area(&self) -> f64 {
        0.5 * (self.v1 - self.v0).cross(&(self.v2 - self.v0)).norm()
    }
}

/// An indexed triangle surface: points plus faces referencing three points each.
///
/// The mesh carries no topology beyond point/face incidence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriangleMesh {
    /// Point coordinates.
    pub points: Vec<Point3>,
    /// Triangular faces as point indices.
    pub faces: Vec<[u32; 3]>,
}

impl TriangleMesh {
    /// Create an empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty mesh with reserved capacity.
    pub fn with_capacity(points: usize, faces: usize) -> Self {
        Self {
            points: Vec::with_capacity(points),
            faces: Vec::with_capacity(faces),
        }
    }

    /// Create a mesh from points and faces.
    pub fn from_parts(points: Vec<Point3>, faces: Vec<[u32; 3]>) -> Self {
        Self { points, faces }
    }

    /// Number of points.
    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    /// Number of triangles.
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// Resolve face `i` into its three vertex positions.
    ///
    /// Panics if `i` or one of its indices is out of range; call
    /// [`validate`](Self::validate) first on untrusted input.
    pub fn triangle(&self, i: usize) -> Triangle {
        let [a, b, c] = self.faces[i];
        Triangle::new(
            self.points[a as usize],
            self.points[b as usize],
            self.points[c as usize],
        )
    }

    /// Iterate over all faces as triangles.
    pub fn triangles(&self) -> impl Iterator<Item = Triangle> + '_ {
        (0..self.faces.len()).map(move |i| self.triangle(i))
    }

    /// Bounding box of all points.
    pub fn bounds(&self) -> Aabb3 {
        Aabb3::from_points(&self.points)
    }

    /// Check that the mesh has faces and every face index is in range.
    pub fn validate(&self) -> Result<()> {
        if self.faces.is_empty() {
            return Err(MeshError::EmptyMesh("mesh has no faces".into()));
        }
        let num_points = self.points.len();
        for (face, indices) in self.faces.iter().enumerate() {
            for &index in indices {
                if index as usize >= num_points {
                    return Err(MeshError::InvalidIndex {
                        face,
                        index,
                        num_points,
                    });
                }
            }
        }
        Ok(())
    }

    /// For every face, the faces that share at least one vertex with it.
    ///
    /// The face itself is not included. Neighbour lists are sorted.
    pub fn face_neighbors(&self) -> Vec<Vec<usize>> {
        let mut point_faces: Vec<Vec<usize>> = vec![Vec::new(); self.points.len()];
        for (face_idx, face) in self.faces.iter().enumerate() {
            for &v in face {
                if let Some(list) = point_faces.get_mut(v as usize) {
                    list.push(face_idx);
                }
            }
        }

        self.faces
            .iter()
            .enumerate()
            .map(|(face_idx, face)| {
                let mut set = BTreeSet::new();
                for &v in face {
                    if let Some(list) = point_faces.get(v as usize) {
                        set.extend(list.iter().copied().filter(|&f| f != face_idx));
                    }
                }
                set.into_iter().collect()
            })
            .collect()
    }

    /// Build a new mesh containing only the given faces.
    ///
    /// Points are compacted and renumbered in first-use order.
    pub fn extract_faces(&self, face_ids: &[usize]) -> TriangleMesh {
        let mut remap: HashMap<u32, u32> = HashMap::new();
        let mut out = TriangleMesh::with_capacity(face_ids.len() * 3, face_ids.len());

        for &face_id in face_ids {
            let Some(face) = self.faces.get(face_id) else {
                continue;
            };
            let mut new_face = [0u32; 3];
            for (slot, &v) in new_face.iter_mut().zip(face.iter()) {
                *slot = *remap.entry(v).or_insert_with(|| {
                    out.points.push(self.points[v as usize]);
                    (out.points.len() - 1) as u32
                });
            }
            out.faces.push(new_face);
        }

        out
    }
}
