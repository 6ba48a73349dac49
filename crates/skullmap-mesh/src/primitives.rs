//! Closed box meshes for tests, benches and demos.

use skullmap_math::Point3;

use crate::TriangleMesh;

/// Corner order: bit 0 selects x, bit 1 selects y, bit 2 selects z.
fn corners(min: Point3, max: Point3) -> [Point3; 8] {
    let mut out = [min; 8];
    for (i, c) in out.iter_mut().enumerate() {
        *c = Point3::new(
            if i & 1 == 0 { min.x } else { max.x },
            if i & 2 == 0 { min.y } else { max.y },
            if i & 4 == 0 { min.z } else { max.z },
        );
    }
    out
}

/// Outward-wound faces of a box over the corners from [`corners`], two
/// triangles per side, sides ordered -x, +x, -y, +y, -z, +z.
const BOX_FACES: [[u32; 3]; 12] = [
    [0, 4, 6],
    [0, 6, 2],
    [1, 3, 7],
    [1, 7, 5],
    [0, 1, 5],
    [0, 5, 4],
    [2, 6, 7],
    [2, 7, 3],
    [0, 2, 3],
    [0, 3, 1],
    [4, 5, 7],
    [4, 7, 6],
];

/// Make an axis-aligned box spanning `min` to `max`.
///
/// 8 points and 12 triangles, wound counter-clockwise seen from outside.
pub fn make_box(min: Point3, max: Point3) -> TriangleMesh {
    TriangleMesh::from_parts(corners(min, max).to_vec(), BOX_FACES.to_vec())
}

/// Make a box with a closed internal cavity.
///
/// The cavity faces are wound inward so every face normal points away from
/// material. `inner` must lie strictly inside `outer`.
pub fn make_hollow_box(outer: (Point3, Point3), inner: (Point3, Point3)) -> TriangleMesh {
    let mut mesh = make_box(outer.0, outer.1);
    mesh.points.extend(corners(inner.0, inner.1));
    for [a, b, c] in BOX_FACES {
        mesh.faces.push([a + 8, c + 8, b + 8]);
    }
    mesh
}
