//! Top-surface extraction by rainfall casting.
//!
//! A regular grid of rays is fired along +x. The first hit of each ray that
//! falls inside the acceptance band becomes a [`HitPoint`]. Complete 2x2
//! neighbourhoods of hit points become quads when the plane through three of
//! their corners faces the reference direction closely enough.

use std::time::Instant;

use rayon::prelude::*;
use skullmap_math::{angle_between_degrees, fit_plane_normal, Point3, Vec3};
use skullmap_mesh::{QuadMesh, TriangleMesh};
use skullmap_raytrace::SpatialIndex;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::grid::RainfallGrid;
use crate::hit_point::{HitPoint, HitPointMatrix};
use crate::params::{GridDimensions, ThicknessParams};
use crate::progress::{percent, StatusObserver};

/// The extracted top surface.
#[derive(Debug, Clone, PartialEq)]
pub struct TopSurface {
    /// Quad mesh whose point `i` is the hit point with id `i`.
    pub mesh: QuadMesh,
    /// All hit points, row by row, carrying their fitted normals.
    pub hit_points: Vec<HitPoint>,
    /// Grid rows cast.
    pub rows: usize,
    /// Grid columns cast.
    pub columns: usize,
    /// Total rays cast.
    pub rays_cast: usize,
}

impl TopSurface {
    /// Number of points in the surface mesh.
    pub fn num_points(&self) -> usize {
        self.mesh.num_points()
    }

    /// Number of accepted quads.
    pub fn num_quads(&self) -> usize {
        self.mesh.num_quads()
    }

    /// Number of hit points with a fitted normal.
    pub fn num_fitted(&self) -> usize {
        self.hit_points.iter().filter(|h| h.has_normal()).count()
    }
}

/// Cast the rainfall grid and collect accepted first hits.
///
/// Rows are visited from the last to the first and columns from the first to
/// the last; ids are handed out in that order. Each hit is moved
/// `pull_back` along -x. A ray whose first hit lies outside the acceptance
/// band leaves its cell empty even if a later hit would fall inside.
pub fn cast_rainfall<I, O>(
    index: &I,
    dims: &GridDimensions,
    params: &ThicknessParams,
    observer: &O,
) -> Result<HitPointMatrix>
where
    I: SpatialIndex + Sync + ?Sized,
    O: StatusObserver + ?Sized,
{
    params.validate()?;
    dims.validate()?;

    let grid = RainfallGrid::new(dims, params.precision)?;
    let mut matrix = HitPointMatrix::new(grid.rows, grid.columns);
    let pull_back = Vec3::x() * params.pull_back;

    info!(
        rows = grid.rows,
        columns = grid.columns,
        "casting {} rainfall rays",
        grid.len()
    );
    observer.status(
        Some(&format!("Casting {} rainfall rays...", grid.len())),
        Some(0),
    );

    let mut next_id: u32 = 0;
    for (done, row) in (0..grid.rows).rev().enumerate() {
        let hits: Vec<Option<Point3>> = (0..grid.columns)
            .into_par_iter()
            .map(|column| {
                let (start, end) = grid.ray(row, column);
                index
                    .first_intersection(&start, &end)
                    .map(|hit| hit.point)
                    .filter(|p| params.accepts(p.x))
            })
            .collect();

        for (column, hit) in hits.into_iter().enumerate() {
            if let Some(point) = hit {
                matrix.set(row, column, HitPoint::new(next_id, point - pull_back));
                next_id += 1;
            }
        }
        observer.status(None, Some(percent(done + 1, grid.rows)));
    }

    debug!(hits = matrix.count(), "rainfall cast complete");
    Ok(matrix)
}

/// Fit normals over every complete 2x2 neighbourhood and return the quads
/// that pass the grazing-angle test.
///
/// For cells `(i, j), (i+1, j), (i+1, j+1), (i, j+1)` the normal of the plane
/// through the first three is stored on `(i, j)` whether or not the quad is
/// accepted. A singular fit stores nothing and emits nothing.
pub fn form_quads(matrix: &mut HitPointMatrix, params: &ThicknessParams) -> Vec<[u32; 4]> {
    let reference = params.reference_vector();
    let mut quads = Vec::new();

    for i in 0..matrix.rows().saturating_sub(1) {
        for j in 0..matrix.columns().saturating_sub(1) {
            let corners = [(i, j), (i + 1, j), (i + 1, j + 1), (i, j + 1)]
                .map(|(r, c)| matrix.get(r, c).copied());
            let [Some(a), Some(b), Some(c), Some(d)] = corners else {
                continue;
            };
            let Some(normal) = fit_plane_normal(&a.position, &b.position, &c.position) else {
                continue;
            };

            if let Some(anchor) = matrix.get_mut(i, j) {
                anchor.normal = normal;
            }
            if angle_between_degrees(&normal, &reference) < params.grazing_angle {
                quads.push([a.id, b.id, c.id, d.id]);
            }
        }
    }

    quads
}

/// Extract the top surface using an existing spatial index.
pub fn extract_with_index<I, O>(
    index: &I,
    dims: &GridDimensions,
    params: &ThicknessParams,
    observer: &O,
) -> Result<TopSurface>
where
    I: SpatialIndex + Sync + ?Sized,
    O: StatusObserver + ?Sized,
{
    let start = Instant::now();
    let mut matrix = cast_rainfall(index, dims, params, observer)?;
    let quads = form_quads(&mut matrix, params);

    let mut mesh = QuadMesh::new();
    mesh.points = matrix.positions_by_id();
    mesh.quads = quads;
    let hit_points = matrix.flatten();

    if hit_points.is_empty() {
        warn!(
            band = ?params.acceptance_band,
            "no rainfall ray hit the mesh inside the acceptance band"
        );
    }

    let elapsed = start.elapsed().as_secs_f64();
    info!(
        points = mesh.num_points(),
        quads = mesh.num_quads(),
        "extracted top surface in {:.1}s",
        elapsed
    );
    observer.status(
        Some(&format!(
            "Done rainfall cast in {:.1}s, top layer has {} quads",
            elapsed,
            mesh.num_quads()
        )),
        Some(100),
    );

    Ok(TopSurface {
        mesh,
        hit_points,
        rows: matrix.rows(),
        columns: matrix.columns(),
        rays_cast: matrix.rows() * matrix.columns(),
    })
}

/// Extract the top surface of a mesh, building a spatial index over it.
pub fn extract_top_surface<O>(
    mesh: &TriangleMesh,
    dims: &GridDimensions,
    params: &ThicknessParams,
    observer: &O,
) -> Result<TopSurface>
where
    O: StatusObserver + ?Sized,
{
    params.validate()?;
    dims.validate()?;
    let index = crate::build_index(mesh, observer)?;
    extract_with_index(&index, dims, params, observer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ThicknessError;
    use crate::progress::Silent;
    use approx::assert_relative_eq;
    use skullmap_mesh::primitives::make_box;
    use skullmap_raytrace::Bvh;
    use std::cell::RefCell;

    fn skull_block() -> TriangleMesh {
        make_box(Point3::new(-2.0, -1.5, -1.3), Point3::new(-1.0, 1.5, 1.7))
    }

    fn dims() -> GridDimensions {
        GridDimensions::new(4, 2, 2)
    }

    fn params() -> ThicknessParams {
        ThicknessParams::default().precision(0.25)
    }

    fn patch(points: [Point3; 4]) -> HitPointMatrix {
        let mut m = HitPointMatrix::new(2, 2);
        for (id, ((r, c), p)) in [(0, 0), (1, 0), (1, 1), (0, 1)]
            .into_iter()
            .zip(points)
            .enumerate()
        {
            m.set(r, c, HitPoint::new(id as u32, p));
        }
        m
    }

    #[test]
    fn test_near_vertical_patch_rejected() {
        let mut m = patch([
            Point3::new(-2.0, 5.0, 0.0),
            Point3::new(-2.0, 5.0, 1.0),
            Point3::new(-1.0, 5.05, 1.0),
            Point3::new(-1.0, 5.05, 0.0),
        ]);
        let quads = form_quads(&mut m, &ThicknessParams::default());
        assert!(quads.is_empty());

        let anchor = m.get(0, 0).unwrap();
        assert!(anchor.has_normal());
        let angle = angle_between_degrees(&anchor.normal, &Vec3::new(-1.0, 0.0, 0.0));
        assert!(angle >= 80.0, "angle {angle}");
    }

    #[test]
    fn test_tilted_patch_accepted() {
        let mut m = patch([
            Point3::new(-2.0, 0.0, 0.0),
            Point3::new(-2.0, 0.0, 1.0),
            Point3::new(-2.2, 1.0, 1.0),
            Point3::new(-2.2, 1.0, 0.0),
        ]);
        let quads = form_quads(&mut m, &ThicknessParams::default());
        assert_eq!(quads, vec![[0, 1, 2, 3]]);

        let n = m.get(0, 0).unwrap().normal;
        assert_relative_eq!(n.norm(), 1.0, epsilon = 1e-12);
        assert!(angle_between_degrees(&n, &Vec3::new(-1.0, 0.0, 0.0)) < 80.0);
        assert!(!m.get(1, 1).unwrap().has_normal());
    }

    #[test]
    fn test_grazing_angle_is_configurable() {
        let points = [
            Point3::new(-2.0, 0.0, 0.0),
            Point3::new(-2.0, 0.0, 1.0),
            Point3::new(-2.2, 1.0, 1.0),
            Point3::new(-2.2, 1.0, 0.0),
        ];
        // The fitted normal is about 11.3 degrees off the reference.
        let mut m = patch(points);
        assert!(form_quads(&mut m, &ThicknessParams::default().grazing_angle(10.0)).is_empty());
        let mut m = patch(points);
        assert_eq!(form_quads(&mut m, &ThicknessParams::default().grazing_angle(12.0)).len(), 1);
    }

    #[test]
    fn test_incomplete_neighbourhood() {
        let mut m = HitPointMatrix::new(2, 2);
        m.set(0, 0, HitPoint::new(0, Point3::new(-2.0, 0.0, 0.0)));
        m.set(1, 0, HitPoint::new(1, Point3::new(-2.0, 0.0, 1.0)));
        m.set(1, 1, HitPoint::new(2, Point3::new(-2.0, 1.0, 1.0)));
        assert!(form_quads(&mut m, &ThicknessParams::default()).is_empty());
        assert!(!m.get(0, 0).unwrap().has_normal());
    }

    #[test]
    fn test_plane_through_origin_emits_nothing() {
        let mut m = patch([
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(0.0, 1.0, 1.0),
            Point3::new(0.0, 1.0, 0.0),
        ]);
        assert!(form_quads(&mut m, &ThicknessParams::default()).is_empty());
        assert!(!m.get(0, 0).unwrap().has_normal());
    }

    #[test]
    fn test_cast_rainfall_fills_footprint() {
        let bvh = Bvh::build(&skull_block());
        let m = cast_rainfall(&bvh, &dims(), &params(), &Silent).unwrap();
        assert_eq!((m.rows(), m.columns()), (8, 8));
        assert_eq!(m.count(), 64);

        // Ids follow the cast order: last row first.
        assert_eq!(m.get(7, 0).unwrap().id, 0);
        assert_eq!(m.get(7, 7).unwrap().id, 7);
        assert_eq!(m.get(0, 0).unwrap().id, 56);

        let hit = m.get(3, 5).unwrap();
        assert_relative_eq!(hit.position.x, -2.3, epsilon = 1e-9);
        assert_relative_eq!(hit.position.y, 0.25, epsilon = 1e-12);
        assert_relative_eq!(hit.position.z, -0.25, epsilon = 1e-12);
    }

    #[test]
    fn test_first_hit_outside_band_is_dropped() {
        let bvh = Bvh::build(&skull_block());
        let p = params().acceptance_band(-1.5, 20.0);
        let m = cast_rainfall(&bvh, &dims(), &p, &Silent).unwrap();
        assert_eq!(m.count(), 0);
    }

    #[test]
    fn test_extract_top_surface() {
        let surface = extract_top_surface(&skull_block(), &dims(), &params(), &Silent).unwrap();
        assert_eq!(surface.num_points(), 64);
        assert_eq!(surface.hit_points.len(), 64);
        assert_eq!(surface.num_quads(), 49);
        assert_eq!(surface.num_fitted(), 49);
        assert_eq!(surface.rays_cast, 64);

        for hit in &surface.hit_points {
            assert_eq!(surface.mesh.points[hit.id as usize], hit.position);
            if hit.has_normal() {
                assert_relative_eq!(hit.normal.x, -1.0, epsilon = 1e-9);
            }
        }
        for quad in &surface.mesh.quads {
            assert!(quad.iter().all(|&id| (id as usize) < surface.num_points()));
        }
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let mesh = skull_block();
        let a = extract_top_surface(&mesh, &dims(), &params(), &Silent).unwrap();
        let b = extract_top_surface(&mesh, &dims(), &params(), &Silent).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_extract_rejects_empty_mesh() {
        let err = extract_top_surface(&TriangleMesh::new(), &dims(), &params(), &Silent)
            .unwrap_err();
        assert!(matches!(err, ThicknessError::EmptyMesh));
    }

    #[test]
    fn test_extract_rejects_bad_precision_before_casting() {
        let calls = RefCell::new(0);
        let observer = |_: Option<&str>, _: Option<u32>| *calls.borrow_mut() += 1;
        let err = extract_top_surface(&skull_block(), &dims(), &params().precision(0.0), &observer)
            .unwrap_err();
        assert!(matches!(err, ThicknessError::InvalidParams(_)));
        assert_eq!(*calls.borrow(), 0);
    }

    #[test]
    fn test_progress_reported_per_row() {
        let reports = RefCell::new(Vec::new());
        let observer = |m: Option<&str>, p: Option<u32>| {
            reports.borrow_mut().push((m.map(String::from), p));
        };
        let bvh = Bvh::build(&skull_block());
        extract_with_index(&bvh, &dims(), &params(), &observer).unwrap();

        let reports = reports.into_inner();
        let row_reports = reports.iter().filter(|(m, _)| m.is_none()).count();
        assert_eq!(row_reports, 8);
        assert!(reports[0].0.as_deref().unwrap().contains("64 rainfall rays"));
        let last = reports.last().unwrap();
        assert!(last.0.as_deref().unwrap().contains("49 quads"));
        assert_eq!(last.1, Some(100));
    }
}
