#![warn(missing_docs)]

//! Skull thickness mapping by ray casting.
//!
//! Two passes run over a closed bone surface:
//!
//! 1. **Rainfall extraction** ([`extract_top_surface`]): a grid of rays fired
//!    along +x keeps the first hit of each ray inside an acceptance band,
//!    fits a normal over each complete 2x2 neighbourhood of hits and keeps the
//!    quads facing the reference direction.
//! 2. **Thickness casting** ([`cast_thickness`]): every hit point with a
//!    normal is cast through along that normal. The first-to-last crossing
//!    distance gives the thickness, the first-to-second the distance to the
//!    first void.
//!
//! [`map_thickness`] runs both and summarizes the result.
//!
//! # Example
//!
//! ```
//! use skullmap_math::Point3;
//! use skullmap_mesh::primitives::make_box;
//! use skullmap_thickness::{map_thickness, GridDimensions, Silent, ThicknessParams};
//!
//! // A 1.5 unit thick plate facing -x.
//! let mesh = make_box(Point3::new(-3.0, -4.1, -4.3), Point3::new(-1.5, 4.1, 4.2));
//! let params = ThicknessParams::default().precision(0.5);
//! let result = map_thickness(&mesh, &GridDimensions::new(6, 6, 6), &params, &Silent)?;
//!
//! assert!(result.summary.measured > 0);
//! let max = result.summary.max_thickness.unwrap();
//! assert!((max - 30.0).abs() < 1e-6);
//! # Ok::<(), skullmap_thickness::ThicknessError>(())
//! ```

mod cast;
mod error;
mod extract;
mod faces;
mod grid;
mod hit_point;
mod params;
mod progress;
mod result;

pub use cast::{
    cast_thickness, cast_with_index, measure_hit_point, MapField, Measurement, ThicknessMaps,
    THICKNESS_FIELD, VOID_FIELD,
};
pub use error::{Result, ThicknessError};
pub use extract::{cast_rainfall, extract_top_surface, extract_with_index, form_quads, TopSurface};
pub use faces::{inflate_faces, select_top_faces, TOP_FACE_BAND};
pub use grid::{RainfallGrid, MAX_RAYS};
pub use hit_point::{HitPoint, HitPointMatrix};
pub use params::{GridDimensions, ThicknessParams};
pub use progress::{Silent, StatusObserver};
pub use result::{ThicknessMap, ThicknessSummary};

use skullmap_mesh::TriangleMesh;
use skullmap_raytrace::Bvh;
use tracing::debug;

/// Check a mesh is usable and build a BVH over all of its faces.
pub fn build_index<O>(mesh: &TriangleMesh, observer: &O) -> Result<Bvh>
where
    O: StatusObserver + ?Sized,
{
    if mesh.num_faces() == 0 {
        return Err(ThicknessError::EmptyMesh);
    }
    mesh.validate()?;

    observer.status(Some("Building intersection object tree..."), None);
    let bvh = Bvh::build(mesh);
    let bounds = bvh.bounds();
    debug!(
        faces = bvh.num_faces(),
        "index bounds: [{:.2}, {:.2}, {:.2}] to [{:.2}, {:.2}, {:.2}]",
        bounds.min.x,
        bounds.min.y,
        bounds.min.z,
        bounds.max.x,
        bounds.max.y,
        bounds.max.z
    );
    Ok(bvh)
}

/// Extract the top surface of `mesh` and measure its thickness.
///
/// Parameters, dimensions and the rainfall grid size are validated before any
/// ray is cast. One index over the original mesh serves both passes; the
/// result equals running [`extract_top_surface`] and [`cast_thickness`] with
/// their own indices.
pub fn map_thickness<O>(
    mesh: &TriangleMesh,
    dims: &GridDimensions,
    params: &ThicknessParams,
    observer: &O,
) -> Result<ThicknessMap>
where
    O: StatusObserver + ?Sized,
{
    params.validate()?;
    dims.validate()?;
    RainfallGrid::new(dims, params.precision)?;

    let index = build_index(mesh, observer)?;
    let mut surface = extract_with_index(&index, dims, params, observer)?;
    let maps = cast_with_index(&index, &mut surface, dims, params, observer)?;
    let summary = ThicknessSummary::new(&surface, &maps);

    Ok(ThicknessMap {
        surface,
        maps,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use skullmap_math::Point3;
    use skullmap_mesh::primitives::make_box;

    #[test]
    fn test_map_thickness_rejects_oversized_grid() {
        let mesh = make_box(Point3::new(-2.0, -1.0, -1.0), Point3::new(-1.0, 1.0, 1.0));
        let params = ThicknessParams::default().precision(1e-300);
        assert!(params.validate().is_ok());

        let calls = std::cell::Cell::new(0);
        let observer = |_: Option<&str>, _: Option<u32>| calls.set(calls.get() + 1);
        let err = map_thickness(&mesh, &GridDimensions::new(4, 2, 2), &params, &observer)
            .unwrap_err();
        assert!(matches!(err, ThicknessError::InvalidParams(_)));
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_build_index_rejects_empty() {
        let err = build_index(&TriangleMesh::new(), &Silent).unwrap_err();
        assert!(matches!(err, ThicknessError::EmptyMesh));
    }

    #[test]
    fn test_build_index_rejects_bad_indices() {
        let mesh = TriangleMesh::from_parts(vec![Point3::origin(); 3], vec![[0, 1, 7]]);
        let err = build_index(&mesh, &Silent).unwrap_err();
        assert!(matches!(err, ThicknessError::Mesh(_)));
    }

    #[test]
    fn test_map_thickness_rejects_zero_dims() {
        let mesh = make_box(Point3::new(-2.0, -1.0, -1.0), Point3::new(-1.0, 1.0, 1.0));
        let err = map_thickness(
            &mesh,
            &GridDimensions::new(4, 0, 2),
            &ThicknessParams::default(),
            &Silent,
        )
        .unwrap_err();
        assert!(matches!(err, ThicknessError::InvalidDimensions(_)));
    }
}
