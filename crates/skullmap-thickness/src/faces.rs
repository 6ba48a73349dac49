//! Selection of the original mesh faces that form the top layer.

use std::collections::BTreeSet;

use rayon::prelude::*;
use skullmap_mesh::TriangleMesh;
use skullmap_raytrace::SpatialIndex;
use tracing::info;

use crate::error::Result;
use crate::grid::RainfallGrid;
use crate::params::{GridDimensions, ThicknessParams};

/// Band on the first hit's x coordinate used for face selection.
pub const TOP_FACE_BAND: [f64; 2] = [-50.0, -10.0];

/// Faces first hit by the rainfall grid with the hit inside `band`.
///
/// Uses the grid layout and spacing of `params`; its acceptance band is
/// ignored in favour of `band`. Returned ids are sorted and unique.
pub fn select_top_faces<I>(
    index: &I,
    dims: &GridDimensions,
    params: &ThicknessParams,
    band: [f64; 2],
) -> Result<Vec<usize>>
where
    I: SpatialIndex + Sync + ?Sized,
{
    let params = params.clone().acceptance_band(band[0], band[1]);
    params.validate()?;
    dims.validate()?;

    let grid = RainfallGrid::new(dims, params.precision)?;
    let faces: BTreeSet<usize> = (0..grid.len())
        .into_par_iter()
        .filter_map(|k| {
            let (start, end) = grid.ray(k / grid.columns, k % grid.columns);
            index
                .first_intersection(&start, &end)
                .filter(|hit| params.accepts(hit.point.x))
                .map(|hit| hit.face)
        })
        .collect();

    info!(rays = grid.len(), faces = faces.len(), "selected top faces");
    Ok(faces.into_iter().collect())
}

/// Grow a face selection by every face sharing a vertex with it.
///
/// Ids outside the mesh are dropped. The result is sorted and unique.
pub fn inflate_faces(mesh: &TriangleMesh, faces: &[usize]) -> Vec<usize> {
    let neighbors = mesh.face_neighbors();
    let mut grown = BTreeSet::new();
    for &face in faces {
        if let Some(ring) = neighbors.get(face) {
            grown.insert(face);
            grown.extend(ring.iter().copied());
        }
    }
    grown.into_iter().collect()
}
