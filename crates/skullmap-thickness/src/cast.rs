//! Thickness measurement along fitted normals.

use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use skullmap_mesh::{ScalarField, TriangleMesh};
use skullmap_raytrace::SpatialIndex;
use tracing::{debug, info};

use crate::error::{Result, ThicknessError};
use crate::extract::TopSurface;
use crate::hit_point::HitPoint;
use crate::params::{GridDimensions, ThicknessParams};
use crate::progress::{percent, StatusObserver};

/// Name of the thickness point field.
pub const THICKNESS_FIELD: &str = "Thickness";

/// Name of the distance-to-first-void point field.
pub const VOID_FIELD: &str = "Distance to first air cell";

/// Which map is displayed on the surface mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapField {
    /// Full material thickness.
    #[default]
    Thickness,
    /// Distance from the outer surface to the first inner crossing.
    DistanceToFirstVoid,
}

impl MapField {
    /// Point field name on the surface mesh.
    pub fn field_name(self) -> &'static str {
        match self {
            MapField::Thickness => THICKNESS_FIELD,
            MapField::DistanceToFirstVoid => VOID_FIELD,
        }
    }
}

/// Scaled distances measured at one hit point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    /// Scaled distance from the first to the last crossing.
    pub thickness: f64,
    /// Scaled distance from the first to the second crossing.
    pub distance_to_first_void: f64,
    /// Distinct surface crossings along the cast.
    pub crossings: usize,
}

/// Cast through a hit point along its normal, `stretch` either side.
///
/// Returns `None` when the cast crosses the surface fewer than twice. A hit
/// point without a normal makes a zero-length cast and always returns `None`.
pub fn measure_hit_point<I>(
    index: &I,
    hit: &HitPoint,
    stretch: f64,
    scale: f64,
) -> Option<Measurement>
where
    I: SpatialIndex + ?Sized,
{
    let offset = hit.normal * stretch;
    let start = hit.position + offset;
    let end = hit.position - offset;

    let hits = index.all_intersections(&start, &end);
    let [first, second, ..] = hits.as_slice() else {
        return None;
    };
    let last = hits.last()?;

    Some(Measurement {
        thickness: scale * (last.point - first.point).norm(),
        distance_to_first_void: scale * (second.point - first.point).norm(),
        crossings: hits.len(),
    })
}

/// Per-point thickness maps over a top surface.
///
/// Unmeasured entries hold 0 and are marked in `measured`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ThicknessMaps {
    /// Thickness per surface point.
    pub thickness: Vec<f64>,
    /// Distance to the first void per surface point.
    pub distance_to_first_void: Vec<f64>,
    /// Whether each point received a measurement.
    pub measured: Vec<bool>,
    /// Hit points a cast was attempted for.
    pub attempted: usize,
}

impl ThicknessMaps {
    /// Zeroed maps for `len` points.
    pub fn new(len: usize) -> Self {
        Self {
            thickness: vec![0.0; len],
            distance_to_first_void: vec![0.0; len],
            measured: vec![false; len],
            attempted: 0,
        }
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.thickness.len()
    }

    /// Whether the maps cover no points.
    pub fn is_empty(&self) -> bool {
        self.thickness.is_empty()
    }

    /// Number of measured points.
    pub fn measured_count(&self) -> usize {
        self.measured.iter().filter(|&&m| m).count()
    }

    fn record(&mut self, id: usize, m: Measurement) {
        self.thickness[id] = m.thickness;
        self.distance_to_first_void[id] = m.distance_to_first_void;
        self.measured[id] = true;
    }
}

/// Measure every hit point of a surface against an existing index.
///
/// Both maps are attached to `surface.mesh` as [`THICKNESS_FIELD`] and
/// [`VOID_FIELD`], with thickness active.
pub fn cast_with_index<I, O>(
    index: &I,
    surface: &mut TopSurface,
    dims: &GridDimensions,
    params: &ThicknessParams,
    observer: &O,
) -> Result<ThicknessMaps>
where
    I: SpatialIndex + Sync + ?Sized,
    O: StatusObserver + ?Sized,
{
    params.validate()?;
    dims.validate()?;

    let num_points = surface.num_points();
    if let Some(bad) = surface
        .hit_points
        .iter()
        .find(|h| h.id as usize >= num_points)
    {
        return Err(ThicknessError::InvalidSurface(format!(
            "hit point id {} outside mesh with {} points",
            bad.id, num_points
        )));
    }

    let stretch = f64::from(dims.depth);
    let targets: Vec<HitPoint> = surface
        .hit_points
        .iter()
        .filter(|h| !params.skip_unfitted || h.has_normal())
        .copied()
        .collect();
    debug!(
        targets = targets.len(),
        skipped = surface.hit_points.len() - targets.len(),
        "thickness targets"
    );

    observer.status(Some("Calculating thickness..."), Some(0));
    let start = Instant::now();

    let mut maps = ThicknessMaps::new(num_points);
    maps.attempted = targets.len();
    let mut done = 0;
    for chunk in targets.chunks(params.progress_stride) {
        let results: Vec<Option<Measurement>> = chunk
            .par_iter()
            .map(|hit| measure_hit_point(index, hit, stretch, params.scale))
            .collect();
        for (hit, result) in chunk.iter().zip(results) {
            if let Some(m) = result {
                maps.record(hit.id as usize, m);
            }
        }
        done += chunk.len();
        observer.status(None, Some(percent(done, targets.len())));
    }

    surface
        .mesh
        .add_scalars(ScalarField::new(THICKNESS_FIELD, maps.thickness.clone()))?;
    surface.mesh.add_scalars(ScalarField::new(
        VOID_FIELD,
        maps.distance_to_first_void.clone(),
    ))?;
    surface.mesh.set_active_scalars(THICKNESS_FIELD)?;

    let elapsed = start.elapsed().as_secs_f64();
    info!(
        measured = maps.measured_count(),
        attempted = maps.attempted,
        "thickness calculated in {:.1}s",
        elapsed
    );
    observer.status(
        Some(&format!("Finished thickness calculation in {elapsed:.1}s")),
        Some(100),
    );
    Ok(maps)
}

/// Measure every hit point of a surface, building a fresh index over the
/// original mesh.
pub fn cast_thickness<O>(
    mesh: &TriangleMesh,
    surface: &mut TopSurface,
    dims: &GridDimensions,
    params: &ThicknessParams,
    observer: &O,
) -> Result<ThicknessMaps>
where
    O: StatusObserver + ?Sized,
{
    params.validate()?;
    dims.validate()?;
    let index = crate::build_index(mesh, observer)?;
    cast_with_index(&index, surface, dims, params, observer)
}
