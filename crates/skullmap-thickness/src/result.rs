//! Pipeline output and summary statistics.

use serde::Serialize;

use crate::cast::ThicknessMaps;
use crate::extract::TopSurface;

/// A top surface carrying its thickness maps.
#[derive(Debug, Clone)]
pub struct ThicknessMap {
    /// Extracted surface; its mesh carries both point fields.
    pub surface: TopSurface,
    /// Per-point maps.
    pub maps: ThicknessMaps,
    /// Statistics over the maps.
    pub summary: ThicknessSummary,
}

/// Statistics over a thickness map.
///
/// Thickness and void statistics cover measured points only and are `None`
/// when nothing was measured.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ThicknessSummary {
    /// Rainfall rays cast.
    pub rays_cast: usize,
    /// Points on the surface.
    pub points: usize,
    /// Accepted quads.
    pub quads: usize,
    /// Points with a fitted normal.
    pub fitted: usize,
    /// Points that received a measurement.
    pub measured: usize,
    /// Points never cast.
    pub skipped: usize,
    /// Smallest measured thickness.
    pub min_thickness: Option<f64>,
    /// Largest measured thickness.
    pub max_thickness: Option<f64>,
    /// Mean measured thickness.
    pub mean_thickness: Option<f64>,
    /// Mean measured distance to the first void.
    pub mean_distance_to_first_void: Option<f64>,
}

impl ThicknessSummary {
    /// Summarize a measured surface.
    pub fn new(surface: &TopSurface, maps: &ThicknessMaps) -> Self {
        let measured = |values: &[f64]| -> Vec<f64> {
            values
                .iter()
                .zip(&maps.measured)
                .filter(|(_, &m)| m)
                .map(|(&v, _)| v)
                .collect()
        };
        let thickness = measured(&maps.thickness);
        let void = measured(&maps.distance_to_first_void);

        Self {
            rays_cast: surface.rays_cast,
            points: surface.num_points(),
            quads: surface.num_quads(),
            fitted: surface.num_fitted(),
            measured: thickness.len(),
            skipped: surface.hit_points.len().saturating_sub(maps.attempted),
            min_thickness: thickness.iter().copied().reduce(f64::min),
            max_thickness: thickness.iter().copied().reduce(f64::max),
            mean_thickness: mean(&thickness),
            mean_distance_to_first_void: mean(&void),
        }
    }

    /// Percentage of surface points that were measured.
    #[allow(clippy::cast_precision_loss)]
    pub fn coverage_percent(&self) -> f64 {
        if self.points == 0 {
            0.0
        } else {
            100.0 * self.measured as f64 / self.points as f64
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map_or_else(|| "n/a".to_string(), |v| format!("{v:.3}"))
}

impl std::fmt::Display for ThicknessSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Skull Thickness Map:")?;
        writeln!(f, "  Rays cast: {}", self.rays_cast)?;
        writeln!(f, "  Surface points: {}", self.points)?;
        writeln!(f, "  Quads: {}", self.quads)?;
        writeln!(f, "  Fitted normals: {}", self.fitted)?;
        writeln!(f, "  Measured: {} ({:.1}%)", self.measured, self.coverage_percent())?;
        writeln!(f, "  Skipped: {}", self.skipped)?;
        writeln!(f, "  Min thickness: {}", fmt_opt(self.min_thickness))?;
        writeln!(f, "  Max thickness: {}", fmt_opt(self.max_thickness))?;
        writeln!(f, "  Mean thickness: {}", fmt_opt(self.mean_thickness))?;
        writeln!(
            f,
            "  Mean distance to first void: {}",
            fmt_opt(self.mean_distance_to_first_void)
        )?;
        Ok(())
    }
}
