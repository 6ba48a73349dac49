//! The regular grid of rainfall rays.

use skullmap_math::Point3;

use crate::error::{Result, ThicknessError};
use crate::params::GridDimensions;

/// Most rays one grid may hold; hit point ids are `u32`.
pub const MAX_RAYS: usize = u32::MAX as usize;

/// Ray layout over a [`GridDimensions`] at a given spacing.
///
/// Row `r` sits at `z = -height/2 + r * spacing`, column `c` at
/// `y = -width/2 + c * spacing`. Every ray spans `x` from `-depth` to `depth`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RainfallGrid {
    /// Number of rows (z samples).
    pub rows: usize,
    /// Number of columns (y samples).
    pub columns: usize,
    /// Ray start and end magnitude on x.
    pub depth: f64,
    /// Distance between neighbouring rays.
    pub spacing: f64,
    origin_y: f64,
    origin_z: f64,
}

impl RainfallGrid {
    /// Lay out `floor(extent / spacing)` rays along each sampled axis.
    ///
    /// `spacing` must be positive and finite. Fails with
    /// [`ThicknessError::InvalidParams`] when the grid would hold more than
    /// [`MAX_RAYS`] rays, since every ray may produce a hit point id.
    pub fn new(dims: &GridDimensions, spacing: f64) -> Result<Self> {
        if !(spacing.is_finite() && spacing > 0.0) {
            return Err(ThicknessError::InvalidParams(format!(
                "ray spacing must be positive and finite, got {spacing}"
            )));
        }
        let count = |extent: u32| {
            let n = (f64::from(extent) / spacing).floor();
            (n <= MAX_RAYS as f64).then_some(n as usize)
        };
        let too_dense = || {
            ThicknessError::InvalidParams(format!(
                "precision {spacing} over a {}x{} grid exceeds {MAX_RAYS} rays",
                dims.width, dims.height
            ))
        };

        let rows = count(dims.height).ok_or_else(too_dense)?;
        let columns = count(dims.width).ok_or_else(too_dense)?;
        match rows.checked_mul(columns) {
            Some(n) if n <= MAX_RAYS => {}
            _ => return Err(too_dense()),
        }

        Ok(Self {
            rows,
            columns,
            depth: f64::from(dims.depth),
            spacing,
            origin_y: -f64::from(dims.width) / 2.0,
            origin_z: -f64::from(dims.height) / 2.0,
        })
    }

    /// Total number of rays.
    pub fn len(&self) -> usize {
        self.rows * self.columns
    }

    /// Whether the grid has no rays.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Start and end of the ray at (`row`, `column`).
    pub fn ray(&self, row: usize, column: usize) -> (Point3, Point3) {
        let y = self.origin_y + column as f64 * self.spacing;
        let z = self.origin_z + row as f64 * self.spacing;
        (
            Point3::new(-self.depth, y, z),
            Point3::new(self.depth, y, z),
        )
    }
}
