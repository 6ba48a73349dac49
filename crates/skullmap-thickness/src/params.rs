//! Sampling grid and mapping parameters.

use serde::{Deserialize, Serialize};
use skullmap_math::{Aabb3, Vec3};

use crate::error::{Result, ThicknessError};

/// Voxel-grid extent of the volume a mesh was segmented from.
///
/// `depth` is the ray axis (x): rainfall rays run from `-depth` to `depth`,
/// and thickness rays reach `depth` either side of the surface. `width` (y)
/// and `height` (z) are the sampled extents, centred on the origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridDimensions {
    /// Extent along the ray axis.
    pub depth: u32,
    /// Extent along y.
    pub width: u32,
    /// Extent along z.
    pub height: u32,
}

impl GridDimensions {
    /// Create grid dimensions.
    pub const fn new(depth: u32, width: u32, height: u32) -> Self {
        Self {
            depth,
            width,
            height,
        }
    }

    /// Dimensions from a `[depth, width, height]` triple.
    pub const fn from_array(dims: [u32; 3]) -> Self {
        Self::new(dims[0], dims[1], dims[2])
    }

    /// Smallest origin-centred grid whose rays cover `bounds`, plus one unit
    /// of margin per axis.
    ///
    /// Used when a mesh arrives without the volume it came from.
    pub fn enclosing(bounds: &Aabb3) -> Self {
        let reach = |lo: f64, hi: f64| lo.abs().max(hi.abs());
        let extent = |v: f64| {
            if v.is_finite() {
                (v.ceil() as u32).saturating_add(1)
            } else {
                1
            }
        };
        if bounds.is_empty() {
            return Self::new(1, 1, 1);
        }
        Self::new(
            extent(reach(bounds.min.x, bounds.max.x)),
            extent(2.0 * reach(bounds.min.y, bounds.max.y)),
            extent(2.0 * reach(bounds.min.z, bounds.max.z)),
        )
    }

    /// Check every extent is positive.
    pub fn validate(&self) -> Result<()> {
        if self.depth == 0 || self.width == 0 || self.height == 0 {
            return Err(ThicknessError::InvalidDimensions(format!(
                "all of depth, width and height must be positive, got {}x{}x{}",
                self.depth, self.width, self.height
            )));
        }
        Ok(())
    }
}

/// Thickness-mapping parameters.
///
/// # Example
///
/// ```
/// use skullmap_thickness::ThicknessParams;
///
/// let params = ThicknessParams::default().precision(0.5).grazing_angle(70.0);
/// assert!(params.validate().is_ok());
///
/// let toml = params.to_toml_string().unwrap();
/// let back = ThicknessParams::from_toml_str(&toml).unwrap();
/// assert_eq!(back, params);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThicknessParams {
    /// Spacing between neighbouring rainfall rays.
    pub precision: f64,
    /// Half-open `[low, high)` window on the first hit's x coordinate.
    pub acceptance_band: [f64; 2],
    /// Quads whose normal is this many degrees or more from the reference
    /// direction are dropped.
    pub grazing_angle: f64,
    /// Outward axis the fitted normals are compared against.
    pub reference_direction: [f64; 3],
    /// Distance each hit point is moved along -x off the surface.
    pub pull_back: f64,
    /// Factor from mesh units to reported thickness.
    pub scale: f64,
    /// Thickness casts between progress reports.
    pub progress_stride: usize,
    /// Leave hit points without a fitted normal out of the thickness pass.
    pub skip_unfitted: bool,
}

impl Default for ThicknessParams {
    fn default() -> Self {
        Self {
            precision: 1.0,
            acceptance_band: [-50.0, 20.0],
            grazing_angle: 80.0,
            reference_direction: [-1.0, 0.0, 0.0],
            pull_back: 0.3,
            scale: 20.0,
            progress_stride: 500,
            skip_unfitted: true,
        }
    }
}

impl ThicknessParams {
    /// Validate parameters.
    pub fn validate(&self) -> Result<()> {
        if !(self.precision.is_finite() && self.precision > 0.0) {
            return Err(ThicknessError::InvalidParams(format!(
                "precision must be positive, got {}",
                self.precision
            )));
        }
        let [low, high] = self.acceptance_band;
        if !(low.is_finite() && high.is_finite() && low < high) {
            return Err(ThicknessError::InvalidParams(format!(
                "acceptance_band must be an increasing finite pair, got [{low}, {high})"
            )));
        }
        if !(self.grazing_angle > 0.0 && self.grazing_angle <= 180.0) {
            return Err(ThicknessError::InvalidParams(format!(
                "grazing_angle must be in (0, 180] degrees, got {}",
                self.grazing_angle
            )));
        }
        let reference = self.reference_vector();
        if !reference.iter().all(|c| c.is_finite()) || reference.norm() == 0.0 {
            return Err(ThicknessError::InvalidParams(
                "reference_direction must be a finite non-zero vector".into(),
            ));
        }
        if !(self.pull_back.is_finite() && self.pull_back >= 0.0) {
            return Err(ThicknessError::InvalidParams(
                "pull_back must be finite and non-negative".into(),
            ));
        }
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(ThicknessError::InvalidParams(
                "scale must be positive".into(),
            ));
        }
        if self.progress_stride == 0 {
            return Err(ThicknessError::InvalidParams(
                "progress_stride must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Reference direction as a vector.
    pub fn reference_vector(&self) -> Vec3 {
        Vec3::from(self.reference_direction)
    }

    /// Whether `x` falls inside the acceptance band.
    pub fn accepts(&self, x: f64) -> bool {
        let [low, high] = self.acceptance_band;
        low <= x && x < high
    }

    /// Parse parameters from TOML. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let params: Self =
            toml::from_str(s).map_err(|e| ThicknessError::InvalidParams(e.to_string()))?;
        params.validate()?;
        Ok(params)
    }

    /// Serialize parameters as TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ThicknessError::InvalidParams(e.to_string()))
    }

    /// Set the ray spacing.
    #[must_use]
    pub fn precision(mut self, precision: f64) -> Self {
        self.precision = precision;
        self
    }

    /// Set the acceptance band `[low, high)`.
    #[must_use]
    pub fn acceptance_band(mut self, low: f64, high: f64) -> Self {
        self.acceptance_band = [low, high];
        self
    }

    /// Set the grazing angle in degrees.
    #[must_use]
    pub fn grazing_angle(mut self, degrees: f64) -> Self {
        self.grazing_angle = degrees;
        self
    }

    /// Set the reference direction.
    #[must_use]
    pub fn reference_direction(mut self, direction: [f64; 3]) -> Self {
        self.reference_direction = direction;
        self
    }

    /// Set the pull-back distance.
    #[must_use]
    pub fn pull_back(mut self, distance: f64) -> Self {
        self.pull_back = distance;
        self
    }

    /// Set the thickness scale factor.
    #[must_use]
    pub fn scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    /// Set the progress stride.
    #[must_use]
    pub fn progress_stride(mut self, stride: usize) -> Self {
        self.progress_stride = stride;
        self
    }

    /// Set whether unfitted hit points are skipped.
    #[must_use]
    pub fn skip_unfitted(mut self, skip: bool) -> Self {
        self.skip_unfitted = skip;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skullmap_math::Point3;

    #[test]
    fn test_default_params() {
        let params = ThicknessParams::default();
        assert!((params.precision - 1.0).abs() < f64::EPSILON);
        assert_eq!(params.acceptance_band, [-50.0, 20.0]);
        assert!((params.grazing_angle - 80.0).abs() < f64::EPSILON);
        assert!((params.pull_back - 0.3).abs() < f64::EPSILON);
        assert!((params.scale - 20.0).abs() < f64::EPSILON);
        assert_eq!(params.progress_stride, 500);
        assert!(params.skip_unfitted);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_band_is_half_open() {
        let params = ThicknessParams::default();
        assert!(params.accepts(-50.0));
        assert!(params.accepts(19.999));
        assert!(!params.accepts(20.0));
        assert!(!params.accepts(-50.001));
    }

    #[test]
    fn test_invalid_params() {
        let base = ThicknessParams::default();
        assert!(base.clone().precision(0.0).validate().is_err());
        assert!(base.clone().precision(-1.0).validate().is_err());
        assert!(base.clone().precision(f64::NAN).validate().is_err());
        assert!(base.clone().acceptance_band(5.0, 5.0).validate().is_err());
        assert!(base.clone().grazing_angle(0.0).validate().is_err());
        assert!(base.clone().reference_direction([0.0; 3]).validate().is_err());
        assert!(base.clone().pull_back(-0.1).validate().is_err());
        assert!(base.clone().scale(0.0).validate().is_err());
        assert!(base.progress_stride(0).validate().is_err());
    }

    #[test]
    fn test_toml_partial() {
        let params = ThicknessParams::from_toml_str(
            "precision = 0.5\nacceptance_band = [-80.0, 0.0]\n",
        )
        .unwrap();
        assert!((params.precision - 0.5).abs() < f64::EPSILON);
        assert_eq!(params.acceptance_band, [-80.0, 0.0]);
        assert!((params.scale - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_toml_rejects_invalid() {
        let err = ThicknessParams::from_toml_str("precision = -2.0").unwrap_err();
        assert!(matches!(err, ThicknessError::InvalidParams(_)));
        assert!(ThicknessParams::from_toml_str("precision = \"fine\"").is_err());
    }

    #[test]
    fn test_dimensions_validate() {
        assert!(GridDimensions::new(10, 10, 10).validate().is_ok());
        let err = GridDimensions::from_array([10, 0, 10]).validate().unwrap_err();
        assert!(matches!(err, ThicknessError::InvalidDimensions(_)));
    }

    #[test]
    fn test_dimensions_enclosing() {
        let bounds = Aabb3::new(Point3::new(-12.2, -3.0, -1.0), Point3::new(-4.0, 5.5, 2.0));
        let dims = GridDimensions::enclosing(&bounds);
        assert_eq!(dims, GridDimensions::new(14, 12, 5));
        assert_eq!(GridDimensions::enclosing(&Aabb3::empty()), GridDimensions::new(1, 1, 1));
    }
}
