//! Quadrilateral output meshes with per-point scalar fields.

use skullmap_math::{Aabb3, Point3};

use crate::error::{MeshError, Result};

/// A named per-point scalar array.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarField {
    /// Field name, as shown to the consumer.
    pub name: String,
    /// One value per mesh point.
    pub values: Vec<f64>,
}

impl ScalarField {
    /// Create a named field.
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Smallest and largest finite value, if any.
    pub fn range(&self) -> Option<(f64, f64)> {
        self.values
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

/// A polygon mesh of 4-vertex cells carrying per-point scalar data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuadMesh {
    /// Point coordinates.
    pub points: Vec<Point3>,
    /// Quad cells as point indices.
    pub quads: Vec<[u32; 4]>,
    /// Attached per-point scalar fields.
    pub point_data: Vec<ScalarField>,
    /// Name of the field selected for display.
    pub active_scalars: Option<String>,
}

impl QuadMesh {
    /// Create an empty quad mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of points.
    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    /// Number of quads.
    pub fn num_quads(&self) -> usize {
        self.quads.len()
    }

    /// Append a point and return its index.
    pub fn add_point(&mut self, p: Point3) -> u32 {
        self.points.push(p);
        (self.points.len() - 1) as u32
    }

    /// Append a quad cell.
    pub fn add_quad(&mut self, quad: [u32; 4]) {
        self.quads.push(quad);
    }

    /// Bounding box of all points.
    pub fn bounds(&self) -> Aabb3 {
        Aabb3::from_points(&self.points)
    }

    /// Attach a scalar field, replacing any field with the same name.
    pub fn add_scalars(&mut self, field: ScalarField) -> Result<()> {
        if field.values.len() != self.points.len() {
            return Err(MeshError::ScalarLength {
                name: field.name,
                len: field.values.len(),
                num_points: self.points.len(),
            });
        }
        match self.point_data.iter_mut().find(|f| f.name == field.name) {
            Some(existing) => *existing = field,
            None => self.point_data.push(field),
        }
        Ok(())
    }

    /// Look up a scalar field by name.
    pub fn scalars(&self, name: &str) -> Option<&ScalarField> {
        self.point_data.iter().find(|f| f.name == name)
    }

    /// Select which attached field is displayed.
    pub fn set_active_scalars(&mut self, name: &str) -> Result<()> {
        if self.scalars(name).is_none() {
            return Err(MeshError::UnknownScalars(name.to_string()));
        }
        self.active_scalars = Some(name.to_string());
        Ok(())
    }

    /// The currently selected field, if any.
    pub fn active(&self) -> Option<&ScalarField> {
        self.active_scalars.as_deref().and_then(|n| self.scalars(n))
    }
}
