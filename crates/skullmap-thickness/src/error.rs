//! Error types for thickness mapping.

use skullmap_mesh::MeshError;
use thiserror::Error;

/// Errors that can occur before or around ray casting.
///
/// Rays that miss the mesh or cross it fewer than twice are not errors; they
/// leave their sample unset.
#[derive(Error, Debug)]
pub enum ThicknessError {
    /// Mesh has no faces to cast against.
    #[error("mesh is empty")]
    EmptyMesh,

    /// Invalid mapping parameters.
    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    /// Grid dimensions are zero or otherwise unusable.
    #[error("invalid grid dimensions: {0}")]
    InvalidDimensions(String),

    /// A top surface whose hit points do not match its mesh.
    #[error("inconsistent top surface: {0}")]
    InvalidSurface(String),

    /// Mesh validation or scalar attachment failed.
    #[error(transparent)]
    Mesh(#[from] MeshError),
}

/// Result type for thickness operations.
pub type Result<T> = std::result::Result<T, ThicknessError>;
