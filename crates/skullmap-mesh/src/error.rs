//! Error types for mesh construction and I/O.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while building, validating or reading meshes.
#[derive(Error, Debug)]
pub enum MeshError {
    /// Reading or writing a file failed.
    #[error("I/O error on {path:?}: {source}")]
    Io {
        /// File being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A mesh file could not be parsed.
    #[error("failed to parse {path:?}: {details}")]
    Parse {
        /// File being parsed.
        path: PathBuf,
        /// Parser message.
        details: String,
    },

    /// File extension is not a supported mesh format.
    #[error("unsupported mesh format: {extension:?}")]
    UnsupportedFormat {
        /// Extension found on the path, if any.
        extension: Option<String>,
    },

    /// Mesh has no points or no faces.
    #[error("mesh is empty: {0}")]
    EmptyMesh(String),

    /// A face references a point that does not exist.
    #[error("face {face} references point {index}, but mesh has {num_points} points")]
    InvalidIndex {
        /// Offending face.
        face: usize,
        /// Offending point index.
        index: u32,
        /// Number of points in the mesh.
        num_points: usize,
    },

    /// A scalar field does not have one value per point.
    #[error("scalar field {name:?} has {len} values, mesh has {num_points} points")]
    ScalarLength {
        /// Field name.
        name: String,
        /// Number of values supplied.
        len: usize,
        /// Number of points in the mesh.
        num_points: usize,
    },

    /// No scalar field with this name is attached.
    #[error("no scalar field named {0:?}")]
    UnknownScalars(String),
}

/// Result type for mesh operations.
pub type Result<T> = std::result::Result<T, MeshError>;
