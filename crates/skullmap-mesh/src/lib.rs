#![warn(missing_docs)]

//! Mesh types for skullmap.
//!
//! - [`TriangleMesh`] - the closed bone surface the thickness core reads
//! - [`QuadMesh`] - the extracted top surface with per-point [`ScalarField`]s
//! - [`io`] - STL/OBJ loading, STL and legacy VTK writing
//! - [`primitives`] - box meshes for tests and demos

mod error;
mod mesh;
mod quad;
pub mod io;
pub mod primitives;

pub use error::{MeshError, Result};
pub use mesh::{Triangle, TriangleMesh};
pub use quad::{QuadMesh, ScalarField};
