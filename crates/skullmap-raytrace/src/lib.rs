#![warn(missing_docs)]

//! Ray tracing against indexed triangle meshes.
//!
//! # Architecture
//!
//! - [`Ray`] - Ray representation with origin and direction
//! - [`Segment`] - Finite query between two points
//! - [`RayHit`] - Intersection result with parameter, point and face
//! - [`intersect_triangle`] - Möller–Trumbore ray/triangle test
//! - [`bvh`] - Bounding volume hierarchy for acceleration
//! - [`SpatialIndex`] - First/all-intersection queries along a segment
//!
//! # Example
//!
//! ```
//! use skullmap_math::Point3;
//! use skullmap_mesh::primitives::make_box;
//! use skullmap_raytrace::{Bvh, SpatialIndex};
//!
//! let mesh = make_box(Point3::new(0.0, 0.0, 0.0), Point3::new(10.0, 10.0, 10.0));
//! let bvh = Bvh::build(&mesh);
//!
//! let hits = bvh.all_intersections(&Point3::new(5.0, 4.0, -5.0), &Point3::new(5.0, 4.0, 15.0));
//! assert_eq!(hits.len(), 2);
//! ```

mod index;
mod ray;
mod triangle;
pub mod bvh;

pub use bvh::Bvh;
pub use index::SpatialIndex;
pub use ray::{Ray, RayHit, Segment};
pub use triangle::intersect_triangle;
