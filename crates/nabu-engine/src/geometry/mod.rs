//! CPU-side mesh data.
//!
//! Meshes are built here, then handed to the scene which uploads them into
//! [`crate::gpu::Buffer`]s. Triangles wind counter-clockwise seen from outside.

mod primitives;
mod vertex;

pub use primitives::{cube, plane};
pub use vertex::{MeshData, Vertex};
