//! voxstream - chunked voxel world streaming and meshing
//!
//! Chunks store their blocks run-length encoded, are meshed with hidden-face
//! culling against a texture atlas, and are streamed in and out around a
//! moving loader on a fixed worker pool.

pub mod core;
pub mod voxel;
pub mod render;
pub mod scene;
pub mod streaming;
