//! Chunk streaming around a moving loader

pub mod config;
pub mod pool;
pub mod manager;

pub use config::{MAX_RENDER_DISTANCE, StreamingConfig};
pub use pool::{TaskHandle, WorkerPool};
pub use manager::{
    LoadedChunk, TickReport, WorldStreamer,
    chunk_entity_name, chunk_mesh_name, desired_coords,
};
