//! Error types for the voxstream engine

use glam::IVec3;
use thiserror::Error;

/// Main error type for the engine
#[derive(Debug, Error)]
pub enum Error {
    #[error("GPU error: {0}")]
    Gpu(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Config parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Config(String),

    /// Run lengths of a chunk's compressed storage do not cover the grid exactly.
    #[error("Corrupt chunk data: expected {expected} blocks, found {actual}")]
    CorruptChunk { expected: usize, actual: usize },

    #[error("Block position {0} is outside the chunk")]
    OutOfBounds(IVec3),

    #[error("Missing {kind} '{name}'")]
    MissingResource { kind: &'static str, name: String },

    #[error("Entity '{0}' is already registered")]
    DuplicateEntity(String),

    #[error("No such entity")]
    NoSuchEntity,

    #[error("A world update is already in flight; wait for it first")]
    UpdateInFlight,

    #[error("Worker pool error: {0}")]
    WorkerPool(String),

    #[error("Streaming error: {0}")]
    Streaming(String),
}

impl From<hecs::NoSuchEntity> for Error {
    fn from(_: hecs::NoSuchEntity) -> Self {
        Error::NoSuchEntity
    }
}
