//! Voxel data: blocks, compressed chunk storage, coordinates and meshing

pub mod block;
pub mod rle;
pub mod coord;
pub mod chunk;
pub mod mesher;

pub use block::{Block, BlockGrid, BlockTextures, CHUNK_SIZE, CHUNK_VOLUME};
pub use rle::{RleBlocks, RleRun};
pub use coord::{ChunkCoord, chunk_to_world, world_to_chunk, world_to_local};
pub use chunk::Chunk;
pub use mesher::{Face, mesh_grid};
