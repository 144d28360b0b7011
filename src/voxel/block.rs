//! Block codes and the dense per-chunk block grid

use std::collections::BTreeMap;

use glam::IVec3;
use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};

/// Edge length of a chunk in blocks (and in world units)
pub const CHUNK_SIZE: i32 = 16;

/// Number of blocks in one chunk
pub const CHUNK_VOLUME: usize = (CHUNK_SIZE * CHUNK_SIZE * CHUNK_SIZE) as usize;

/// Integer code of the voxel occupying one grid cell. `0` is air.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Block(pub u16);

impl Block {
    /// Empty cell
    pub const AIR: Block = Block(0);
    /// The placeholder solid block every generated chunk is filled with
    pub const SOLID: Block = Block(1);

    /// Check if block is air
    pub fn is_air(self) -> bool {
        self.0 == 0
    }

    /// Check if block occupies its cell
    pub fn is_solid(self) -> bool {
        self.0 != 0
    }
}

/// Linear index of a local block position (x fastest, then y, then z)
#[inline]
pub fn block_index(x: i32, y: i32, z: i32) -> usize {
    (x + y * CHUNK_SIZE + z * CHUNK_SIZE * CHUNK_SIZE) as usize
}

/// Whether a local position lies inside a chunk
#[inline]
pub fn in_bounds(pos: IVec3) -> bool {
    pos.cmpge(IVec3::ZERO).all() && pos.cmplt(IVec3::splat(CHUNK_SIZE)).all()
}

/// Dense `CHUNK_SIZE`³ array of blocks.
///
/// Only materialized while meshing or editing; chunks keep their blocks
/// run-length encoded.
#[derive(Clone, PartialEq, Eq)]
pub struct BlockGrid {
    blocks: Vec<Block>,
}

impl BlockGrid {
    /// Grid with every cell set to `block`
    pub fn filled(block: Block) -> Self {
        Self { blocks: vec![block; CHUNK_VOLUME] }
    }

    /// Grid of air
    pub fn empty() -> Self {
        Self::filled(Block::AIR)
    }

    /// Wrap a flat block array. Fails unless it holds exactly `CHUNK_VOLUME` blocks.
    pub fn from_vec(blocks: Vec<Block>) -> Result<Self> {
        if blocks.len() != CHUNK_VOLUME {
            return Err(Error::CorruptChunk {
                expected: CHUNK_VOLUME,
                actual: blocks.len(),
            });
        }
        Ok(Self { blocks })
    }

    /// Block at a local position; anything outside the grid reads as air.
    pub fn get(&self, pos: IVec3) -> Block {
        if !in_bounds(pos) {
            return Block::AIR;
        }
        self.blocks[block_index(pos.x, pos.y, pos.z)]
    }

    /// Set the block at a local position
    pub fn set(&mut self, pos: IVec3, block: Block) -> Result<()> {
        if !in_bounds(pos) {
            return Err(Error::OutOfBounds(pos));
        }
        self.blocks[block_index(pos.x, pos.y, pos.z)] = block;
        Ok(())
    }

    /// Flat view in scan order
    pub fn as_slice(&self) -> &[Block] {
        &self.blocks
    }

    /// Number of non-air cells
    pub fn solid_count(&self) -> usize {
        self.blocks.iter().filter(|b| b.is_solid()).count()
    }
}

impl std::fmt::Debug for BlockGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockGrid")
            .field("solid", &self.solid_count())
            .finish()
    }
}

/// Texture name for each block code.
///
/// There is a single placeholder block, so this is a default name plus
/// optional per-code overrides rather than a block registry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockTextures {
    /// Texture used for any block without an override
    pub default: String,
    /// Per-block-code texture names
    pub overrides: BTreeMap<u16, String>,
}

impl Default for BlockTextures {
    fn default() -> Self {
        Self {
            default: "dirt".to_string(),
            overrides: BTreeMap::new(),
        }
    }
}

impl BlockTextures {
    /// Texture name to sample for `block`
    pub fn texture_for(&self, block: Block) -> &str {
        self.overrides
            .get(&block.0)
            .map(String::as_str)
            .unwrap_or(&self.default)
    }
}
