//! Run-length encoding of chunk block storage
//!
//! A chunk stores its blocks as `(block, length)` runs over the flattened
//! grid in scan order. Well-formed storage always covers exactly
//! `CHUNK_VOLUME` blocks and never has two adjacent runs of the same block.

use serde::{Deserialize, Serialize};

use super::block::{Block, BlockGrid, CHUNK_VOLUME};
use crate::core::{Error, Result};

/// One run of identical blocks
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RleRun {
    pub block: Block,
    pub length: u32,
}

impl RleRun {
    pub fn new(block: Block, length: u32) -> Self {
        Self { block, length }
    }
}

/// Run-length encoded block sequence
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RleBlocks {
    runs: Vec<RleRun>,
}

impl RleBlocks {
    /// Encode a block sequence. Empty input gives no runs.
    pub fn compress(blocks: &[Block]) -> Self {
        let mut runs = Vec::new();

        let Some((&first, rest)) = blocks.split_first() else {
            return Self { runs };
        };

        let mut current = RleRun::new(first, 1);
        for &block in rest {
            if block == current.block {
                current.length += 1;
            } else {
                runs.push(current);
                current = RleRun::new(block, 1);
            }
        }
        runs.push(current);

        Self { runs }
    }

    /// Encode a full grid
    pub fn from_grid(grid: &BlockGrid) -> Self {
        Self::compress(grid.as_slice())
    }

    /// Take runs as-is (for tests and tooling). Use [`validate`](Self::validate)
    /// before trusting them.
    pub fn from_runs(runs: Vec<RleRun>) -> Self {
        Self { runs }
    }

    /// Expand all runs in order
    pub fn decompress(&self) -> Vec<Block> {
        let mut blocks = Vec::with_capacity(self.total_len());
        for run in &self.runs {
            blocks.extend(std::iter::repeat_n(run.block, run.length as usize));
        }
        blocks
    }

    /// Expand into a chunk grid.
    ///
    /// Storage whose runs do not sum to `CHUNK_VOLUME` is corrupt and is
    /// reported, never padded or truncated.
    pub fn decompress_grid(&self) -> Result<BlockGrid> {
        let total = self.total_len();
        if total != CHUNK_VOLUME {
            return Err(Error::CorruptChunk {
                expected: CHUNK_VOLUME,
                actual: total,
            });
        }
        BlockGrid::from_vec(self.decompress())
    }

    /// Check the chunk storage invariants
    pub fn validate(&self) -> Result<()> {
        let total = self.total_len();
        if total != CHUNK_VOLUME {
            return Err(Error::CorruptChunk {
                expected: CHUNK_VOLUME,
                actual: total,
            });
        }
        if self.runs.iter().any(|r| r.length == 0) {
            return Err(Error::Streaming("zero-length block run".to_string()));
        }
        if self.runs.windows(2).any(|w| w[0].block == w[1].block) {
            return Err(Error::Streaming("adjacent block runs share a value".to_string()));
        }
        Ok(())
    }

    /// Block at a flat index without expanding the runs
    pub fn block_at(&self, index: usize) -> Option<Block> {
        let mut start = 0usize;
        for run in &self.runs {
            let end = start + run.length as usize;
            if index < end {
                return Some(run.block);
            }
            start = end;
        }
        None
    }

    pub fn runs(&self) -> &[RleRun] {
        &self.runs
    }

    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    /// Sum of all run lengths
    pub fn total_len(&self) -> usize {
        self.runs.iter().map(|r| r.length as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blocks(codes: &[u16]) -> Vec<Block> {
        codes.iter().map(|&c| Block(c)).collect()
    }

    #[test]
    fn test_compress_empty() {
        let rle = RleBlocks::compress(&[]);
        assert!(rle.is_empty());
        assert!(rle.decompress().is_empty());
    }

    #[test]
    fn test_compress_runs() {
        let rle = RleBlocks::compress(&blocks(&[1, 1, 1, 0, 0, 1, 2, 2]));
        assert_eq!(
            rle.runs(),
            &[
                RleRun::new(Block(1), 3),
                RleRun::new(Block(0), 2),
                RleRun::new(Block(1), 1),
                RleRun::new(Block(2), 2),
            ]
        );
    }

    #[test]
    fn test_round_trip_mixed_sequences() {
        let samples: Vec<Vec<Block>> = vec![
            blocks(&[7]),
            blocks(&[0, 1, 0, 1, 0, 1]),
            blocks(&[3, 3, 3, 3]),
            (0..1000u16).map(|i| Block(i / 7 % 3)).collect(),
        ];

        for sample in samples {
            let rle = RleBlocks::compress(&sample);
            assert_eq!(rle.decompress(), sample);
            assert_eq!(rle.total_len(), sample.len());
        }
    }

    #[test]
    fn test_no_adjacent_equal_runs() {
        let sample: Vec<Block> = (0..500u16).map(|i| Block((i / 3 + i / 11) % 2)).collect();
        let rle = RleBlocks::compress(&sample);
        assert!(rle.runs().windows(2).all(|w| w[0].block != w[1].block));
        assert!(rle.runs().iter().all(|r| r.length > 0));
    }

    #[test]
    fn test_solid_chunk_is_one_run() {
        let rle = RleBlocks::from_grid(&BlockGrid::filled(Block::SOLID));
        assert_eq!(rle.runs(), &[RleRun::new(Block::SOLID, CHUNK_VOLUME as u32)]);
        assert!(rle.validate().is_ok());
    }

    #[test]
    fn test_decompress_grid_detects_short_data() {
        let rle = RleBlocks::from_runs(vec![RleRun::new(Block::SOLID, 100)]);
        let err = rle.decompress_grid().unwrap_err();
        assert!(matches!(err, Error::CorruptChunk { actual: 100, .. }));
    }

    #[test]
    fn test_decompress_grid_detects_long_data() {
        let rle = RleBlocks::from_runs(vec![
            RleRun::new(Block::SOLID, CHUNK_VOLUME as u32),
            RleRun::new(Block::AIR, 1),
        ]);
        assert!(rle.decompress_grid().is_err());
    }

    #[test]
    fn test_validate_rejects_unmerged_runs() {
        let half = (CHUNK_VOLUME / 2) as u32;
        let rle = RleBlocks::from_runs(vec![
            RleRun::new(Block::SOLID, half),
            RleRun::new(Block::SOLID, half),
        ]);
        assert!(rle.validate().is_err());
        // Still decodes to a full grid; only minimality is violated
        assert!(rle.decompress_grid().is_ok());
    }

    #[test]
    fn test_block_at() {
        let rle = RleBlocks::compress(&blocks(&[1, 1, 0, 2]));
        assert_eq!(rle.block_at(0), Some(Block(1)));
        assert_eq!(rle.block_at(1), Some(Block(1)));
        assert_eq!(rle.block_at(2), Some(Block(0)));
        assert_eq!(rle.block_at(3), Some(Block(2)));
        assert_eq!(rle.block_at(4), None);
    }
}
