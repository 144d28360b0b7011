//! Chunk grid coordinates and world/chunk space conversion

use std::fmt;

use glam::{IVec3, Vec3};
use serde::{Deserialize, Serialize};

use super::block::CHUNK_SIZE;

/// Integer coordinate identifying a chunk in the world grid
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl ChunkCoord {
    /// Create a new chunk coordinate
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Convert world position to chunk coordinate.
    ///
    /// Uses floor division so that negative positions land in negative chunks
    /// (`x = -0.5` is in chunk `-1`, not `0`).
    pub fn from_world_pos(pos: Vec3) -> Self {
        Self {
            x: (pos.x / CHUNK_SIZE as f32).floor() as i32,
            y: (pos.y / CHUNK_SIZE as f32).floor() as i32,
            z: (pos.z / CHUNK_SIZE as f32).floor() as i32,
        }
    }

    /// Get the world-space origin (minimum corner) of this chunk
    pub fn world_origin(&self) -> Vec3 {
        Vec3::new(
            self.x as f32 * CHUNK_SIZE as f32,
            self.y as f32 * CHUNK_SIZE as f32,
            self.z as f32 * CHUNK_SIZE as f32,
        )
    }

    /// Same horizontal position, projected onto vertical layer `y`
    pub fn on_layer(self, y: i32) -> Self {
        Self { y, ..self }
    }

    /// Offset by whole chunks
    pub fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// Offset by whole chunks, `None` if any axis leaves the `i32` range
    pub fn checked_offset(self, dx: i32, dy: i32, dz: i32) -> Option<Self> {
        Some(Self::new(
            self.x.checked_add(dx)?,
            self.y.checked_add(dy)?,
            self.z.checked_add(dz)?,
        ))
    }

    /// Square-radius distance in chunks
    pub fn chebyshev_distance(self, other: ChunkCoord) -> u32 {
        self.x
            .abs_diff(other.x)
            .max(self.y.abs_diff(other.y))
            .max(self.z.abs_diff(other.z))
    }

    pub fn as_ivec3(self) -> IVec3 {
        IVec3::new(self.x, self.y, self.z)
    }
}

impl From<IVec3> for ChunkCoord {
    fn from(v: IVec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl From<ChunkCoord> for IVec3 {
    fn from(c: ChunkCoord) -> Self {
        c.as_ivec3()
    }
}

impl fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Chunk containing a world-space position
pub fn world_to_chunk(pos: Vec3) -> ChunkCoord {
    ChunkCoord::from_world_pos(pos)
}

/// Minimum corner of a chunk in world space
pub fn chunk_to_world(coord: ChunkCoord) -> Vec3 {
    coord.world_origin()
}

/// Block position of a world-space point inside its chunk (`0..CHUNK_SIZE` per axis)
pub fn world_to_local(pos: Vec3) -> IVec3 {
    let block = pos.floor().as_ivec3();
    IVec3::new(
        block.x.rem_euclid(CHUNK_SIZE),
        block.y.rem_euclid(CHUNK_SIZE),
        block.z.rem_euclid(CHUNK_SIZE),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_world_pos() {
        let cs = CHUNK_SIZE as f32;

        let coord = ChunkCoord::from_world_pos(Vec3::new(cs / 2.0, cs / 2.0, cs / 2.0));
        assert_eq!(coord, ChunkCoord::new(0, 0, 0));

        let coord = ChunkCoord::from_world_pos(Vec3::new(cs, 0.0, 0.0));
        assert_eq!(coord, ChunkCoord::new(1, 0, 0));

        let coord = ChunkCoord::from_world_pos(Vec3::new(cs * 1.5, cs * 2.5, cs * 3.5));
        assert_eq!(coord, ChunkCoord::new(1, 2, 3));

        let coord = ChunkCoord::from_world_pos(Vec3::new(-10.0, -20.0, -40.0));
        assert_eq!(coord, ChunkCoord::new(-1, -2, -3));
    }

    #[test]
    fn test_negative_positions_floor() {
        assert_eq!(world_to_chunk(Vec3::new(-0.5, 0.0, 0.0)).x, -1);
        assert_eq!(world_to_chunk(Vec3::new(-16.0, 0.0, 0.0)).x, -1);
        assert_eq!(world_to_chunk(Vec3::new(-16.01, 0.0, 0.0)).x, -2);
    }

    #[test]
    fn test_world_origin() {
        let cs = CHUNK_SIZE as f32;
        assert_eq!(ChunkCoord::new(0, 0, 0).world_origin(), Vec3::ZERO);
        assert_eq!(ChunkCoord::new(1, 2, 3).world_origin(), Vec3::new(cs, cs * 2.0, cs * 3.0));
        assert_eq!(ChunkCoord::new(-1, -1, -1).world_origin(), Vec3::splat(-cs));
    }

    #[test]
    fn test_round_trip() {
        for x in -40..40 {
            for z in [-1000, -3, 0, 7, 999] {
                let coord = ChunkCoord::new(x, x / 3, z);
                assert_eq!(world_to_chunk(chunk_to_world(coord)), coord);
            }
        }
    }

    #[test]
    fn test_on_layer_and_distance() {
        let c = ChunkCoord::new(4, 9, -2);
        assert_eq!(c.on_layer(0), ChunkCoord::new(4, 0, -2));
        assert_eq!(c.chebyshev_distance(ChunkCoord::new(1, 9, 0)), 3);
        let (min, max) = (ChunkCoord::new(i32::MIN, 0, 0), ChunkCoord::new(i32::MAX, 0, 0));
        assert_eq!(min.chebyshev_distance(max), u32::MAX);
    }

    #[test]
    fn test_checked_offset_at_range_edge() {
        let far = world_to_chunk(Vec3::new(1.0e12, 0.0, -1.0e12));
        assert_eq!(far.x, i32::MAX);
        assert_eq!(far.z, i32::MIN);

        assert_eq!(far.checked_offset(1, 0, 0), None);
        assert_eq!(far.checked_offset(0, 0, -1), None);
        assert_eq!(
            far.checked_offset(-1, 0, 1),
            Some(ChunkCoord::new(i32::MAX - 1, 0, i32::MIN + 1))
        );
    }

    #[test]
    fn test_world_to_local() {
        assert_eq!(world_to_local(Vec3::new(17.5, 3.0, -0.5)), IVec3::new(1, 3, 15));
    }

    #[test]
    fn test_display() {
        assert_eq!(ChunkCoord::new(1, 0, -3).to_string(), "(1, 0, -3)");
    }
}
