//! Chunk: run-length compressed blocks of one grid cell of the world

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{PoisonError, RwLock};

use glam::IVec3;

use super::block::{Block, BlockGrid, BlockTextures, block_index, in_bounds};
use super::coord::ChunkCoord;
use super::mesher::mesh_grid;
use super::rle::RleBlocks;
use crate::core::{Error, Result};
use crate::render::atlas::TextureAtlas;
use crate::render::mesh::{GpuMesh, Mesh, RenderDevice};
use crate::render::vertex::MeshData;

/// A `CHUNK_SIZE`³ region of blocks, stored run-length encoded.
///
/// Shared between the streaming manager and its scene entity, so block
/// storage sits behind a lock.
pub struct Chunk {
    coord: ChunkCoord,
    blocks: RwLock<RleBlocks>,
    /// Number of meshes built from this chunk
    mesh_generations: AtomicU32,
}

impl std::fmt::Debug for Chunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chunk")
            .field("coord", &self.coord)
            .field("runs", &self.run_count())
            .field("mesh_generations", &self.mesh_generations())
            .finish()
    }
}

impl Chunk {
    /// Create a fully solid chunk at the given coordinate
    pub fn new(coord: ChunkCoord) -> Self {
        Self::with_blocks(coord, &BlockGrid::filled(Block::SOLID))
    }

    /// Create a chunk from an explicit grid
    pub fn with_blocks(coord: ChunkCoord, grid: &BlockGrid) -> Self {
        Self {
            coord,
            blocks: RwLock::new(RleBlocks::from_grid(grid)),
            mesh_generations: AtomicU32::new(0),
        }
    }

    /// Create a chunk from stored runs. The runs are validated.
    pub fn from_rle(coord: ChunkCoord, blocks: RleBlocks) -> Result<Self> {
        blocks.validate()?;
        Ok(Self {
            coord,
            blocks: RwLock::new(blocks),
            mesh_generations: AtomicU32::new(0),
        })
    }

    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    /// Decompress the block grid
    pub fn blocks(&self) -> Result<BlockGrid> {
        self.read_blocks().decompress_grid()
    }

    /// Replace every block, re-compressing the storage
    pub fn set_blocks(&self, grid: &BlockGrid) {
        *self.blocks.write().unwrap_or_else(PoisonError::into_inner) = RleBlocks::from_grid(grid);
    }

    /// Change one block at a chunk-local position
    pub fn set_block(&self, local: IVec3, block: Block) -> Result<()> {
        if !in_bounds(local) {
            return Err(Error::OutOfBounds(local));
        }

        let mut blocks = self.blocks.write().unwrap_or_else(PoisonError::into_inner);
        let mut grid = blocks.decompress_grid()?;
        grid.set(local, block)?;
        *blocks = RleBlocks::from_grid(&grid);
        Ok(())
    }

    /// Block at a chunk-local position (air outside the chunk)
    pub fn block(&self, local: IVec3) -> Block {
        if !in_bounds(local) {
            return Block::AIR;
        }
        self.read_blocks()
            .block_at(block_index(local.x, local.y, local.z))
            .unwrap_or(Block::AIR)
    }

    /// Number of runs in the compressed storage
    pub fn run_count(&self) -> usize {
        self.read_blocks().run_count()
    }

    /// Copy of the compressed storage
    pub fn rle(&self) -> RleBlocks {
        self.read_blocks().clone()
    }

    /// Build this chunk's culled mesh.
    ///
    /// Corrupt storage fails here instead of producing a partial mesh.
    pub fn build_mesh(&self, atlas: &TextureAtlas, textures: &BlockTextures) -> Result<MeshData> {
        let grid = self.blocks()?;
        let mesh = mesh_grid(&grid, atlas, textures);
        self.mesh_generations.fetch_add(1, Ordering::AcqRel);
        Ok(mesh)
    }

    /// Build the mesh, hand it to the mesh component and upload it
    pub fn generate(
        &self,
        mesh: &mut Mesh,
        atlas: &TextureAtlas,
        textures: &BlockTextures,
        device: &dyn RenderDevice,
    ) -> Result<GpuMesh> {
        let data = self.build_mesh(atlas, textures)?;
        log::trace!(
            "Chunk {}: {} faces, {} indices",
            self.coord,
            data.face_count(),
            data.indices.len()
        );

        mesh.set_vertices(data.vertices);
        mesh.set_indices(data.indices);
        mesh.generate(device)
    }

    /// How many times a mesh has been built from this chunk
    pub fn mesh_generations(&self) -> u32 {
        self.mesh_generations.load(Ordering::Acquire)
    }

    fn read_blocks(&self) -> std::sync::RwLockReadGuard<'_, RleBlocks> {
        self.blocks.read().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::mesh::HeadlessDevice;
    use crate::voxel::block::{CHUNK_SIZE, CHUNK_VOLUME};
    use crate::voxel::rle::RleRun;

    #[test]
    fn test_new_chunk_is_solid() {
        let chunk = Chunk::new(ChunkCoord::new(1, 0, 2));
        assert_eq!(chunk.coord(), ChunkCoord::new(1, 0, 2));
        assert_eq!(chunk.run_count(), 1);
        assert_eq!(chunk.blocks().unwrap().solid_count(), CHUNK_VOLUME);
        assert_eq!(chunk.mesh_generations(), 0);
    }

    #[test]
    fn test_set_block_recompresses() {
        let chunk = Chunk::new(ChunkCoord::default());
        chunk.set_block(IVec3::new(5, 5, 5), Block::AIR).unwrap();

        assert_eq!(chunk.block(IVec3::new(5, 5, 5)), Block::AIR);
        assert_eq!(chunk.block(IVec3::new(4, 5, 5)), Block::SOLID);
        assert_eq!(chunk.run_count(), 3);
        assert!(chunk.rle().validate().is_ok());

        // Filling the hole merges the runs back together
        chunk.set_block(IVec3::new(5, 5, 5), Block::SOLID).unwrap();
        assert_eq!(chunk.run_count(), 1);
    }

    #[test]
    fn test_set_block_out_of_bounds() {
        let chunk = Chunk::new(ChunkCoord::default());
        assert!(chunk.set_block(IVec3::new(CHUNK_SIZE, 0, 0), Block::AIR).is_err());
        assert_eq!(chunk.block(IVec3::new(-1, 0, 0)), Block::AIR);
    }

    #[test]
    fn test_corrupt_storage_is_rejected() {
        let runs = RleBlocks::from_runs(vec![RleRun::new(Block::SOLID, 17)]);
        let err = Chunk::from_rle(ChunkCoord::default(), runs).unwrap_err();
        assert!(matches!(err, Error::CorruptChunk { actual: 17, .. }));
    }

    #[test]
    fn test_generate_uploads_surface_mesh() {
        let device = HeadlessDevice::new();
        let atlas = TextureAtlas::new("default");
        let chunk = Chunk::new(ChunkCoord::new(0, 0, 0));
        let mut mesh = Mesh::new("Chunk_Mesh_0_0_0_");

        let handle = chunk
            .generate(&mut mesh, &atlas, &BlockTextures::default(), &device)
            .unwrap();

        let faces = 6 * (CHUNK_SIZE * CHUNK_SIZE) as usize;
        assert_eq!(mesh.vertex_count(), faces * 4);
        assert_eq!(mesh.index_count(), faces * 6);
        assert_eq!(mesh.gpu_mesh(), Some(handle));
        assert_eq!(chunk.mesh_generations(), 1);
        assert_eq!(device.live_mesh_count(), 1);
    }

    #[test]
    fn test_hollowed_chunk_exposes_inner_faces() {
        let chunk = Chunk::new(ChunkCoord::default());
        chunk.set_block(IVec3::new(8, 8, 8), Block::AIR).unwrap();

        let mesh = chunk
            .build_mesh(&TextureAtlas::new("default"), &BlockTextures::default())
            .unwrap();
        let surface = 6 * (CHUNK_SIZE * CHUNK_SIZE) as usize;
        assert_eq!(mesh.face_count(), surface + 6);
    }
}
