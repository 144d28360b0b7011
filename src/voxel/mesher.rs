//! Face-culled chunk meshing
//!
//! Every solid cell emits one quad per face whose neighbor is air or outside
//! the chunk. Faces between two solid cells are culled, so geometry grows with
//! the exposed surface rather than with the number of cells.
//!
//! Output order is fixed: cells in `x`, `y`, `z` loop order (x outermost) and
//! faces in [`Face::ALL`] order within a cell.

use glam::{IVec3, Vec2, Vec3};

use super::block::{BlockGrid, BlockTextures, CHUNK_SIZE};
use crate::render::atlas::TextureAtlas;
use crate::render::vertex::{MeshData, Vertex};

/// Axis-aligned face direction
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Face {
    PosX,
    NegX,
    PosY,
    NegY,
    PosZ,
    NegZ,
}

impl Face {
    /// Emission order within a cell
    pub const ALL: [Face; 6] = [
        Face::PosX,
        Face::NegX,
        Face::PosY,
        Face::NegY,
        Face::PosZ,
        Face::NegZ,
    ];

    /// Offset to the neighboring cell across this face
    pub fn offset(self) -> IVec3 {
        match self {
            Face::PosX => IVec3::X,
            Face::NegX => IVec3::NEG_X,
            Face::PosY => IVec3::Y,
            Face::NegY => IVec3::NEG_Y,
            Face::PosZ => IVec3::Z,
            Face::NegZ => IVec3::NEG_Z,
        }
    }

    pub fn normal(self) -> Vec3 {
        self.offset().as_vec3()
    }

    /// Unit-cube corners of the quad, wound consistently for every face
    pub fn corners(self) -> [Vec3; 4] {
        match self {
            Face::PosX => [
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(1.0, 1.0, 1.0),
                Vec3::new(1.0, 0.0, 1.0),
            ],
            Face::NegX => [
                Vec3::new(0.0, 0.0, 1.0),
                Vec3::new(0.0, 1.0, 1.0),
                Vec3::new(0.0, 1.0, 0.0),
                Vec3::new(0.0, 0.0, 0.0),
            ],
            Face::PosY => [
                Vec3::new(0.0, 1.0, 1.0),
                Vec3::new(1.0, 1.0, 1.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ],
            Face::NegY => [
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 1.0),
                Vec3::new(0.0, 0.0, 1.0),
            ],
            Face::PosZ => [
                Vec3::new(1.0, 0.0, 1.0),
                Vec3::new(1.0, 1.0, 1.0),
                Vec3::new(0.0, 1.0, 1.0),
                Vec3::new(0.0, 0.0, 1.0),
            ],
            Face::NegZ => [
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
            ],
        }
    }
}

/// Flat vertex tint
const FACE_COLOR: Vec3 = Vec3::ONE;

/// Build the culled mesh of a block grid.
///
/// Texture names that are missing from the atlas produce zero UVs (the atlas
/// logs a warning) and meshing continues.
pub fn mesh_grid(grid: &BlockGrid, atlas: &TextureAtlas, textures: &BlockTextures) -> MeshData {
    let mut mesh = MeshData::new();

    for x in 0..CHUNK_SIZE {
        for y in 0..CHUNK_SIZE {
            for z in 0..CHUNK_SIZE {
                let pos = IVec3::new(x, y, z);
                let block = grid.get(pos);
                if block.is_air() {
                    continue;
                }

                for face in Face::ALL {
                    // Out-of-bounds neighbors read as air
                    if grid.get(pos + face.offset()).is_air() {
                        let uvs = atlas.texture_coordinates(textures.texture_for(block));
                        push_face(&mut mesh, pos, face, uvs);
                    }
                }
            }
        }
    }

    mesh
}

fn push_face(mesh: &mut MeshData, cell: IVec3, face: Face, uvs: [Vec2; 4]) {
    let base = mesh.vertices.len() as u32;
    let origin = cell.as_vec3();
    let normal = face.normal();

    for (corner, uv) in face.corners().into_iter().zip(uvs) {
        mesh.vertices.push(Vertex::new(origin + corner, FACE_COLOR, normal, uv));
    }

    mesh.indices
        .extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::atlas::SubTexture;
    use crate::voxel::block::Block;

    fn atlas() -> TextureAtlas {
        TextureAtlas::new("default")
            .with_entry("dirt", SubTexture::new(Vec2::new(0.5, 0.0), Vec2::new(0.5, 0.5)))
    }

    fn single_block_grid(pos: IVec3) -> BlockGrid {
        let mut grid = BlockGrid::empty();
        grid.set(pos, Block::SOLID).unwrap();
        grid
    }

    #[test]
    fn test_empty_grid() {
        let mesh = mesh_grid(&BlockGrid::empty(), &atlas(), &BlockTextures::default());
        assert!(mesh.is_empty());
        assert!(mesh.indices.is_empty());
    }

    #[test]
    fn test_single_block() {
        let grid = single_block_grid(IVec3::new(3, 4, 5));
        let mesh = mesh_grid(&grid, &atlas(), &BlockTextures::default());
        assert_eq!(mesh.face_count(), 6);
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.indices.len(), 36);
    }

    #[test]
    fn test_single_block_face_order_and_normals() {
        let mesh = mesh_grid(&single_block_grid(IVec3::ZERO), &atlas(), &BlockTextures::default());
        for (i, face) in Face::ALL.iter().enumerate() {
            for v in &mesh.vertices[i * 4..i * 4 + 4] {
                assert_eq!(v.normal(), face.normal());
            }
        }
        assert_eq!(&mesh.indices[..6], &[0, 1, 2, 2, 3, 0]);
        assert_eq!(&mesh.indices[30..], &[20, 21, 22, 22, 23, 20]);
    }

    #[test]
    fn test_corners_lie_on_face_plane() {
        for face in Face::ALL {
            let n = face.normal();
            // The face plane sits at 1 for positive faces and 0 for negative ones
            let plane = if n.max_element() > 0.0 { 1.0 } else { 0.0 };
            for corner in face.corners() {
                assert_eq!(corner.dot(n.abs()), plane, "{face:?}");
            }
        }
    }

    #[test]
    fn test_winding_matches_normal() {
        // Every face winds the same way relative to its outward normal
        for face in Face::ALL {
            let [a, b, c, _] = face.corners();
            let winding = (b - a).cross(c - a).normalize();
            assert_eq!(winding, face.normal(), "{face:?}");
        }
    }

    #[test]
    fn test_positions_are_cell_offsets() {
        let grid = single_block_grid(IVec3::new(2, 7, 9));
        let mesh = mesh_grid(&grid, &atlas(), &BlockTextures::default());
        for v in &mesh.vertices {
            let p = v.position();
            assert!(p.x >= 2.0 && p.x <= 3.0);
            assert!(p.y >= 7.0 && p.y <= 8.0);
            assert!(p.z >= 9.0 && p.z <= 10.0);
        }
    }

    #[test]
    fn test_uvs_from_atlas() {
        let mesh = mesh_grid(&single_block_grid(IVec3::ZERO), &atlas(), &BlockTextures::default());
        let uvs: Vec<Vec2> = mesh.vertices[..4].iter().map(|v| v.uv()).collect();
        assert_eq!(
            uvs,
            vec![
                Vec2::new(0.5, 0.0),
                Vec2::new(1.0, 0.0),
                Vec2::new(1.0, 0.5),
                Vec2::new(0.5, 0.5),
            ]
        );
    }

    #[test]
    fn test_missing_texture_uses_zero_uvs() {
        let textures = BlockTextures {
            default: "obsidian".to_string(),
            ..Default::default()
        };
        let mesh = mesh_grid(&single_block_grid(IVec3::ZERO), &atlas(), &textures);
        assert_eq!(mesh.face_count(), 6);
        assert!(mesh.vertices.iter().all(|v| v.uv() == Vec2::ZERO));
    }

    #[test]
    fn test_solid_chunk_only_surface_faces() {
        let mesh = mesh_grid(&BlockGrid::filled(Block::SOLID), &atlas(), &BlockTextures::default());
        let side = CHUNK_SIZE as usize;
        assert_eq!(mesh.face_count(), 6 * side * side);
        assert_eq!(mesh.indices.len(), 6 * 6 * side * side);
    }

    #[test]
    fn test_two_adjacent_blocks_cull_shared_face() {
        let mut grid = single_block_grid(IVec3::new(4, 4, 4));
        grid.set(IVec3::new(5, 4, 4), Block::SOLID).unwrap();
        let mesh = mesh_grid(&grid, &atlas(), &BlockTextures::default());
        assert_eq!(mesh.face_count(), 10);
    }

    #[test]
    fn test_deterministic() {
        let mut grid = BlockGrid::empty();
        for i in 0..CHUNK_SIZE {
            let pos = IVec3::new(i, (i * 3) % CHUNK_SIZE, (i * 7) % CHUNK_SIZE);
            grid.set(pos, Block::SOLID).unwrap();
        }
        let a = mesh_grid(&grid, &atlas(), &BlockTextures::default());
        let b = mesh_grid(&grid, &atlas(), &BlockTextures::default());
        assert_eq!(a, b);
    }
}
