//! Chunk mesh vertex layout

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

/// Chunk vertex (44 bytes, tightly packed for the vertex buffer)
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// Chunk-local position (offset 0)
    pub position: [f32; 3],
    /// Tint color (offset 12)
    pub color: [f32; 3],
    /// Face normal (offset 24)
    pub normal: [f32; 3],
    /// Atlas UV (offset 36)
    pub uv: [f32; 2],
}

impl Vertex {
    pub fn new(position: Vec3, color: Vec3, normal: Vec3, uv: Vec2) -> Self {
        Self {
            position: position.to_array(),
            color: color.to_array(),
            normal: normal.to_array(),
            uv: uv.to_array(),
        }
    }

    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }

    pub fn normal(&self) -> Vec3 {
        Vec3::from_array(self.normal)
    }

    pub fn uv(&self) -> Vec2 {
        Vec2::from_array(self.uv)
    }
}

/// CPU-side triangle mesh: 4 vertices and 6 indices per face
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of quads in the mesh
    pub fn face_count(&self) -> usize {
        self.vertices.len() / 4
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Vertex buffer contents as raw bytes
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }
}
