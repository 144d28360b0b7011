//! Mesh component and the GPU upload seam
//!
//! The engine never talks to a graphics API directly. A [`RenderDevice`]
//! receives finished vertex/index data and hands back an opaque [`GpuMesh`]
//! handle; [`HeadlessDevice`] is the in-process implementation used by the
//! driver binary and tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::core::{Error, Result};
use super::vertex::{MeshData, Vertex};

/// Opaque handle to an uploaded mesh
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GpuMesh(pub u64);

/// Creates and releases GPU mesh buffers. Must be callable from worker threads.
pub trait RenderDevice: Send + Sync {
    /// Create vertex and index buffers for a mesh
    fn upload_mesh(&self, label: &str, vertex_bytes: &[u8], indices: &[u32]) -> Result<GpuMesh>;

    /// Free the buffers behind a handle
    fn release_mesh(&self, mesh: GpuMesh);
}

/// Buffer sizes recorded for one live upload
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadInfo {
    pub label: String,
    pub vertex_bytes: usize,
    pub index_count: usize,
}

/// Device that keeps uploads in memory and counts them
#[derive(Debug, Default)]
pub struct HeadlessDevice {
    next_id: AtomicU64,
    uploads: AtomicU64,
    live: Mutex<HashMap<GpuMesh, UploadInfo>>,
}

impl HeadlessDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total successful uploads since creation
    pub fn upload_count(&self) -> u64 {
        self.uploads.load(Ordering::Relaxed)
    }

    /// Meshes uploaded and not yet released
    pub fn live_mesh_count(&self) -> usize {
        self.live.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Upload record for a live handle
    pub fn upload_info(&self, mesh: GpuMesh) -> Option<UploadInfo> {
        self.live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&mesh)
            .cloned()
    }
}

impl RenderDevice for HeadlessDevice {
    fn upload_mesh(&self, label: &str, vertex_bytes: &[u8], indices: &[u32]) -> Result<GpuMesh> {
        if vertex_bytes.len() % std::mem::size_of::<Vertex>() != 0 {
            return Err(Error::Gpu(format!(
                "vertex buffer for '{}' is not a whole number of vertices ({} bytes)",
                label,
                vertex_bytes.len()
            )));
        }

        let handle = GpuMesh(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.live.lock().unwrap_or_else(PoisonError::into_inner).insert(
            handle,
            UploadInfo {
                label: label.to_string(),
                vertex_bytes: vertex_bytes.len(),
                index_count: indices.len(),
            },
        );
        self.uploads.fetch_add(1, Ordering::Relaxed);
        log::trace!("Uploaded mesh '{}' as {:?}", label, handle);
        Ok(handle)
    }

    fn release_mesh(&self, mesh: GpuMesh) {
        self.live.lock().unwrap_or_else(PoisonError::into_inner).remove(&mesh);
    }
}

/// Mesh component: CPU geometry plus its current GPU upload
#[derive(Clone, Debug)]
pub struct Mesh {
    name: String,
    data: MeshData,
    gpu: Option<GpuMesh>,
}

impl Mesh {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: MeshData::new(),
            gpu: None,
        }
    }

    pub fn set_vertices(&mut self, vertices: Vec<Vertex>) {
        self.data.vertices = vertices;
    }

    pub fn set_indices(&mut self, indices: Vec<u32>) {
        self.data.indices = indices;
    }

    /// Upload the current geometry, replacing (and releasing) any previous upload
    pub fn generate(&mut self, device: &dyn RenderDevice) -> Result<GpuMesh> {
        let handle = device.upload_mesh(&self.name, self.data.vertex_bytes(), &self.data.indices)?;
        if let Some(old) = self.gpu.replace(handle) {
            device.release_mesh(old);
        }
        Ok(handle)
    }

    /// Drop the GPU upload, keeping CPU geometry
    pub fn release(&mut self, device: &dyn RenderDevice) {
        if let Some(handle) = self.gpu.take() {
            device.release_mesh(handle);
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &MeshData {
        &self.data
    }

    pub fn gpu_mesh(&self) -> Option<GpuMesh> {
        self.gpu
    }

    pub fn vertex_count(&self) -> usize {
        self.data.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.data.indices.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec2, Vec3};

    fn quad() -> Vec<Vertex> {
        vec![Vertex::new(Vec3::ZERO, Vec3::ONE, Vec3::Z, Vec2::ZERO); 4]
    }

    #[test]
    fn test_generate_uploads() {
        let device = HeadlessDevice::new();
        let mut mesh = Mesh::new("quad");
        mesh.set_vertices(quad());
        mesh.set_indices(vec![0, 1, 2, 2, 3, 0]);

        let handle = mesh.generate(&device).unwrap();
        assert_eq!(mesh.gpu_mesh(), Some(handle));
        assert_eq!(device.live_mesh_count(), 1);

        let info = device.upload_info(handle).unwrap();
        assert_eq!(info.label, "quad");
        assert_eq!(info.vertex_bytes, 4 * std::mem::size_of::<Vertex>());
        assert_eq!(info.index_count, 6);
    }

    #[test]
    fn test_regenerate_releases_previous() {
        let device = HeadlessDevice::new();
        let mut mesh = Mesh::new("quad");
        mesh.set_vertices(quad());

        let first = mesh.generate(&device).unwrap();
        let second = mesh.generate(&device).unwrap();
        assert_ne!(first, second);
        assert_eq!(device.live_mesh_count(), 1);
        assert_eq!(device.upload_count(), 2);

        mesh.release(&device);
        assert_eq!(device.live_mesh_count(), 0);
        assert_eq!(mesh.gpu_mesh(), None);
    }

    #[test]
    fn test_rejects_partial_vertex_buffer() {
        let device = HeadlessDevice::new();
        let err = device.upload_mesh("bad", &[0u8; 7], &[]).unwrap_err();
        assert!(matches!(err, Error::Gpu(_)));
    }
}
