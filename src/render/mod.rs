//! Render-side collaborators: vertex layout, meshes, atlases and the device seam

pub mod atlas;
pub mod vertex;
pub mod mesh;
pub mod resources;

pub use atlas::{SubTexture, TextureAtlas};
pub use vertex::{MeshData, Vertex};
pub use mesh::{GpuMesh, HeadlessDevice, Mesh, RenderDevice, UploadInfo};
pub use resources::{Material, RenderResources, Shader};
