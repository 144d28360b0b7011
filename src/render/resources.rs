//! Named render resources shared by every chunk entity

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::core::{Error, Result};
use super::atlas::TextureAtlas;

/// Handle to a shader program, looked up by name
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Shader {
    pub name: String,
    /// Path prefix of the vertex/pixel stage sources
    pub source: PathBuf,
}

impl Shader {
    pub fn new(name: impl Into<String>, source: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }
}

/// Shader and atlas pair attached to a renderable entity
#[derive(Clone, Debug)]
pub struct Material {
    pub shader: Arc<Shader>,
    pub atlas: Arc<TextureAtlas>,
}

/// Shaders and texture atlases registered by name.
///
/// Built once at startup and shared read-only with the streaming workers.
#[derive(Clone, Debug, Default)]
pub struct RenderResources {
    shaders: HashMap<String, Arc<Shader>>,
    atlases: HashMap<String, Arc<TextureAtlas>>,
}

impl RenderResources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a shader under its own name, replacing any previous one
    pub fn register_shader(&mut self, shader: Shader) -> Arc<Shader> {
        let shader = Arc::new(shader);
        self.shaders.insert(shader.name.clone(), Arc::clone(&shader));
        shader
    }

    /// Register an atlas under its own name, replacing any previous one
    pub fn register_atlas(&mut self, atlas: TextureAtlas) -> Arc<TextureAtlas> {
        let atlas = Arc::new(atlas);
        self.atlases.insert(atlas.name().to_string(), Arc::clone(&atlas));
        atlas
    }

    pub fn shader(&self, name: &str) -> Result<Arc<Shader>> {
        self.shaders.get(name).cloned().ok_or_else(|| Error::MissingResource {
            kind: "shader",
            name: name.to_string(),
        })
    }

    pub fn atlas(&self, name: &str) -> Result<Arc<TextureAtlas>> {
        self.atlases.get(name).cloned().ok_or_else(|| Error::MissingResource {
            kind: "texture atlas",
            name: name.to_string(),
        })
    }

    /// Resolve a shader and an atlas by name into one material
    pub fn material(&self, shader: &str, atlas: &str) -> Result<Material> {
        Ok(Material {
            shader: self.shader(shader)?,
            atlas: self.atlas(atlas)?,
        })
    }
}
