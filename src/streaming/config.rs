//! Streaming configuration, loaded from JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};
use crate::voxel::block::BlockTextures;

/// Largest accepted `render_distance`: a 129 x 129 square of resident chunks
pub const MAX_RENDER_DISTANCE: i32 = 64;

/// World streaming settings. Missing fields take their defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// Chunks kept loaded on each side of the loader's chunk (Chebyshev radius).
    pub render_distance: i32,
    /// Worker threads for ticks and chunk generation.
    pub worker_threads: usize,
    /// Shader attached to chunk entities.
    pub shader: String,
    /// Texture atlas used for chunk UVs.
    pub atlas: String,
    /// Name of the entity every chunk is parented under.
    pub root_entity: String,
    pub block_textures: BlockTextures,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            render_distance: 2,
            worker_threads: 4,
            shader: "default".to_string(),
            atlas: "default".to_string(),
            root_entity: "World".to_string(),
            block_textures: BlockTextures::default(),
        }
    }
}

impl StreamingConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a JSON config file
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&json)?;
        log::info!("Loaded streaming config from {}", path.display());
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0..=MAX_RENDER_DISTANCE).contains(&self.render_distance) {
            return Err(Error::Config(format!(
                "render_distance must be in 0..={}, got {}",
                MAX_RENDER_DISTANCE, self.render_distance
            )));
        }
        if self.worker_threads == 0 {
            return Err(Error::Config("worker_threads must be >= 1".to_string()));
        }
        for (field, value) in [
            ("shader", &self.shader),
            ("atlas", &self.atlas),
            ("root_entity", &self.root_entity),
            ("block_textures.default", &self.block_textures.default),
        ] {
            if value.is_empty() {
                return Err(Error::Config(format!("{field} must not be empty")));
            }
        }
        Ok(())
    }

    /// Chunks resident at rest: `(2R+1)^2`, with R clamped to the accepted range
    pub fn chunk_budget(&self) -> usize {
        let side = (2 * self.render_distance.clamp(0, MAX_RENDER_DISTANCE) + 1) as usize;
        side * side
    }
}
