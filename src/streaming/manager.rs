//! World streaming manager
//!
//! Keeps a square of chunks around a moving loader resident. Each update runs
//! as one task on the worker pool:
//!
//! 1. Diff the desired square against the loaded set under the lock. Chunks
//!    that stay are carried into the next set as-is.
//! 2. Generate the missing chunks in parallel (entity, mesh, GPU upload).
//! 3. Once every generation has joined, unload chunks that fell out of the
//!    square and commit the next set, again under the lock.
//!
//! Readers always see either the old or the new set, never a mix.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use glam::Vec3;
use hecs::Entity;
use rayon::prelude::*;

use super::config::{MAX_RENDER_DISTANCE, StreamingConfig};
use super::pool::{TaskHandle, WorkerPool};
use crate::core::{Error, Result};
use crate::render::mesh::{GpuMesh, Mesh, RenderDevice};
use crate::render::resources::{Material, RenderResources};
use crate::scene::{EntityRegistry, Scene};
use crate::voxel::chunk::Chunk;
use crate::voxel::coord::{ChunkCoord, chunk_to_world, world_to_chunk};

/// Entity name of the chunk at `coord`
pub fn chunk_entity_name(coord: ChunkCoord) -> String {
    format!("Chunk_{}_{}_{}_", coord.x, coord.y, coord.z)
}

/// Mesh name of the chunk at `coord`
pub fn chunk_mesh_name(coord: ChunkCoord) -> String {
    format!("Chunk_Mesh_{}_{}_{}_", coord.x, coord.y, coord.z)
}

/// Coordinates within `render_distance` of `center` on the ground layer,
/// x-major then z.
///
/// Fails if the distance is outside `0..=MAX_RENDER_DISTANCE` or the square
/// would cross the edge of the `i32` chunk grid.
pub fn desired_coords(center: ChunkCoord, render_distance: i32) -> Result<Vec<ChunkCoord>> {
    if !(0..=MAX_RENDER_DISTANCE).contains(&render_distance) {
        return Err(Error::Config(format!(
            "render_distance must be in 0..={}, got {}",
            MAX_RENDER_DISTANCE, render_distance
        )));
    }

    let center = center.on_layer(0);
    let r = render_distance;
    let out_of_range = || Error::Streaming(format!("loader chunk {} is out of range", center));
    center.checked_offset(-r, 0, -r).ok_or_else(out_of_range)?;
    center.checked_offset(r, 0, r).ok_or_else(out_of_range)?;

    let side = (2 * r + 1) as usize;
    let mut coords = Vec::with_capacity(side * side);
    for dx in -r..=r {
        for dz in -r..=r {
            coords.push(center.offset(dx, 0, dz));
        }
    }
    Ok(coords)
}

/// A resident chunk and the handles that keep it visible
#[derive(Clone, Debug)]
pub struct LoadedChunk {
    pub chunk: Arc<Chunk>,
    pub entity: Entity,
    pub gpu_mesh: GpuMesh,
}

/// Outcome of one streaming update
#[derive(Clone, Debug, Default)]
pub struct TickReport {
    /// Loader chunk the update was computed for
    pub center: ChunkCoord,
    /// Chunks carried over from the previous set
    pub migrated: usize,
    pub generated: Vec<ChunkCoord>,
    pub unloaded: Vec<ChunkCoord>,
    /// Chunks that failed to generate; retried on the next update
    pub failed: Vec<(ChunkCoord, String)>,
    pub elapsed: Duration,
}

impl TickReport {
    /// True when the update changed nothing
    pub fn is_steady(&self) -> bool {
        self.generated.is_empty() && self.unloaded.is_empty() && self.failed.is_empty()
    }
}

/// State shared between the streamer and its in-flight tick
struct Shared<R> {
    config: StreamingConfig,
    registry: Arc<R>,
    device: Arc<dyn RenderDevice>,
    material: Material,
    root: Entity,
    loaded: Mutex<HashMap<ChunkCoord, LoadedChunk>>,
}

impl<R: EntityRegistry> Shared<R> {
    fn lock_loaded(&self) -> MutexGuard<'_, HashMap<ChunkCoord, LoadedChunk>> {
        self.loaded.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn run_tick(&self, center: ChunkCoord, desired: Vec<ChunkCoord>) -> TickReport {
        let start = Instant::now();

        let mut next = HashMap::with_capacity(desired.len());
        let mut missing = Vec::new();
        {
            let loaded = self.lock_loaded();
            for coord in &desired {
                match loaded.get(coord) {
                    Some(existing) => {
                        next.insert(*coord, existing.clone());
                    }
                    None => missing.push(*coord),
                }
            }
        }
        let migrated = next.len();

        let results: Vec<(ChunkCoord, Result<LoadedChunk>)> = missing
            .par_iter()
            .map(|&coord| (coord, self.load_chunk(coord)))
            .collect();

        let mut generated = Vec::with_capacity(results.len());
        let mut failed = Vec::new();
        for (coord, result) in results {
            match result {
                Ok(chunk) => {
                    next.insert(coord, chunk);
                    generated.push(coord);
                }
                Err(e) => {
                    log::error!("Failed to generate chunk {}: {}", coord, e);
                    failed.push((coord, e.to_string()));
                }
            }
        }

        let mut unloaded = Vec::new();
        {
            let mut loaded = self.lock_loaded();
            for (coord, chunk) in loaded.iter() {
                if !next.contains_key(coord) {
                    self.unload_chunk(*coord, chunk);
                    unloaded.push(*coord);
                }
            }
            *loaded = next;
        }
        unloaded.sort();

        let report = TickReport {
            center,
            migrated,
            generated,
            unloaded,
            failed,
            elapsed: start.elapsed(),
        };
        log::info!(
            "World update at {}: {} kept, {} generated, {} unloaded, {} failed in {:.1}ms",
            center,
            report.migrated,
            report.generated.len(),
            report.unloaded.len(),
            report.failed.len(),
            report.elapsed.as_secs_f64() * 1000.0
        );
        report
    }

    /// Register, build and upload one chunk. A failure leaves nothing behind.
    fn load_chunk(&self, coord: ChunkCoord) -> Result<LoadedChunk> {
        let name = chunk_entity_name(coord);
        let entity = self.registry.register(&name)?;

        self.build_chunk(coord, entity).inspect_err(|_| {
            self.registry.unregister(&name);
        })
    }

    fn build_chunk(&self, coord: ChunkCoord, entity: Entity) -> Result<LoadedChunk> {
        self.registry.set_parent(entity, self.root)?;
        self.registry.set_local_position(entity, chunk_to_world(coord))?;
        self.registry.add_component(entity, self.material.clone())?;

        let chunk = Arc::new(Chunk::new(coord));
        let mut mesh = Mesh::new(chunk_mesh_name(coord));
        let gpu_mesh = chunk.generate(
            &mut mesh,
            &self.material.atlas,
            &self.config.block_textures,
            self.device.as_ref(),
        )?;

        let attached = self
            .registry
            .add_component(entity, mesh)
            .and_then(|()| self.registry.add_component(entity, Arc::clone(&chunk)));
        if let Err(e) = attached {
            self.device.release_mesh(gpu_mesh);
            return Err(e);
        }

        Ok(LoadedChunk { chunk, entity, gpu_mesh })
    }

    fn unload_chunk(&self, coord: ChunkCoord, loaded: &LoadedChunk) {
        if !self.registry.unregister(&chunk_entity_name(coord)) {
            log::warn!("Chunk {} had no registered entity", coord);
        }
        self.device.release_mesh(loaded.gpu_mesh);
        log::debug!("Unloaded chunk {}", coord);
    }
}

/// Streams chunks in and out around a loader position.
///
/// At most one update is in flight; call [`WorldStreamer::wait_for_update`]
/// or [`WorldStreamer::poll_update`] before the next
/// [`WorldStreamer::update`].
pub struct WorldStreamer<R: EntityRegistry = Scene> {
    shared: Arc<Shared<R>>,
    pool: Option<WorkerPool>,
    pending: Option<TaskHandle<TickReport>>,
}

impl<R: EntityRegistry> WorldStreamer<R> {
    /// Validate the config, resolve render resources, start the worker pool
    /// and register the root entity.
    ///
    /// The configured shader and atlas are looked up here once and pinned for
    /// the streamer's lifetime; later changes to `resources` are not seen.
    pub fn new(
        config: StreamingConfig,
        registry: Arc<R>,
        resources: Arc<RenderResources>,
        device: Arc<dyn RenderDevice>,
    ) -> Result<Self> {
        config.validate()?;
        let material = resources.material(&config.shader, &config.atlas)?;
        let pool = WorkerPool::new(config.worker_threads)?;
        let root = registry.register(&config.root_entity)?;

        log::info!(
            "World streamer ready: render distance {}, {} workers, atlas '{}'",
            config.render_distance,
            config.worker_threads,
            config.atlas
        );

        Ok(Self {
            shared: Arc::new(Shared {
                config,
                registry,
                device,
                material,
                root,
                loaded: Mutex::new(HashMap::new()),
            }),
            pool: Some(pool),
            pending: None,
        })
    }

    /// Queue an update for a new loader position and return immediately.
    ///
    /// A loader so far out that its square leaves the chunk grid is rejected
    /// with `Error::Streaming` and nothing is queued.
    pub fn update(&mut self, loader_position: Vec3) -> Result<()> {
        if self.pending.is_some() {
            return Err(Error::UpdateInFlight);
        }
        let pool = self
            .pool
            .as_ref()
            .ok_or_else(|| Error::WorkerPool("worker pool has shut down".to_string()))?;

        let center = world_to_chunk(loader_position).on_layer(0);
        let desired = desired_coords(center, self.shared.config.render_distance)?;
        let shared = Arc::clone(&self.shared);
        self.pending = Some(pool.submit(move || shared.run_tick(center, desired)));
        Ok(())
    }

    /// Block until the queued update finishes. `Ok(None)` if none was queued.
    pub fn wait_for_update(&mut self) -> Result<Option<TickReport>> {
        match self.pending.take() {
            Some(handle) => handle.wait().map(Some),
            None => Ok(None),
        }
    }

    /// Result of the queued update if it has finished
    pub fn poll_update(&mut self) -> Option<Result<TickReport>> {
        let result = self.pending.as_mut()?.try_take()?;
        self.pending = None;
        Some(result)
    }

    /// Run one update to completion
    pub fn tick(&mut self, loader_position: Vec3) -> Result<TickReport> {
        self.update(loader_position)?;
        self.wait_for_update()?
            .ok_or_else(|| Error::Streaming("update finished without a report".to_string()))
    }

    pub fn is_updating(&self) -> bool {
        self.pending.is_some()
    }

    /// Loaded coordinates, sorted
    pub fn loaded_coords(&self) -> Vec<ChunkCoord> {
        let mut coords: Vec<ChunkCoord> = self.shared.lock_loaded().keys().copied().collect();
        coords.sort();
        coords
    }

    pub fn loaded_count(&self) -> usize {
        self.shared.lock_loaded().len()
    }

    pub fn is_loaded(&self, coord: ChunkCoord) -> bool {
        self.shared.lock_loaded().contains_key(&coord)
    }

    pub fn chunk(&self, coord: ChunkCoord) -> Option<Arc<Chunk>> {
        self.shared.lock_loaded().get(&coord).map(|c| Arc::clone(&c.chunk))
    }

    pub fn entity(&self, coord: ChunkCoord) -> Option<Entity> {
        self.shared.lock_loaded().get(&coord).map(|c| c.entity)
    }

    pub fn loaded_chunk(&self, coord: ChunkCoord) -> Option<LoadedChunk> {
        self.shared.lock_loaded().get(&coord).cloned()
    }

    pub fn config(&self) -> &StreamingConfig {
        &self.shared.config
    }

    pub fn registry(&self) -> &Arc<R> {
        &self.shared.registry
    }

    pub fn root_entity(&self) -> Entity {
        self.shared.root
    }

    /// Finish any queued update, unload everything and join the workers
    pub fn shutdown(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        let Some(pool) = self.pool.take() else {
            return;
        };

        if let Some(handle) = self.pending.take() {
            if let Err(e) = handle.wait() {
                log::error!("Pending world update failed during shutdown: {}", e);
            }
        }

        let drained: Vec<(ChunkCoord, LoadedChunk)> = self.shared.lock_loaded().drain().collect();
        for (coord, loaded) in &drained {
            self.shared.unload_chunk(*coord, loaded);
        }
        self.shared.registry.unregister(&self.shared.config.root_entity);

        pool.shutdown();
        log::info!("World streamer shut down ({} chunks unloaded)", drained.len());
    }
}

impl<R: EntityRegistry> Drop for WorldStreamer<R> {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl<R: EntityRegistry> std::fmt::Debug for WorldStreamer<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorldStreamer")
            .field("config", &self.shared.config)
            .field("loaded", &self.loaded_count())
            .field("updating", &self.is_updating())
            .finish()
    }
}
