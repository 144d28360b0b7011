//! `hecs`-backed entity registry

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use glam::Vec3;
use hecs::{Component, Entity, World};

use super::components::{Name, Parent, Transform};
use super::registry::EntityRegistry;
use crate::core::{Error, Result};

struct SceneInner {
    world: World,
    names: HashMap<String, Entity>,
}

impl SceneInner {
    fn children_of(&self, parent: Entity) -> Vec<Entity> {
        self.world
            .query::<&Parent>()
            .iter()
            .filter(|(_, p)| p.0 == parent)
            .map(|(e, _)| e)
            .collect()
    }

    /// Entity plus all descendants, parents first
    fn subtree(&self, root: Entity) -> Vec<Entity> {
        let mut out = vec![root];
        let mut i = 0;
        while i < out.len() {
            let children = self.children_of(out[i]);
            out.extend(children);
            i += 1;
        }
        out
    }
}

/// Entity arena plus a name index, behind one mutex.
pub struct Scene {
    inner: Mutex<SceneInner>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene").field("entities", &self.len()).finish()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(SceneInner {
                world: World::new(),
                names: HashMap::new(),
            }),
        }
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().names.keys().cloned().collect();
        names.sort();
        names
    }

    /// Name of a live entity
    pub fn name_of(&self, entity: Entity) -> Option<String> {
        self.get_component::<Name>(entity).map(|n| n.0)
    }

    fn lock(&self) -> MutexGuard<'_, SceneInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl EntityRegistry for Scene {
    fn register(&self, name: &str) -> Result<Entity> {
        let mut inner = self.lock();
        if inner.names.contains_key(name) {
            return Err(Error::DuplicateEntity(name.to_string()));
        }

        let entity = inner.world.spawn((Name(name.to_string()), Transform::default()));
        inner.names.insert(name.to_string(), entity);
        log::trace!("Registered entity '{}'", name);
        Ok(entity)
    }

    fn unregister(&self, name: &str) -> bool {
        let mut inner = self.lock();
        let Some(&entity) = inner.names.get(name) else {
            return false;
        };

        for e in inner.subtree(entity) {
            let removed = inner.world.get::<&Name>(e).ok().map(|n| n.0.clone());
            if let Some(removed) = removed {
                inner.names.remove(&removed);
            }
            // Subtree entries are live, collected under the same lock
            let _ = inner.world.despawn(e);
        }
        log::trace!("Unregistered entity '{}'", name);
        true
    }

    fn lookup(&self, name: &str) -> Option<Entity> {
        self.lock().names.get(name).copied()
    }

    fn add_component<T: Component>(&self, entity: Entity, component: T) -> Result<()> {
        self.lock().world.insert_one(entity, component)?;
        Ok(())
    }

    fn get_component<T: Component + Clone>(&self, entity: Entity) -> Option<T> {
        let inner = self.lock();
        let component = inner.world.get::<&T>(entity).ok()?;
        Some((*component).clone())
    }

    fn set_local_position(&self, entity: Entity, position: Vec3) -> Result<()> {
        let inner = self.lock();
        let mut transform = inner
            .world
            .get::<&mut Transform>(entity)
            .map_err(|_| Error::NoSuchEntity)?;
        transform.position = position;
        Ok(())
    }

    fn transform(&self, entity: Entity) -> Option<Transform> {
        self.get_component::<Transform>(entity)
    }

    fn set_parent(&self, child: Entity, parent: Entity) -> Result<()> {
        let mut inner = self.lock();
        if !inner.world.contains(parent) {
            return Err(Error::NoSuchEntity);
        }
        inner.world.insert_one(child, Parent(parent))?;
        Ok(())
    }

    fn children(&self, parent: Entity) -> Vec<Entity> {
        self.lock().children_of(parent)
    }

    fn len(&self) -> usize {
        self.lock().world.len() as usize
    }
}
