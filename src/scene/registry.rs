//! Entity registry seam used by the world streamer

use glam::Vec3;
use hecs::{Component, Entity};

use super::components::Transform;
use crate::core::Result;

/// Named entities with components and a parent hierarchy.
///
/// Implementations are internally synchronized: chunk generation registers
/// and decorates entities from several worker threads at once.
pub trait EntityRegistry: Send + Sync + 'static {
    /// Create an entity under a unique name
    fn register(&self, name: &str) -> Result<Entity>;

    /// Remove the named entity and everything parented under it.
    /// Returns false if no entity has that name.
    fn unregister(&self, name: &str) -> bool;

    fn lookup(&self, name: &str) -> Option<Entity>;

    /// Attach a component, replacing any previous one of the same type
    fn add_component<T: Component>(&self, entity: Entity, component: T) -> Result<()>;

    /// Copy of a component, if the entity has one
    fn get_component<T: Component + Clone>(&self, entity: Entity) -> Option<T>;

    fn set_local_position(&self, entity: Entity, position: Vec3) -> Result<()>;

    fn transform(&self, entity: Entity) -> Option<Transform>;

    fn set_parent(&self, child: Entity, parent: Entity) -> Result<()>;

    /// Direct children of an entity
    fn children(&self, parent: Entity) -> Vec<Entity>;

    /// Number of live entities
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
