//! Entity registry: named entities, components and parenting

pub mod components;
pub mod registry;
pub mod world;

pub use components::{Name, Parent, Transform};
pub use registry::EntityRegistry;
pub use world::Scene;
