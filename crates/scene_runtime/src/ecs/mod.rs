//! Entity-Component-System implementation
//!
//! Scenes own entities and their components. Hierarchy links, views and the
//! serialization registry are all built on the same sparse-set storage.

pub mod entity;
pub mod component;
pub mod storage;
pub mod scene;
pub mod handle;
pub mod query;
pub mod hierarchy;
pub mod registry;
pub mod system;
pub mod components;
pub mod systems;

#[cfg(test)]
mod tests;

pub use entity::EntityId;
pub use component::Component;
pub use storage::ComponentStorage;
pub use scene::{Scene, SceneId};
pub use handle::{EntityMut, EntityRef};
pub use query::{View, ViewIter, ViewQuery};
pub use hierarchy::HierarchyError;
pub use registry::{ComponentDescriptor, ComponentRegistry, SerializableComponent};
pub use system::System;
