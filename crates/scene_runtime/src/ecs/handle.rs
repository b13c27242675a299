//! Entity handles
//!
//! An entity id paired with the scene that defines it. Handles do not own
//! anything; they scope typed component access to one scene.

use crate::ecs::{Component, EntityId, Scene};

/// Read-only handle to an entity
#[derive(Clone, Copy)]
pub struct EntityRef<'a> {
    id: EntityId,
    scene: &'a Scene,
}

impl<'a> EntityRef<'a> {
    pub(crate) fn new(scene: &'a Scene, id: EntityId) -> Self {
        Self { id, scene }
    }

    /// Entity id
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Owning scene
    pub fn scene(&self) -> &'a Scene {
        self.scene
    }

    /// Whether the entity is alive
    pub fn is_alive(&self) -> bool {
        self.scene.is_alive(self.id)
    }

    /// Whether the entity has a `T`
    pub fn has<T: Component>(&self) -> bool {
        self.scene.has::<T>(self.id)
    }

    /// Borrow the entity's `T`.
    ///
    /// # Panics
    /// If the entity has no `T`.
    pub fn get<T: Component>(&self) -> &'a T {
        self.scene.get::<T>(self.id)
    }

    /// Borrow the entity's `T` if present
    pub fn try_get<T: Component>(&self) -> Option<&'a T> {
        self.scene.try_get::<T>(self.id)
    }
}

/// Mutable handle to an entity
pub struct EntityMut<'a> {
    id: EntityId,
    scene: &'a mut Scene,
}

impl<'a> EntityMut<'a> {
    pub(crate) fn new(scene: &'a mut Scene, id: EntityId) -> Self {
        Self { id, scene }
    }

    /// Entity id
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Reborrow as a read-only handle
    pub fn as_readonly(&self) -> EntityRef<'_> {
        EntityRef::new(self.scene, self.id)
    }

    /// Whether the entity has a `T`
    pub fn has<T: Component>(&self) -> bool {
        self.scene.has::<T>(self.id)
    }

    /// Borrow the entity's `T`.
    ///
    /// # Panics
    /// If the entity has no `T`.
    pub fn get<T: Component>(&self) -> &T {
        self.scene.get::<T>(self.id)
    }

    /// Mutably borrow the entity's `T`.
    ///
    /// # Panics
    /// If the entity has no `T`.
    pub fn get_mut<T: Component>(&mut self) -> &mut T {
        self.scene.get_mut::<T>(self.id)
    }

    /// Attach a `T`.
    ///
    /// # Panics
    /// If the entity already has a `T`.
    pub fn add<T: Component>(&mut self, component: T) -> &mut T {
        self.scene.add(self.id, component)
    }

    /// Detach the entity's `T`.
    ///
    /// # Panics
    /// If the entity has no `T`.
    pub fn remove<T: Component>(&mut self) -> T {
        self.scene.remove::<T>(self.id)
    }

    /// Builder-style [`EntityMut::add`]
    pub fn with<T: Component>(mut self, component: T) -> Self {
        self.add(component);
        self
    }
}

#[cfg(test)]
mod tests {
    use crate::ecs::components::{MovementComponent, TagComponent};
    use crate::ecs::Scene;

    #[test]
    fn test_handle_component_access() {
        let mut scene = Scene::new("handles");
        let id = scene.create_entity("Ship");

        let mut handle = scene.entity_mut(id).with(MovementComponent::new());
        assert!(handle.has::<MovementComponent>());
        handle.get_mut::<TagComponent>().name = "Renamed".into();
        let movement = handle.remove::<MovementComponent>();
        assert!(movement.enabled);

        let view = scene.entity(id);
        assert!(view.is_alive());
        assert!(!view.has::<MovementComponent>());
        assert_eq!(view.get::<TagComponent>().name, "Renamed");
        assert!(view.try_get::<MovementComponent>().is_none());
    }

    #[test]
    #[should_panic(expected = "has no component")]
    fn test_remove_missing_panics() {
        let mut scene = Scene::new("handles");
        let id = scene.create_entity("Ship");
        scene.entity_mut(id).remove::<MovementComponent>();
    }
}
