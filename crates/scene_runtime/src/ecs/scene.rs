//! Component store
//!
//! A [`Scene`] owns every entity of one world and one sparse-set storage per
//! component type. Storages are created on first insert and looked up by
//! `TypeId`.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;

use serde::{Serialize, Deserialize};
use uuid::Uuid;

use crate::ecs::components::{
    HierarchyComponent, TagComponent, TransformComponent, TransformMatrixComponent,
};
use crate::ecs::entity::EntityAllocator;
use crate::ecs::handle::{EntityMut, EntityRef};
use crate::ecs::query::{View, ViewQuery};
use crate::ecs::storage::{ComponentStorage, ErasedStorage};
use crate::ecs::{Component, EntityId};

/// Stable scene identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SceneId(Uuid);

impl SceneId {
    /// Fresh random identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Underlying UUID
    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Entities and their components for one world
pub struct Scene {
    id: SceneId,
    name: String,
    entities: EntityAllocator,
    storages: HashMap<TypeId, Box<dyn ErasedStorage>>,
}

impl Clone for Scene {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            name: self.name.clone(),
            entities: self.entities.clone(),
            storages: self
                .storages
                .iter()
                .map(|(type_id, storage)| (*type_id, storage.clone_boxed()))
                .collect(),
        }
    }
}

impl fmt::Debug for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut components: Vec<_> = self
            .storages
            .values()
            .map(|storage| (storage.component_name(), storage.len()))
            .collect();
        components.sort_unstable();

        f.debug_struct("Scene")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("entities", &self.entities.len())
            .field("components", &components)
            .finish()
    }
}

impl Scene {
    /// Create an empty scene with a fresh identifier
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(SceneId::generate(), name)
    }

    /// Create an empty scene with a known identifier
    pub fn with_id(id: SceneId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            entities: EntityAllocator::default(),
            storages: HashMap::new(),
        }
    }

    /// Scene identifier
    pub fn id(&self) -> SceneId {
        self.id
    }

    /// Human-readable name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the scene
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    // Entities

    /// Create an entity with the standard component set: local and world
    /// transforms, a tag and detached hierarchy links.
    ///
    /// # Panics
    ///
    /// Panics if every entity id of the scene is in use.
    pub fn create_entity(&mut self, name: impl Into<String>) -> EntityId {
        let entity = self.allocate_entity();
        self.insert(entity, TransformComponent::default());
        self.insert(entity, TransformMatrixComponent::default());
        self.insert(entity, TagComponent::new(name));
        self.insert(entity, HierarchyComponent::default());
        entity
    }

    /// Create an entity with no components.
    ///
    /// When `hint` names a free slot the new entity takes exactly that id,
    /// which is how serialized scenes keep their identities on load.
    ///
    /// # Panics
    ///
    /// Panics if every entity id of the scene is in use.
    pub fn create_empty_entity(&mut self, hint: Option<EntityId>) -> EntityId {
        self.try_create_empty_entity(hint)
            .unwrap_or_else(|| ids_exhausted(&self.name))
    }

    /// Like [`Scene::create_empty_entity`], but returns `None` instead of
    /// panicking when no id is left.
    ///
    /// A hint that is taken, or too far past the ids in use, yields some
    /// other free id.
    pub fn try_create_empty_entity(&mut self, hint: Option<EntityId>) -> Option<EntityId> {
        match hint {
            Some(hint) => {
                let entity = self.entities.allocate_hint(hint)?;
                if entity != hint {
                    log::warn!("{} unavailable in scene '{}', allocated {}", hint, self.name, entity);
                }
                Some(entity)
            }
            None => self.entities.allocate(),
        }
    }

    fn allocate_entity(&mut self) -> EntityId {
        self.entities.allocate().unwrap_or_else(|| ids_exhausted(&self.name))
    }

    /// Copy every component of `source` onto a new entity.
    ///
    /// Hierarchy links start detached; if `source` has a parent the clone is
    /// attached under it as the last sibling with the same local transform.
    pub fn clone_entity(&mut self, source: EntityId) -> EntityId {
        assert!(self.is_alive(source), "clone_entity: {} is not alive", source);

        let clone = self.allocate_entity();
        let hierarchy = TypeId::of::<HierarchyComponent>();
        for (type_id, storage) in &mut self.storages {
            if *type_id != hierarchy {
                storage.copy_component(source, clone);
            }
        }

        let parent = self
            .try_get::<HierarchyComponent>(source)
            .map_or(EntityId::NULL, |links| links.parent);
        if self.has::<HierarchyComponent>(source) {
            self.insert(clone, HierarchyComponent::default());
        }

        if parent.is_valid() {
            let local = self.try_get::<TransformComponent>(source).cloned();
            match self.parent(clone, parent) {
                Ok(()) => {
                    if let Some(local) = local {
                        self.insert(clone, local);
                    }
                }
                Err(err) => log::error!("Failed to attach clone {} under {}: {}", clone, parent, err),
            }
        }

        clone
    }

    /// Release all components of `entity` and free its id.
    ///
    /// Hierarchy links on other entities are left untouched; use
    /// [`Scene::delete_entity_tree`] to keep the hierarchy consistent.
    pub fn delete_entity(&mut self, entity: EntityId) -> bool {
        if !self.entities.release(entity) {
            log::warn!("delete_entity: {} is not alive", entity);
            return false;
        }
        for storage in self.storages.values_mut() {
            storage.remove_entity(entity);
        }
        true
    }

    /// Whether `entity` is alive in this scene
    pub fn is_alive(&self, entity: EntityId) -> bool {
        self.entities.is_alive(entity)
    }

    /// Number of live entities
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Live entities in ascending id order
    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.iter()
    }

    /// Invoke `f` for every live entity regardless of its components
    pub fn each(&self, mut f: impl FnMut(EntityId)) {
        for entity in self.entities.iter() {
            f(entity);
        }
    }

    /// First entity whose tag matches `name`
    pub fn find_by_name(&self, name: &str) -> Option<EntityId> {
        let tags = self.storage::<TagComponent>()?;
        tags.iter()
            .filter(|(_, tag)| tag.name == name)
            .map(|(entity, _)| entity)
            .min()
    }

    /// Immutable handle to `entity`
    pub fn entity(&self, entity: EntityId) -> EntityRef<'_> {
        EntityRef::new(self, entity)
    }

    /// Mutable handle to `entity`
    pub fn entity_mut(&mut self, entity: EntityId) -> EntityMut<'_> {
        EntityMut::new(self, entity)
    }

    // Components

    /// Whether `entity` has a `T`
    pub fn has<T: Component>(&self, entity: EntityId) -> bool {
        self.storage::<T>().is_some_and(|storage| storage.contains(entity))
    }

    /// Borrow the `T` of `entity`.
    ///
    /// # Panics
    /// If `entity` has no `T`.
    pub fn get<T: Component>(&self, entity: EntityId) -> &T {
        match self.try_get(entity) {
            Some(component) => component,
            None => missing_component::<T>(entity),
        }
    }

    /// Mutably borrow the `T` of `entity`.
    ///
    /// # Panics
    /// If `entity` has no `T`.
    pub fn get_mut<T: Component>(&mut self, entity: EntityId) -> &mut T {
        match self.try_get_mut(entity) {
            Some(component) => component,
            None => missing_component::<T>(entity),
        }
    }

    /// Borrow the `T` of `entity` if present
    pub fn try_get<T: Component>(&self, entity: EntityId) -> Option<&T> {
        self.storage::<T>()?.get(entity)
    }

    /// Mutably borrow the `T` of `entity` if present
    pub fn try_get_mut<T: Component>(&mut self, entity: EntityId) -> Option<&mut T> {
        self.storage_mut::<T>()?.get_mut(entity)
    }

    /// Attach a new `T` to `entity`.
    ///
    /// # Panics
    /// If `entity` is dead or already has a `T`.
    pub fn add<T: Component>(&mut self, entity: EntityId, component: T) -> &mut T {
        assert!(self.is_alive(entity), "add::<{}>: {} is not alive", std::any::type_name::<T>(), entity);
        assert!(
            !self.has::<T>(entity),
            "add::<{}>: {} already has this component",
            std::any::type_name::<T>(),
            entity
        );
        let storage = self.storage_or_insert::<T>();
        storage.insert(entity, component);
        storage.get_mut(entity).unwrap_or_else(|| missing_component::<T>(entity))
    }

    /// Attach or replace the `T` of `entity`, returning the previous value.
    /// Ignored (with a warning) for dead entities.
    pub fn insert<T: Component>(&mut self, entity: EntityId, component: T) -> Option<T> {
        if !self.is_alive(entity) {
            log::warn!("insert::<{}>: {} is not alive", std::any::type_name::<T>(), entity);
            return None;
        }
        self.storage_or_insert::<T>().insert(entity, component)
    }

    /// Detach and return the `T` of `entity`.
    ///
    /// # Panics
    /// If `entity` has no `T`.
    pub fn remove<T: Component>(&mut self, entity: EntityId) -> T {
        match self.try_remove(entity) {
            Some(component) => component,
            None => missing_component::<T>(entity),
        }
    }

    /// Detach the `T` of `entity` if present
    pub fn try_remove<T: Component>(&mut self, entity: EntityId) -> Option<T> {
        self.storage_mut::<T>()?.remove(entity)
    }

    /// Number of entities holding a `T`
    pub fn component_count<T: Component>(&self) -> usize {
        self.storage::<T>().map_or(0, ComponentStorage::len)
    }

    /// Type names of every component on `entity`, sorted
    pub fn component_names(&self, entity: EntityId) -> Vec<&'static str> {
        let mut names: Vec<_> = self
            .storages
            .values()
            .filter(|storage| storage.contains(entity))
            .map(|storage| storage.component_name())
            .collect();
        names.sort_unstable();
        names
    }

    // Iteration

    /// Lazy view over entities holding every component in `Q`
    pub fn view<Q: ViewQuery>(&self) -> View<'_, Q> {
        View::new(self)
    }

    /// Iterate every `T` with its entity
    pub fn query<T: Component>(&self) -> impl Iterator<Item = (EntityId, &T)> {
        self.storage::<T>().into_iter().flat_map(|storage| storage.iter())
    }

    /// Mutably iterate every `T` with its entity
    pub fn query_mut<T: Component>(&mut self) -> impl Iterator<Item = (EntityId, &mut T)> {
        self.storage_mut::<T>().into_iter().flat_map(|storage| storage.iter_mut())
    }

    /// Call `f` with mutable access to `A` and `B` for every entity holding both.
    ///
    /// # Panics
    /// If `A` and `B` are the same type.
    pub fn query_mut2<A: Component, B: Component>(&mut self, mut f: impl FnMut(EntityId, &mut A, &mut B)) {
        assert_ne!(
            TypeId::of::<A>(),
            TypeId::of::<B>(),
            "query_mut2 needs two distinct component types"
        );

        let Some(mut second) = self.storages.remove(&TypeId::of::<B>()) else {
            return;
        };
        if let (Some(first), Some(seconds)) = (
            self.storage_mut::<A>(),
            second.as_any_mut().downcast_mut::<ComponentStorage<B>>(),
        ) {
            for (entity, a) in first.iter_mut() {
                if let Some(b) = seconds.get_mut(entity) {
                    f(entity, a, b);
                }
            }
        }
        self.storages.insert(TypeId::of::<B>(), second);
    }

    // Storage access

    pub(crate) fn storage<T: Component>(&self) -> Option<&ComponentStorage<T>> {
        self.storages
            .get(&TypeId::of::<T>())?
            .as_any()
            .downcast_ref::<ComponentStorage<T>>()
    }

    pub(crate) fn storage_mut<T: Component>(&mut self) -> Option<&mut ComponentStorage<T>> {
        self.storages
            .get_mut(&TypeId::of::<T>())?
            .as_any_mut()
            .downcast_mut::<ComponentStorage<T>>()
    }

    fn storage_or_insert<T: Component>(&mut self) -> &mut ComponentStorage<T> {
        let storage = self
            .storages
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(ComponentStorage::<T>::new()) as Box<dyn ErasedStorage>);
        match storage.as_any_mut().downcast_mut::<ComponentStorage<T>>() {
            Some(storage) => storage,
            None => unreachable!("storage registered under the wrong TypeId"),
        }
    }
}

#[cold]
#[track_caller]
fn ids_exhausted(scene: &str) -> ! {
    panic!("scene '{}' has no free entity ids", scene)
}

fn missing_component<T>(entity: EntityId) -> ! {
    panic!("{} has no component {}", entity, std::any::type_name::<T>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::MovementComponent;
    use crate::foundation::math::Vec3;

    #[test]
    fn test_create_entity_has_standard_components() {
        let mut scene = Scene::new("test");
        let entity = scene.create_entity("Player");

        assert!(scene.has::<TransformComponent>(entity));
        assert!(scene.has::<TransformMatrixComponent>(entity));
        assert!(scene.has::<HierarchyComponent>(entity));
        assert_eq!(scene.get::<TagComponent>(entity).name, "Player");
        assert_eq!(*scene.get::<HierarchyComponent>(entity), HierarchyComponent::default());
    }

    #[test]
    fn test_empty_entity_honours_hint() {
        let mut scene = Scene::new("test");
        let entity = scene.create_empty_entity(Some(EntityId::from_raw(7)));

        assert_eq!(entity, EntityId::from_raw(7));
        assert!(scene.component_names(entity).is_empty());

        let again = scene.create_empty_entity(Some(EntityId::from_raw(7)));
        assert_ne!(again, entity);
    }

    #[test]
    fn test_delete_releases_components_and_id() {
        let mut scene = Scene::new("test");
        let a = scene.create_entity("A");
        let b = scene.create_entity("B");

        assert!(scene.delete_entity(a));
        assert!(!scene.delete_entity(a));
        assert!(!scene.has::<TagComponent>(a));
        assert_eq!(scene.entity_count(), 1);
        assert_eq!(scene.component_count::<TagComponent>(), 1);

        // Slot is recycled
        assert_eq!(scene.create_entity("C"), a);
        assert_eq!(scene.get::<TagComponent>(b).name, "B");
    }

    #[test]
    #[should_panic(expected = "has no component")]
    fn test_get_missing_component_panics() {
        let mut scene = Scene::new("test");
        let entity = scene.create_entity("A");
        let _ = scene.get::<MovementComponent>(entity);
    }

    #[test]
    #[should_panic(expected = "already has this component")]
    fn test_double_add_panics() {
        let mut scene = Scene::new("test");
        let entity = scene.create_entity("A");
        scene.add(entity, TagComponent::new("again"));
    }

    #[test]
    fn test_clone_entity_copies_components_but_not_links() {
        let mut scene = Scene::new("test");
        let source = scene.create_entity("Source");
        scene.add(source, MovementComponent::with_velocity(Vec3::x()));

        let clone = scene.clone_entity(source);
        assert_ne!(clone, source);
        assert_eq!(scene.get::<TagComponent>(clone).name, "Source");
        assert_eq!(scene.get::<MovementComponent>(clone).velocity, Vec3::x());
        assert_eq!(*scene.get::<HierarchyComponent>(clone), HierarchyComponent::default());
    }

    #[test]
    fn test_scene_clone_is_independent() {
        let mut scene = Scene::new("test");
        let entity = scene.create_entity("A");
        let copy = scene.clone();

        scene.get_mut::<TagComponent>(entity).name = "changed".into();
        assert_eq!(copy.get::<TagComponent>(entity).name, "A");
        assert_eq!(copy.id(), scene.id());
    }

    #[test]
    fn test_query_mut2_visits_intersection() {
        let mut scene = Scene::new("test");
        let moving = scene.create_entity("moving");
        let _still = scene.create_entity("still");
        scene.add(moving, MovementComponent::with_velocity(Vec3::new(1.0, 0.0, 0.0)));

        let mut visited = Vec::new();
        scene.query_mut2::<TransformComponent, MovementComponent>(|entity, transform, movement| {
            transform.position += movement.velocity;
            visited.push(entity);
        });

        assert_eq!(visited, vec![moving]);
        assert_eq!(scene.get::<TransformComponent>(moving).position, Vec3::new(1.0, 0.0, 0.0));
        assert!(scene.has::<MovementComponent>(moving));
    }

    #[test]
    fn test_find_by_name() {
        let mut scene = Scene::new("test");
        scene.create_entity("A");
        let b = scene.create_entity("B");
        assert_eq!(scene.find_by_name("B"), Some(b));
        assert_eq!(scene.find_by_name("missing"), None);
    }
}
