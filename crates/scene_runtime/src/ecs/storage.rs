//! Sparse-set component storage
//!
//! Each component type lives in its own [`ComponentStorage`]: a dense array of
//! values plus the owning entities, and a sparse slot table mapping entity
//! slots to dense indices. Presence tests and lookups are O(1); iteration is
//! proportional to the number of components of that type.

use std::any::Any;

use super::{Component, EntityId};

const EMPTY: u32 = u32::MAX;

/// Dense storage for one component type
#[derive(Debug, Clone)]
pub struct ComponentStorage<T> {
    sparse: Vec<u32>,
    entities: Vec<EntityId>,
    components: Vec<T>,
}

impl<T> Default for ComponentStorage<T> {
    fn default() -> Self {
        Self {
            sparse: Vec::new(),
            entities: Vec::new(),
            components: Vec::new(),
        }
    }
}

impl<T> ComponentStorage<T> {
    /// Create an empty storage
    pub fn new() -> Self {
        Self::default()
    }

    fn dense_index(&self, entity: EntityId) -> Option<usize> {
        if entity.is_null() {
            return None;
        }
        match self.sparse.get(entity.index()) {
            Some(&index) if index != EMPTY => Some(index as usize),
            _ => None,
        }
    }

    /// Insert or replace the component for `entity`, returning the previous value
    pub fn insert(&mut self, entity: EntityId, component: T) -> Option<T> {
        if let Some(index) = self.dense_index(entity) {
            return Some(std::mem::replace(&mut self.components[index], component));
        }

        if self.sparse.len() <= entity.index() {
            self.sparse.resize(entity.index() + 1, EMPTY);
        }
        self.sparse[entity.index()] = self.entities.len() as u32;
        self.entities.push(entity);
        self.components.push(component);
        None
    }

    /// Remove the component for `entity`
    pub fn remove(&mut self, entity: EntityId) -> Option<T> {
        let index = self.dense_index(entity)?;
        self.sparse[entity.index()] = EMPTY;

        let last = self.entities.len() - 1;
        if index != last {
            let moved = self.entities[last];
            self.sparse[moved.index()] = index as u32;
        }
        self.entities.swap_remove(index);
        Some(self.components.swap_remove(index))
    }

    /// Whether `entity` has this component
    pub fn contains(&self, entity: EntityId) -> bool {
        self.dense_index(entity).is_some()
    }

    /// Get the component for `entity`
    pub fn get(&self, entity: EntityId) -> Option<&T> {
        self.dense_index(entity).map(|index| &self.components[index])
    }

    /// Get the component for `entity` mutably
    pub fn get_mut(&mut self, entity: EntityId) -> Option<&mut T> {
        self.dense_index(entity).map(move |index| &mut self.components[index])
    }

    /// Number of stored components
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the storage is empty
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Entities owning a component, in dense order
    pub fn entities(&self) -> &[EntityId] {
        &self.entities
    }

    /// Iterate `(entity, component)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &T)> {
        self.entities.iter().copied().zip(self.components.iter())
    }

    /// Iterate `(entity, component)` pairs mutably
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (EntityId, &mut T)> {
        self.entities.iter().copied().zip(self.components.iter_mut())
    }
}

/// Type-erased view of a [`ComponentStorage`] used by the scene for
/// operations that touch every component type of an entity.
pub(crate) trait ErasedStorage: Send + Sync {
    fn remove_entity(&mut self, entity: EntityId) -> bool;
    fn contains(&self, entity: EntityId) -> bool;
    fn len(&self) -> usize;
    /// Copy the component of `from` onto `to`. Returns false if `from` has none.
    fn copy_component(&mut self, from: EntityId, to: EntityId) -> bool;
    fn clone_boxed(&self) -> Box<dyn ErasedStorage>;
    fn component_name(&self) -> &'static str;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Component> ErasedStorage for ComponentStorage<T> {
    fn remove_entity(&mut self, entity: EntityId) -> bool {
        self.remove(entity).is_some()
    }

    fn contains(&self, entity: EntityId) -> bool {
        ComponentStorage::contains(self, entity)
    }

    fn len(&self) -> usize {
        ComponentStorage::len(self)
    }

    fn copy_component(&mut self, from: EntityId, to: EntityId) -> bool {
        match self.get(from).cloned() {
            Some(component) => {
                self.insert(to, component);
                true
            }
            None => false,
        }
    }

    fn clone_boxed(&self) -> Box<dyn ErasedStorage> {
        Box::new(self.clone())
    }

    fn component_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Health(i32);
    impl Component for Health {}

    fn id(raw: u32) -> EntityId {
        EntityId::from_raw(raw)
    }

    #[test]
    fn test_insert_get_remove() {
        let mut storage = ComponentStorage::new();
        assert_eq!(storage.insert(id(3), Health(10)), None);
        assert_eq!(storage.insert(id(3), Health(20)), Some(Health(10)));
        assert_eq!(storage.get(id(3)), Some(&Health(20)));
        assert!(!storage.contains(id(2)));
        assert!(!storage.contains(EntityId::NULL));

        assert_eq!(storage.remove(id(3)), Some(Health(20)));
        assert!(storage.is_empty());
        assert_eq!(storage.remove(id(3)), None);
    }

    #[test]
    fn test_swap_remove_keeps_sparse_table_consistent() {
        let mut storage = ComponentStorage::new();
        for raw in 0..5 {
            storage.insert(id(raw), Health(raw as i32));
        }
        storage.remove(id(1));

        for raw in [0, 2, 3, 4] {
            assert_eq!(storage.get(id(raw)), Some(&Health(raw as i32)));
        }
        assert_eq!(storage.len(), 4);
    }

    #[test]
    fn test_erased_copy_component() {
        let mut storage = ComponentStorage::new();
        storage.insert(id(0), Health(7));

        let erased: &mut dyn ErasedStorage = &mut storage;
        assert!(erased.copy_component(id(0), id(9)));
        assert!(!erased.copy_component(id(4), id(5)));
        assert_eq!(storage.get(id(9)), Some(&Health(7)));
    }
}
