//! Runtime component registry
//!
//! Maps a component's serialized name to the functions that encode it out of
//! a scene and decode it back in. Components register themselves through
//! [`ComponentRegistry::register`]; nothing enumerates them centrally.

use std::any::TypeId;
use std::collections::HashMap;

use crate::ecs::components;
use crate::ecs::{Component, EntityId, Scene};
use crate::serialization::{DecodeContext, DecodeError, FieldTree};

/// A component that can be written to and read from a [`FieldTree`]
pub trait SerializableComponent: Component + Default {
    /// Field name used for this component in entity records
    const NAME: &'static str;

    /// Encode the component's fields
    fn encode(&self) -> FieldTree;

    /// Decode a component. Missing fields fall back to defaults; fields of
    /// the wrong type are errors.
    fn decode(tree: &FieldTree, ctx: &mut DecodeContext<'_>) -> Result<Self, DecodeError>;
}

type EncodeFn = fn(&Scene, EntityId) -> Option<FieldTree>;
type DecodeFn = fn(&mut Scene, EntityId, &FieldTree, &mut DecodeContext<'_>) -> Result<(), DecodeError>;
type DefaultFn = fn(&mut Scene, EntityId);

/// Type-erased encode/decode entry for one component type
#[derive(Clone, Copy)]
pub struct ComponentDescriptor {
    name: &'static str,
    type_id: TypeId,
    encode: EncodeFn,
    decode: DecodeFn,
    insert_default: DefaultFn,
}

impl ComponentDescriptor {
    fn of<T: SerializableComponent>() -> Self {
        Self {
            name: T::NAME,
            type_id: TypeId::of::<T>(),
            encode: encode_component::<T>,
            decode: decode_component::<T>,
            insert_default: insert_default::<T>,
        }
    }

    /// Serialized field name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Encode the entity's component, if it has one
    pub fn encode(&self, scene: &Scene, entity: EntityId) -> Option<FieldTree> {
        (self.encode)(scene, entity)
    }

    /// Decode `tree` and insert the result on `entity`
    pub fn decode(
        &self,
        scene: &mut Scene,
        entity: EntityId,
        tree: &FieldTree,
        ctx: &mut DecodeContext<'_>,
    ) -> Result<(), DecodeError> {
        (self.decode)(scene, entity, tree, ctx)
    }

    /// Insert a default-initialized component on `entity`
    pub fn insert_default(&self, scene: &mut Scene, entity: EntityId) {
        (self.insert_default)(scene, entity);
    }
}

impl std::fmt::Debug for ComponentDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentDescriptor").field("name", &self.name).finish()
    }
}

fn encode_component<T: SerializableComponent>(scene: &Scene, entity: EntityId) -> Option<FieldTree> {
    scene.try_get::<T>(entity).map(T::encode)
}

fn decode_component<T: SerializableComponent>(
    scene: &mut Scene,
    entity: EntityId,
    tree: &FieldTree,
    ctx: &mut DecodeContext<'_>,
) -> Result<(), DecodeError> {
    let component = T::decode(tree, ctx)?;
    scene.insert(entity, component);
    Ok(())
}

fn insert_default<T: SerializableComponent>(scene: &mut Scene, entity: EntityId) {
    scene.insert(entity, T::default());
}

/// Registry of serializable component types, in registration order
#[derive(Debug, Clone)]
pub struct ComponentRegistry {
    descriptors: Vec<ComponentDescriptor>,
    by_name: HashMap<&'static str, usize>,
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

impl ComponentRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            descriptors: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    /// Registry preloaded with the built-in components.
    ///
    /// This is only the default set: any other [`SerializableComponent`]
    /// joins through [`ComponentRegistry::register`].
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        components::register_builtin(&mut registry);
        registry
    }

    /// Register `T`. Registering a second type under an existing name
    /// replaces the earlier entry.
    pub fn register<T: SerializableComponent>(&mut self) -> &mut Self {
        let descriptor = ComponentDescriptor::of::<T>();
        match self.by_name.get(T::NAME) {
            Some(&index) => {
                if self.descriptors[index].type_id != descriptor.type_id {
                    log::warn!(
                        "Component name '{}' re-registered by {}",
                        T::NAME,
                        std::any::type_name::<T>()
                    );
                }
                self.descriptors[index] = descriptor;
            }
            None => {
                self.by_name.insert(T::NAME, self.descriptors.len());
                self.descriptors.push(descriptor);
            }
        }
        self
    }

    /// Look up a descriptor by serialized name
    pub fn get(&self, name: &str) -> Option<&ComponentDescriptor> {
        self.by_name.get(name).map(|&index| &self.descriptors[index])
    }

    /// Whether a name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Descriptors in registration order
    pub fn iter(&self) -> impl Iterator<Item = &ComponentDescriptor> {
        self.descriptors.iter()
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::TransformMatrixComponent;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Marker {
        level: u32,
    }

    impl Component for Marker {}

    impl SerializableComponent for Marker {
        const NAME: &'static str = "Tag";

        fn encode(&self) -> FieldTree {
            FieldTree::new().with("level", self.level)
        }

        fn decode(tree: &FieldTree, _ctx: &mut DecodeContext<'_>) -> Result<Self, DecodeError> {
            Ok(Self { level: tree.get_or("level", 0)? })
        }
    }

    #[test]
    fn test_builtin_names() {
        let registry = ComponentRegistry::with_builtin();
        let names: Vec<_> = registry.iter().map(ComponentDescriptor::name).collect();
        assert_eq!(names, vec!["Tag", "Transform", "Hierarchy", "MeshRenderer", "Script", "Movement"]);
        assert!(!registry.contains("TransformMatrix"));
    }

    #[test]
    fn test_reregistration_replaces() {
        let mut registry = ComponentRegistry::with_builtin();
        let before = registry.len();
        registry.register::<Marker>();
        assert_eq!(registry.len(), before);
        assert_eq!(registry.get("Tag").map(|d| d.type_id), Some(TypeId::of::<Marker>()));
    }

    #[test]
    fn test_encode_only_present_components() {
        let registry = ComponentRegistry::with_builtin();
        let mut scene = Scene::new("registry");
        let entity = scene.create_entity("Crate");

        let tag = registry.get("Tag").unwrap();
        let movement = registry.get("Movement").unwrap();
        assert_eq!(
            tag.encode(&scene, entity).and_then(|tree| tree.get::<String>("name").ok()),
            Some("Crate".to_string())
        );
        assert!(movement.encode(&scene, entity).is_none());
        assert!(scene.has::<TransformMatrixComponent>(entity));
    }
}
