//! Script component

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::ecs::registry::SerializableComponent;
use crate::ecs::Component;
use crate::serialization::{DecodeContext, DecodeError, FieldTree};

/// Opaque per-entity state owned by the scripting engine
#[derive(Clone)]
pub struct ScriptInstance(Arc<dyn Any + Send + Sync>);

impl ScriptInstance {
    /// Wrap scripting state
    pub fn new<T: Any + Send + Sync>(state: T) -> Self {
        Self(Arc::new(state))
    }

    /// Borrow the state as `T`
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }

    /// Whether two instances share the same state object
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ScriptInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptInstance").finish_non_exhaustive()
    }
}

/// Binds an entity to a script class.
///
/// Only the class name is persisted; the instance is recreated by the
/// scripting engine after load.
#[derive(Debug, Clone, Default)]
pub struct ScriptComponent {
    /// Script class to instantiate
    pub class_name: String,
    /// Live instance, if the scripting engine attached one
    pub instance: Option<ScriptInstance>,
}

impl Component for ScriptComponent {}

impl ScriptComponent {
    /// Create an unbound script component
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            instance: None,
        }
    }
}

impl SerializableComponent for ScriptComponent {
    const NAME: &'static str = "Script";

    fn encode(&self) -> FieldTree {
        FieldTree::new().with("class_name", self.class_name.as_str())
    }

    fn decode(tree: &FieldTree, _ctx: &mut DecodeContext<'_>) -> Result<Self, DecodeError> {
        Ok(Self::new(tree.get::<String>("class_name")?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_survives_clone() {
        let mut script = ScriptComponent::new("Spinner");
        script.instance = Some(ScriptInstance::new(42_u32));

        let copy = script.clone();
        let (a, b) = (script.instance.unwrap(), copy.instance.unwrap());
        assert!(a.ptr_eq(&b));
        assert_eq!(b.downcast_ref::<u32>(), Some(&42));
    }
}
