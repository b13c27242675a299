//! Human-readable entity name

use crate::ecs::registry::SerializableComponent;
use crate::ecs::Component;
use crate::serialization::{DecodeContext, DecodeError, FieldTree};

/// Name shown in editors and used by [`Scene::find_by_name`](crate::ecs::Scene::find_by_name)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagComponent {
    /// Display name
    pub name: String,
}

impl TagComponent {
    /// Create a tag
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Component for TagComponent {}

impl SerializableComponent for TagComponent {
    const NAME: &'static str = "Tag";

    fn encode(&self) -> FieldTree {
        FieldTree::new().with("name", self.name.as_str())
    }

    fn decode(tree: &FieldTree, _ctx: &mut DecodeContext<'_>) -> Result<Self, DecodeError> {
        Ok(Self { name: tree.get_or("name", String::new())? })
    }
}
