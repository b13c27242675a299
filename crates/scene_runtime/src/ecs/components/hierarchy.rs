//! Hierarchy links
//!
//! Children of a parent form a circular doubly linked list through
//! `prev_sibling` / `next_sibling`. A single child links to itself on both
//! sides. All links are [`EntityId`]s within the same scene.

use crate::ecs::registry::SerializableComponent;
use crate::ecs::{Component, EntityId};
use crate::serialization::{DecodeContext, DecodeError, FieldTree};

/// Parent, sibling and child links of an entity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HierarchyComponent {
    /// Parent entity, null for roots
    pub parent: EntityId,
    /// Previous sibling in the parent's ring
    pub prev_sibling: EntityId,
    /// Next sibling in the parent's ring
    pub next_sibling: EntityId,
    /// Head of the child ring
    pub first_child: EntityId,
    /// Tail of the child ring
    pub last_child: EntityId,
}

impl Component for HierarchyComponent {}

impl HierarchyComponent {
    /// Whether the entity has a parent
    pub fn has_parent(&self) -> bool {
        self.parent.is_valid()
    }

    /// Whether the entity has no children
    pub fn is_leaf(&self) -> bool {
        self.first_child.is_null()
    }
}

impl SerializableComponent for HierarchyComponent {
    const NAME: &'static str = "Hierarchy";

    fn encode(&self) -> FieldTree {
        FieldTree::new()
            .with("parent", self.parent)
            .with("prev_sibling", self.prev_sibling)
            .with("next_sibling", self.next_sibling)
            .with("first_child", self.first_child)
            .with("last_child", self.last_child)
    }

    fn decode(tree: &FieldTree, _ctx: &mut DecodeContext<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            parent: tree.get_or("parent", EntityId::NULL)?,
            prev_sibling: tree.get_or("prev_sibling", EntityId::NULL)?,
            next_sibling: tree.get_or("next_sibling", EntityId::NULL)?,
            first_child: tree.get_or("first_child", EntityId::NULL)?,
            last_child: tree.get_or("last_child", EntityId::NULL)?,
        })
    }
}
