//! Scene hierarchy
//!
//! Parent/child relations are stored in [`HierarchyComponent`]s. The children
//! of a parent form a circular doubly linked list, so attaching and detaching
//! are O(1) splices. Every operation checks its preconditions before touching
//! a single link: a rejected call leaves the scene exactly as it was.

use std::collections::VecDeque;

use thiserror::Error;

use crate::ecs::components::{HierarchyComponent, TransformComponent, TransformMatrixComponent};
use crate::ecs::{EntityId, Scene};
use crate::foundation::math::Mat4;

/// Rejected hierarchy operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HierarchyError {
    /// The entity is not alive in this scene
    #[error("{0} is not alive in this scene")]
    InvalidEntity(EntityId),

    /// The child must be unparented first
    #[error("{child} is already parented to {parent}")]
    AlreadyParented {
        /// Entity being attached
        child: EntityId,
        /// Its current parent
        parent: EntityId,
    },

    /// The new parent is the child itself or one of its descendants
    #[error("parenting {child} under {parent} would create a cycle")]
    WouldCreateCycle {
        /// Entity being attached
        child: EntityId,
        /// Requested parent
        parent: EntityId,
    },

    /// The new parent's world transform cannot be inverted
    #[error("world transform of {0} is singular")]
    SingularTransform(EntityId),
}

impl Scene {
    /// Attach `child` as the last child of `new_parent`, keeping its world
    /// transform unchanged.
    ///
    /// `child` must not have a parent. Rejected calls are logged and leave
    /// every link untouched.
    pub fn parent(&mut self, child: EntityId, new_parent: EntityId) -> Result<(), HierarchyError> {
        let inverse_parent = match self.check_parent(child, new_parent) {
            Ok(inverse) => inverse,
            Err(err) => {
                log::error!("Rejected parent({}, {}): {}", child, new_parent, err);
                return Err(err);
            }
        };
        let child_world = self.world_transform(child);

        self.ensure_links(child);
        self.ensure_links(new_parent);

        let parent_links = self.links(new_parent);
        if parent_links.first_child.is_null() {
            let links = self.links_mut(new_parent);
            links.first_child = child;
            links.last_child = child;

            let links = self.links_mut(child);
            links.prev_sibling = child;
            links.next_sibling = child;
        } else {
            let head = parent_links.first_child;
            let tail = parent_links.last_child;
            self.links_mut(tail).next_sibling = child;
            self.links_mut(head).prev_sibling = child;

            let links = self.links_mut(child);
            links.prev_sibling = tail;
            links.next_sibling = head;
            self.links_mut(new_parent).last_child = child;
        }
        self.links_mut(child).parent = new_parent;

        self.insert(child, TransformComponent::from_matrix(&(inverse_parent * child_world)));
        Ok(())
    }

    /// Detach `child` from its parent, keeping its world transform unchanged.
    /// Does nothing if it has no parent.
    pub fn unparent(&mut self, child: EntityId) -> Result<(), HierarchyError> {
        if !self.is_alive(child) {
            log::error!("Rejected unparent({}): not alive", child);
            return Err(HierarchyError::InvalidEntity(child));
        }

        let links = self.links(child);
        if links.parent.is_null() {
            return Ok(());
        }
        let old_parent = links.parent;
        let neighbours = if links.next_sibling == child {
            vec![old_parent]
        } else {
            vec![old_parent, links.prev_sibling, links.next_sibling]
        };
        if let Some(dead) = neighbours.into_iter().find(|linked| !self.is_alive(*linked)) {
            log::error!("Rejected unparent({}): linked to {} which is not alive", child, dead);
            return Err(HierarchyError::InvalidEntity(dead));
        }

        let parent_world = self.world_transform(old_parent);
        let local = self.local_matrix(child);

        if links.next_sibling == child {
            let parent_links = self.links_mut(old_parent);
            parent_links.first_child = EntityId::NULL;
            parent_links.last_child = EntityId::NULL;
        } else {
            self.links_mut(links.prev_sibling).next_sibling = links.next_sibling;
            self.links_mut(links.next_sibling).prev_sibling = links.prev_sibling;

            let parent_links = self.links_mut(old_parent);
            if parent_links.first_child == child {
                parent_links.first_child = links.next_sibling;
            }
            if parent_links.last_child == child {
                parent_links.last_child = links.prev_sibling;
            }
        }

        let links = self.links_mut(child);
        links.parent = EntityId::NULL;
        links.prev_sibling = EntityId::NULL;
        links.next_sibling = EntityId::NULL;

        self.insert(child, TransformComponent::from_matrix(&(parent_world * local)));
        Ok(())
    }

    /// Parent of `entity`, if any
    pub fn parent_of(&self, entity: EntityId) -> Option<EntityId> {
        self.links(entity).parent.some()
    }

    /// World matrix of `entity`: the local transforms of it and every
    /// ancestor, root-most applied last.
    pub fn world_transform(&self, entity: EntityId) -> Mat4 {
        let mut matrix = self.local_matrix(entity);
        let mut current = self.links(entity).parent;
        let mut depth = 0;
        while current.is_valid() {
            depth += 1;
            if depth > self.entity_count() {
                log::error!("Parent chain of {} does not terminate", entity);
                break;
            }
            matrix = self.local_matrix(current) * matrix;
            current = self.links(current).parent;
        }
        matrix
    }

    /// Every live entity without a parent, in id order
    pub fn gather_roots(&self) -> Vec<EntityId> {
        self.entities().filter(|entity| self.links(*entity).parent.is_null()).collect()
    }

    /// Children of `parent` from first to last
    pub fn gather_children(&self, parent: EntityId) -> Vec<EntityId> {
        let links = self.links(parent);
        let mut children = Vec::new();
        if links.first_child.is_null() {
            return children;
        }

        let mut current = links.first_child;
        loop {
            children.push(current);
            if current == links.last_child {
                break;
            }
            current = self.links(current).next_sibling;
            if current.is_null() || children.len() > self.entity_count() {
                log::error!("Child ring of {} is broken", parent);
                break;
            }
        }
        children
    }

    /// Whether `entity` has no children
    pub fn is_leaf(&self, entity: EntityId) -> bool {
        self.links(entity).is_leaf()
    }

    /// Whether `ancestor` is `entity` or one of its ancestors
    pub fn descends_from(&self, entity: EntityId, ancestor: EntityId) -> bool {
        let mut current = entity;
        let mut depth = 0;
        while current.is_valid() {
            if current == ancestor {
                return true;
            }
            depth += 1;
            if depth > self.entity_count() {
                break;
            }
            current = self.links(current).parent;
        }
        false
    }

    /// Detach `root` and delete it with all of its descendants.
    /// Returns the number of deleted entities.
    pub fn delete_entity_tree(&mut self, root: EntityId) -> usize {
        if self.unparent(root).is_err() {
            return 0;
        }

        let mut doomed = vec![root];
        let mut index = 0;
        while index < doomed.len() {
            let children = self.gather_children(doomed[index]);
            doomed.extend(children);
            index += 1;
        }

        doomed.into_iter().filter(|entity| self.delete_entity(*entity)).count()
    }

    /// Check every sibling ring and parent link.
    /// Returns a description of the first violation found.
    pub fn validate_hierarchy(&self) -> Result<(), String> {
        for (entity, links) in self.query::<HierarchyComponent>() {
            if let Some(violation) = self
                .parent_link_violation(entity, links)
                .or_else(|| self.child_ring_violation(entity, links))
            {
                return Err(violation);
            }
        }
        Ok(())
    }

    /// Clear every link that fails validation. A bad parent link leaves the
    /// entity a detached root; a bad child ring leaves it childless.
    ///
    /// Clearing one side can strand the entities on the other, so this
    /// repeats until the scene validates. Returns each repaired entity with
    /// its violation.
    pub fn repair_hierarchy(&mut self) -> Vec<(EntityId, String)> {
        let mut repaired = Vec::new();
        loop {
            let broken: Vec<(EntityId, Option<String>, Option<String>)> = self
                .query::<HierarchyComponent>()
                .map(|(entity, links)| {
                    (
                        entity,
                        self.parent_link_violation(entity, links),
                        self.child_ring_violation(entity, links),
                    )
                })
                .filter(|(_, upward, downward)| upward.is_some() || downward.is_some())
                .collect();
            if broken.is_empty() {
                return repaired;
            }

            for (entity, upward, downward) in broken {
                let links = self.get_mut::<HierarchyComponent>(entity);
                if upward.is_some() {
                    links.parent = EntityId::NULL;
                    links.prev_sibling = EntityId::NULL;
                    links.next_sibling = EntityId::NULL;
                }
                if downward.is_some() {
                    links.first_child = EntityId::NULL;
                    links.last_child = EntityId::NULL;
                }
                for violation in upward.into_iter().chain(downward) {
                    log::warn!("Cleared hierarchy links: {}", violation);
                    repaired.push((entity, violation));
                }
            }
        }
    }

    /// Resolve every [`TransformMatrixComponent`] to its world matrix.
    ///
    /// Seeds each matrix with the local transform, then walks breadth-first
    /// from the roots multiplying in each parent's resolved world matrix, so
    /// every entity is visited once.
    pub fn propagate_transforms(&mut self) {
        self.query_mut2::<TransformMatrixComponent, TransformComponent>(|_, cached, local| {
            cached.matrix = local.to_matrix();
        });

        let mut queue: VecDeque<(EntityId, Mat4)> = self
            .gather_roots()
            .into_iter()
            .map(|root| (root, self.local_matrix(root)))
            .collect();

        let mut visited = 0;
        while let Some((entity, world)) = queue.pop_front() {
            visited += 1;
            if visited > self.entity_count() {
                log::error!("Hierarchy of scene '{}' contains a cycle", self.name());
                break;
            }
            for child in self.gather_children(entity) {
                let child_world = world * self.local_matrix(child);
                if let Some(cached) = self.try_get_mut::<TransformMatrixComponent>(child) {
                    cached.matrix = child_world;
                }
                queue.push_back((child, child_world));
            }
        }
    }

    fn check_parent(&self, child: EntityId, new_parent: EntityId) -> Result<Mat4, HierarchyError> {
        if !self.is_alive(child) {
            return Err(HierarchyError::InvalidEntity(child));
        }
        if !self.is_alive(new_parent) {
            return Err(HierarchyError::InvalidEntity(new_parent));
        }

        let current = self.links(child).parent;
        if current.is_valid() {
            return Err(HierarchyError::AlreadyParented { child, parent: current });
        }
        let siblings = self.links(new_parent);
        if siblings.first_child.is_valid() {
            if let Some(dead) = [siblings.first_child, siblings.last_child]
                .into_iter()
                .find(|end| !self.is_alive(*end))
            {
                return Err(HierarchyError::InvalidEntity(dead));
            }
        }
        if self.descends_from(new_parent, child) {
            return Err(HierarchyError::WouldCreateCycle { child, parent: new_parent });
        }

        self.world_transform(new_parent)
            .try_inverse()
            .ok_or(HierarchyError::SingularTransform(new_parent))
    }

    fn parent_link_violation(&self, entity: EntityId, links: &HierarchyComponent) -> Option<String> {
        if links.parent.is_null() {
            if links.prev_sibling.is_valid() || links.next_sibling.is_valid() {
                return Some(format!("{entity}: root with sibling links"));
            }
            return None;
        }

        if !self.is_alive(links.parent) {
            return Some(format!("{entity}: parent {} is not alive", links.parent));
        }
        if !self.is_alive(links.prev_sibling) || !self.is_alive(links.next_sibling) {
            return Some(format!("{entity}: parented but not in a sibling ring"));
        }
        if self.chain_length(entity) > self.entity_count() {
            return Some(format!("{entity}: parent chain does not terminate"));
        }
        if !self.ring_contains(links.parent, entity) {
            return Some(format!("{entity}: missing from the child ring of {}", links.parent));
        }
        None
    }

    fn child_ring_violation(&self, entity: EntityId, links: &HierarchyComponent) -> Option<String> {
        if links.first_child.is_null() != links.last_child.is_null() {
            return Some(format!("{entity}: first_child and last_child disagree"));
        }
        if links.first_child.is_null() {
            return None;
        }

        let mut current = links.first_child;
        for _ in 0..self.entity_count() {
            if !self.is_alive(current) {
                return Some(format!("{entity}: child {current} is not alive"));
            }
            let child = self.links(current);
            if child.parent != entity {
                return Some(format!("{current}: listed under {entity} but parent is {}", child.parent));
            }
            if !self.is_alive(child.next_sibling) || self.links(child.next_sibling).prev_sibling != current {
                return Some(format!("{current}: next/prev links disagree"));
            }
            if current == links.last_child {
                if child.next_sibling != links.first_child {
                    return Some(format!("{entity}: child ring is not circular"));
                }
                return None;
            }
            current = child.next_sibling;
        }
        Some(format!("{entity}: child ring does not reach last_child"))
    }

    fn ring_contains(&self, parent: EntityId, entity: EntityId) -> bool {
        let links = self.links(parent);
        let mut current = links.first_child;
        for _ in 0..self.entity_count() {
            if current.is_null() {
                return false;
            }
            if current == entity {
                return true;
            }
            if current == links.last_child {
                return false;
            }
            current = self.links(current).next_sibling;
        }
        false
    }

    fn chain_length(&self, entity: EntityId) -> usize {
        let mut length = 0;
        let mut current = self.links(entity).parent;
        while current.is_valid() && length <= self.entity_count() {
            length += 1;
            current = self.links(current).parent;
        }
        length
    }

    fn local_matrix(&self, entity: EntityId) -> Mat4 {
        self.try_get::<TransformComponent>(entity)
            .map_or_else(Mat4::identity, TransformComponent::to_matrix)
    }

    fn links(&self, entity: EntityId) -> HierarchyComponent {
        self.try_get::<HierarchyComponent>(entity).copied().unwrap_or_default()
    }

    fn ensure_links(&mut self, entity: EntityId) {
        if !self.has::<HierarchyComponent>(entity) {
            self.insert(entity, HierarchyComponent::default());
        }
    }

    fn links_mut(&mut self, entity: EntityId) -> &mut HierarchyComponent {
        self.ensure_links(entity);
        self.get_mut::<HierarchyComponent>(entity)
    }
}
