//! Entity identifiers and slot allocation

use std::fmt;

use serde::{Serialize, Deserialize};

/// Entity identifier
///
/// A recyclable slot index. [`EntityId::NULL`] is the distinguished "no
/// entity" value and is the only id that converts to `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(u32);

impl EntityId {
    /// The null entity
    pub const NULL: Self = Self(u32::MAX);

    /// Wrap a raw slot identifier
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw slot identifier
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Whether this is the null entity
    pub const fn is_null(self) -> bool {
        self.0 == u32::MAX
    }

    /// Whether this refers to an entity slot
    pub const fn is_valid(self) -> bool {
        !self.is_null()
    }

    /// `Some(self)` unless null
    pub const fn some(self) -> Option<Self> {
        if self.is_null() { None } else { Some(self) }
    }

    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::NULL
    }
}

impl From<EntityId> for bool {
    fn from(entity: EntityId) -> Self {
        entity.is_valid()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "Entity(null)")
        } else {
            write!(f, "Entity({})", self.0)
        }
    }
}

/// How far past the current capacity an id hint may reach. Hints further
/// out fall back to a regular slot so one stored id cannot size the scene.
pub const MAX_HINT_GAP: usize = 1 << 16;

/// Slot allocator with recycling and exact-id replay
#[derive(Debug, Clone, Default)]
pub(crate) struct EntityAllocator {
    alive: Vec<bool>,
    // May hold slots that were revived through a hint; those are skipped on pop.
    free: Vec<u32>,
    count: usize,
}

impl EntityAllocator {
    /// Next free slot, `None` once every non-null id is in use
    pub fn allocate(&mut self) -> Option<EntityId> {
        while let Some(slot) = self.free.pop() {
            if !self.alive[slot as usize] {
                self.alive[slot as usize] = true;
                self.count += 1;
                return Some(EntityId(slot));
            }
        }

        let slot = u32::try_from(self.alive.len()).ok().filter(|slot| *slot != u32::MAX)?;
        self.alive.push(true);
        self.count += 1;
        Some(EntityId(slot))
    }

    /// Allocate exactly `hint` if it is free and within [`MAX_HINT_GAP`] of
    /// the current capacity, otherwise any slot
    pub fn allocate_hint(&mut self, hint: EntityId) -> Option<EntityId> {
        if hint.is_null() {
            return self.allocate();
        }

        let index = hint.index();
        if index < self.alive.len() {
            if self.alive[index] {
                return self.allocate();
            }
        } else if index - self.alive.len() > MAX_HINT_GAP {
            return self.allocate();
        } else {
            for slot in self.alive.len()..index {
                self.free.push(slot as u32);
            }
            self.alive.resize(index + 1, false);
        }

        self.alive[index] = true;
        self.count += 1;
        Some(hint)
    }

    pub fn release(&mut self, entity: EntityId) -> bool {
        if !self.is_alive(entity) {
            return false;
        }
        self.alive[entity.index()] = false;
        self.free.push(entity.0);
        self.count -= 1;
        true
    }

    pub fn is_alive(&self, entity: EntityId) -> bool {
        !entity.is_null() && self.alive.get(entity.index()).copied().unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn capacity(&self) -> usize {
        self.alive.len()
    }

    /// Live entities in ascending slot order
    pub fn iter(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.alive
            .iter()
            .enumerate()
            .filter(|(_, alive)| **alive)
            .map(|(slot, _)| EntityId(slot as u32))
    }
}
