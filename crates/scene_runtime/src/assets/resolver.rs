//! Asset resolution interface

use std::collections::{HashMap, HashSet};

use parking_lot::Mutex;
use uuid::Uuid;

use super::{AssetHandle, AssetType};

/// Memory representation an asset can be asked to provide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryRepresentation {
    /// CPU-side data
    Cpu,
    /// Uploaded to the graphics device
    Gpu,
}

/// Collaborator that turns handles into usable assets.
///
/// Implemented by the asset manager. The runtime never interprets asset
/// content; it only checks that a handle resolves and requests the
/// representation a component needs.
pub trait AssetResolver {
    /// Whether `handle` names a known asset of the right type
    fn resolve(&self, handle: &AssetHandle) -> bool;

    /// Ask for `representation` of the asset to be made available.
    /// Returns false if the request cannot be honoured.
    fn request(&self, handle: &AssetHandle, representation: MemoryRepresentation) -> bool;
}

/// Simple in-memory resolver backed by a table of registered assets.
///
/// Records every representation request so callers can see what a scene
/// load asked for.
#[derive(Debug, Default)]
pub struct AssetCatalog {
    assets: HashMap<Uuid, AssetType>,
    requested: Mutex<HashSet<(AssetHandle, MemoryRepresentation)>>,
}

impl AssetCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an asset
    pub fn insert(&mut self, handle: AssetHandle) {
        if let Some(previous) = self.assets.insert(handle.uuid, handle.asset_type) {
            if previous != handle.asset_type {
                log::warn!("Asset {} re-registered as {:?} (was {:?})", handle.uuid, handle.asset_type, previous);
            }
        }
    }

    /// Register a fresh asset of `asset_type` and return its handle
    pub fn register(&mut self, asset_type: AssetType) -> AssetHandle {
        let handle = AssetHandle::generate(asset_type);
        self.insert(handle);
        handle
    }

    /// Forget an asset
    pub fn remove(&mut self, handle: &AssetHandle) -> bool {
        self.assets.remove(&handle.uuid).is_some()
    }

    /// Whether `representation` of `handle` was requested
    pub fn was_requested(&self, handle: &AssetHandle, representation: MemoryRepresentation) -> bool {
        self.requested.lock().contains(&(*handle, representation))
    }

    /// Number of distinct requests made so far
    pub fn request_count(&self) -> usize {
        self.requested.lock().len()
    }
}

impl AssetResolver for AssetCatalog {
    fn resolve(&self, handle: &AssetHandle) -> bool {
        self.assets.get(&handle.uuid) == Some(&handle.asset_type)
    }

    fn request(&self, handle: &AssetHandle, representation: MemoryRepresentation) -> bool {
        if !self.resolve(handle) {
            return false;
        }
        self.requested.lock().insert((*handle, representation));
        true
    }
}
