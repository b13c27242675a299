//! Asset references
//!
//! Assets themselves are owned by an external asset manager. The runtime only
//! stores portable [`AssetHandle`]s in component fields and asks an
//! [`AssetResolver`] to make them usable when a scene is loaded.

pub mod handle;
pub mod resolver;

pub use handle::{AssetHandle, AssetType};
pub use resolver::{AssetCatalog, AssetResolver, MemoryRepresentation};
