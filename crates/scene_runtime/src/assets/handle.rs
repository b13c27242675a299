//! Portable asset handles

use std::fmt;

use serde::{Serialize, Deserialize};
use uuid::Uuid;

use crate::serialization::{Field, FieldTree, FromField, IntoField};

/// Kind of asset a handle points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetType {
    /// Geometry
    Mesh,
    /// Surface material
    Material,
    /// Image data
    Texture,
    /// Script source
    Script,
}

impl AssetType {
    /// Stable name used in scene files
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mesh => "mesh",
            Self::Material => "material",
            Self::Texture => "texture",
            Self::Script => "script",
        }
    }

    /// Parse a stable name
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "mesh" => Some(Self::Mesh),
            "material" => Some(Self::Material),
            "texture" => Some(Self::Texture),
            "script" => Some(Self::Script),
            _ => None,
        }
    }
}

/// Weak, portable reference to an asset: its type and UUID.
///
/// Holding a handle does not keep the asset alive and never implies that the
/// asset is loaded; resolution is the asset manager's business.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetHandle {
    /// Asset kind
    pub asset_type: AssetType,
    /// Asset identity
    pub uuid: Uuid,
}

impl AssetHandle {
    /// Create a handle
    pub fn new(asset_type: AssetType, uuid: Uuid) -> Self {
        Self { asset_type, uuid }
    }

    /// Create a handle with a fresh random UUID
    pub fn generate(asset_type: AssetType) -> Self {
        Self::new(asset_type, Uuid::new_v4())
    }
}

impl fmt::Display for AssetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.asset_type.as_str(), self.uuid)
    }
}

impl IntoField for AssetHandle {
    fn into_field(self) -> Field {
        Field::Tree(
            FieldTree::new()
                .with("type", self.asset_type.as_str())
                .with("uuid", self.uuid),
        )
    }
}

impl FromField for AssetHandle {
    const EXPECTED: &'static str = "asset handle tree {type, uuid}";

    fn from_field(field: &Field) -> Option<Self> {
        let Field::Tree(tree) = field else { return None };
        let asset_type = AssetType::parse(&tree.get::<String>("type").ok()?)?;
        Some(Self::new(asset_type, tree.get("uuid").ok()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_field_roundtrip() {
        let handle = AssetHandle::generate(AssetType::Material);
        let tree = FieldTree::new().with("material", handle);
        assert_eq!(tree.get::<AssetHandle>("material").unwrap(), handle);
    }

    #[test]
    fn test_unknown_asset_type_rejected() {
        let raw = FieldTree::new().with("type", "sound").with("uuid", Uuid::new_v4());
        let tree = FieldTree::new().with("mesh", raw);
        assert!(tree.get::<AssetHandle>("mesh").is_err());
    }
}
