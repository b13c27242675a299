//! Mesh renderer component

use crate::assets::{AssetHandle, MemoryRepresentation};
use crate::ecs::registry::SerializableComponent;
use crate::ecs::Component;
use crate::serialization::{DecodeContext, DecodeError, FieldTree};

/// Mesh and material references consumed by the renderer.
///
/// Both are weak handles: the asset manager owns the data, and a handle that
/// did not resolve at load time is left empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeshRendererComponent {
    /// Geometry to draw
    pub mesh: Option<AssetHandle>,
    /// Material to draw it with
    pub material: Option<AssetHandle>,
}

impl Component for MeshRendererComponent {}

impl MeshRendererComponent {
    /// Create a renderer with both references set
    pub fn new(mesh: AssetHandle, material: AssetHandle) -> Self {
        Self {
            mesh: Some(mesh),
            material: Some(material),
        }
    }
}

impl SerializableComponent for MeshRendererComponent {
    const NAME: &'static str = "MeshRenderer";

    fn encode(&self) -> FieldTree {
        let mut tree = FieldTree::new();
        if let Some(mesh) = self.mesh {
            tree.set("mesh", mesh);
        }
        if let Some(material) = self.material {
            tree.set("material", material);
        }
        tree
    }

    fn decode(tree: &FieldTree, ctx: &mut DecodeContext<'_>) -> Result<Self, DecodeError> {
        let mut component = Self::default();
        if tree.contains("mesh") {
            let handle = tree.get::<AssetHandle>("mesh")?;
            component.mesh = ctx.resolve_asset("mesh", handle, MemoryRepresentation::Gpu);
        }
        if tree.contains("material") {
            let handle = tree.get::<AssetHandle>("material")?;
            component.material = ctx.resolve_asset("material", handle, MemoryRepresentation::Gpu);
        }
        Ok(component)
    }
}
