//! ECS Components module
//!
//! Built-in components. Every type here is plain data; the serializable ones
//! also describe how they map onto a [`FieldTree`](crate::serialization::FieldTree).

pub mod tag;
pub mod transform;
pub mod hierarchy;
pub mod mesh_renderer;
pub mod script;
pub mod movement;

pub use tag::TagComponent;
pub use transform::{TransformComponent, TransformMatrixComponent};
pub use hierarchy::HierarchyComponent;
pub use mesh_renderer::MeshRendererComponent;
pub use script::{ScriptComponent, ScriptInstance};
pub use movement::MovementComponent;

use crate::ecs::ComponentRegistry;

/// Register the built-in serializable components.
/// `TransformMatrixComponent` is derived and never stored.
pub fn register_builtin(registry: &mut ComponentRegistry) {
    registry
        .register::<TagComponent>()
        .register::<TransformComponent>()
        .register::<HierarchyComponent>()
        .register::<MeshRendererComponent>()
        .register::<ScriptComponent>()
        .register::<MovementComponent>();
}
