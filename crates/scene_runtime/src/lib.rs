//! # Scene Runtime
//!
//! A real-time scene runtime: a background simulation thread advances a
//! hierarchical entity/component world while consumers on other threads read
//! a consistent, never torn, snapshot of it.
//!
//! ## Features
//!
//! - **ECS Scenes**: Sparse-set component storage with multi-component views
//! - **Hierarchy**: Circular sibling lists that preserve world transforms on reparenting
//! - **Serialization**: Identity-preserving scene files in RON
//! - **Publication**: Non-blocking snapshot hand-off from the simulation thread
//! - **Runtime**: Inactive / running / paused background loop
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scene_runtime::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut engine = Engine::new(EngineConfig::default())?;
//!     engine.add_system(MovementSystem::new())?;
//!
//!     let mut scene = Scene::new("Level");
//!     let ship = scene.create_entity("Ship");
//!     scene.add(ship, MovementComponent::with_velocity(Vec3::new(1.0, 0.0, 0.0)));
//!     let id = engine.scenes().load_scene(scene)?;
//!
//!     engine.run()?;
//!     if let Some(snapshot) = engine.scenes().scene(id) {
//!         println!("{:?}", snapshot.get::<TransformMatrixComponent>(ship));
//!     }
//!     engine.stop()?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Core engine modules
pub mod core;
pub mod config;
pub mod foundation;

pub mod ecs;
pub mod assets;
pub mod serialization;
pub mod scene;
pub mod runtime;

mod engine;

pub use engine::{Engine, EngineError};
pub use crate::core::config::EngineConfig;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        Engine, EngineConfig, EngineError,
        assets::{AssetCatalog, AssetHandle, AssetResolver, AssetType},
        config::Config,
        core::config::{RuntimeConfig, SerializationConfig},
        ecs::{
            components::{
                HierarchyComponent, MeshRendererComponent, MovementComponent, ScriptComponent,
                TagComponent, TransformComponent, TransformMatrixComponent,
            },
            systems::MovementSystem,
            Component, EntityId, HierarchyError, Scene, SceneId, System,
        },
        foundation::math::{Mat4, Quat, Vec3},
        runtime::{CoreRuntime, RuntimeDelegate, RuntimeState},
        scene::{SceneError, SceneSystem},
        serialization::{DecodePolicy, FieldTree, LoadReport, SceneSerializer},
    };
}
