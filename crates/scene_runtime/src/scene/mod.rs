//! Scene publication
//!
//! Loaded scenes exist in three roles:
//!
//! ```text
//! published   read by consumers (renderer, editor) under the runtime lock
//! simulation  private working set of the simulation thread
//! backup      copy taken when the simulation starts, restored when it stops
//! ```
//!
//! [`SceneSystem`] is the consumer side: it loads, unloads and reads the
//! published set. [`SceneSimulation`] is the [`RuntimeDelegate`](crate::runtime::RuntimeDelegate)
//! that steps the simulation set and publishes it without ever blocking.

mod scene_set;
mod scene_system;
mod simulation;
mod stats;

pub use scene_set::SceneSet;
pub use scene_system::{SceneError, SceneSystem};
pub use simulation::SceneSimulation;
pub use stats::{PublicationSnapshot, PublicationStats};
