//! System trait

use crate::ecs::Scene;

/// Simulation behaviour run once per tick on every simulated scene
pub trait System: Send {
    /// Run the system
    fn run(&mut self, scene: &mut Scene, delta_time: f32);

    /// Name used in logs
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}
