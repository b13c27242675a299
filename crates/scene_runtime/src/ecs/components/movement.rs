//! Movement component for entities that move on their own
//!
//! Integrated each tick by [`MovementSystem`](crate::ecs::systems::MovementSystem).

use crate::ecs::registry::SerializableComponent;
use crate::ecs::Component;
use crate::foundation::math::Vec3;
use crate::serialization::{DecodeContext, DecodeError, FieldTree};

/// Component for entities that can move
#[derive(Debug, Clone, PartialEq)]
pub struct MovementComponent {
    /// Linear velocity in units per second (parent space)
    pub velocity: Vec3,

    /// Angular velocity in radians per second (scaled rotation axis)
    pub angular_velocity: Vec3,

    /// Whether movement is enabled
    pub enabled: bool,
}

impl Component for MovementComponent {}

impl Default for MovementComponent {
    fn default() -> Self {
        Self::new()
    }
}

impl MovementComponent {
    /// Create a new, stationary movement component
    pub fn new() -> Self {
        Self {
            velocity: Vec3::zeros(),
            angular_velocity: Vec3::zeros(),
            enabled: true,
        }
    }

    /// Create a movement component with initial velocity
    pub fn with_velocity(velocity: Vec3) -> Self {
        Self {
            velocity,
            ..Self::new()
        }
    }

    /// Create a movement component with rotation
    pub fn with_rotation(angular_velocity: Vec3) -> Self {
        Self {
            angular_velocity,
            ..Self::new()
        }
    }

    /// Whether the component would change anything this tick
    pub fn is_moving(&self) -> bool {
        self.enabled && (self.velocity.norm_squared() > 0.0 || self.angular_velocity.norm_squared() > 0.0)
    }
}

impl SerializableComponent for MovementComponent {
    const NAME: &'static str = "Movement";

    fn encode(&self) -> FieldTree {
        FieldTree::new()
            .with("velocity", self.velocity)
            .with("angular_velocity", self.angular_velocity)
            .with("enabled", self.enabled)
    }

    fn decode(tree: &FieldTree, _ctx: &mut DecodeContext<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            velocity: tree.get_or("velocity", Vec3::zeros())?,
            angular_velocity: tree.get_or("angular_velocity", Vec3::zeros())?,
            enabled: tree.get_or("enabled", true)?,
        })
    }
}
