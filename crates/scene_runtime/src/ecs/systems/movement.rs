//! Movement integration

use crate::ecs::components::{MovementComponent, TransformComponent};
use crate::ecs::{Scene, System};
use crate::foundation::math::{Quat, Vec3};

/// Integrates [`MovementComponent`] velocities into local transforms
#[derive(Debug, Default)]
pub struct MovementSystem;

impl MovementSystem {
    /// Create the system
    pub fn new() -> Self {
        Self
    }

    fn integrate(transform: &mut TransformComponent, movement: &MovementComponent, delta_time: f32) {
        transform.position += movement.velocity * delta_time;

        let rotation: Vec3 = movement.angular_velocity * delta_time;
        if rotation.norm_squared() > 0.0 {
            transform.orientation = Quat::from_scaled_axis(rotation) * transform.orientation;
        }
    }
}

impl System for MovementSystem {
    fn run(&mut self, scene: &mut Scene, delta_time: f32) {
        scene.query_mut2::<TransformComponent, MovementComponent>(|_, transform, movement| {
            if movement.enabled {
                Self::integrate(transform, movement, delta_time);
            }
        });
    }

    fn name(&self) -> &str {
        "MovementSystem"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_velocity_is_integrated() {
        let mut scene = Scene::new("movement");
        let moving = scene.create_entity("moving");
        let disabled = scene.create_entity("disabled");
        scene.add(moving, MovementComponent::with_velocity(Vec3::new(2.0, 0.0, 0.0)));
        scene.add(disabled, MovementComponent {
            enabled: false,
            ..MovementComponent::with_velocity(Vec3::new(2.0, 0.0, 0.0))
        });

        let mut system = MovementSystem::new();
        system.run(&mut scene, 0.5);
        system.run(&mut scene, 0.5);

        assert_relative_eq!(scene.get::<TransformComponent>(moving).position, Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(scene.get::<TransformComponent>(disabled).position, Vec3::zeros());
    }

    #[test]
    fn test_angular_velocity_rotates() {
        let mut scene = Scene::new("movement");
        let spinner = scene.create_entity("spinner");
        scene.add(spinner, MovementComponent::with_rotation(Vec3::new(0.0, std::f32::consts::PI, 0.0)));

        MovementSystem::new().run(&mut scene, 1.0);

        let angle = scene.get::<TransformComponent>(spinner).orientation.angle();
        assert_relative_eq!(angle, std::f32::consts::PI, epsilon = 1e-4);
    }
}
