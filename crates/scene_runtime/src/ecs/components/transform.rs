//! Transform components
//!
//! [`TransformComponent`] is the authored local transform relative to the
//! parent entity. [`TransformMatrixComponent`] caches the resolved world
//! matrix and is always derived, never serialized.

use crate::ecs::registry::SerializableComponent;
use crate::ecs::Component;
use crate::foundation::math::{compose_trs, decompose_trs, Mat4, Quat, Vec3};
use crate::serialization::{DecodeContext, DecodeError, FieldTree};

/// Local transform relative to the parent (or the world for roots)
#[derive(Debug, Clone, PartialEq)]
pub struct TransformComponent {
    /// Translation
    pub position: Vec3,

    /// Rotation
    pub orientation: Quat,

    /// Per-axis scale
    pub scale: Vec3,
}

impl Component for TransformComponent {}

impl Default for TransformComponent {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            orientation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl TransformComponent {
    /// Create identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create from position only
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create from full transform specification
    pub fn from_parts(position: Vec3, orientation: Quat, scale: Vec3) -> Self {
        Self {
            position,
            orientation,
            scale,
        }
    }

    /// Create from a transformation matrix (decompose TRS)
    pub fn from_matrix(matrix: &Mat4) -> Self {
        let (position, orientation, scale) = decompose_trs(matrix);
        Self::from_parts(position, orientation, scale)
    }

    /// Convert to transformation matrix (TRS order)
    pub fn to_matrix(&self) -> Mat4 {
        compose_trs(&self.position, &self.orientation, &self.scale)
    }

    /// Builder pattern: Set position
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Builder pattern: Set orientation
    pub fn with_orientation(mut self, orientation: Quat) -> Self {
        self.orientation = orientation;
        self
    }

    /// Builder pattern: Set orientation from Euler angles (radians)
    pub fn with_rotation_euler(mut self, roll: f32, pitch: f32, yaw: f32) -> Self {
        self.orientation = Quat::from_euler_angles(roll, pitch, yaw);
        self
    }

    /// Builder pattern: Set scale (uniform)
    pub fn with_uniform_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::new(scale, scale, scale);
        self
    }

    /// Builder pattern: Set scale (non-uniform)
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }
}

impl SerializableComponent for TransformComponent {
    const NAME: &'static str = "Transform";

    fn encode(&self) -> FieldTree {
        FieldTree::new()
            .with("position", self.position)
            .with("orientation", self.orientation)
            .with("scale", self.scale)
    }

    fn decode(tree: &FieldTree, _ctx: &mut DecodeContext<'_>) -> Result<Self, DecodeError> {
        let defaults = Self::default();
        Ok(Self {
            position: tree.get_or("position", defaults.position)?,
            orientation: tree.get_or("orientation", defaults.orientation)?,
            scale: tree.get_or("scale", defaults.scale)?,
        })
    }
}

/// Cached world matrix, resolved by transform propagation
#[derive(Debug, Clone, PartialEq)]
pub struct TransformMatrixComponent {
    /// World-space matrix (`parent_world * local`)
    pub matrix: Mat4,
}

impl Component for TransformMatrixComponent {}

impl Default for TransformMatrixComponent {
    fn default() -> Self {
        Self {
            matrix: Mat4::identity(),
        }
    }
}

impl TransformMatrixComponent {
    /// World-space position encoded in the matrix
    pub fn translation(&self) -> Vec3 {
        Vec3::new(self.matrix.m14, self.matrix.m24, self.matrix.m34)
    }
}
