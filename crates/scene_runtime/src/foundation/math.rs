//! Math utilities and types
//!
//! Provides the math types used by transforms and the hierarchy. All matrices
//! follow the column-vector convention: `world = parent_world * local` and
//! `local = T * R * S`.

pub use nalgebra::{Matrix3, Matrix4, UnitQuaternion, Vector3};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// Quaternion type for rotations
pub type Quat = UnitQuaternion<f32>;

/// Scale magnitudes below this are treated as degenerate
pub const SCALE_EPSILON: f32 = 1e-8;

/// Compose a translation, rotation and scale into a single matrix (T * R * S)
pub fn compose_trs(position: &Vec3, rotation: &Quat, scale: &Vec3) -> Mat4 {
    Mat4::new_translation(position)
        * rotation.to_homogeneous()
        * Mat4::new_nonuniform_scaling(scale)
}

/// Decompose an affine matrix into translation, rotation and scale.
///
/// Shear cannot be represented and is discarded. A negative determinant is
/// folded into the X scale.
pub fn decompose_trs(matrix: &Mat4) -> (Vec3, Quat, Vec3) {
    let position = Vec3::new(matrix.m14, matrix.m24, matrix.m34);

    let basis: Mat3 = matrix.fixed_view::<3, 3>(0, 0).into_owned();
    let mut scale = Vec3::new(
        basis.column(0).norm(),
        basis.column(1).norm(),
        basis.column(2).norm(),
    );
    if basis.determinant() < 0.0 {
        scale.x = -scale.x;
    }

    if scale.iter().any(|s| s.abs() < SCALE_EPSILON) {
        return (position, Quat::identity(), scale);
    }

    let rotation_matrix = Mat3::from_columns(&[
        basis.column(0) / scale.x,
        basis.column(1) / scale.y,
        basis.column(2) / scale.z,
    ]);
    let rotation = Quat::from_matrix(&rotation_matrix);

    (position, rotation, scale)
}
