//! Position, rotation and scale of a scene node.

use bytemuck::{Pod, Zeroable};

use crate::math::{
    Mat4, Quat, Vec3, mat4_from_trs, mat4_rotation, mat4_scaling, mat4_translation, quat_inverse,
};

/// Local transform of a scene node.
///
/// The layout is part of the scene file format: 40 bytes, `position` (3 f32),
/// `rotation` (x, y, z, w), `scale` (3 f32).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    /// Origin, no rotation, unit scale.
    pub fn identity() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::identity()
        }
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn translation_matrix(&self) -> Mat4 {
        mat4_translation(self.position)
    }

    pub fn inverse_translation_matrix(&self) -> Mat4 {
        mat4_translation(-self.position)
    }

    pub fn rotation_matrix(&self) -> Mat4 {
        mat4_rotation(self.rotation)
    }

    pub fn inverse_rotation_matrix(&self) -> Mat4 {
        mat4_rotation(quat_inverse(self.rotation))
    }

    pub fn scaling_matrix(&self) -> Mat4 {
        mat4_scaling(self.scale)
    }

    /// Zero scale components invert to zero instead of infinity.
    pub fn inverse_scaling_matrix(&self) -> Mat4 {
        let inv = |s: f32| if s == 0.0 { 0.0 } else { 1.0 / s };
        mat4_scaling(Vec3::new(inv(self.scale.x), inv(self.scale.y), inv(self.scale.z)))
    }

    /// Local-to-parent matrix.
    pub fn matrix(&self) -> Mat4 {
        mat4_from_trs(self.position, self.rotation, self.scale)
    }

    /// Parent-to-local matrix.
    pub fn inverse_matrix(&self) -> Mat4 {
        self.inverse_scaling_matrix() * self.inverse_rotation_matrix() * self.inverse_translation_matrix()
    }

    /// World-to-view matrix for a camera placed at this transform. Scale is ignored.
    pub fn view_matrix(&self) -> Mat4 {
        self.inverse_rotation_matrix() * self.inverse_translation_matrix()
    }

    /// View-to-world matrix, the inverse of [`view_matrix`](Self::view_matrix).
    pub fn inverse_view_matrix(&self) -> Mat4 {
        self.translation_matrix() * self.rotation_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{Vec4, quat_from_axis_angle};

    #[test]
    fn block_is_forty_bytes() {
        assert_eq!(std::mem::size_of::<Transform>(), 40);
    }

    #[test]
    fn default_is_identity() {
        let t = Transform::default();
        assert!((t.matrix() - Mat4::identity()).norm() < 1e-6);
        let raw: &[f32] = bytemuck::cast_slice(bytemuck::bytes_of(&t));
        assert_eq!(raw, &[0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn inverse_matrix_undoes_matrix() {
        let t = Transform::from_position(Vec3::new(1.0, 2.0, 3.0))
            .with_rotation(quat_from_axis_angle(Vec3::new(0.0, 1.0, 1.0), 0.7))
            .with_scale(Vec3::new(2.0, 0.5, 4.0));
        let product = t.matrix() * t.inverse_matrix();
        assert!((product - Mat4::identity()).norm() < 1e-4);
    }

    #[test]
    fn view_matrix_moves_camera_to_origin() {
        let t = Transform::from_position(Vec3::new(0.0, 0.0, 5.0));
        let p = t.view_matrix() * Vec4::new(0.0, 0.0, 5.0, 1.0);
        assert!(p.xyz().norm() < 1e-6);
        let back = t.inverse_view_matrix() * t.view_matrix();
        assert!((back - Mat4::identity()).norm() < 1e-5);
    }
}
