//! Math type aliases and matrix helpers.
//!
//! All types are f32 nalgebra types with a `#[repr(C)]` layout, so they are
//! valid as fixed-size reflected field values.

pub use nalgebra;

/// 2D vector (f32).
pub type Vec2 = nalgebra::Vector2<f32>;

/// 3D vector (f32).
pub type Vec3 = nalgebra::Vector3<f32>;

/// 4D vector (f32).
pub type Vec4 = nalgebra::Vector4<f32>;

/// 4x4 matrix (f32), column-major.
pub type Mat4 = nalgebra::Matrix4<f32>;

/// Quaternion (f32). Stored as `[x, y, z, w]` in memory.
pub type Quat = nalgebra::Quaternion<f32>;

/// Identity rotation.
pub fn quat_identity() -> Quat {
    Quat::identity()
}

/// Create a quaternion from x, y, z, w components.
pub fn quat_from_xyzw(x: f32, y: f32, z: f32, w: f32) -> Quat {
    nalgebra::Quaternion::new(w, x, y, z)
}

/// Convert a quaternion to a `[x, y, z, w]` array.
pub fn quat_to_array(q: Quat) -> [f32; 4] {
    [q.coords.x, q.coords.y, q.coords.z, q.coords.w]
}

/// Rotation of `angle` radians around a (not necessarily normalized) axis.
pub fn quat_from_axis_angle(axis: Vec3, angle: f32) -> Quat {
    let axis = nalgebra::Unit::new_normalize(axis);
    nalgebra::UnitQuaternion::from_axis_angle(&axis, angle).into_inner()
}

/// Inverse rotation. Falls back to identity for a zero quaternion.
pub fn quat_inverse(q: Quat) -> Quat {
    q.try_inverse().unwrap_or_else(Quat::identity)
}

/// Rotate a vector by a quaternion.
pub fn quat_rotate_vec3(q: Quat, v: Vec3) -> Vec3 {
    nalgebra::UnitQuaternion::new_normalize(q) * v
}

/// Translation-only matrix.
pub fn mat4_translation(t: Vec3) -> Mat4 {
    Mat4::new_translation(&t)
}

/// Rotation-only matrix.
pub fn mat4_rotation(q: Quat) -> Mat4 {
    nalgebra::UnitQuaternion::new_normalize(q).to_homogeneous()
}

/// Scale-only matrix.
pub fn mat4_scaling(s: Vec3) -> Mat4 {
    Mat4::new_nonuniform_scaling(&s)
}

/// `T * R * S`: scales first, then rotates, then translates.
pub fn mat4_from_trs(translation: Vec3, rotation: Quat, scale: Vec3) -> Mat4 {
    mat4_translation(translation) * mat4_rotation(rotation) * mat4_scaling(scale)
}
