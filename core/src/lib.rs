//! # Keepsake Core
//!
//! Plain value types shared by the persistence crates: math aliases,
//! colors and the scene node [`Transform`](transform::Transform).
//!
//! Every type here is `#[repr(C)]` and [`bytemuck::Pod`] so it can be stored
//! in reflected fields and copied byte for byte by the codec.

pub mod color;
pub mod math;
pub mod transform;

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
