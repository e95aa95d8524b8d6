//! File-backed resource kinds.
//!
//! Registered together by
//! [`register_standard_resources`](crate::TypeRegistryBuilder::register_standard_resources).

mod image;
mod material;
mod model;
mod shader;

pub use image::Image;
pub use material::{
    Material, MaterialError, create_material, material_property, set_material_property,
};
pub use model::{Model, Vertex};
pub use shader::{Shader, ShaderProperty};
