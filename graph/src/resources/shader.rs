use std::collections::BTreeSet;

use crate::Reflect;
use crate::codec::{DecodeError, EncodeError, LoadContext, Persist, SaveContext};
use crate::objects::ObjectRef;
use crate::resources::Material;

/// A named slice of a material's uniform data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderProperty {
    pub name: String,
    pub offset: usize,
    pub size: usize,
}

impl ShaderProperty {
    pub fn end(&self) -> usize {
        self.offset + self.size
    }
}

/// Describes the uniform layout and image slots shared by its materials.
///
/// Layout after the reflected fields:
///
/// ```text
/// u64 property count,       per property: name, u64 offset, u64 size
/// u64 image property count, per name: string
/// u64 material count,       per material: location
/// ```
///
/// Loading a shader loads every material listed in its file.
#[derive(Debug, Clone, Default, Reflect)]
pub struct Shader {
    /// Location of the compiled shader module.
    pub module_path: String,
    #[reflect(skip)]
    properties: Vec<ShaderProperty>,
    #[reflect(skip)]
    image_properties: BTreeSet<String>,
    #[reflect(skip)]
    materials: Vec<ObjectRef<Material>>,
}

impl Shader {
    pub fn new(module_path: impl Into<String>) -> Self {
        Self {
            module_path: module_path.into(),
            ..Default::default()
        }
    }

    /// Append a property sized for `T`, placed right after the last one.
    /// Returns `None` if the name is taken.
    pub fn add_property<T: bytemuck::Pod>(&mut self, name: &str) -> Option<&ShaderProperty> {
        self.add_property_sized(name, size_of::<T>())
    }

    pub fn add_property_sized(&mut self, name: &str, size: usize) -> Option<&ShaderProperty> {
        if self.property(name).is_some() {
            return None;
        }
        let offset = self.uniform_size();
        self.properties.push(ShaderProperty {
            name: name.to_owned(),
            offset,
            size,
        });
        self.properties.last()
    }

    pub fn property(&self, name: &str) -> Option<&ShaderProperty> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Properties in declaration order.
    pub fn properties(&self) -> &[ShaderProperty] {
        &self.properties
    }

    /// Bytes of uniform data a material of this shader holds.
    pub fn uniform_size(&self) -> usize {
        self.properties.last().map_or(0, ShaderProperty::end)
    }

    /// Returns `false` if the name was already present.
    pub fn add_image_property(&mut self, name: &str) -> bool {
        self.image_properties.insert(name.to_owned())
    }

    pub fn has_image_property(&self, name: &str) -> bool {
        self.image_properties.contains(name)
    }

    /// Image property names in sorted order.
    pub fn image_properties(&self) -> impl Iterator<Item = &str> {
        self.image_properties.iter().map(String::as_str)
    }

    /// Materials using this shader.
    pub fn materials(&self) -> &[ObjectRef<Material>] {
        &self.materials
    }

    pub(crate) fn link_material(&mut self, material: ObjectRef<Material>) {
        if !material.is_null() && !self.materials.contains(&material) {
            self.materials.push(material);
        }
    }
}

impl Persist for Shader {
    fn save(&self, ctx: &mut SaveContext<'_>) -> Result<(), EncodeError> {
        ctx.write_fields(self)?;

        let writer = ctx.writer();
        writer.write_len(self.properties.len());
        for property in &self.properties {
            writer.write_str(&property.name);
            writer.write_len(property.offset);
            writer.write_len(property.size);
        }
        writer.write_len(self.image_properties.len());
        for name in &self.image_properties {
            writer.write_str(name);
        }

        // Materials without a file cannot be found again on load.
        let world = ctx.world();
        let located: Vec<&str> = self
            .materials
            .iter()
            .filter_map(|m| m.id())
            .filter_map(|id| world.location_of(id))
            .collect();
        ctx.writer().write_len(located.len());
        for location in located {
            ctx.writer().write_str(location);
        }
        Ok(())
    }

    fn load(&mut self, ctx: &mut LoadContext<'_>) -> Result<(), DecodeError> {
        ctx.read_fields(self)?;

        let count = ctx.reader().read_len()?;
        self.properties.clear();
        for _ in 0..count {
            let name = ctx.reader().read_string()?;
            let offset = ctx.reader().read_len()?;
            let size = ctx.reader().read_len()?;
            self.properties.push(ShaderProperty { name, offset, size });
        }

        let count = ctx.reader().read_len()?;
        self.image_properties.clear();
        for _ in 0..count {
            let name = ctx.reader().read_string()?;
            self.image_properties.insert(name);
        }

        let count = ctx.reader().read_len()?;
        for _ in 0..count {
            let material = ctx.read_reference::<Material>()?;
            self.link_material(material);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keepsake_core::math::Vec4;

    #[test]
    fn properties_are_packed_in_order() {
        let mut shader = Shader::new("shaders/lit.spv");
        shader.add_property::<Vec4>("tint");
        shader.add_property::<f32>("roughness");

        let tint = shader.property("tint").unwrap();
        assert_eq!((tint.offset, tint.size), (0, 16));
        let roughness = shader.property("roughness").unwrap();
        assert_eq!((roughness.offset, roughness.size), (16, 4));
        assert_eq!(shader.uniform_size(), 20);
    }

    #[test]
    fn duplicate_property_is_rejected() {
        let mut shader = Shader::default();
        assert!(shader.add_property::<f32>("a").is_some());
        assert!(shader.add_property::<u32>("a").is_none());
        assert_eq!(shader.properties().len(), 1);
    }

    #[test]
    fn image_properties_are_a_set() {
        let mut shader = Shader::default();
        assert!(shader.add_image_property("normal"));
        assert!(shader.add_image_property("albedo"));
        assert!(!shader.add_image_property("normal"));

        assert!(shader.has_image_property("albedo"));
        assert_eq!(
            shader.image_properties().collect::<Vec<_>>(),
            vec!["albedo", "normal"]
        );
    }
}
