use bytemuck::Pod;

use crate::Reflect;
use crate::codec::{DecodeError, EncodeError, LoadContext, Persist, SaveContext};
use crate::kind::Kind;
use crate::objects::{ObjectId, ObjectRef};
use crate::resources::{Image, Shader, ShaderProperty};
use crate::world::World;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MaterialError {
    #[error("object {0} is not a live {1}")]
    MissingObject(ObjectId, &'static str),

    #[error("material has no shader")]
    NoShader,

    #[error("shader has no property '{0}'")]
    NoSuchProperty(String),

    #[error("shader has no image property '{0}'")]
    NoSuchImageProperty(String),

    #[error("property '{name}' is {expected} bytes, value is {found}")]
    SizeMismatch {
        name: String,
        expected: usize,
        found: usize,
    },
}

/// Uniform values and images for one use of a [`Shader`].
///
/// Layout after the shader reference:
///
/// ```text
/// u64 data length, data bytes
/// u64 image count, per image: property name, image location
/// ```
///
/// Loading a material registers it with its shader.
#[derive(Debug, Clone, Default, Reflect)]
pub struct Material {
    pub shader: ObjectRef<Shader>,
    #[reflect(skip)]
    data: Vec<u8>,
    #[reflect(skip)]
    images: Vec<(String, ObjectRef<Image>)>,
}

fn checked<'s, T: Pod>(shader: &'s Shader, name: &str) -> Result<&'s ShaderProperty, MaterialError> {
    let property = shader
        .property(name)
        .ok_or_else(|| MaterialError::NoSuchProperty(name.to_owned()))?;
    if property.size != size_of::<T>() {
        return Err(MaterialError::SizeMismatch {
            name: name.to_owned(),
            expected: property.size,
            found: size_of::<T>(),
        });
    }
    Ok(property)
}

impl Material {
    /// A material of `shader` with zeroed uniform data.
    pub fn new(shader: ObjectRef<Shader>, layout: &Shader) -> Self {
        Self {
            shader,
            data: vec![0; layout.uniform_size()],
            images: Vec::new(),
        }
    }

    /// Raw uniform data.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Read a property. Bytes past the end of the data read as zero.
    pub fn get_property<T: Pod>(&self, shader: &Shader, name: &str) -> Result<T, MaterialError> {
        let property = checked::<T>(shader, name)?;
        let mut value = T::zeroed();
        let bytes = bytemuck::bytes_of_mut(&mut value);
        let available = self.data.len().saturating_sub(property.offset).min(property.size);
        if available > 0 {
            bytes[..available]
                .copy_from_slice(&self.data[property.offset..property.offset + available]);
        }
        Ok(value)
    }

    /// Write a property, growing the data if the shader gained properties.
    pub fn set_property<T: Pod>(
        &mut self,
        shader: &Shader,
        name: &str,
        value: T,
    ) -> Result<(), MaterialError> {
        let property = checked::<T>(shader, name)?;
        if self.data.len() < property.end() {
            self.data.resize(property.end(), 0);
        }
        self.data[property.offset..property.end()].copy_from_slice(bytemuck::bytes_of(&value));
        Ok(())
    }

    pub fn image(&self, name: &str) -> Option<ObjectRef<Image>> {
        self.images
            .iter()
            .find(|(slot, _)| slot == name)
            .map(|(_, image)| *image)
    }

    /// Bind an image to one of the shader's image properties.
    pub fn set_image(
        &mut self,
        shader: &Shader,
        name: &str,
        image: ObjectRef<Image>,
    ) -> Result<(), MaterialError> {
        if !shader.has_image_property(name) {
            return Err(MaterialError::NoSuchImageProperty(name.to_owned()));
        }
        match self.images.iter_mut().find(|(slot, _)| slot == name) {
            Some((_, existing)) => *existing = image,
            None => self.images.push((name.to_owned(), image)),
        }
        Ok(())
    }
}

impl Persist for Material {
    fn save(&self, ctx: &mut SaveContext<'_>) -> Result<(), EncodeError> {
        ctx.write_fields(self)?;
        ctx.writer().write_bytes(&self.data);
        ctx.writer().write_len(self.images.len());
        for (name, image) in &self.images {
            ctx.writer().write_str(name);
            ctx.write_ref(name, image)?;
        }
        Ok(())
    }

    fn load(&mut self, ctx: &mut LoadContext<'_>) -> Result<(), DecodeError> {
        ctx.read_fields(self)?;
        self.data = ctx.reader().read_bytes()?;

        let count = ctx.reader().read_len()?;
        self.images.clear();
        for _ in 0..count {
            let name = ctx.reader().read_string()?;
            let image = ctx.read_reference::<Image>()?;
            self.images.push((name, image));
        }

        let this = ObjectRef::new(ctx.current());
        if let Some(shader) = self.shader.id()
            && let Some(shader) = ctx.world_mut().get_mut::<Shader>(shader)
        {
            shader.link_material(this);
        }
        Ok(())
    }
}

/// Spawn a material for `shader` and register it with the shader.
///
/// # Panics
///
/// Panics if [`Material`] is not registered.
pub fn create_material(
    world: &mut World,
    shader: ObjectRef<Shader>,
) -> Result<ObjectRef<Material>, MaterialError> {
    let shader_id = shader.id().ok_or(MaterialError::NoShader)?;
    let layout = world
        .get::<Shader>(shader_id)
        .ok_or(MaterialError::MissingObject(shader_id, Shader::NAME))?;
    let material = Material::new(shader, layout);
    let material = ObjectRef::new(world.insert(material));
    if let Some(shader) = world.get_mut::<Shader>(shader_id) {
        shader.link_material(material);
    }
    Ok(material)
}

fn shader_property<T: Pod>(
    world: &World,
    material: ObjectId,
    name: &str,
) -> Result<ShaderProperty, MaterialError> {
    let shader = world
        .get::<Material>(material)
        .ok_or(MaterialError::MissingObject(material, Material::NAME))?
        .shader
        .id()
        .ok_or(MaterialError::NoShader)?;
    let shader = world
        .get::<Shader>(shader)
        .ok_or(MaterialError::MissingObject(shader, Shader::NAME))?;
    checked::<T>(shader, name).cloned()
}

/// Read a property of a material living in `world`.
pub fn material_property<T: Pod>(
    world: &World,
    material: ObjectId,
    name: &str,
) -> Result<T, MaterialError> {
    let material = world
        .get::<Material>(material)
        .ok_or(MaterialError::MissingObject(material, Material::NAME))?;
    let shader = material.shader.id().ok_or(MaterialError::NoShader)?;
    let shader = world
        .get::<Shader>(shader)
        .ok_or(MaterialError::MissingObject(shader, Shader::NAME))?;
    material.get_property(shader, name)
}

/// Write a property of a material living in `world`.
pub fn set_material_property<T: Pod>(
    world: &mut World,
    material: ObjectId,
    name: &str,
    value: T,
) -> Result<(), MaterialError> {
    let property = shader_property::<T>(world, material, name)?;
    let material = world
        .get_mut::<Material>(material)
        .ok_or(MaterialError::MissingObject(material, Material::NAME))?;
    if material.data.len() < property.end() {
        material.data.resize(property.end(), 0);
    }
    material.data[property.offset..property.end()].copy_from_slice(bytemuck::bytes_of(&value));
    Ok(())
}
