use bytemuck::{Pod, Zeroable};
use keepsake_core::math::{Vec2, Vec3};

use crate::Reflect;
use crate::codec::{ByteReader, DecodeError, EncodeError, LoadContext, Persist, SaveContext};

/// One mesh vertex, stored verbatim in model files.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: Vec3,
    pub uv: Vec2,
    pub normal: Vec3,
    pub tangent: Vec3,
    pub bitangent: Vec3,
}

impl Vertex {
    pub fn new(position: Vec3, uv: Vec2, normal: Vec3) -> Self {
        Self {
            position,
            uv,
            normal,
            ..Default::default()
        }
    }
}

/// An indexed triangle mesh.
///
/// Stored as the vertex count and the raw vertices, then the index count and
/// the raw `u32` indices. Counts are `u64`.
#[derive(Debug, Clone, Default, PartialEq, Reflect)]
pub struct Model {
    #[reflect(skip)]
    vertices: Vec<Vertex>,
    #[reflect(skip)]
    indices: Vec<u32>,
}

impl Model {
    /// `None` if an index points past the last vertex.
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Option<Self> {
        let model = Self { vertices, indices };
        model.first_bad_index().is_none().then_some(model)
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    fn first_bad_index(&self) -> Option<u32> {
        self.indices
            .iter()
            .copied()
            .find(|&i| i as usize >= self.vertices.len())
    }
}

fn read_array<T: Pod>(reader: &mut ByteReader<'_>) -> Result<Vec<T>, DecodeError> {
    let offset = reader.position();
    let count = reader.read_len()?;
    let len = count
        .checked_mul(size_of::<T>())
        .ok_or(DecodeError::UnexpectedEof {
            needed: usize::MAX,
            remaining: reader.remaining(),
            offset,
        })?;
    let bytes = reader.read_raw(len)?;
    Ok(bytes
        .chunks_exact(size_of::<T>())
        .map(bytemuck::pod_read_unaligned)
        .collect())
}

impl Persist for Model {
    fn save(&self, ctx: &mut SaveContext<'_>) -> Result<(), EncodeError> {
        let writer = ctx.writer();
        writer.write_len(self.vertices.len());
        writer.write_raw(bytemuck::cast_slice(&self.vertices));
        writer.write_len(self.indices.len());
        writer.write_raw(bytemuck::cast_slice(&self.indices));
        Ok(())
    }

    fn load(&mut self, ctx: &mut LoadContext<'_>) -> Result<(), DecodeError> {
        self.vertices = read_array(ctx.reader())?;
        self.indices = read_array(ctx.reader())?;
        if let Some(index) = self.first_bad_index() {
            return Err(DecodeError::Invalid(format!(
                "index {index} is out of range for {} vertices",
                self.vertices.len()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Vec<Vertex> {
        vec![
            Vertex::new(Vec3::new(0.0, 0.0, 0.0), Vec2::new(0.0, 0.0), Vec3::z()),
            Vertex::new(Vec3::new(1.0, 0.0, 0.0), Vec2::new(1.0, 0.0), Vec3::z()),
            Vertex::new(Vec3::new(0.0, 1.0, 0.0), Vec2::new(0.0, 1.0), Vec3::z()),
        ]
    }

    #[test]
    fn vertex_is_tightly_packed() {
        assert_eq!(size_of::<Vertex>(), 14 * 4);
        assert_eq!(std::mem::offset_of!(Vertex, normal), 20);
    }

    #[test]
    fn indices_must_hit_a_vertex() {
        assert!(Model::new(triangle(), vec![0, 1, 2]).is_some());
        assert!(Model::new(triangle(), vec![0, 1, 3]).is_none());
    }

    #[test]
    fn read_array_rejects_short_payload() {
        let mut data = 2u64.to_le_bytes().to_vec();
        data.extend_from_slice(&7u32.to_ne_bytes());
        let mut reader = ByteReader::new(&data);
        assert!(matches!(
            read_array::<u32>(&mut reader),
            Err(DecodeError::UnexpectedEof { needed: 8, .. })
        ));
    }
}
