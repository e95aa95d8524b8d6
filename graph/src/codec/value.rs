//! Wire encoding of single field values.

use keepsake_core::color::{Color8, Color32};
use keepsake_core::math::{Mat4, Quat, Vec2, Vec3, Vec4};

use super::bytes::{ByteReader, ByteWriter};
use super::error::DecodeError;
use crate::field::{FieldDescriptor, FieldTag, FieldValue};

/// Write a non-reference value. References are written by the caller, which
/// knows how to turn a handle into a location.
pub(crate) fn write_value(writer: &mut ByteWriter, value: &FieldValue) {
    match value {
        FieldValue::I8(v) => writer.write_pod(v),
        FieldValue::I16(v) => writer.write_pod(v),
        FieldValue::I32(v) => writer.write_pod(v),
        FieldValue::I64(v) => writer.write_pod(v),
        FieldValue::U8(v) => writer.write_pod(v),
        FieldValue::U16(v) => writer.write_pod(v),
        FieldValue::U32(v) => writer.write_pod(v),
        FieldValue::U64(v) => writer.write_pod(v),
        FieldValue::F32(v) => writer.write_pod(v),
        FieldValue::F64(v) => writer.write_pod(v),
        FieldValue::Bool(v) => writer.write_pod(&u8::from(*v)),
        FieldValue::String(s) => writer.write_str(s),
        FieldValue::Vec2(v) => writer.write_pod(v),
        FieldValue::Vec3(v) => writer.write_pod(v),
        FieldValue::Vec4(v) => writer.write_pod(v),
        FieldValue::Quat(v) => writer.write_pod(v),
        FieldValue::Mat4(v) => writer.write_pod(v),
        FieldValue::Color8(v) => writer.write_pod(v),
        FieldValue::Color32(v) => writer.write_pod(v),
        FieldValue::Opaque(bytes) => writer.write_raw(bytes),
        FieldValue::Reference(_) => {
            unreachable!("reference values are written through SaveContext")
        }
    }
}

/// Read a non-reference value shaped by the field's tag and size.
pub(crate) fn read_value(
    reader: &mut ByteReader<'_>,
    field: &FieldDescriptor,
) -> Result<FieldValue, DecodeError> {
    let value = match (field.tag(), field.size()) {
        (FieldTag::Integer, 1) => FieldValue::I8(reader.read_pod()?),
        (FieldTag::Integer, 2) => FieldValue::I16(reader.read_pod()?),
        (FieldTag::Integer, 4) => FieldValue::I32(reader.read_pod()?),
        (FieldTag::Integer, 8) => FieldValue::I64(reader.read_pod()?),
        (FieldTag::Unsigned, 1) => FieldValue::U8(reader.read_pod()?),
        (FieldTag::Unsigned, 2) => FieldValue::U16(reader.read_pod()?),
        (FieldTag::Unsigned, 4) => FieldValue::U32(reader.read_pod()?),
        (FieldTag::Unsigned, 8) => FieldValue::U64(reader.read_pod()?),
        (FieldTag::Float, 4) => FieldValue::F32(reader.read_pod()?),
        (FieldTag::Float, 8) => FieldValue::F64(reader.read_pod()?),
        (FieldTag::Bool, _) => FieldValue::Bool(reader.read_pod::<u8>()? != 0),
        (FieldTag::String, _) => FieldValue::String(reader.read_string()?),
        (FieldTag::Vec2, _) => FieldValue::Vec2(reader.read_pod::<Vec2>()?),
        (FieldTag::Vec3, _) => FieldValue::Vec3(reader.read_pod::<Vec3>()?),
        (FieldTag::Vec4, _) => FieldValue::Vec4(reader.read_pod::<Vec4>()?),
        (FieldTag::Quat, _) => FieldValue::Quat(reader.read_pod::<Quat>()?),
        (FieldTag::Mat4, _) => FieldValue::Mat4(reader.read_pod::<Mat4>()?),
        (FieldTag::Color, 4) => FieldValue::Color8(reader.read_pod::<Color8>()?),
        (FieldTag::Color, 16) => FieldValue::Color32(reader.read_pod::<Color32>()?),
        (FieldTag::Opaque, size) => FieldValue::Opaque(reader.read_raw(size)?.to_vec()),
        (tag, size) => {
            return Err(DecodeError::Invalid(format!(
                "field '{}' has no wire form for {tag:?} of {size} bytes",
                field.name()
            )));
        }
    };
    Ok(value)
}
