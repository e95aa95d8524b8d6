//! Field descriptors: typed, name-addressed access to one field of a kind.
//!
//! A [`FieldDescriptor`] records a field's name, [`FieldTag`], byte offset and
//! size within the owning struct, and a pair of accessors that move the value
//! in and out as a [`FieldValue`]. Descriptors are produced by
//! `#[derive(Reflect)]` and stored once per kind in the
//! [`TypeRegistry`](crate::TypeRegistry).
//!
//! The set of built-in field types is closed: the types implementing
//! [`FieldType`] below. Any other `Pod` type is reflected as
//! [`FieldTag::Opaque`] and copied as raw bytes.

use std::any::Any;

use bytemuck::Pod;
use keepsake_core::color::{Color8, Color32};
use keepsake_core::math::{Mat4, Quat, Vec2, Vec3, Vec4};
use thiserror::Error;

use crate::kind::{Kind, KindHash, Object};
use crate::objects::{ObjectId, ObjectRef};

/// Semantic type of a reflected field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldTag {
    Integer,
    Unsigned,
    Float,
    Bool,
    String,
    Vec2,
    Vec3,
    Vec4,
    Quat,
    Mat4,
    Color,
    /// Handle to another object, persisted as that object's location.
    Reference,
    /// Raw bytes of a `Pod` value.
    Opaque,
}

/// A field value moved in or out of an object.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Bool(bool),
    String(String),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Quat(Quat),
    Mat4(Mat4),
    Color8(Color8),
    Color32(Color32),
    Reference(Option<ObjectId>),
    Opaque(Vec<u8>),
}

impl FieldValue {
    pub fn tag(&self) -> FieldTag {
        match self {
            Self::I8(_) | Self::I16(_) | Self::I32(_) | Self::I64(_) => FieldTag::Integer,
            Self::U8(_) | Self::U16(_) | Self::U32(_) | Self::U64(_) => FieldTag::Unsigned,
            Self::F32(_) | Self::F64(_) => FieldTag::Float,
            Self::Bool(_) => FieldTag::Bool,
            Self::String(_) => FieldTag::String,
            Self::Vec2(_) => FieldTag::Vec2,
            Self::Vec3(_) => FieldTag::Vec3,
            Self::Vec4(_) => FieldTag::Vec4,
            Self::Quat(_) => FieldTag::Quat,
            Self::Mat4(_) => FieldTag::Mat4,
            Self::Color8(_) | Self::Color32(_) => FieldTag::Color,
            Self::Reference(_) => FieldTag::Reference,
            Self::Opaque(_) => FieldTag::Opaque,
        }
    }

    /// Short name of the variant, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::I8(_) => "i8",
            Self::I16(_) => "i16",
            Self::I32(_) => "i32",
            Self::I64(_) => "i64",
            Self::U8(_) => "u8",
            Self::U16(_) => "u16",
            Self::U32(_) => "u32",
            Self::U64(_) => "u64",
            Self::F32(_) => "f32",
            Self::F64(_) => "f64",
            Self::Bool(_) => "bool",
            Self::String(_) => "String",
            Self::Vec2(_) => "Vec2",
            Self::Vec3(_) => "Vec3",
            Self::Vec4(_) => "Vec4",
            Self::Quat(_) => "Quat",
            Self::Mat4(_) => "Mat4",
            Self::Color8(_) => "Color8",
            Self::Color32(_) => "Color32",
            Self::Reference(_) => "reference",
            Self::Opaque(_) => "bytes",
        }
    }
}

/// Errors from reading or writing a field through its descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    /// The object handed to the accessor is not an instance of the owning kind.
    #[error("field '{field}' belongs to kind '{expected}', got an instance of '{found}'")]
    KindMismatch {
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },
    /// The value variant does not fit the field.
    #[error("field '{field}' holds {expected}, cannot store {found}")]
    ValueMismatch {
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },
    #[error("kind '{kind}' has no field named '{field}'")]
    NoSuchField { kind: &'static str, field: String },
}

/// A built-in reflectable field type.
pub trait FieldType: Sized + Send + Sync + 'static {
    const TAG: FieldTag;

    /// Hash of the kind a reference field points at.
    fn referenced_kind() -> Option<KindHash> {
        None
    }

    fn to_value(&self) -> FieldValue;

    /// Hands the value back when its variant does not match this type.
    fn from_value(value: FieldValue) -> Result<Self, FieldValue>;
}

macro_rules! impl_field_type {
    ($($ty:ty => $variant:ident, $tag:ident;)*) => {
        $(
            impl FieldType for $ty {
                const TAG: FieldTag = FieldTag::$tag;

                fn to_value(&self) -> FieldValue {
                    FieldValue::$variant(self.clone())
                }

                fn from_value(value: FieldValue) -> Result<Self, FieldValue> {
                    match value {
                        FieldValue::$variant(v) => Ok(v),
                        other => Err(other),
                    }
                }
            }
        )*
    };
}

impl_field_type! {
    i8 => I8, Integer;
    i16 => I16, Integer;
    i32 => I32, Integer;
    i64 => I64, Integer;
    u8 => U8, Unsigned;
    u16 => U16, Unsigned;
    u32 => U32, Unsigned;
    u64 => U64, Unsigned;
    f32 => F32, Float;
    f64 => F64, Float;
    bool => Bool, Bool;
    String => String, String;
    Vec2 => Vec2, Vec2;
    Vec3 => Vec3, Vec3;
    Vec4 => Vec4, Vec4;
    Quat => Quat, Quat;
    Mat4 => Mat4, Mat4;
    Color8 => Color8, Color;
    Color32 => Color32, Color;
}

impl<K: Kind> FieldType for ObjectRef<K> {
    const TAG: FieldTag = FieldTag::Reference;

    fn referenced_kind() -> Option<KindHash> {
        Some(K::HASH)
    }

    fn to_value(&self) -> FieldValue {
        FieldValue::Reference(self.id())
    }

    fn from_value(value: FieldValue) -> Result<Self, FieldValue> {
        match value {
            FieldValue::Reference(id) => Ok(ObjectRef::from_id(id)),
            other => Err(other),
        }
    }
}

type ReadFn = Box<dyn Fn(&dyn Any) -> Option<FieldValue> + Send + Sync>;
type WriteFn = Box<dyn Fn(&mut dyn Any, FieldValue) -> Result<(), FieldValue> + Send + Sync>;

/// Metadata and accessors for one field of a kind.
pub struct FieldDescriptor {
    name: &'static str,
    tag: FieldTag,
    offset: usize,
    size: usize,
    ref_kind: Option<KindHash>,
    owner: &'static str,
    value_type: &'static str,
    read: ReadFn,
    write: WriteFn,
}

impl FieldDescriptor {
    /// Descriptor for a field of a built-in type.
    ///
    /// # Panics
    ///
    /// Panics if the field does not lie within `K`.
    pub fn new<K: Kind, T: FieldType>(
        name: &'static str,
        offset: usize,
        get: fn(&K) -> &T,
        get_mut: fn(&mut K) -> &mut T,
    ) -> Self {
        Self::with_accessors::<K, T>(
            name,
            T::TAG,
            offset,
            T::referenced_kind(),
            Box::new(move |obj: &dyn Any| obj.downcast_ref::<K>().map(|k| get(k).to_value())),
            Box::new(move |obj: &mut dyn Any, value: FieldValue| {
                let Some(k) = obj.downcast_mut::<K>() else {
                    return Err(value);
                };
                *get_mut(k) = T::from_value(value)?;
                Ok(())
            }),
        )
    }

    /// Descriptor for a `Pod` field copied as raw bytes.
    ///
    /// # Panics
    ///
    /// Panics if the field does not lie within `K`.
    pub fn opaque<K: Kind, T: Pod + Send + Sync>(
        name: &'static str,
        offset: usize,
        get: fn(&K) -> &T,
        get_mut: fn(&mut K) -> &mut T,
    ) -> Self {
        Self::with_accessors::<K, T>(
            name,
            FieldTag::Opaque,
            offset,
            None,
            Box::new(move |obj: &dyn Any| {
                obj.downcast_ref::<K>()
                    .map(|k| FieldValue::Opaque(bytemuck::bytes_of(get(k)).to_vec()))
            }),
            Box::new(move |obj: &mut dyn Any, value: FieldValue| {
                let Some(k) = obj.downcast_mut::<K>() else {
                    return Err(value);
                };
                match &value {
                    FieldValue::Opaque(bytes) if bytes.len() == size_of::<T>() => {
                        *get_mut(k) = bytemuck::pod_read_unaligned(bytes);
                        Ok(())
                    }
                    _ => Err(value),
                }
            }),
        )
    }

    fn with_accessors<K: Kind, T>(
        name: &'static str,
        tag: FieldTag,
        offset: usize,
        ref_kind: Option<KindHash>,
        read: ReadFn,
        write: WriteFn,
    ) -> Self {
        let size = size_of::<T>();
        assert!(
            offset + size <= size_of::<K>(),
            "field '{}' of kind '{}' spans bytes {}..{} outside the {}-byte object",
            name,
            K::NAME,
            offset,
            offset + size,
            size_of::<K>()
        );
        Self {
            name,
            tag,
            offset,
            size,
            ref_kind,
            owner: K::NAME,
            value_type: std::any::type_name::<T>(),
            read,
            write,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn tag(&self) -> FieldTag {
        self.tag
    }

    /// Byte offset of the field within the owning struct.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// In-memory size of the field. For opaque fields this is also the number
    /// of bytes on the wire.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Kind hash of the referenced object, for [`FieldTag::Reference`] fields.
    pub fn ref_kind(&self) -> Option<KindHash> {
        self.ref_kind
    }

    /// Name of the kind owning this field.
    pub fn owner(&self) -> &'static str {
        self.owner
    }

    /// Copy the field's current value out of `object`.
    pub fn read(&self, object: &dyn Object) -> Result<FieldValue, FieldError> {
        (self.read)(object.as_any()).ok_or_else(|| self.kind_mismatch(object.kind_name()))
    }

    /// Store `value` into the field. A reference value is stored as is and
    /// never triggers a load.
    pub fn write(&self, object: &mut dyn Object, value: FieldValue) -> Result<(), FieldError> {
        let found_kind = object.kind_name();
        (self.write)(object.as_any_mut(), value).map_err(|rejected| {
            if found_kind != self.owner {
                self.kind_mismatch(found_kind)
            } else {
                FieldError::ValueMismatch {
                    field: self.name,
                    expected: self.value_type,
                    found: rejected.type_name(),
                }
            }
        })
    }

    fn kind_mismatch(&self, found: &'static str) -> FieldError {
        FieldError::KindMismatch {
            field: self.name,
            expected: self.owner,
            found,
        }
    }
}

impl std::fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("tag", &self.tag)
            .field("offset", &self.offset)
            .field("size", &self.size)
            .field("ref_kind", &self.ref_kind)
            .finish()
    }
}
