//! Save and load contexts.
//!
//! [`SaveContext`] walks an object and its reflected fields into a
//! [`ByteWriter`], turning references into locations. [`LoadContext`] reads
//! them back, resolving locations through the running
//! [`LoadSession`](crate::session::LoadSession).

use std::sync::Arc;

use super::bytes::{ByteReader, ByteWriter};
use super::error::{DecodeError, EncodeError};
use super::value::{read_value, write_value};
use crate::field::{FieldTag, FieldValue};
use crate::identity::Identity;
use crate::kind::{Category, Kind, KindHash, Object};
use crate::objects::{ObjectId, ObjectRef};
use crate::registry::{Codec, KindDescriptor};
use crate::session::LoadSession;
use crate::world::World;

// ---------------------------------------------------------------------------
// SaveContext
// ---------------------------------------------------------------------------

/// Context for writing one object file.
pub struct SaveContext<'w> {
    world: &'w World,
    writer: ByteWriter,
    current: ObjectId,
}

impl<'w> SaveContext<'w> {
    pub(crate) fn new(world: &'w World, root: ObjectId) -> Self {
        Self {
            world,
            writer: ByteWriter::new(),
            current: root,
        }
    }

    pub fn world(&self) -> &'w World {
        self.world
    }

    pub fn writer(&mut self) -> &mut ByteWriter {
        &mut self.writer
    }

    /// The object being written. Changes while nested objects are written.
    pub fn current(&self) -> ObjectId {
        self.current
    }

    /// Write `object`'s reflected fields in registration order.
    pub fn write_fields(&mut self, object: &dyn Object) -> Result<(), EncodeError> {
        let world = self.world;
        let descriptor = world
            .registry()
            .lookup(object.kind_hash())
            .ok_or(EncodeError::UnknownKind(object.kind_hash()))?;
        self.write_fields_of(object, descriptor)
    }

    fn write_fields_of(
        &mut self,
        object: &dyn Object,
        descriptor: &KindDescriptor,
    ) -> Result<(), EncodeError> {
        for field in descriptor.fields() {
            match field.read(object)? {
                FieldValue::Reference(target) => self.write_reference(field.name(), target)?,
                value => write_value(&mut self.writer, &value),
            }
        }
        Ok(())
    }

    /// Write a reference as the target's location, or an empty string for
    /// null. A handle to a destroyed object is written as null.
    pub fn write_reference(
        &mut self,
        field: &str,
        target: Option<ObjectId>,
    ) -> Result<(), EncodeError> {
        let Some(target) = target else {
            self.writer.write_str("");
            return Ok(());
        };
        if !self.world.contains(target) {
            log::warn!("Field '{field}' references destroyed object {target}; writing null");
            self.writer.write_str("");
            return Ok(());
        }
        match self.world.location_of(target) {
            Some(location) => {
                self.writer.write_str(location);
                Ok(())
            }
            None => Err(EncodeError::UnlocatedReference {
                field: field.to_owned(),
                target,
            }),
        }
    }

    pub fn write_ref<K: Kind>(&mut self, field: &str, target: &ObjectRef<K>) -> Result<(), EncodeError> {
        self.write_reference(field, target.id())
    }

    /// Write the object `id` inline, using its kind's codec.
    pub fn write_object(&mut self, id: ObjectId) -> Result<(), EncodeError> {
        let world = self.world;
        let object = world.object(id).ok_or(EncodeError::MissingObject(id))?;
        let descriptor = world
            .registry()
            .lookup(object.kind_hash())
            .ok_or(EncodeError::UnknownKind(object.kind_hash()))?;

        let previous = std::mem::replace(&mut self.current, id);
        let result = match descriptor.codec() {
            Codec::Fields => self.write_fields_of(object, descriptor),
            Codec::Custom { save, .. } => save(object, self),
        };
        self.current = previous;
        result
    }

    pub fn finish(self) -> Vec<u8> {
        self.writer.into_inner()
    }
}

// ---------------------------------------------------------------------------
// LoadContext
// ---------------------------------------------------------------------------

/// Context for reading one object file into a world.
///
/// The object being decoded is moved out of the world for the duration, so
/// the world can be mutated freely: references are resolved, nested objects
/// are created and hierarchy links are made through [`world_mut`](Self::world_mut).
pub struct LoadContext<'a> {
    world: &'a mut World,
    session: &'a mut LoadSession,
    reader: ByteReader<'a>,
    current: ObjectId,
}

impl<'a> LoadContext<'a> {
    pub(crate) fn new(
        world: &'a mut World,
        session: &'a mut LoadSession,
        data: &'a [u8],
        root: ObjectId,
    ) -> Self {
        Self {
            world,
            session,
            reader: ByteReader::new(data),
            current: root,
        }
    }

    pub fn world(&self) -> &World {
        &*self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut *self.world
    }

    pub fn reader(&mut self) -> &mut ByteReader<'a> {
        &mut self.reader
    }

    /// The object being read. Changes while nested objects are read.
    pub fn current(&self) -> ObjectId {
        self.current
    }

    /// Read `object`'s reflected fields in registration order.
    pub fn read_fields(&mut self, object: &mut dyn Object) -> Result<(), DecodeError> {
        let registry = Arc::clone(self.world.registry());
        let descriptor = registry
            .lookup(object.kind_hash())
            .ok_or(DecodeError::UnknownKind(object.kind_hash()))?;
        self.read_fields_of(object, descriptor)
    }

    fn read_fields_of(
        &mut self,
        object: &mut dyn Object,
        descriptor: &KindDescriptor,
    ) -> Result<(), DecodeError> {
        for field in descriptor.fields() {
            let value = if field.tag() == FieldTag::Reference {
                let location = self.reader.read_string()?;
                let target = match (location.is_empty(), field.ref_kind()) {
                    (true, _) => None,
                    (false, Some(kind)) => Some(self.resolve(kind, &location)?),
                    (false, None) => {
                        return Err(DecodeError::Invalid(format!(
                            "reference field '{}' has no target kind",
                            field.name()
                        )));
                    }
                };
                FieldValue::Reference(target)
            } else {
                read_value(&mut self.reader, field)?
            };
            field.write(object, value)?;
        }
        Ok(())
    }

    /// Get or create the object stored at `location`.
    ///
    /// A new object is registered under `location` right away and decoded
    /// later in the same session, so cycles of references terminate and the
    /// returned handle is valid immediately.
    pub fn resolve(&mut self, kind: KindHash, location: &str) -> Result<ObjectId, DecodeError> {
        self.session.resolve(self.world, kind, location)
    }

    pub fn resolve_ref<K: Kind>(&mut self, location: &str) -> Result<ObjectRef<K>, DecodeError> {
        self.resolve(K::HASH, location).map(ObjectRef::new)
    }

    /// Read a location written by [`SaveContext::write_reference`] and resolve it.
    pub fn read_reference<K: Kind>(&mut self) -> Result<ObjectRef<K>, DecodeError> {
        let location = self.reader.read_string()?;
        if location.is_empty() {
            return Ok(ObjectRef::null());
        }
        self.resolve_ref(&location)
    }

    /// Create an object of `kind` without a location and read it inline from
    /// the current data. The object is named after its kind until its own
    /// codec renames it.
    pub fn read_object(&mut self, kind: KindHash) -> Result<ObjectId, DecodeError> {
        let descriptor = self
            .world
            .registry()
            .lookup(kind)
            .ok_or(DecodeError::UnknownKind(kind))?;
        let object = descriptor.create();
        let identity = Identity::unlocated(descriptor.name());
        let id = self.world.insert_object(object, identity);
        self.session.track(id);
        self.decode(id)?;
        Ok(id)
    }

    /// Like [`read_object`](Self::read_object), but fails unless the kind
    /// belongs to `category`.
    pub fn read_object_in(
        &mut self,
        kind: KindHash,
        category: Category,
    ) -> Result<ObjectId, DecodeError> {
        let descriptor = self
            .world
            .registry()
            .lookup(kind)
            .ok_or(DecodeError::UnknownKind(kind))?;
        if descriptor.category() != category {
            return Err(DecodeError::WrongCategory {
                kind: descriptor.name(),
                expected: category,
                found: descriptor.category(),
            });
        }
        self.read_object(kind)
    }

    /// Decode the object `id` from the current data, using its kind's codec.
    pub(crate) fn decode(&mut self, id: ObjectId) -> Result<(), DecodeError> {
        let registry = Arc::clone(self.world.registry());
        let kind = self
            .world
            .objects
            .kind_of(id)
            .ok_or(DecodeError::MissingObject(id))?;
        let descriptor = registry.lookup(kind).ok_or(DecodeError::UnknownKind(kind))?;
        let mut object = self
            .world
            .objects
            .take(id)
            .ok_or(DecodeError::MissingObject(id))?;

        let previous = std::mem::replace(&mut self.current, id);
        let result = match descriptor.codec() {
            Codec::Fields => self.read_fields_of(object.as_mut(), descriptor),
            Codec::Custom { load, .. } => load(object.as_mut(), self),
        };
        self.current = previous;

        if !self.world.objects.put_back(id, object) {
            log::warn!("Object {id} was destroyed while it was being loaded");
        }
        result
    }

    /// Bytes left after the root object was read.
    pub(crate) fn remaining(&self) -> usize {
        self.reader.remaining()
    }
}
