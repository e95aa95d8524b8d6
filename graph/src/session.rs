//! Cross-reference resolution.
//!
//! Loading runs in two phases inside a [`LoadSession`]. Resolving a location
//! that is not yet registered creates a default instance through the kind
//! factory, registers it under the location and queues it. The session then
//! decodes queued objects one at a time until the queue is empty. Every
//! reference therefore resolves to a registered handle immediately, cycles
//! terminate, and no decode ever reads a half-populated object.

use std::collections::VecDeque;

use keepsake_vfs::path;

use crate::codec::{DecodeError, LoadContext};
use crate::error::LoadError;
use crate::identity::Identity;
use crate::kind::KindHash;
use crate::objects::ObjectId;
use crate::world::World;

/// One top-level load and everything it pulls in.
#[derive(Debug, Default)]
pub struct LoadSession {
    queue: VecDeque<ObjectId>,
    created: Vec<ObjectId>,
}

impl LoadSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the object registered at `location`, or create, register and
    /// queue a new one of `kind`.
    ///
    /// A registered object of a different kind is returned as is, with a
    /// warning.
    pub fn resolve(
        &mut self,
        world: &mut World,
        kind: KindHash,
        location: &str,
    ) -> Result<ObjectId, DecodeError> {
        let location =
            path::normalize(location).map_err(|_| DecodeError::InvalidLocation(location.to_owned()))?;

        if let Some(existing) = world.identities().get_by_location(&location) {
            if let Some(found) = world.kind_of(existing)
                && found != kind
            {
                let registry = world.registry();
                log::warn!(
                    "'{}' is already loaded as a {}, not a {}",
                    location,
                    registry.lookup(found).map_or("<unknown>", |k| k.name()),
                    registry.lookup(kind).map_or("<unknown>", |k| k.name()),
                );
            }
            return Ok(existing);
        }

        let descriptor = world
            .registry()
            .lookup(kind)
            .ok_or(DecodeError::UnknownKind(kind))?;
        let name = descriptor.name();
        let object = descriptor.create();
        let id = world.insert_object(object, Identity::located(location.as_str()));
        log::debug!("Queued {name} '{location}' as {id}");

        self.queue.push_back(id);
        self.created.push(id);
        Ok(id)
    }

    /// Record an object created inline during this session.
    pub(crate) fn track(&mut self, id: ObjectId) {
        self.created.push(id);
    }

    /// Objects created so far, in creation order.
    pub fn created(&self) -> &[ObjectId] {
        &self.created
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Read and decode queued objects until none are left.
    pub fn drain(&mut self, world: &mut World) -> Result<(), LoadError> {
        while let Some(id) = self.queue.pop_front() {
            let Some(location) = world.location_of(id).map(str::to_owned) else {
                log::debug!("Skipping {id}: destroyed before it was read");
                continue;
            };
            let data = world
                .vfs()
                .read(&location)
                .map_err(|source| LoadError::Storage {
                    location: location.clone(),
                    source,
                })?;
            self.decode(world, id, &data)
                .map_err(|source| LoadError::Decode {
                    location: location.clone(),
                    source,
                })?;
            log::debug!("Loaded '{location}' ({} bytes)", data.len());
        }
        Ok(())
    }

    /// Decode `data` into the already registered object `id`.
    pub(crate) fn decode(
        &mut self,
        world: &mut World,
        id: ObjectId,
        data: &[u8],
    ) -> Result<(), DecodeError> {
        let mut ctx = LoadContext::new(world, self, data, id);
        ctx.decode(id)?;
        if ctx.remaining() > 0 {
            log::warn!("{} trailing bytes after object {id}", ctx.remaining());
        }
        Ok(())
    }

    /// Destroy every object this session created.
    pub fn rollback(self, world: &mut World) {
        log::debug!("Rolling back {} objects", self.created.len());
        for id in self.created.into_iter().rev() {
            world.destroy_single(id);
        }
    }
}
