//! The [`World`]: owner of every live object and entry point for loading
//! and saving.

use std::sync::Arc;

use keepsake_vfs::{FileSystemSource, Vfs, path};

use crate::codec::SaveContext;
use crate::commands::CommandBuffer;
use crate::config::PersistConfig;
use crate::error::{LoadError, SaveError};
use crate::identity::{Identity, IdentityRegistry};
use crate::kind::{Kind, KindHash, Object};
use crate::objects::{ObjectId, ObjectRef, Objects};
use crate::registry::TypeRegistry;
use crate::scene::{Hierarchy, Node};
use crate::session::LoadSession;
use crate::system::SystemTable;

/// Name under which [`World::from_config`] mounts the assets directory.
pub const ASSETS_SOURCE: &str = "assets";

/// Owns the object arena, the identity registry, the scene hierarchy and
/// system membership.
///
/// All structural changes need `&mut World`. During a parallel frame phase
/// systems only see `&World` and queue changes on [`commands`](World::commands).
pub struct World {
    registry: Arc<TypeRegistry>,
    pub(crate) objects: Objects,
    identities: IdentityRegistry,
    pub(crate) hierarchy: Hierarchy,
    pub(crate) systems: SystemTable,
    vfs: Vfs,
    commands: CommandBuffer,
}

impl World {
    pub fn new(registry: Arc<TypeRegistry>, vfs: Vfs) -> Self {
        Self {
            registry,
            objects: Objects::default(),
            identities: IdentityRegistry::new(),
            hierarchy: Hierarchy::default(),
            systems: SystemTable::default(),
            vfs,
            commands: CommandBuffer::new(),
        }
    }

    /// A world reading and writing files below `config.assets_root`.
    pub fn from_config(registry: Arc<TypeRegistry>, config: &PersistConfig) -> Self {
        log::info!("Assets root: {}", config.assets_root.display());
        let vfs = Vfs::with_default(ASSETS_SOURCE, FileSystemSource::new(&config.assets_root));
        Self::new(registry, vfs)
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    pub fn vfs(&self) -> &Vfs {
        &self.vfs
    }

    pub fn identities(&self) -> &IdentityRegistry {
        &self.identities
    }

    pub fn systems(&self) -> &SystemTable {
        &self.systems
    }

    /// Deferred mutations, applied by [`apply_commands`](World::apply_commands).
    pub fn commands(&self) -> &CommandBuffer {
        &self.commands
    }

    // ---- objects ----

    /// Store an object and record its identity.
    pub(crate) fn insert_object(&mut self, object: Box<dyn Object>, identity: Identity) -> ObjectId {
        let id = self.objects.insert(object);
        self.identities.register(id, identity);
        id
    }

    /// Create a default instance of a registered kind, with no location.
    ///
    /// # Panics
    ///
    /// Panics if `K` is not registered.
    pub fn spawn<K: Kind>(&mut self) -> ObjectId {
        self.spawn_kind(K::HASH)
            .unwrap_or_else(|| panic!("kind '{}' is not registered", K::NAME))
    }

    /// Store `value` as a new object with no location, named after its kind.
    ///
    /// # Panics
    ///
    /// Panics if `K` is not registered.
    pub fn insert<K: Kind>(&mut self, value: K) -> ObjectId {
        assert!(
            self.registry.contains(K::HASH),
            "kind '{}' is not registered",
            K::NAME
        );
        self.insert_object(Box::new(value), Identity::unlocated(K::NAME))
    }

    /// Create a default instance of `kind`, named after the kind. `None` if
    /// the kind is unknown.
    pub fn spawn_kind(&mut self, kind: KindHash) -> Option<ObjectId> {
        let descriptor = self.registry.lookup(kind)?;
        let object = descriptor.create();
        let identity = Identity::unlocated(descriptor.name());
        Some(self.insert_object(object, identity))
    }

    /// A new parentless scene node.
    pub fn spawn_node(&mut self, name: &str) -> ObjectId {
        let id = self.insert(Node::named(name));
        self.identities.set_name(id, name);
        id
    }

    /// Alive, including objects temporarily moved out during a load or a
    /// frame phase.
    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains(id)
    }

    pub fn kind_of(&self, id: ObjectId) -> Option<KindHash> {
        self.objects.kind_of(id)
    }

    pub fn object(&self, id: ObjectId) -> Option<&dyn Object> {
        self.objects.get(id)
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut dyn Object> {
        self.objects.get_mut(id)
    }

    pub fn get<K: Kind>(&self, id: ObjectId) -> Option<&K> {
        self.objects.get(id)?.downcast_ref::<K>()
    }

    pub fn get_mut<K: Kind>(&mut self, id: ObjectId) -> Option<&mut K> {
        self.objects.get_mut(id)?.downcast_mut::<K>()
    }

    /// Number of live objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.len() == 0
    }

    /// Stored objects in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &dyn Object)> {
        self.objects.iter()
    }

    /// Stored objects of kind `K`.
    pub fn iter_kind<K: Kind>(&self) -> impl Iterator<Item = (ObjectId, &K)> {
        self.objects
            .iter()
            .filter_map(|(id, object)| object.downcast_ref::<K>().map(|k| (id, k)))
    }

    // ---- identity ----

    pub fn identity(&self, id: ObjectId) -> Option<&Identity> {
        self.identities.get(id)
    }

    /// The object's location, if it has a non-empty one.
    pub fn location_of(&self, id: ObjectId) -> Option<&str> {
        self.identities
            .get(id)
            .filter(|identity| identity.is_located())
            .map(Identity::location)
    }

    pub fn find_by_location(&self, location: &str) -> Option<ObjectId> {
        let location = path::normalize(location).ok()?;
        self.identities.get_by_location(&location)
    }

    pub fn find_by_name(&self, name: &str) -> Option<ObjectId> {
        self.identities.get_by_name(name)
    }

    /// Rename an object without changing its location.
    pub fn set_name(&mut self, id: ObjectId, name: &str) -> bool {
        self.identities.set_name(id, name)
    }

    // ---- loading ----

    /// Load the object at `location`, or return the one already loaded.
    ///
    /// Everything the object references is loaded in the same session before
    /// this returns. On failure every object created by the session is
    /// destroyed again.
    ///
    /// # Panics
    ///
    /// Panics if `K` is not registered.
    pub fn get_or_load<K: Kind>(&mut self, location: &str) -> Result<ObjectRef<K>, LoadError> {
        assert!(
            self.registry.contains(K::HASH),
            "kind '{}' is not registered",
            K::NAME
        );
        self.get_or_load_kind(K::HASH, location).map(ObjectRef::new)
    }

    /// Untyped [`get_or_load`](World::get_or_load).
    pub fn get_or_load_kind(&mut self, kind: KindHash, location: &str) -> Result<ObjectId, LoadError> {
        let mut session = LoadSession::new();
        let id = session
            .resolve(self, kind, location)
            .map_err(|source| LoadError::Decode {
                location: location.to_owned(),
                source,
            })?;
        match session.drain(self) {
            Ok(()) => Ok(id),
            Err(err) => {
                log::error!("Loading '{location}' failed: {err}");
                session.rollback(self);
                Err(err)
            }
        }
    }

    /// Load a scene root, or create an empty root node registered at
    /// `location` if no file exists there yet.
    pub fn load_scene_or_default(&mut self, location: &str) -> Result<ObjectId, LoadError> {
        let normalized = path::normalize(location).map_err(|source| LoadError::Storage {
            location: location.to_owned(),
            source,
        })?;
        if let Some(existing) = self.identities.get_by_location(&normalized) {
            return Ok(existing);
        }
        let exists = self.vfs.exists(&normalized).map_err(|source| LoadError::Storage {
            location: normalized.clone(),
            source,
        })?;
        if exists {
            return self.get_or_load_kind(Node::HASH, &normalized);
        }

        log::info!("No scene at '{normalized}', starting with an empty root");
        let name = path::file_name(&normalized).to_owned();
        Ok(self.insert_object(Box::new(Node::named(&name)), Identity::located(normalized)))
    }

    /// Load the configured root scene. A missing file yields an empty root
    /// only if `create_missing_root` is set.
    pub fn load_root_scene(&mut self, config: &PersistConfig) -> Result<ObjectId, LoadError> {
        if config.create_missing_root {
            self.load_scene_or_default(&config.root_scene)
        } else {
            self.get_or_load_kind(Node::HASH, &config.root_scene)
        }
    }

    /// Decode an object of `kind` from `data` instead of a file. The new
    /// object has no location; anything it references is loaded normally.
    pub fn load_from_bytes(&mut self, kind: KindHash, data: &[u8]) -> Result<ObjectId, LoadError> {
        const SOURCE: &str = "<memory>";
        let mut session = LoadSession::new();
        let Some(id) = self.spawn_kind(kind) else {
            return Err(LoadError::Decode {
                location: SOURCE.to_owned(),
                source: crate::codec::DecodeError::UnknownKind(kind),
            });
        };
        session.track(id);
        let result = session
            .decode(self, id, data)
            .map_err(|source| LoadError::Decode {
                location: SOURCE.to_owned(),
                source,
            })
            .and_then(|()| session.drain(self));
        match result {
            Ok(()) => Ok(id),
            Err(err) => {
                session.rollback(self);
                Err(err)
            }
        }
    }

    // ---- saving ----

    /// Encode the object `id` with its kind's codec.
    pub fn encode(&self, id: ObjectId) -> Result<Vec<u8>, crate::codec::EncodeError> {
        let mut ctx = SaveContext::new(self, id);
        ctx.write_object(id)?;
        Ok(ctx.finish())
    }

    /// Write `id` to `location` and make that its location.
    pub fn save(&mut self, id: ObjectId, location: &str) -> Result<(), SaveError> {
        let location = path::normalize(location).map_err(|source| SaveError::Storage {
            location: location.to_owned(),
            source,
        })?;
        if !self.objects.contains(id) {
            return Err(SaveError::MissingObject(id));
        }
        if self
            .identities
            .get_by_location(&location)
            .is_some_and(|other| other != id)
        {
            return Err(SaveError::LocationInUse(location));
        }

        let previous = self.identities.get(id).cloned().unwrap_or_default();
        self.identities.set_location(id, &location);
        if let Err(err) = self.write_file(id, &location) {
            self.identities.register(id, previous);
            return Err(err);
        }
        Ok(())
    }

    /// Write `id` back to its current location.
    pub fn save_in_place(&self, id: ObjectId) -> Result<(), SaveError> {
        if !self.objects.contains(id) {
            return Err(SaveError::MissingObject(id));
        }
        let location = self.location_of(id).ok_or(SaveError::Unlocated(id))?;
        self.write_file(id, location)
    }

    fn write_file(&self, id: ObjectId, location: &str) -> Result<(), SaveError> {
        let data = self.encode(id).map_err(|source| SaveError::Encode {
            location: location.to_owned(),
            source,
        })?;
        self.vfs
            .write(location, &data)
            .map_err(|source| SaveError::Storage {
                location: location.to_owned(),
                source,
            })?;
        log::debug!("Saved {id} to '{location}' ({} bytes)", data.len());
        Ok(())
    }

    // ---- destruction ----

    /// Destroy an object. A node takes its whole subtree and every attached
    /// behavior with it. Returns `false` if `id` was not alive.
    pub fn destroy(&mut self, id: ObjectId) -> bool {
        if !self.objects.contains(id) {
            return false;
        }
        self.destroy_subtree(id);
        true
    }

    fn destroy_subtree(&mut self, id: ObjectId) {
        for child in self.hierarchy.children(id).to_vec() {
            self.destroy_subtree(child);
        }
        for behavior in self.hierarchy.behaviors(id).to_vec() {
            self.destroy_single(behavior);
        }
        self.destroy_single(id);
    }

    /// Remove one object from every table, leaving its children orphaned.
    pub(crate) fn destroy_single(&mut self, id: ObjectId) {
        self.hierarchy.forget(id);
        self.systems.remove_member(id);
        self.identities.unregister(id);
        self.objects.remove(id);
    }

    /// Run queued commands, including any they queue in turn. Returns the
    /// number of commands run.
    pub fn apply_commands(&mut self) -> usize {
        let mut applied = 0;
        loop {
            let batch = self.commands.drain();
            if batch.is_empty() {
                return applied;
            }
            applied += batch.len();
            for command in batch {
                command(self);
            }
        }
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("objects", &self.objects.len())
            .field("systems", &self.systems.len())
            .field("vfs", &self.vfs)
            .finish()
    }
}
