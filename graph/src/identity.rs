//! Identity of live objects: display name and location.
//!
//! The registry is the dedup table of the loader. At most one live object
//! holds a given non-empty location, so loading a location that is already
//! registered hands back the existing object instead of a second copy.

use keepsake_vfs::path;

use crate::objects::ObjectId;

/// Name and location of an object.
///
/// The name of a located object is the trailing segment of its location.
/// An empty location means the object is not backed by a file of its own
/// (scene children, behaviors, freshly spawned objects).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    name: String,
    location: String,
}

impl Identity {
    /// Identity of an object stored at `location`.
    pub fn located(location: impl Into<String>) -> Self {
        let location = location.into();
        Self {
            name: path::file_name(&location).to_owned(),
            location,
        }
    }

    /// Identity of an object without a file of its own.
    pub fn unlocated(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: String::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn is_located(&self) -> bool {
        !self.location.is_empty()
    }
}

/// Identities of every live object, scanned linearly.
#[derive(Debug, Default)]
pub struct IdentityRegistry {
    entries: Vec<(ObjectId, Identity)>,
}

impl IdentityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the identity of `id`, replacing any previous one.
    ///
    /// The caller guarantees that a non-empty location is not held by a
    /// different object.
    pub fn register(&mut self, id: ObjectId, identity: Identity) {
        debug_assert!(
            !identity.is_located()
                || self
                    .get_by_location(identity.location())
                    .is_none_or(|other| other == id),
            "location '{}' registered twice",
            identity.location()
        );
        match self.entries.iter_mut().find(|(entry, _)| *entry == id) {
            Some((_, existing)) => *existing = identity,
            None => self.entries.push((id, identity)),
        }
    }

    pub fn unregister(&mut self, id: ObjectId) -> Option<Identity> {
        let pos = self.entries.iter().position(|(entry, _)| *entry == id)?;
        Some(self.entries.swap_remove(pos).1)
    }

    pub fn get(&self, id: ObjectId) -> Option<&Identity> {
        self.entries
            .iter()
            .find(|(entry, _)| *entry == id)
            .map(|(_, identity)| identity)
    }

    /// Empty locations never match.
    pub fn get_by_location(&self, location: &str) -> Option<ObjectId> {
        if location.is_empty() {
            return None;
        }
        self.entries
            .iter()
            .find(|(_, identity)| identity.location == location)
            .map(|(id, _)| *id)
    }

    /// First object with the given display name.
    pub fn get_by_name(&self, name: &str) -> Option<ObjectId> {
        self.entries
            .iter()
            .find(|(_, identity)| identity.name == name)
            .map(|(id, _)| *id)
    }

    /// Move `id` to a new location, re-deriving its name. Returns `false` if
    /// `id` is not registered.
    pub fn set_location(&mut self, id: ObjectId, location: &str) -> bool {
        match self.entries.iter_mut().find(|(entry, _)| *entry == id) {
            Some((_, identity)) => {
                *identity = Identity::located(location);
                true
            }
            None => false,
        }
    }

    /// Rename an object without moving it.
    pub fn set_name(&mut self, id: ObjectId, name: &str) -> bool {
        match self.entries.iter_mut().find(|(entry, _)| *entry == id) {
            Some((_, identity)) => {
                identity.name = name.to_owned();
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &Identity)> {
        self.entries.iter().map(|(id, identity)| (*id, identity))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
