//! Deferred world mutations.

use parking_lot::Mutex;

use crate::kind::Kind;
use crate::objects::ObjectId;
use crate::world::World;

type Command = Box<dyn FnOnce(&mut World) + Send>;

/// Thread-safe queue of changes to apply to a [`World`] later.
///
/// Systems run with `&World` only; anything structural (destroying,
/// re-parenting, loading, saving) goes through here and runs when the frame
/// runner calls [`World::apply_commands`] after the phase.
#[derive(Default)]
pub struct CommandBuffer {
    commands: Mutex<Vec<Command>>,
}

impl CommandBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push<F>(&self, command: F)
    where
        F: FnOnce(&mut World) + Send + 'static,
    {
        self.commands.lock().push(Box::new(command));
    }

    pub fn destroy(&self, id: ObjectId) {
        self.push(move |world| {
            world.destroy(id);
        });
    }

    /// Load `location` as a `K`. Failures are logged.
    pub fn load<K: Kind>(&self, location: impl Into<String>) {
        let location = location.into();
        self.push(move |world| {
            if let Err(err) = world.get_or_load::<K>(&location) {
                log::error!("Deferred load of '{location}' failed: {err}");
            }
        });
    }

    /// Save `id` to `location`. Failures are logged.
    pub fn save(&self, id: ObjectId, location: impl Into<String>) {
        let location = location.into();
        self.push(move |world| {
            if let Err(err) = world.save(id, &location) {
                log::error!("Deferred save of {id} to '{location}' failed: {err}");
            }
        });
    }

    pub(crate) fn drain(&self) -> Vec<Command> {
        std::mem::take(&mut *self.commands.lock())
    }

    pub fn len(&self) -> usize {
        self.commands.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.lock().is_empty()
    }
}

impl std::fmt::Debug for CommandBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandBuffer")
            .field("pending", &self.len())
            .finish()
    }
}
