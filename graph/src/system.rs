//! Named systems and the behaviors enrolled in them.
//!
//! A system is a callback that receives every behavior enrolled in it as one
//! [`BehaviorBatch`]. During a phase each batch is moved out of the world,
//! so different systems run in parallel without sharing any behavior, while
//! all of them can still read the rest of the world.

use std::collections::HashMap;

use crate::commands::CommandBuffer;
use crate::kind::{Kind, Object};
use crate::objects::ObjectId;
use crate::world::World;

/// Frame phase a system is invoked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Once, before the first frame.
    Start,
    Update,
    BeforeRender,
    Render,
}

impl Phase {
    /// Phases of one frame, in order.
    pub const FRAME: [Phase; 3] = [Phase::Update, Phase::BeforeRender, Phase::Render];
}

type SystemFn = dyn Fn(&SystemContext<'_>, &mut BehaviorBatch) + Send + Sync;

/// A named callback over a batch of behaviors.
pub struct System {
    name: String,
    run: Box<SystemFn>,
}

impl System {
    pub fn new<F>(name: impl Into<String>, run: F) -> Self
    where
        F: Fn(&SystemContext<'_>, &mut BehaviorBatch) + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            run: Box::new(run),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn run(&self, ctx: &SystemContext<'_>, batch: &mut BehaviorBatch) {
        (self.run)(ctx, batch);
    }
}

impl std::fmt::Debug for System {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("System").field("name", &self.name).finish()
    }
}

/// Registered systems and their members.
#[derive(Debug, Default)]
pub struct SystemTable {
    systems: Vec<System>,
    members: Vec<Vec<ObjectId>>,
    membership: HashMap<ObjectId, usize>,
}

impl SystemTable {
    /// # Panics
    ///
    /// Panics if a system with the same name exists.
    pub fn register(&mut self, system: System) {
        assert!(
            self.index_of(system.name()).is_none(),
            "system '{}' is already registered",
            system.name()
        );
        log::debug!("Registered system '{}'", system.name());
        self.systems.push(system);
        self.members.push(Vec::new());
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.systems.iter().position(|s| s.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&System> {
        self.index_of(name).map(|i| &self.systems[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    /// Systems in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &System> {
        self.systems.iter()
    }

    /// Members of `name` in enrollment order.
    pub fn members(&self, name: &str) -> &[ObjectId] {
        match self.index_of(name) {
            Some(index) => &self.members[index],
            None => &[],
        }
    }

    /// Name of the system `behavior` is enrolled in.
    pub fn system_of(&self, behavior: ObjectId) -> Option<&str> {
        self.membership
            .get(&behavior)
            .map(|&i| self.systems[i].name.as_str())
    }

    pub fn len(&self) -> usize {
        self.systems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    /// Move `behavior` into `system`, or out of every system for `None`.
    /// An unknown name is logged and treated as `None`.
    pub(crate) fn enroll(&mut self, behavior: ObjectId, system: Option<&str>) {
        self.remove_member(behavior);
        let Some(name) = system.filter(|name| !name.is_empty()) else {
            return;
        };
        match self.index_of(name) {
            Some(index) => {
                self.members[index].push(behavior);
                self.membership.insert(behavior, index);
            }
            None => log::warn!("Unknown system '{name}'; {behavior} stays unassigned"),
        }
    }

    pub(crate) fn remove_member(&mut self, behavior: ObjectId) {
        if let Some(index) = self.membership.remove(&behavior) {
            self.members[index].retain(|&id| id != behavior);
        }
    }

    pub(crate) fn system_at(&self, index: usize) -> &System {
        &self.systems[index]
    }
}

/// What a system sees while it runs.
pub struct SystemContext<'w> {
    world: &'w World,
    phase: Phase,
    system: &'w str,
}

impl<'w> SystemContext<'w> {
    pub(crate) fn new(world: &'w World, phase: Phase, system: &'w str) -> Self {
        Self {
            world,
            phase,
            system,
        }
    }

    /// Read access to the world. Behaviors of running systems are not
    /// visible through it.
    pub fn world(&self) -> &'w World {
        self.world
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn system_name(&self) -> &'w str {
        self.system
    }

    /// Queue for structural changes, applied after the phase.
    pub fn commands(&self) -> &'w CommandBuffer {
        self.world.commands()
    }
}

/// Behaviors of one system, moved out of the world for a phase.
#[derive(Default)]
pub struct BehaviorBatch {
    pub(crate) system: usize,
    entries: Vec<(ObjectId, Box<dyn Object>)>,
}

impl BehaviorBatch {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &dyn Object)> {
        self.entries.iter().map(|(id, object)| (*id, object.as_ref()))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (ObjectId, &mut dyn Object)> {
        self.entries
            .iter_mut()
            .map(|(id, object)| (*id, object.as_mut()))
    }

    /// Members of kind `K`; others are skipped.
    pub fn iter_kind<K: Kind>(&self) -> impl Iterator<Item = (ObjectId, &K)> {
        self.iter()
            .filter_map(|(id, object)| object.downcast_ref::<K>().map(|k| (id, k)))
    }

    pub fn iter_kind_mut<K: Kind>(&mut self) -> impl Iterator<Item = (ObjectId, &mut K)> {
        self.iter_mut()
            .filter_map(|(id, object)| object.downcast_mut::<K>().map(|k| (id, k)))
    }
}

impl World {
    /// # Panics
    ///
    /// Panics if a system with the same name exists.
    pub fn register_system(&mut self, system: System) {
        self.systems.register(system);
    }

    /// Move `behavior` into `system`, or out of every system for `None`.
    pub fn set_behavior_system(&mut self, behavior: ObjectId, system: Option<&str>) {
        self.systems.enroll(behavior, system);
    }

    /// Take the members of every non-empty system out of the arena.
    pub(crate) fn take_batches(&mut self) -> Vec<BehaviorBatch> {
        let mut batches = Vec::new();
        for (system, members) in self.systems.members.iter().enumerate() {
            let mut entries = Vec::with_capacity(members.len());
            for &id in members {
                match self.objects.take(id) {
                    Some(object) => entries.push((id, object)),
                    None => log::warn!("Behavior {id} is not available for its system"),
                }
            }
            if !entries.is_empty() {
                batches.push(BehaviorBatch { system, entries });
            }
        }
        batches
    }

    pub(crate) fn return_batches(&mut self, batches: Vec<BehaviorBatch>) {
        for batch in batches {
            for (id, object) in batch.entries {
                self.objects.put_back(id, object);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Reflect;
    use crate::TypeRegistry;
    use crate::scene::add_behavior;
    use keepsake_vfs::{MemorySource, Vfs};

    #[derive(Default, Reflect)]
    struct Counter {
        value: u32,
    }

    fn world() -> World {
        let registry = TypeRegistry::builder()
            .register_behavior::<Counter>(Some("count"))
            .build();
        let mut world = World::new(registry, Vfs::with_default("mem", MemorySource::new()));
        world.register_system(System::new("count", |_, batch| {
            for (_, counter) in batch.iter_kind_mut::<Counter>() {
                counter.value += 1;
            }
        }));
        world
    }

    #[test]
    fn default_system_enrollment() {
        let mut world = world();
        let node = world.spawn_node("node");
        let counter = add_behavior::<Counter>(&mut world, node);

        assert_eq!(world.systems().system_of(counter), Some("count"));
        assert_eq!(world.systems().members("count"), &[counter]);
    }

    #[test]
    fn unknown_system_leaves_behavior_unassigned() {
        let mut world = world();
        let node = world.spawn_node("node");
        let counter = add_behavior::<Counter>(&mut world, node);

        world.set_behavior_system(counter, Some("missing"));

        assert_eq!(world.systems().system_of(counter), None);
        assert!(world.systems().members("count").is_empty());
    }

    #[test]
    fn destroy_removes_membership() {
        let mut world = world();
        let node = world.spawn_node("node");
        let counter = add_behavior::<Counter>(&mut world, node);

        world.destroy(node);

        assert_eq!(world.systems().system_of(counter), None);
        assert!(world.systems().members("count").is_empty());
    }

    #[test]
    fn batches_are_taken_and_returned() {
        let mut world = world();
        let node = world.spawn_node("node");
        let counter = add_behavior::<Counter>(&mut world, node);

        let mut batches = world.take_batches();
        assert_eq!(batches.len(), 1);
        assert!(world.get::<Counter>(counter).is_none());
        assert!(world.contains(counter));

        let system = world.systems().system_at(batches[0].system);
        let ctx = SystemContext::new(&world, Phase::Update, system.name());
        system.run(&ctx, &mut batches[0]);

        world.return_batches(batches);
        assert_eq!(world.get::<Counter>(counter).unwrap().value, 1);
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn duplicate_system_panics() {
        let mut world = world();
        world.register_system(System::new("count", |_, _| {}));
    }
}
