//! Parent-child and owner-behavior links.
//!
//! The links live in one table owned by the [`World`] rather than inside the
//! objects, so moving an object out of its slot during a load or a frame
//! phase never hides its relationships.
//!
//! # Usage
//!
//! ```ignore
//! // Direct mutation (requires &mut World)
//! set_parent(&mut world, child, parent);
//! remove_parent(&mut world, child);
//! destroy_recursive(&mut world, node);
//!
//! // Deferred, from inside a system
//! ctx.commands().cmd_set_parent(child, parent);
//! ctx.commands().cmd_destroy_recursive(node);
//! ```

use std::collections::HashMap;

use crate::commands::CommandBuffer;
use crate::kind::{Category, Kind};
use crate::objects::ObjectId;
use crate::world::World;

/// Relationship table.
#[derive(Debug, Default)]
pub(crate) struct Hierarchy {
    parents: HashMap<ObjectId, ObjectId>,
    children: HashMap<ObjectId, Vec<ObjectId>>,
    owners: HashMap<ObjectId, ObjectId>,
    behaviors: HashMap<ObjectId, Vec<ObjectId>>,
}

impl Hierarchy {
    pub fn parent(&self, node: ObjectId) -> Option<ObjectId> {
        self.parents.get(&node).copied()
    }

    pub fn children(&self, node: ObjectId) -> &[ObjectId] {
        self.children.get(&node).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn owner(&self, behavior: ObjectId) -> Option<ObjectId> {
        self.owners.get(&behavior).copied()
    }

    pub fn behaviors(&self, node: ObjectId) -> &[ObjectId] {
        self.behaviors.get(&node).map(Vec::as_slice).unwrap_or_default()
    }

    /// `true` if `ancestor` is `node` or one of its ancestors.
    pub fn is_ancestor(&self, ancestor: ObjectId, node: ObjectId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    pub fn link(&mut self, child: ObjectId, parent: ObjectId) {
        self.unlink(child);
        self.parents.insert(child, parent);
        self.children.entry(parent).or_default().push(child);
    }

    pub fn unlink(&mut self, child: ObjectId) -> Option<ObjectId> {
        let parent = self.parents.remove(&child)?;
        remove_from(&mut self.children, parent, child);
        Some(parent)
    }

    pub fn attach(&mut self, node: ObjectId, behavior: ObjectId) {
        self.detach(behavior);
        self.owners.insert(behavior, node);
        self.behaviors.entry(node).or_default().push(behavior);
    }

    pub fn detach(&mut self, behavior: ObjectId) -> Option<ObjectId> {
        let owner = self.owners.remove(&behavior)?;
        remove_from(&mut self.behaviors, owner, behavior);
        Some(owner)
    }

    /// Drop every link that mentions `id`. Children and behaviors of `id`
    /// are left without a parent or owner.
    pub fn forget(&mut self, id: ObjectId) {
        self.unlink(id);
        self.detach(id);
        for child in self.children.remove(&id).unwrap_or_default() {
            self.parents.remove(&child);
        }
        for behavior in self.behaviors.remove(&id).unwrap_or_default() {
            self.owners.remove(&behavior);
        }
    }
}

fn remove_from(map: &mut HashMap<ObjectId, Vec<ObjectId>>, key: ObjectId, value: ObjectId) {
    if let Some(list) = map.get_mut(&key) {
        list.retain(|&id| id != value);
        if list.is_empty() {
            map.remove(&key);
        }
    }
}

fn assert_category(world: &World, id: ObjectId, category: Category) {
    let found = world
        .kind_of(id)
        .and_then(|kind| world.registry().lookup(kind))
        .map(|descriptor| descriptor.category());
    assert!(
        found == Some(category),
        "{id} is not a live {category} (found {found:?})"
    );
}

/// Makes `node` the last child of `parent`.
///
/// Any previous parent link is replaced. Re-parenting to the current parent
/// does nothing and keeps the child's position.
///
/// # Panics
///
/// Panics if either object is not a live node, if `node == parent`, or if
/// `parent` is a descendant of `node`.
pub fn set_parent(world: &mut World, node: ObjectId, parent: ObjectId) {
    assert_ne!(node, parent, "Cannot set node as its own parent: {node}");
    assert_category(world, node, Category::Node);
    assert_category(world, parent, Category::Node);
    assert!(
        !world.hierarchy.is_ancestor(node, parent),
        "Cannot parent {node} to its own descendant {parent}"
    );

    if world.hierarchy.parent(node) == Some(parent) {
        return;
    }
    world.hierarchy.link(node, parent);
}

/// Detaches `node` from its parent. Does nothing for a root.
pub fn remove_parent(world: &mut World, node: ObjectId) {
    world.hierarchy.unlink(node);
}

/// Destroys `node`, its subtree and every behavior attached along the way.
pub fn destroy_recursive(world: &mut World, node: ObjectId) {
    world.destroy(node);
}

/// Spawns a default `K` and attaches it to `node`.
///
/// # Panics
///
/// Panics if `K` is not a registered behavior kind or `node` is not a live node.
pub fn add_behavior<K: Kind>(world: &mut World, node: ObjectId) -> ObjectId {
    let behavior = world.spawn::<K>();
    attach_behavior(world, node, behavior);
    behavior
}

/// Attaches `behavior` to `node` and enrolls it in its kind's default
/// system, if that system is registered. A behavior already owned by another
/// node moves.
///
/// # Panics
///
/// Panics if `behavior` is not a live behavior or `node` is not a live node.
pub fn attach_behavior(world: &mut World, node: ObjectId, behavior: ObjectId) {
    let default_system = world
        .kind_of(behavior)
        .and_then(|kind| world.registry().lookup(kind))
        .and_then(|descriptor| descriptor.default_system())
        .map(str::to_owned);
    attach_behavior_to_system(world, node, behavior, default_system.as_deref());
}

/// Attaches `behavior` to `node` and enrolls it in `system`. An empty or
/// unknown system name leaves it outside every system.
pub(crate) fn attach_behavior_to_system(
    world: &mut World,
    node: ObjectId,
    behavior: ObjectId,
    system: Option<&str>,
) {
    assert_category(world, node, Category::Node);
    assert_category(world, behavior, Category::Behavior);
    world.hierarchy.attach(node, behavior);
    world.systems.enroll(behavior, system);
}

/// Detaches `behavior` from its owner and from its system. The behavior
/// stays alive. Returns the previous owner.
pub fn detach_behavior(world: &mut World, behavior: ObjectId) -> Option<ObjectId> {
    world.systems.remove_member(behavior);
    world.hierarchy.detach(behavior)
}

impl World {
    pub fn parent(&self, node: ObjectId) -> Option<ObjectId> {
        self.hierarchy.parent(node)
    }

    /// Children in insertion order.
    pub fn children(&self, node: ObjectId) -> &[ObjectId] {
        self.hierarchy.children(node)
    }

    /// Behaviors in attachment order.
    pub fn behaviors(&self, node: ObjectId) -> &[ObjectId] {
        self.hierarchy.behaviors(node)
    }

    pub fn behavior_owner(&self, behavior: ObjectId) -> Option<ObjectId> {
        self.hierarchy.owner(behavior)
    }

    /// First behavior of kind `K` attached to `node`.
    pub fn get_behavior<K: Kind>(&self, node: ObjectId) -> Option<&K> {
        self.behaviors(node).iter().find_map(|&b| self.get::<K>(b))
    }

    /// `root` followed by its descendants, depth first, children in order.
    pub fn descendants(&self, root: ObjectId) -> Vec<ObjectId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev());
        }
        out
    }
}

/// Deferred hierarchy operations for use from inside systems.
pub trait HierarchyCommands {
    fn cmd_set_parent(&self, node: ObjectId, parent: ObjectId);

    fn cmd_remove_parent(&self, node: ObjectId);

    fn cmd_destroy_recursive(&self, node: ObjectId);
}

impl HierarchyCommands for CommandBuffer {
    fn cmd_set_parent(&self, node: ObjectId, parent: ObjectId) {
        self.push(move |world| set_parent(world, node, parent));
    }

    fn cmd_remove_parent(&self, node: ObjectId) {
        self.push(move |world| remove_parent(world, node));
    }

    fn cmd_destroy_recursive(&self, node: ObjectId) {
        self.push(move |world| destroy_recursive(world, node));
    }
}
