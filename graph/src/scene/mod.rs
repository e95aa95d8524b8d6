//! Scene graph: nodes, their children and their attached behaviors.

mod hierarchy;
mod node;

pub(crate) use hierarchy::Hierarchy;
pub use hierarchy::{
    HierarchyCommands, add_behavior, attach_behavior, destroy_recursive, detach_behavior,
    remove_parent, set_parent,
};
pub use node::Node;
