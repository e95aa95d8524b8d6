use keepsake_core::transform::Transform;

use crate::Reflect;
use crate::codec::{DecodeError, EncodeError, LoadContext, Persist, SaveContext};
use crate::kind::{Category, Kind};
use crate::scene::hierarchy::{attach_behavior_to_system, set_parent};

/// A scene graph node.
///
/// A node file holds the node's fields, then its behaviors, then its
/// children, each child written inline in the same layout:
///
/// ```text
/// fields
/// u64 behavior count
///   per behavior: u64 kind hash, string system name, behavior data
/// u64 child count
///   per child: a nested node
/// ```
#[derive(Debug, Clone, Default, PartialEq, Reflect)]
pub struct Node {
    pub name: String,
    pub transform: Transform,
}

impl Node {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            transform: Transform::identity(),
        }
    }
}

impl Persist for Node {
    fn save(&self, ctx: &mut SaveContext<'_>) -> Result<(), EncodeError> {
        ctx.write_fields(self)?;

        let world = ctx.world();
        let node = ctx.current();

        let behaviors = world.behaviors(node);
        ctx.writer().write_len(behaviors.len());
        for &behavior in behaviors {
            let object = world
                .object(behavior)
                .ok_or(EncodeError::MissingObject(behavior))?;
            ctx.writer().write_u64(object.kind_hash());
            ctx.writer()
                .write_str(world.systems().system_of(behavior).unwrap_or(""));
            ctx.write_object(behavior)?;
        }

        let children = world.children(node);
        ctx.writer().write_len(children.len());
        for &child in children {
            ctx.write_object(child)?;
        }
        Ok(())
    }

    fn load(&mut self, ctx: &mut LoadContext<'_>) -> Result<(), DecodeError> {
        ctx.read_fields(self)?;
        let node = ctx.current();
        if ctx.world().location_of(node).is_none() {
            ctx.world_mut().set_name(node, &self.name);
        }

        let behavior_count = ctx.reader().read_len()?;
        for _ in 0..behavior_count {
            let kind = ctx.reader().read_u64()?;
            let system = ctx.reader().read_string()?;
            let behavior = ctx.read_object_in(kind, Category::Behavior)?;
            let system = (!system.is_empty()).then_some(system.as_str());
            attach_behavior_to_system(ctx.world_mut(), node, behavior, system);
        }

        let child_count = ctx.reader().read_len()?;
        for _ in 0..child_count {
            let child = ctx.read_object_in(Node::HASH, Category::Node)?;
            set_parent(ctx.world_mut(), child, node);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldTag;
    use crate::{TypeRegistry, World};
    use keepsake_vfs::{MemorySource, Vfs};

    #[test]
    fn node_fields() {
        let fields = Node::fields();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].name(), "name");
        assert_eq!(fields[0].tag(), FieldTag::String);
        assert_eq!(fields[1].name(), "transform");
        assert_eq!(fields[1].tag(), FieldTag::Opaque);
        assert_eq!(fields[1].size(), 40);
    }

    #[test]
    fn empty_node_layout() {
        let registry = TypeRegistry::builder().build();
        let mut world = World::new(registry, Vfs::with_default("mem", MemorySource::new()));
        let node = world.spawn_node("Empty");

        let bytes = world.encode(node).unwrap();

        // name (8 + 5) + transform (40) + behavior count + child count
        assert_eq!(bytes.len(), 13 + 40 + 8 + 8);
        assert_eq!(&bytes[0..8], &5u64.to_le_bytes());
        assert_eq!(&bytes[8..13], b"Empty");
        assert_eq!(&bytes[53..], &[0u8; 16]);
    }
}
