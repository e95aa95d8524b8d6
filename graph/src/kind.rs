//! Kinds: the object types the registry knows how to create and persist.

use std::any::Any;

use crate::field::FieldDescriptor;

/// Stable 64-bit identity of a kind, written into scene files.
pub type KindHash = u64;

/// Hash a kind name. Stable across builds and platforms.
pub const fn kind_hash(name: &str) -> KindHash {
    xxhash_rust::const_xxh64::xxh64(name.as_bytes(), 0)
}

/// Which role a kind plays in a world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Loadable file-backed object such as a shader or an image.
    Resource,
    /// Scene graph node.
    Node,
    /// Attachable behavior owned by a node.
    Behavior,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Category::Resource => "resource",
            Category::Node => "node",
            Category::Behavior => "behavior",
        };
        f.write_str(name)
    }
}

/// A reflected object type.
///
/// Usually derived with `#[derive(Reflect)]`, which fills in [`NAME`](Kind::NAME)
/// and [`fields`](Kind::fields) from the struct definition.
pub trait Kind: Default + Send + Sync + 'static {
    /// Display name. Also the input of [`HASH`](Kind::HASH).
    const NAME: &'static str;

    const HASH: KindHash = kind_hash(Self::NAME);

    /// Field descriptors in wire order.
    fn fields() -> Vec<FieldDescriptor>;
}

/// Type-erased view of a live instance of some [`Kind`].
pub trait Object: Send + Sync + 'static {
    fn kind_hash(&self) -> KindHash;
    fn kind_name(&self) -> &'static str;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Kind> Object for T {
    fn kind_hash(&self) -> KindHash {
        T::HASH
    }

    fn kind_name(&self) -> &'static str {
        T::NAME
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl dyn Object {
    pub fn is<T: Kind>(&self) -> bool {
        self.as_any().is::<T>()
    }

    pub fn downcast_ref<T: Kind>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Kind>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}
