//! The type descriptor table.
//!
//! Every kind a world can hold is registered once, at startup, through
//! [`TypeRegistry::builder`]. The finished registry is immutable and shared
//! behind an `Arc`.

use std::collections::HashMap;
use std::sync::Arc;

use crate::codec::persist::{load_erased, save_erased};
use crate::codec::{DecodeError, EncodeError, LoadContext, Persist, SaveContext};
use crate::field::FieldDescriptor;
use crate::kind::{Category, Kind, KindHash, Object};
use crate::resources::{Image, Material, Model, Shader};
use crate::scene::Node;

pub type SaveFn = fn(&dyn Object, &mut SaveContext<'_>) -> Result<(), EncodeError>;
pub type LoadFn = fn(&mut dyn Object, &mut LoadContext<'_>) -> Result<(), DecodeError>;

/// How a kind is laid out in a file.
#[derive(Clone, Copy)]
pub enum Codec {
    /// Reflected fields in registration order.
    Fields,
    /// Layout written by the kind's [`Persist`] impl.
    Custom { save: SaveFn, load: LoadFn },
}

impl std::fmt::Debug for Codec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Codec::Fields => f.write_str("Fields"),
            Codec::Custom { .. } => f.write_str("Custom"),
        }
    }
}

/// Everything the registry knows about one kind.
pub struct KindDescriptor {
    name: &'static str,
    hash: KindHash,
    category: Category,
    size: usize,
    fields: Vec<FieldDescriptor>,
    factory: fn() -> Box<dyn Object>,
    codec: Codec,
    default_system: Option<String>,
}

fn create_default<K: Kind>() -> Box<dyn Object> {
    Box::new(K::default())
}

impl KindDescriptor {
    fn of<K: Kind>(category: Category, codec: Codec) -> Self {
        Self {
            name: K::NAME,
            hash: K::HASH,
            category,
            size: size_of::<K>(),
            fields: K::fields(),
            factory: create_default::<K>,
            codec,
            default_system: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn hash(&self) -> KindHash {
        self.hash
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// In-memory size of an instance.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name() == name)
    }

    /// A default-constructed instance.
    pub fn create(&self) -> Box<dyn Object> {
        (self.factory)()
    }

    pub fn codec(&self) -> Codec {
        self.codec
    }

    /// System a freshly attached behavior of this kind joins.
    pub fn default_system(&self) -> Option<&str> {
        self.default_system.as_deref()
    }
}

impl std::fmt::Debug for KindDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KindDescriptor")
            .field("name", &self.name)
            .field("hash", &format_args!("{:#018x}", self.hash))
            .field("category", &self.category)
            .field("fields", &self.fields.len())
            .field("codec", &self.codec)
            .finish()
    }
}

/// Immutable table of registered kinds, keyed by kind hash.
pub struct TypeRegistry {
    kinds: Vec<KindDescriptor>,
    by_hash: HashMap<KindHash, usize>,
}

impl TypeRegistry {
    /// Start a registry. [`Node`] is always registered.
    pub fn builder() -> TypeRegistryBuilder {
        let mut builder = TypeRegistryBuilder { kinds: Vec::new() };
        builder.register_persist::<Node>(Category::Node);
        builder
    }

    pub fn lookup(&self, hash: KindHash) -> Option<&KindDescriptor> {
        self.by_hash.get(&hash).map(|&i| &self.kinds[i])
    }

    pub fn lookup_by_name(&self, name: &str) -> Option<&KindDescriptor> {
        self.kinds.iter().find(|k| k.name == name)
    }

    pub fn descriptor_of<K: Kind>(&self) -> Option<&KindDescriptor> {
        self.lookup(K::HASH)
    }

    pub fn contains(&self, hash: KindHash) -> bool {
        self.by_hash.contains_key(&hash)
    }

    /// Descriptors in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &KindDescriptor> {
        self.kinds.iter()
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.kinds.iter().map(|k| k.name)).finish()
    }
}

/// Collects kind registrations during startup.
pub struct TypeRegistryBuilder {
    kinds: Vec<KindDescriptor>,
}

impl TypeRegistryBuilder {
    /// Register a kind persisted as its plain field list.
    ///
    /// # Panics
    ///
    /// Panics if another kind with the same hash is already registered, or if
    /// `category` is [`Category::Node`].
    pub fn register<K: Kind>(&mut self, category: Category) -> &mut Self {
        self.push(KindDescriptor::of::<K>(category, Codec::Fields))
    }

    /// Register a kind with a hand-written layout.
    ///
    /// # Panics
    ///
    /// Panics if another kind with the same hash is already registered, or if
    /// `category` is [`Category::Node`].
    pub fn register_persist<K: Persist>(&mut self, category: Category) -> &mut Self {
        let codec = Codec::Custom {
            save: save_erased::<K>,
            load: load_erased::<K>,
        };
        self.push(KindDescriptor::of::<K>(category, codec))
    }

    /// Register a behavior kind. New instances attached to a node join
    /// `default_system`, if given.
    ///
    /// # Panics
    ///
    /// Panics if another kind with the same hash is already registered.
    pub fn register_behavior<K: Kind>(&mut self, default_system: Option<&str>) -> &mut Self {
        let mut descriptor = KindDescriptor::of::<K>(Category::Behavior, Codec::Fields);
        descriptor.default_system = default_system.map(str::to_owned);
        self.push(descriptor)
    }

    /// Register [`Image`], [`Model`], [`Shader`] and [`Material`].
    pub fn register_standard_resources(&mut self) -> &mut Self {
        self.register_persist::<Image>(Category::Resource)
            .register_persist::<Model>(Category::Resource)
            .register_persist::<Shader>(Category::Resource)
            .register_persist::<Material>(Category::Resource)
    }

    fn push(&mut self, descriptor: KindDescriptor) -> &mut Self {
        assert!(
            descriptor.category != Category::Node || descriptor.hash == Node::HASH,
            "kind '{}' cannot use the node category; only 'Node' is a node",
            descriptor.name
        );
        if let Some(existing) = self.kinds.iter().find(|k| k.hash == descriptor.hash) {
            panic!(
                "kind '{}' is already registered (hash {:#018x} also used by '{}')",
                descriptor.name, descriptor.hash, existing.name
            );
        }
        self.kinds.push(descriptor);
        self
    }

    pub fn build(&mut self) -> Arc<TypeRegistry> {
        let kinds = std::mem::take(&mut self.kinds);
        let by_hash = kinds.iter().enumerate().map(|(i, k)| (k.hash, i)).collect();
        log::info!("Type registry built with {} kinds", kinds.len());
        for kind in &kinds {
            log::debug!(
                "  {} ({}, {:#018x}, {} fields)",
                kind.name,
                kind.category,
                kind.hash,
                kind.fields.len()
            );
        }
        Arc::new(TypeRegistry { kinds, by_hash })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Reflect;
    use crate::kind::kind_hash;

    #[derive(Default, Reflect)]
    struct Health {
        current: f32,
        max: f32,
    }

    #[derive(Default, Reflect)]
    #[reflect(name = "Health")]
    struct Impostor {
        value: u8,
    }

    #[test]
    fn node_is_always_registered() {
        let registry = TypeRegistry::builder().build();
        let node = registry.lookup(Node::HASH).unwrap();
        assert_eq!(node.name(), "Node");
        assert_eq!(node.category(), Category::Node);
        assert!(matches!(node.codec(), Codec::Custom { .. }));
    }

    #[test]
    fn register_and_lookup() {
        let registry = TypeRegistry::builder()
            .register_behavior::<Health>(Some("Combat"))
            .build();

        let health = registry.lookup(kind_hash("Health")).unwrap();
        assert_eq!(health.category(), Category::Behavior);
        assert_eq!(health.default_system(), Some("Combat"));
        assert_eq!(health.fields().len(), 2);
        assert_eq!(
            health.field("max").unwrap().offset(),
            std::mem::offset_of!(Health, max)
        );
        assert!(registry.lookup_by_name("Health").is_some());
        assert!(registry.lookup(kind_hash("Mana")).is_none());
    }

    #[test]
    fn factory_creates_default_instance() {
        let registry = TypeRegistry::builder()
            .register::<Health>(Category::Resource)
            .build();
        let object = registry.descriptor_of::<Health>().unwrap().create();
        let health = object.downcast_ref::<Health>().unwrap();
        assert_eq!(health.current, 0.0);
        assert_eq!(health.max, 0.0);
    }

    #[test]
    fn iteration_follows_registration_order() {
        let registry = TypeRegistry::builder()
            .register_standard_resources()
            .register::<Health>(Category::Resource)
            .build();
        let names: Vec<_> = registry.iter().map(|k| k.name()).collect();
        assert_eq!(names, ["Node", "Image", "Model", "Shader", "Material", "Health"]);
        assert_eq!(registry.len(), 6);
    }

    #[test]
    #[should_panic(expected = "cannot use the node category")]
    fn only_node_is_a_node() {
        TypeRegistry::builder().register::<Health>(Category::Node);
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn duplicate_hash_panics() {
        TypeRegistry::builder()
            .register::<Health>(Category::Resource)
            .register::<Impostor>(Category::Resource);
    }
}
