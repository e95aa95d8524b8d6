//! # Keepsake Graph
//!
//! Reflection and object-graph persistence.
//!
//! ## Core Types
//!
//! - [`Kind`] / [`Object`]: reflected object types and their type-erased view
//! - [`FieldDescriptor`]: name, tag, offset, size and accessors of one field
//! - [`TypeRegistry`]: kinds by hash, built once at startup
//! - [`World`]: arena of live objects, identities, scene hierarchy and systems
//! - [`ObjectId`] / [`ObjectRef`]: generational handles
//!
//! ## Persistence
//!
//! - [`World::get_or_load`]: load by location, at most one instance per location
//! - [`World::save`]: write an object and everything it owns to one file
//! - [`LoadSession`]: two-phase resolution of cross-file references
//! - [`Persist`]: hand-written layouts for kinds that need more than fields
//!
//! ## Frame execution
//!
//! - [`System`] / [`SystemTable`]: named callbacks over attached behaviors
//! - [`FrameRunner`]: runs systems in parallel, phase by phase
//! - [`CommandBuffer`]: structural changes deferred out of a phase
//!
//! ```ignore
//! #[derive(Default, Reflect)]
//! struct Spin {
//!     speed: f32,
//! }
//!
//! let registry = TypeRegistry::builder()
//!     .register_behavior::<Spin>(Some("spin"))
//!     .build();
//! let mut world = World::from_config(registry, &config);
//! let root = world.load_root_scene(&config)?;
//! ```

extern crate self as keepsake_graph;

pub mod codec;
mod commands;
mod config;
mod error;
mod field;
mod frame;
mod identity;
mod kind;
mod objects;
mod registry;
pub mod resources;
pub mod scene;
mod session;
mod system;
pub mod thread_pool;
mod world;

pub use codec::{DecodeError, EncodeError, LoadContext, Persist, SaveContext};
pub use commands::CommandBuffer;
pub use config::{ConfigError, PersistConfig};
pub use error::{LoadError, SaveError};
pub use field::{FieldDescriptor, FieldError, FieldTag, FieldType, FieldValue};
pub use frame::FrameRunner;
pub use graph_macro::Reflect;
pub use identity::{Identity, IdentityRegistry};
pub use kind::{Category, Kind, KindHash, Object, kind_hash};
pub use objects::{ObjectId, ObjectRef};
pub use registry::{Codec, KindDescriptor, TypeRegistry, TypeRegistryBuilder};
pub use scene::{HierarchyCommands, Node};
pub use session::LoadSession;
pub use system::{BehaviorBatch, Phase, System, SystemContext, SystemTable};
pub use thread_pool::ThreadPool;
pub use world::{ASSETS_SOURCE, World};

pub use keepsake_core::{color, math, transform};
pub use keepsake_vfs as vfs;
