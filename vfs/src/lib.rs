//! Asset storage for Keepsake.
//!
//! Object files are addressed by *locations*: relative, forward-slash paths
//! below the assets root. This crate maps locations to bytes through the
//! [`AssetSource`] trait and the [`Vfs`] router.
//!
//! # Sources
//!
//! - [`MemorySource`]: in-memory storage for tests and embedded assets (read-write)
//! - [`FileSystemSource`]: native filesystem access rooted at a directory (read-write)
//!
//! All operations are blocking. Loading an object graph is a single-threaded,
//! synchronous operation, so there is nothing to gain from futures here.
//!
//! # Read-Only vs Read-Write
//!
//! All sources must implement read operations. Write operations are optional
//! and default to returning [`VfsError::ReadOnly`].

mod error;
#[cfg(feature = "filesystem")]
mod filesystem;
mod memory;
pub mod path;
mod source;
mod vfs;

pub use error::VfsError;
#[cfg(feature = "filesystem")]
pub use filesystem::FileSystemSource;
pub use memory::MemorySource;
pub use source::AssetSource;
pub use vfs::Vfs;
