//! World-level error types for loading and saving object files.

use keepsake_vfs::VfsError;
use thiserror::Error;

use crate::codec::{DecodeError, EncodeError};
use crate::objects::ObjectId;

/// Errors raised while loading an object graph.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read '{location}': {source}")]
    Storage {
        location: String,
        #[source]
        source: VfsError,
    },
    #[error("failed to decode '{location}': {source}")]
    Decode {
        location: String,
        #[source]
        source: DecodeError,
    },
}

impl LoadError {
    /// The location whose file could not be read or decoded. For a nested
    /// failure this is the referenced file, not the one first requested.
    pub fn location(&self) -> &str {
        match self {
            LoadError::Storage { location, .. } | LoadError::Decode { location, .. } => location,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, LoadError::Storage { source, .. } if source.is_not_found())
    }
}

/// Errors raised while saving an object.
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("object {0} is not alive")]
    MissingObject(ObjectId),
    #[error("object {0} has no location to save to")]
    Unlocated(ObjectId),
    #[error("location '{0}' already belongs to another object")]
    LocationInUse(String),
    #[error("failed to encode '{location}': {source}")]
    Encode {
        location: String,
        #[source]
        source: EncodeError,
    },
    #[error("failed to write '{location}': {source}")]
    Storage {
        location: String,
        #[source]
        source: VfsError,
    },
}
