//! Error types for encoding and decoding objects.

use thiserror::Error;

use crate::field::FieldError;
use crate::kind::KindHash;
use crate::objects::ObjectId;

/// Errors raised while writing an object.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error(transparent)]
    Field(#[from] FieldError),
    /// A reference field points at an object that has never been given a
    /// location, so there is nothing to write in its place.
    #[error("field '{field}' references object {target} which has no location")]
    UnlocatedReference { field: String, target: ObjectId },
    #[error("object {0} is not alive")]
    MissingObject(ObjectId),
    #[error("kind {0:#018x} is not registered")]
    UnknownKind(KindHash),
    #[error("{0}")]
    Invalid(String),
}

/// Errors raised while reading an object.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("unexpected end of data at byte {offset}: needed {needed} bytes, {remaining} left")]
    UnexpectedEof {
        needed: usize,
        remaining: usize,
        offset: usize,
    },
    #[error("invalid UTF-8 in string at byte {offset}")]
    InvalidUtf8 { offset: usize },
    /// A kind hash read from the data is not in the registry.
    #[error("unknown kind hash {0:#018x}")]
    UnknownKind(KindHash),
    #[error(transparent)]
    Field(#[from] FieldError),
    #[error("invalid location '{0}'")]
    InvalidLocation(String),
    /// A kind was found where a different category was expected.
    #[error("kind '{kind}' is a {found}, expected a {expected}")]
    WrongCategory {
        kind: &'static str,
        expected: crate::kind::Category,
        found: crate::kind::Category,
    },
    #[error("object {0} is not alive")]
    MissingObject(ObjectId),
    #[error("{0}")]
    Invalid(String),
}
