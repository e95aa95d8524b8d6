//! Binary object codec.
//!
//! An object file is the encoding of one located object. Kinds registered
//! with [`Codec::Fields`](crate::Codec::Fields) are written as their
//! reflected fields in registration order; kinds implementing [`Persist`]
//! write their own layout, usually fields followed by extra blocks.
//!
//! | value | encoding |
//! |---|---|
//! | integers, floats, math types, colors | native in-memory bytes |
//! | `bool` | one byte |
//! | `String` | `u64` LE length + UTF-8 bytes |
//! | reference | target location as a string, empty for null |
//! | opaque | exactly `size` raw bytes |

pub mod bytes;
mod context;
mod error;
pub(crate) mod persist;
mod value;

pub use bytes::{ByteReader, ByteWriter};
pub use context::{LoadContext, SaveContext};
pub use error::{DecodeError, EncodeError};
pub use persist::Persist;
