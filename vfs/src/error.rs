use thiserror::Error;

/// Errors raised by asset storage.
#[derive(Debug, Error)]
pub enum VfsError {
    /// Nothing is stored at the location.
    #[error("not found: {0}")]
    NotFound(String),
    #[error("IO error: {0}")]
    Io(#[source] std::io::Error),
    /// Empty location or a location containing `..`.
    #[error("invalid path: {0}")]
    InvalidPath(String),
    #[error("no such source: {0}")]
    NoSuchSource(String),
    #[error("source is read-only")]
    ReadOnly,
}

impl VfsError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, VfsError::NotFound(_))
    }
}

impl From<std::io::Error> for VfsError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            VfsError::NotFound(err.to_string())
        } else {
            VfsError::Io(err)
        }
    }
}
