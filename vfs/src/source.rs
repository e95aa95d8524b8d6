use crate::VfsError;

/// A byte store that object files are read from and written to.
///
/// Paths handed to a source are already normalized by the [`Vfs`](crate::Vfs)
/// router: forward slashes, no leading or trailing slash, no `.` or `..`
/// segments, mount prefix stripped.
pub trait AssetSource: Send + Sync + 'static {
    /// Read the entire contents of the file at `path`.
    fn read(&self, path: &str) -> Result<Vec<u8>, VfsError>;

    fn exists(&self, path: &str) -> Result<bool, VfsError>;

    /// Names (not full paths) of the immediate children of a directory.
    /// Empty for a missing directory.
    fn list_dir(&self, path: &str) -> Result<Vec<String>, VfsError>;

    fn is_read_only(&self) -> bool {
        true
    }

    /// Create or overwrite a file.
    fn write(&self, _path: &str, _data: &[u8]) -> Result<(), VfsError> {
        Err(VfsError::ReadOnly)
    }

    fn delete(&self, _path: &str) -> Result<(), VfsError> {
        Err(VfsError::ReadOnly)
    }
}
