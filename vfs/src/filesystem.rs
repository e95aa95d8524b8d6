use std::path::PathBuf;

use crate::error::VfsError;
use crate::source::AssetSource;

/// Asset source backed by a directory on disk.
///
/// Locations are joined onto the root directory. Traversal out of the root
/// is impossible because the router rejects `..` segments before a path
/// reaches the source.
pub struct FileSystemSource {
    root: PathBuf,
}

impl FileSystemSource {
    /// The directory does not need to exist until the first read or write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }
}

impl AssetSource for FileSystemSource {
    fn read(&self, path: &str) -> Result<Vec<u8>, VfsError> {
        let full_path = self.resolve(path);
        log::trace!("Reading {}", full_path.display());
        Ok(std::fs::read(full_path)?)
    }

    fn exists(&self, path: &str) -> Result<bool, VfsError> {
        Ok(self.resolve(path).exists())
    }

    fn list_dir(&self, path: &str) -> Result<Vec<String>, VfsError> {
        let full_path = self.resolve(path);
        if !full_path.is_dir() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(full_path)? {
            if let Some(name) = entry?.file_name().to_str() {
                entries.push(name.to_owned());
            }
        }
        entries.sort();
        Ok(entries)
    }

    fn is_read_only(&self) -> bool {
        false
    }

    fn write(&self, path: &str, data: &[u8]) -> Result<(), VfsError> {
        let full_path = self.resolve(path);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        log::trace!("Writing {} bytes to {}", data.len(), full_path.display());
        std::fs::write(full_path, data)?;
        Ok(())
    }

    fn delete(&self, path: &str) -> Result<(), VfsError> {
        std::fs::remove_file(self.resolve(path))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("keepsake_vfs_test_{name}"));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn read_existing_file() {
        let dir = temp_dir("read");
        std::fs::write(dir.join("test.txt"), b"hello").unwrap();

        let source = FileSystemSource::new(&dir);
        assert_eq!(source.read("test.txt").unwrap(), b"hello");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn read_missing_file_is_not_found() {
        let dir = temp_dir("read_missing");
        let source = FileSystemSource::new(&dir);
        assert!(source.read("nope.txt").unwrap_err().is_not_found());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn exists_check() {
        let dir = temp_dir("exists");
        std::fs::write(dir.join("file.txt"), b"").unwrap();

        let source = FileSystemSource::new(&dir);
        assert!(source.exists("file.txt").unwrap());
        assert!(!source.exists("nope.txt").unwrap());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn list_dir_entries() {
        let dir = temp_dir("list");
        std::fs::write(dir.join("a.txt"), b"").unwrap();
        std::fs::create_dir_all(dir.join("sub")).unwrap();

        let source = FileSystemSource::new(&dir);
        assert_eq!(source.list_dir("").unwrap(), vec!["a.txt", "sub"]);
        assert!(source.list_dir("missing").unwrap().is_empty());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn write_creates_parents() {
        let dir = temp_dir("write");
        let source = FileSystemSource::new(&dir);

        source.write("sub/dir/file.bin", b"data").unwrap();
        assert_eq!(std::fs::read(dir.join("sub/dir/file.bin")).unwrap(), b"data");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn delete_file() {
        let dir = temp_dir("delete");
        std::fs::write(dir.join("file.txt"), b"data").unwrap();

        let source = FileSystemSource::new(&dir);
        source.delete("file.txt").unwrap();
        assert!(!dir.join("file.txt").exists());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
