use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::VfsError;
use crate::source::AssetSource;

/// In-memory asset source.
///
/// Cloning shares the underlying storage, so a test can keep a handle to a
/// source after mounting it and inspect what a save wrote. Directories are
/// implicit: they exist whenever some file path contains them as a prefix.
#[derive(Clone, Default)]
pub struct MemorySource {
    files: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `data` at `path`, replacing any previous contents.
    pub fn insert(&self, path: impl Into<String>, data: Vec<u8>) {
        self.files.write().insert(path.into(), data);
    }

    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.files.read().get(path).cloned()
    }

    pub fn remove(&self, path: &str) -> Option<Vec<u8>> {
        self.files.write().remove(path)
    }

    pub fn len(&self) -> usize {
        self.files.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.read().is_empty()
    }
}

impl AssetSource for MemorySource {
    fn read(&self, path: &str) -> Result<Vec<u8>, VfsError> {
        self.get(path).ok_or_else(|| VfsError::NotFound(path.to_owned()))
    }

    fn exists(&self, path: &str) -> Result<bool, VfsError> {
        Ok(self.files.read().contains_key(path))
    }

    fn list_dir(&self, path: &str) -> Result<Vec<String>, VfsError> {
        let prefix = if path.is_empty() {
            String::new()
        } else {
            format!("{path}/")
        };

        let files = self.files.read();
        let children: BTreeSet<String> = files
            .keys()
            .filter_map(|key| key.strip_prefix(&prefix))
            .filter_map(|rest| rest.split('/').next())
            .filter(|child| !child.is_empty())
            .map(str::to_owned)
            .collect();
        Ok(children.into_iter().collect())
    }

    fn is_read_only(&self) -> bool {
        false
    }

    fn write(&self, path: &str, data: &[u8]) -> Result<(), VfsError> {
        self.insert(path, data.to_vec());
        Ok(())
    }

    fn delete(&self, path: &str) -> Result<(), VfsError> {
        self.remove(path)
            .map(|_| ())
            .ok_or_else(|| VfsError::NotFound(path.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_existing_file() {
        let mem = MemorySource::new();
        mem.insert("scene.node", b"abc".to_vec());
        assert_eq!(mem.read("scene.node").unwrap(), b"abc");
    }

    #[test]
    fn read_missing_file() {
        let mem = MemorySource::new();
        assert!(mem.read("nope.node").unwrap_err().is_not_found());
    }

    #[test]
    fn exists_true_and_false() {
        let mem = MemorySource::new();
        mem.insert("file.txt", vec![]);
        assert!(mem.exists("file.txt").unwrap());
        assert!(!mem.exists("nope.txt").unwrap());
    }

    #[test]
    fn list_dir_root() {
        let mem = MemorySource::new();
        mem.insert("a.txt", vec![]);
        mem.insert("b/c.txt", vec![]);
        mem.insert("b/d.txt", vec![]);

        assert_eq!(mem.list_dir("").unwrap(), vec!["a.txt", "b"]);
    }

    #[test]
    fn list_dir_nested() {
        let mem = MemorySource::new();
        mem.insert("shaders/lit.shader", vec![]);
        mem.insert("shaders/inc/common.bin", vec![]);
        mem.insert("materials/wood.mat", vec![]);

        assert_eq!(mem.list_dir("shaders").unwrap(), vec!["inc", "lit.shader"]);
        assert!(mem.list_dir("missing").unwrap().is_empty());
    }

    #[test]
    fn write_then_read() {
        let mem = MemorySource::new();
        assert!(!mem.is_read_only());
        mem.write("new.bin", b"xyz").unwrap();
        assert_eq!(mem.read("new.bin").unwrap(), b"xyz");
    }

    #[test]
    fn delete_file() {
        let mem = MemorySource::new();
        mem.insert("file.txt", b"data".to_vec());
        mem.delete("file.txt").unwrap();
        assert!(!mem.exists("file.txt").unwrap());
        assert!(mem.delete("file.txt").is_err());
    }

    #[test]
    fn clones_share_storage() {
        let mem = MemorySource::new();
        let other = mem.clone();
        other.insert("shared.bin", vec![1]);
        assert_eq!(mem.len(), 1);
    }
}
