use std::collections::HashMap;
use std::sync::Arc;

use crate::error::VfsError;
use crate::path;
use crate::source::AssetSource;

/// Routes locations to mounted [`AssetSource`]s.
///
/// A location's first segment selects the source it is mounted under. If no
/// mount matches, the full location is handed to the default source, which
/// is how a single assets directory serves plain locations like
/// `"materials/wood.mat"`.
///
/// The default source is only reached through full locations, never through
/// its mount name, so every file it holds has exactly one location. With
/// `"assets"` as the default, `"assets/x.node"` is the file `assets/x.node`
/// inside that source.
///
/// `Clone` is cheap and shares the mounts.
#[derive(Clone)]
pub struct Vfs {
    inner: Arc<VfsInner>,
}

struct VfsInner {
    sources: HashMap<String, Box<dyn AssetSource>>,
    default_source: Option<String>,
}

impl Vfs {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(VfsInner {
                sources: HashMap::new(),
                default_source: None,
            }),
        }
    }

    /// A router with `source` mounted under `name` and used as the default.
    pub fn with_default(name: &str, source: impl AssetSource) -> Self {
        let mut vfs = Self::new();
        vfs.mount(name, source);
        vfs.set_default(name);
        vfs
    }

    /// Mount a source under the given name, replacing any previous one.
    ///
    /// # Panics
    ///
    /// Panics if the `Vfs` has already been cloned. Mounting belongs to the
    /// startup phase, before the router is shared.
    pub fn mount(&mut self, name: impl Into<String>, source: impl AssetSource) {
        let inner = Arc::get_mut(&mut self.inner).expect("cannot mount after Vfs has been cloned");
        inner.sources.insert(name.into(), Box::new(source));
    }

    /// # Panics
    ///
    /// Panics if the `Vfs` has already been cloned.
    pub fn set_default(&mut self, name: impl Into<String>) {
        let inner =
            Arc::get_mut(&mut self.inner).expect("cannot set default after Vfs has been cloned");
        inner.default_source = Some(name.into());
    }

    pub fn read(&self, raw_path: &str) -> Result<Vec<u8>, VfsError> {
        let (source, path) = self.resolve(raw_path)?;
        source.read(&path)
    }

    pub fn exists(&self, raw_path: &str) -> Result<bool, VfsError> {
        let (source, path) = self.resolve(raw_path)?;
        source.exists(&path)
    }

    pub fn list_dir(&self, raw_path: &str) -> Result<Vec<String>, VfsError> {
        let (source, path) = self.resolve(raw_path)?;
        source.list_dir(&path)
    }

    /// Returns [`VfsError::ReadOnly`] if the resolved source does not accept writes.
    pub fn write(&self, raw_path: &str, data: &[u8]) -> Result<(), VfsError> {
        let (source, path) = self.resolve(raw_path)?;
        source.write(&path, data)
    }

    pub fn delete(&self, raw_path: &str) -> Result<(), VfsError> {
        let (source, path) = self.resolve(raw_path)?;
        source.delete(&path)
    }

    pub fn is_read_only(&self, raw_path: &str) -> Result<bool, VfsError> {
        let (source, _) = self.resolve(raw_path)?;
        Ok(source.is_read_only())
    }

    fn resolve(&self, raw_path: &str) -> Result<(&dyn AssetSource, String), VfsError> {
        let normalized = path::normalize(raw_path)?;
        let (name, rest) = path::split_source(&normalized);

        let is_default = self.inner.default_source.as_deref() == Some(name);
        if !rest.is_empty()
            && !is_default
            && let Some(source) = self.inner.sources.get(name)
        {
            return Ok((source.as_ref(), rest.to_owned()));
        }

        if let Some(default_name) = &self.inner.default_source
            && let Some(source) = self.inner.sources.get(default_name)
        {
            return Ok((source.as_ref(), normalized));
        }

        Err(VfsError::NoSuchSource(name.to_owned()))
    }
}

impl Default for Vfs {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Vfs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut mounts: Vec<&String> = self.inner.sources.keys().collect();
        mounts.sort();
        f.debug_struct("Vfs")
            .field("mounts", &mounts)
            .field("default", &self.inner.default_source)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemorySource;

    #[test]
    fn mount_and_read() {
        let mem = MemorySource::new();
        mem.insert("hello.txt", b"world".to_vec());

        let mut vfs = Vfs::new();
        vfs.mount("data", mem);

        assert_eq!(vfs.read("data/hello.txt").unwrap(), b"world");
    }

    #[test]
    fn default_source_gets_full_path() {
        let mem = MemorySource::new();
        mem.insert("materials/wood.mat", b"m".to_vec());

        let vfs = Vfs::with_default("assets", mem);
        assert_eq!(vfs.read("materials/wood.mat").unwrap(), b"m");
    }

    #[test]
    fn single_segment_goes_to_default() {
        let mem = MemorySource::new();
        mem.insert("Scene.node", b"s".to_vec());

        let vfs = Vfs::with_default("assets", mem);
        assert_eq!(vfs.read("Scene.node").unwrap(), b"s");
    }

    #[test]
    fn default_mount_name_is_a_plain_directory() {
        let mem = MemorySource::new();
        mem.insert("x.node", b"top".to_vec());
        mem.insert("assets/x.node", b"nested".to_vec());

        let vfs = Vfs::with_default("assets", mem);
        assert_eq!(vfs.read("x.node").unwrap(), b"top");
        assert_eq!(vfs.read("assets/x.node").unwrap(), b"nested");
    }

    #[test]
    fn no_source_error() {
        let vfs = Vfs::new();
        assert!(matches!(
            vfs.read("unknown/file.txt"),
            Err(VfsError::NoSuchSource(_))
        ));
    }

    #[test]
    fn path_normalization() {
        let mem = MemorySource::new();
        mem.insert("a/b.txt", b"ok".to_vec());

        let mut vfs = Vfs::new();
        vfs.mount("data", mem);

        assert_eq!(vfs.read("data//a/./b.txt").unwrap(), b"ok");
    }

    #[test]
    fn invalid_path_rejected() {
        let vfs = Vfs::with_default("data", MemorySource::new());
        assert!(matches!(
            vfs.read("data/../secret.txt"),
            Err(VfsError::InvalidPath(_))
        ));
    }

    #[test]
    fn write_exists_delete() {
        let mem = MemorySource::new();
        let vfs = Vfs::with_default("m", mem.clone());

        vfs.write("new.txt", b"hello").unwrap();
        assert!(vfs.exists("new.txt").unwrap());
        assert_eq!(mem.get("new.txt").unwrap(), b"hello");

        vfs.delete("new.txt").unwrap();
        assert!(!vfs.exists("new.txt").unwrap());
    }

    #[test]
    fn list_dir_via_vfs() {
        let mem = MemorySource::new();
        mem.insert("a.txt", vec![]);
        mem.insert("sub/b.txt", vec![]);

        let mut vfs = Vfs::new();
        vfs.mount("m", mem);

        assert_eq!(vfs.list_dir("m/sub").unwrap(), vec!["b.txt"]);
        assert!(!vfs.is_read_only("m/anything").unwrap());
    }

    #[test]
    fn multiple_sources() {
        let mem1 = MemorySource::new();
        mem1.insert("a.txt", b"from_1".to_vec());
        let mem2 = MemorySource::new();
        mem2.insert("b.txt", b"from_2".to_vec());

        let mut vfs = Vfs::new();
        vfs.mount("src1", mem1);
        vfs.mount("src2", mem2);

        assert_eq!(vfs.read("src1/a.txt").unwrap(), b"from_1");
        assert_eq!(vfs.read("src2/b.txt").unwrap(), b"from_2");
    }
}
