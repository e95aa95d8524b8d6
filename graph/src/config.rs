//! Host configuration, read from RON.
//!
//! ```ron
//! (
//!     assets_root: "./assets",
//!     root_scene: "Scene.node",
//!     worker_threads: Some(4),
//!     create_missing_root: true,
//! )
//! ```
//!
//! Every field is optional; missing ones take their defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Error reading a [`PersistConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("failed to write config: {0}")]
    Format(#[from] ron::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistConfig {
    /// Directory every location is relative to.
    pub assets_root: PathBuf,
    /// Location of the scene loaded by [`World::load_root_scene`](crate::World::load_root_scene).
    pub root_scene: String,
    /// Worker threads for frame phases. `None` uses every available core.
    pub worker_threads: Option<usize>,
    /// Start from an empty root node when `root_scene` does not exist.
    pub create_missing_root: bool,
}

impl Default for PersistConfig {
    fn default() -> Self {
        Self {
            assets_root: PathBuf::from("./assets"),
            root_scene: "Scene.node".to_owned(),
            worker_threads: None,
            create_missing_root: true,
        }
    }
}

impl PersistConfig {
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_ron_str(&text)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        Ok(ron::ser::to_string_pretty(
            self,
            ron::ser::PrettyConfig::default(),
        )?)
    }

    /// Configured worker count, or the available parallelism.
    pub fn worker_threads(&self) -> usize {
        self.worker_threads
            .unwrap_or_else(|| std::thread::available_parallelism().map_or(1, |n| n.get()))
            .max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = PersistConfig::default();
        assert_eq!(config.assets_root, PathBuf::from("./assets"));
        assert_eq!(config.root_scene, "Scene.node");
        assert!(config.create_missing_root);
        assert!(config.worker_threads() >= 1);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config = PersistConfig::from_ron_str("(root_scene: \"Main.node\")").unwrap();
        assert_eq!(config.root_scene, "Main.node");
        assert_eq!(config.assets_root, PathBuf::from("./assets"));
        assert!(config.create_missing_root);
    }

    #[test]
    fn full_config() {
        let text = r#"(
            assets_root: "/data/game",
            root_scene: "Levels/One.node",
            worker_threads: Some(2),
            create_missing_root: false,
        )"#;
        let config = PersistConfig::from_ron_str(text).unwrap();
        assert_eq!(config.assets_root, PathBuf::from("/data/game"));
        assert_eq!(config.worker_threads(), 2);
        assert!(!config.create_missing_root);
    }

    #[test]
    fn text_round_trip() {
        let config = PersistConfig {
            worker_threads: Some(3),
            ..Default::default()
        };
        let text = config.to_ron_string().unwrap();
        assert_eq!(PersistConfig::from_ron_str(&text).unwrap(), config);
    }

    #[test]
    fn invalid_text_is_an_error() {
        assert!(matches!(
            PersistConfig::from_ron_str("(assets_root: 5)"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let path = std::env::temp_dir().join("keepsake_config_test_missing.ron");
        let _ = std::fs::remove_file(&path);
        assert!(matches!(
            PersistConfig::load(&path),
            Err(ConfigError::Io { .. })
        ));
    }
}
