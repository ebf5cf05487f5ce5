//! Configuration management for rootcache

pub mod schema;

pub use schema::Config;

use crate::error::{RootCacheError, RootCacheResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("rootcache")
            .join("config.toml")
    }

    /// Get the state directory path
    pub fn state_dir() -> PathBuf {
        dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("rootcache")
    }

    /// Directory holding state files, honoring `cache.dir`
    pub fn cache_dir(config: &Config) -> PathBuf {
        config
            .cache
            .dir
            .clone()
            .unwrap_or_else(|| Self::state_dir().join("roots"))
    }

    /// Load the config file; a missing file means all defaults
    pub async fn load(&self) -> RootCacheResult<Config> {
        let path = &self.config_path;
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No config at {}, using defaults", path.display());
                return Ok(Config::default());
            }
            Err(e) => {
                return Err(RootCacheError::io(
                    format!("reading config from {}", path.display()),
                    e,
                ))
            }
        };

        toml::from_str(&content).map_err(|e| RootCacheError::ConfigInvalid {
            path: path.clone(),
            reason: e.to_string(),
        })
    }

    /// Write `config` as TOML, creating the parent directory
    pub async fn save(&self, config: &Config) -> RootCacheResult<()> {
        let path = &self.config_path;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| RootCacheError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }

        let content = toml::to_string_pretty(config)?;
        fs::write(path, content)
            .await
            .map_err(|e| RootCacheError::io(format!("writing config to {}", path.display()), e))?;

        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Ensure the state file directory exists with owner-only access
    pub async fn ensure_cache_dir(dir: &Path) -> RootCacheResult<()> {
        if dir.exists() {
            return Ok(());
        }

        fs::create_dir_all(dir).await.map_err(|e| {
            RootCacheError::io(format!("creating directory {}", dir.display()), e)
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o700);
            std::fs::set_permissions(dir, perms)
                .map_err(|e| RootCacheError::io("setting cache dir permissions", e))?;
        }

        debug!("Created cache directory {}", dir.display());
        Ok(())
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_default_when_missing() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nonexistent.toml");
        let manager = ConfigManager::with_path(path);

        let config = manager.load().await.unwrap();
        assert_eq!(config.cache.lock_timeout_secs, 30);
    }

    #[tokio::test]
    async fn save_and_load_roundtrip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.toml");
        let manager = ConfigManager::with_path(path);

        let mut config = Config::default();
        config.cache.dir = Some(temp.path().join("roots"));
        config.cache.lock_timeout_secs = 5;

        manager.save(&config).await.unwrap();
        let loaded = manager.load().await.unwrap();

        assert_eq!(loaded.cache.dir, Some(temp.path().join("roots")));
        assert_eq!(loaded.cache.lock_timeout_secs, 5);
    }

    #[tokio::test]
    async fn invalid_toml_reports_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[cache\nlock_timeout_secs = ").unwrap();
        let manager = ConfigManager::with_path(path.clone());

        let err = manager.load().await.unwrap_err();
        assert!(matches!(err, RootCacheError::ConfigInvalid { path: p, .. } if p == path));
    }

    #[test]
    fn cache_dir_prefers_config() {
        let mut config = Config::default();
        assert!(ConfigManager::cache_dir(&config).ends_with("rootcache/roots"));

        config.cache.dir = Some(PathBuf::from("/tmp/custom"));
        assert_eq!(ConfigManager::cache_dir(&config), PathBuf::from("/tmp/custom"));
    }

    #[tokio::test]
    async fn ensure_cache_dir_creates_private_dir() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("a").join("roots");

        ConfigManager::ensure_cache_dir(&dir).await.unwrap();
        assert!(dir.is_dir());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&dir).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o700);
        }

        // Idempotent
        ConfigManager::ensure_cache_dir(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn unreadable_config_is_io_error() {
        let temp = TempDir::new().unwrap();
        // A directory where the file should be
        let manager = ConfigManager::with_path(temp.path().to_path_buf());

        let err = manager.load().await.unwrap_err();
        assert!(matches!(err, RootCacheError::Io { .. }));
    }
}
