//! Application configuration management.
//!
//! Configuration holds the API base URL, the token storage backend, the
//! request timeout and the last email used to log in.
//!
//! It is stored at `~/.config/caixinha/config.json`; `CAIXINHA_API_URL` and
//! `CAIXINHA_STORAGE` override the file.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::{Gateway, DEFAULT_TIMEOUT_SECS};
use crate::auth::{FileStorage, KeyringStorage, MemoryStorage, TokenStorage, TokenStore};

/// Application name used for config directory paths
const APP_NAME: &str = "caixinha";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// API used when nothing else is configured
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";

pub const ENV_API_URL: &str = "CAIXINHA_API_URL";
pub const ENV_STORAGE: &str = "CAIXINHA_STORAGE";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Keyring,
    File,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keyring" => Ok(StorageBackend::Keyring),
            "file" => Ok(StorageBackend::File),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(anyhow!("Unknown token storage backend: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub storage: StorageBackend,
    pub request_timeout_secs: u64,
    pub last_email: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            storage: StorageBackend::default(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            last_email: None,
        }
    }
}

impl Config {
    /// Load the config file and apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Apply overrides looked up by variable name
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = lookup(ENV_API_URL).filter(|u| !u.trim().is_empty()) {
            self.api_base_url = url.trim().to_string();
        }
        if let Some(storage) = lookup(ENV_STORAGE) {
            self.storage = storage.parse()?;
        }
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE))
    }

    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME))
    }

    /// Request timeout; 0 would fail every request, so it means the default
    pub fn request_timeout(&self) -> Duration {
        match self.request_timeout_secs {
            0 => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            secs => Duration::from_secs(secs),
        }
    }

    /// Storage backend selected by this config
    pub fn token_storage(&self) -> Result<Box<dyn TokenStorage>> {
        Ok(match self.storage {
            StorageBackend::Keyring => Box::new(KeyringStorage::new()),
            StorageBackend::File => Box::new(FileStorage::in_dir(&Self::config_dir()?)),
            StorageBackend::Memory => Box::new(MemoryStorage::new()),
        })
    }

    /// Open the token store and build a gateway around it
    pub fn connect(&self) -> Result<Gateway> {
        let store = Arc::new(TokenStore::open(self.token_storage()?));
        Gateway::with_timeout(&self.api_base_url, store, self.request_timeout())
            .context("Failed to build HTTP client")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.storage, StorageBackend::Keyring);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("caixinha").join("config.json");
        let config = Config {
            api_base_url: "https://caixinha.example.com/api".into(),
            storage: StorageBackend::File,
            request_timeout_secs: 5,
            last_email: Some("ana@example.com".into()),
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.api_base_url, "https://caixinha.example.com/api");
        assert_eq!(loaded.storage, StorageBackend::File);
        assert_eq!(loaded.last_email.as_deref(), Some("ana@example.com"));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"storage": "memory"}"#).unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.storage, StorageBackend::Memory);
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
    }

    #[test]
    fn test_zero_timeout_uses_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"request_timeout_secs": 0}"#).unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.request_timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_overrides(|key| match key {
                ENV_API_URL => Some(" http://10.0.0.2:8000/api ".into()),
                ENV_STORAGE => Some("FILE".into()),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.api_base_url, "http://10.0.0.2:8000/api");
        assert_eq!(config.storage, StorageBackend::File);

        assert!(config
            .apply_overrides(|key| (key == ENV_STORAGE).then(|| "vault".to_string()))
            .is_err());
    }

    #[test]
    fn test_memory_backend_connects() {
        let config = Config {
            storage: StorageBackend::Memory,
            ..Config::default()
        };
        let gateway = config.connect().unwrap();
        assert_eq!(gateway.base_url(), DEFAULT_API_BASE_URL);
        assert!(!gateway.store().is_authenticated());
    }
}
