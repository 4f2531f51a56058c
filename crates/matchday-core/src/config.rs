//! Application configuration management.
//!
//! This module handles loading and saving the client configuration, which
//! includes the API base URL, the session store backend, and the last used
//! email address.
//!
//! Configuration is stored at `~/.config/matchday/config.json`.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "matchday";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Production API base URL; override with the `MATCHDAY_API_URL` environment
/// variable (a `.env` file is honored too).
const DEFAULT_API_BASE_URL: &str = "https://api.matchday.app";

/// Which persistent store holds the session between app restarts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    File,
    Keychain,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub last_email: Option<String>,
    pub store_backend: StoreBackend,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            last_email: None,
            store_backend: StoreBackend::default(),
        }
    }
}

fn default_api_base_url() -> String {
    // Load .env if present (silently ignore if not found)
    let _ = dotenvy::dotenv();
    std::env::var("MATCHDAY_API_URL").unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string())
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory holding the persisted session and other local state.
    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(!config.api_base_url.is_empty());
        assert_eq!(config.store_backend, StoreBackend::File);
        assert!(config.last_email.is_none());
    }

    #[test]
    fn test_store_backend_serde() {
        let backend: StoreBackend = serde_json::from_str(r#""keychain""#).expect("parse");
        assert_eq!(backend, StoreBackend::Keychain);
        assert_eq!(
            serde_json::to_string(&StoreBackend::File).expect("serialize"),
            r#""file""#
        );
    }

    #[test]
    fn test_config_tolerates_missing_fields() {
        let config: Config = serde_json::from_str(r#"{"last_email": "a@b.com"}"#).expect("parse");
        assert_eq!(config.last_email.as_deref(), Some("a@b.com"));
        assert_eq!(config.store_backend, StoreBackend::File);
    }
}
