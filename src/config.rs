//! Server configuration.
//!
//! Environment variables:
//! - `FIT_SYNC_PORT`: Port to listen on (default: 8080)
//! - `FIT_SYNC_DATA_DIR`: Directory to store documents (default: ~/.local/share/fit-sync-server)
//! - `FIT_SYNC_CONFIG`: Path to config file (default: ~/.config/fit-sync-server/config.yaml)
//!
//! Config file format:
//!
//! ```yaml
//! api_keys:
//!   - key: "your-secret-key-here"
//!     account_id: "alice"
//! ```

use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::server::AuthAccount;

/// API key entry in config
#[derive(Debug, Clone, Deserialize)]
pub struct ApiKeyEntry {
    pub key: String,
    pub account_id: String,
}

/// Config file structure
#[derive(Debug, Clone, Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    api_keys: Vec<ApiKeyEntry>,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// Directory holding one JSON document per account
    pub data_dir: PathBuf,
    pub config_path: PathBuf,
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let port = std::env::var("FIT_SYNC_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let data_dir = std::env::var("FIT_SYNC_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::data_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("fit-sync-server")
            });

        let config_path = std::env::var("FIT_SYNC_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::config_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("fit-sync-server")
                    .join("config.yaml")
            });

        Self {
            port,
            data_dir,
            config_path,
        }
    }
}

/// API key store - maps key -> account
#[derive(Debug, Clone, Default)]
pub struct ApiKeyStore {
    keys: HashMap<String, AuthAccount>,
}

impl ApiKeyStore {
    /// Load API keys from config file.
    ///
    /// A missing or unreadable file yields an empty store, so every
    /// authenticated request fails until keys are configured.
    pub fn load(config_path: &Path) -> Self {
        let entries = match std::fs::read_to_string(config_path) {
            Ok(contents) => match serde_yaml::from_str::<ConfigFile>(&contents) {
                Ok(config) => config.api_keys,
                Err(e) => {
                    tracing::warn!("Failed to parse config file: {}", e);
                    Vec::new()
                }
            },
            Err(e) => {
                tracing::warn!(
                    "Failed to read config file {}: {}",
                    config_path.display(),
                    e
                );
                Vec::new()
            }
        };

        let store = Self::from_entries(entries);
        if store.is_empty() {
            tracing::warn!("No API keys loaded - all authenticated requests will fail");
        } else {
            tracing::info!("Loaded {} API key(s)", store.keys.len());
        }
        store
    }

    pub fn from_entries(entries: impl IntoIterator<Item = ApiKeyEntry>) -> Self {
        let keys = entries
            .into_iter()
            .map(|entry| {
                (
                    entry.key,
                    AuthAccount {
                        account_id: entry.account_id,
                    },
                )
            })
            .collect();
        Self { keys }
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Validate an API key and return the account it grants
    pub fn validate(&self, key: &str) -> Option<AuthAccount> {
        self.keys.get(key).cloned()
    }
}
