//! Terminal client configuration loaded from TOML files
//!
//! ```toml
//! relay_url = "http://127.0.0.1:3000"
//! storage_path = "./data/client-storage.json"
//! timeout_secs = 60
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Settings for the conversation client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base address of the relay server
    #[serde(default = "default_relay_url")]
    pub relay_url: String,

    /// File holding client-local persisted state (the session id)
    #[serde(default = "default_storage_path")]
    pub storage_path: PathBuf,

    /// Upper bound on one exchange before it is reported as failed
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_relay_url() -> String {
    "http://127.0.0.1:3000".to_string()
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("./data/client-storage.json")
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            relay_url: default_relay_url(),
            storage_path: default_storage_path(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from a TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: ClientConfig = toml::from_str(content)?;
        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
}
