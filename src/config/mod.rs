//! Application configuration

pub mod client;

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use client::{ClientConfig, ConfigError};

/// Backend used when no address is configured (local development)
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8080";

/// Relay server configuration, read from the environment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Base address of the assistant backend, without trailing slash
    pub backend_url: String,
    /// Upper bound on one outbound backend call
    pub backend_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let backend_url = env::var("BACKEND_URL")
            .or_else(|_| env::var("NEXT_PUBLIC_BACKEND_URL"))
            .unwrap_or_else(|_| DEFAULT_BACKEND_URL.into());

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".into()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            backend_url: backend_url.trim_end_matches('/').to_string(),
            backend_timeout_secs: env::var("BACKEND_TIMEOUT_SECS")
                .ok()
                .and_then(|t| t.parse().ok())
                .unwrap_or(60),
        })
    }

    pub fn backend_timeout(&self) -> Duration {
        Duration::from_secs(self.backend_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 3000,
            backend_url: DEFAULT_BACKEND_URL.into(),
            backend_timeout_secs: 60,
        }
    }
}
