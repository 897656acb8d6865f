//! Assistant backend integration
//!
//! The backend is an opaque service reached by a single call:
//! `POST {base_url}/api/chat/message` with `{ userId, message }`, answering
//! with a JSON object that is expected to carry `assistantMessage`.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::config::Config;

/// Path appended to the backend base address
pub const MESSAGE_PATH: &str = "/api/chat/message";

/// One exchange as it travels over the wire (relay and backend share the shape)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRequest {
    #[serde(rename = "userId")]
    pub session_id: String,
    pub message: String,
}

/// Successful reply body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeReply {
    #[serde(rename = "assistantMessage")]
    pub assistant_message: String,
}

#[derive(Debug, Error)]
pub enum BackendError {
    /// Backend answered with a non-success status
    #[error("Backend error: {code} - {body}", code = .status.as_u16())]
    Status { status: StatusCode, body: String },

    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
}

/// HTTP client for the assistant backend
pub struct AssistantBackend {
    client: Client,
    base_url: String,
}

impl AssistantBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, BackendError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, BackendError> {
        Self::new(config.backend_url.clone(), config.backend_timeout())
    }

    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, MESSAGE_PATH)
    }

    /// Submit one message and return the backend's JSON body untouched.
    pub async fn submit(&self, request: &ExchangeRequest) -> Result<Value, BackendError> {
        let response = self
            .client
            .post(self.endpoint())
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            return Err(BackendError::Status { status, body });
        }

        Ok(response.json().await?)
    }
}
