//! Client side of the relay call

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::backend::{ExchangeReply, ExchangeRequest};
use crate::routes::RELAY_PATH;

/// Why an exchange produced no assistant reply
#[derive(Debug, thiserror::Error)]
pub enum ExchangeError {
    /// Relay answered with a non-success status
    #[error("Backend error: {status} - {body}")]
    Status { status: u16, body: String },

    /// Relay answered 2xx but the body had no usable `assistantMessage`
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("{0}")]
    Transport(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Failure without a description of its own
    #[error("Unknown error")]
    Unknown,
}

/// Seam between the controller and the network.
#[async_trait]
pub trait RelayTransport: Send + Sync {
    async fn send(&self, request: &ExchangeRequest) -> Result<ExchangeReply, ExchangeError>;
}

#[async_trait]
impl<T: RelayTransport + ?Sized> RelayTransport for Arc<T> {
    async fn send(&self, request: &ExchangeRequest) -> Result<ExchangeReply, ExchangeError> {
        (**self).send(request).await
    }
}

/// Posts exchanges to a running relay over HTTP
pub struct HttpRelayClient {
    client: Client,
    url: String,
}

impl HttpRelayClient {
    pub fn new(relay_url: &str) -> Self {
        Self {
            client: Client::new(),
            url: format!("{}{}", relay_url.trim_end_matches('/'), RELAY_PATH),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl RelayTransport for HttpRelayClient {
    async fn send(&self, request: &ExchangeRequest) -> Result<ExchangeReply, ExchangeError> {
        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| ExchangeError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .map_err(|e| ExchangeError::Transport(e.to_string()))?;
            return Err(ExchangeError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<ExchangeReply>()
            .await
            .map_err(|e| ExchangeError::InvalidResponse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relay_url() {
        let client = HttpRelayClient::new("http://127.0.0.1:3000/");
        assert_eq!(client.url(), "http://127.0.0.1:3000/api/chat");
    }

    #[test]
    fn test_error_descriptions() {
        let err = ExchangeError::Status {
            status: 503,
            body: "Backend error: 503 - overloaded".to_string(),
        };
        assert_eq!(err.to_string(), "Backend error: 503 - Backend error: 503 - overloaded");
        assert_eq!(ExchangeError::Timeout(Duration::from_secs(30)).to_string(), "request timed out after 30s");
        assert_eq!(ExchangeError::Unknown.to_string(), "Unknown error");
    }

    /// Relay that fails with a body cut short of its Content-Length
    async fn spawn_truncating_relay() -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let _ = socket
                    .write_all(
                        b"HTTP/1.1 502 Bad Gateway\r\n\
                          Content-Length: 100\r\n\
                          Connection: close\r\n\
                          \r\n\
                          Backend",
                    )
                    .await;
                let _ = socket.shutdown().await;
            }
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_unreadable_error_body_is_transport_error() {
        let client = HttpRelayClient::new(&spawn_truncating_relay().await);
        let request = ExchangeRequest {
            session_id: "u1".to_string(),
            message: "hi".to_string(),
        };

        let err = client.send(&request).await.unwrap_err();
        assert!(matches!(err, ExchangeError::Transport(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_unreachable_relay_is_transport_error() {
        let client = HttpRelayClient::new("http://127.0.0.1:9");
        let request = ExchangeRequest {
            session_id: "u1".to_string(),
            message: "hi".to_string(),
        };

        let err = client.send(&request).await.unwrap_err();
        assert!(matches!(err, ExchangeError::Transport(_)));
    }
}
