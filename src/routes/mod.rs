//! API routes
//!
//! The relay is the only endpoint a chat client talks to. It validates the
//! exchange, forwards it to the assistant backend and normalizes the outcome:
//!
//! - `400` plain text when `userId` or `message` is missing (backend untouched)
//! - backend status passed through, plain text, when the backend fails
//! - `500 Internal Server Error` when the request cannot be handled at all

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::backend::{BackendError, ExchangeRequest};
use crate::AppState;

/// Path the chat client posts exchanges to
pub const RELAY_PATH: &str = "/api/chat";

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Inbound body; fields are optional so that absence maps to a 400, not a parse failure
#[derive(Debug, Deserialize)]
struct RelayBody {
    #[serde(rename = "userId", default)]
    user_id: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl RelayBody {
    /// Only a JSON object with two non-empty string fields makes an exchange
    fn parse(body: Value) -> Option<ExchangeRequest> {
        if !body.is_object() {
            return None;
        }
        serde_json::from_value::<RelayBody>(body).ok()?.into_exchange()
    }

    fn into_exchange(self) -> Option<ExchangeRequest> {
        let session_id = self.user_id.filter(|s| !s.is_empty())?;
        let message = self.message.filter(|m| !m.is_empty())?;
        Some(ExchangeRequest {
            session_id,
            message,
        })
    }
}

/// Relay failures, each with a fixed response shape
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Missing userId or message in request body")]
    MissingFields,

    #[error("Backend error: {code} - {body}", code = .status.as_u16())]
    Backend { status: StatusCode, body: String },

    #[error("Internal Server Error")]
    Internal(String),
}

impl From<BackendError> for RelayError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Status { status, body } => RelayError::Backend { status, body },
            BackendError::RequestFailed(e) => RelayError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = match &self {
            RelayError::MissingFields => StatusCode::BAD_REQUEST,
            RelayError::Backend { status, body } => {
                tracing::error!(status = status.as_u16(), body = %body, "Backend error");
                *status
            }
            RelayError::Internal(detail) => {
                tracing::error!(error = %detail, "Error processing chat message");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, self.to_string()).into_response()
    }
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn relay(State(state): State<AppState>, body: Bytes) -> Result<Json<Value>, RelayError> {
    let body: Value =
        serde_json::from_slice(&body).map_err(|e| RelayError::Internal(e.to_string()))?;

    let request = RelayBody::parse(body).ok_or(RelayError::MissingFields)?;

    tracing::debug!(
        session_id = %request.session_id,
        endpoint = %state.backend.endpoint(),
        "Forwarding chat message"
    );

    let reply = state.backend.submit(&request).await?;
    Ok(Json(reply))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route(RELAY_PATH, post(relay))
}
