//! CodeFable chat
//!
//! Two halves of one message exchange pipeline:
//!
//! - a stateless relay server ([`routes`]) that validates chat exchanges and
//!   forwards them to the assistant backend ([`backend`]),
//! - a conversation controller ([`core`]) that owns the client-side message
//!   history, admission control and error recovery.

pub mod backend;
pub mod config;
pub mod conversation;
pub mod core;
pub mod routes;

use std::sync::Arc;

use backend::AssistantBackend;
use config::Config;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub backend: Arc<AssistantBackend>,
}

impl AppState {
    pub fn new(config: Config, backend: AssistantBackend) -> Self {
        Self {
            config,
            backend: Arc::new(backend),
        }
    }
}
