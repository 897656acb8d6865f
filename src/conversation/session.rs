//! Client-local session identity
//!
//! The session identifier is the only state that outlives a conversation. It is
//! kept in a small key/value store (a JSON file on disk for the terminal client,
//! an in-memory map in tests) and created on first use.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;
use uuid::Uuid;

/// Storage key holding the session identifier
pub const SESSION_KEY: &str = "codefable_user_id";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Storage IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt storage file: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("Storage lock poisoned")]
    Poisoned,
}

/// Persistent string key/value storage owned by the client.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError>;
    fn set(&self, key: &str, value: &str) -> Result<(), SessionError>;
}

/// Read the session id, generating and persisting one when absent.
pub fn resolve_session_id(store: &dyn SessionStore) -> Result<String, SessionError> {
    if let Some(existing) = store.get(SESSION_KEY)?.filter(|id| !id.is_empty()) {
        tracing::debug!(session_id = %existing, "Reusing stored session id");
        return Ok(existing);
    }

    let session_id = Uuid::new_v4().to_string();
    store.set(SESSION_KEY, &session_id)?;
    tracing::info!(session_id = %session_id, "Generated new session id");
    Ok(session_id)
}

/// JSON object file, one entry per key.
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<HashMap<String, String>, SessionError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(HashMap::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SessionError> {
        let mut entries = self.load()?;
        entries.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(&entries)?)?;
        Ok(())
    }
}

/// In-memory store, handy for tests and embedding.
#[derive(Default)]
pub struct MemorySessionStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(key: &str, value: &str) -> Self {
        let store = Self::new();
        if let Ok(mut entries) = store.entries.lock() {
            entries.insert(key.to_string(), value.to_string());
        }
        store
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        let entries = self.entries.lock().map_err(|_| SessionError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SessionError> {
        let mut entries = self.entries.lock().map_err(|_| SessionError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generates_and_persists_when_absent() {
        let store = MemorySessionStore::new();
        let id = resolve_session_id(&store).unwrap();

        assert!(Uuid::parse_str(&id).is_ok());
        assert_eq!(store.get(SESSION_KEY).unwrap(), Some(id));
    }

    #[test]
    fn test_reuses_existing_id() {
        let store = MemorySessionStore::with_entry(SESSION_KEY, "visitor-42");
        assert_eq!(resolve_session_id(&store).unwrap(), "visitor-42");
        assert_eq!(resolve_session_id(&store).unwrap(), "visitor-42");
    }

    #[test]
    fn test_file_store_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");

        let first = resolve_session_id(&FileSessionStore::new(&path)).unwrap();
        assert!(path.exists());

        // A fresh store over the same file behaves like a later visit
        let second = resolve_session_id(&FileSessionStore::new(&path)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_file_store_keeps_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("storage.json"));

        store.set("theme", "dark").unwrap();
        let id = resolve_session_id(&store).unwrap();

        assert_eq!(store.get("theme").unwrap().as_deref(), Some("dark"));
        assert_eq!(store.get(SESSION_KEY).unwrap(), Some(id));
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "not json").unwrap();

        let err = resolve_session_id(&FileSessionStore::new(&path)).unwrap_err();
        assert!(matches!(err, SessionError::Corrupt(_)));
    }
}
