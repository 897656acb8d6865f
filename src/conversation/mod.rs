//! Conversation types and state management

pub mod session;

use chrono::Local;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use session::{resolve_session_id, FileSessionStore, MemorySessionStore, SessionStore};

/// Greeting seeded into every new conversation
pub const GREETING: &str = "Hello! I'm your AI assistant. How can I help you today?";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    /// Display-only wall clock time (`HH:MM`)
    pub timestamp: String,
}

impl Message {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            timestamp: Local::now().format("%H:%M").to_string(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Append-only message history for one session.
#[derive(Debug, Clone, Serialize)]
pub struct Conversation {
    pub session_id: String,
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            messages: Vec::new(),
        }
    }

    pub fn with_greeting(mut self) -> Self {
        self.messages.push(Message::assistant(GREETING));
        self
    }

    pub fn add_user(&mut self, content: &str) -> &Message {
        self.push(Message::user(content))
    }

    pub fn add_assistant(&mut self, content: &str) -> &Message {
        self.push(Message::assistant(content))
    }

    fn push(&mut self, message: Message) -> &Message {
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greeting_is_seeded() {
        let conversation = Conversation::new("s1").with_greeting();
        assert_eq!(conversation.len(), 1);
        assert_eq!(conversation.messages()[0].role, Role::Assistant);
        assert_eq!(conversation.messages()[0].content, GREETING);
    }

    #[test]
    fn test_append_keeps_insertion_order_and_unique_ids() {
        let mut conversation = Conversation::new("s1");
        conversation.add_user("first");
        conversation.add_assistant("second");
        conversation.add_user("third");

        let contents: Vec<_> = conversation.messages().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["first", "second", "third"]);

        let ids = conversation.messages();
        assert_ne!(ids[0].id, ids[1].id);
        assert_ne!(ids[1].id, ids[2].id);
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let msg = Message::user("Hello");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(msg.timestamp.len(), 5);
    }
}
