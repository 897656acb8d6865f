//! Conversation controller
//!
//! Owns the client-side conversation state and enforces the send protocol:
//!
//! 1. Admission: blank input or a send already in flight is rejected silently
//! 2. The trimmed input is appended as a user message and the input cleared
//! 3. Exactly one relay request is issued, bounded by a timeout
//! 4. The reply, or a synthesized error message, is appended as the assistant
//!
//! `awaiting_reply` always returns to `false` once a send ends, including when
//! the send future is dropped before the relay answers.

use std::time::Duration;

use crate::backend::{ExchangeReply, ExchangeRequest};
use crate::conversation::{Conversation, Message};

use super::transport::{ExchangeError, RelayTransport};
use super::view::{ChatView, ViewState};

/// Default bound on one exchange
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Keys the composer forwards to the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Enter, with or without the line-break modifier (Shift)
    Enter { shift: bool },
    Other,
}

/// Result of one submit attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Admission control refused the submit; nothing was appended or sent
    Rejected,
    /// The assistant replied
    Replied,
    /// The exchange failed; the description was shown to the user
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    Sent(SendOutcome),
    NewlineInserted,
    Ignored,
}

/// Proof that a send was admitted. Hand it back to
/// [`ConversationController::complete_send`] once the relay has answered.
#[derive(Debug)]
#[must_use = "an admitted send must be completed"]
pub struct PendingExchange {
    request: ExchangeRequest,
}

impl PendingExchange {
    pub fn request(&self) -> &ExchangeRequest {
        &self.request
    }
}

/// Clears the busy flag when dropped. A guard dropped before `finished` is
/// set belongs to an abandoned send, so it also re-renders the idle state.
struct BusyGuard<'a, V: ChatView> {
    awaiting_reply: &'a mut bool,
    view: &'a mut V,
    conversation: &'a Conversation,
    pending_input: &'a str,
    finished: bool,
}

impl<V: ChatView> Drop for BusyGuard<'_, V> {
    fn drop(&mut self) {
        *self.awaiting_reply = false;
        if self.finished {
            return;
        }
        tracing::debug!("Send abandoned before the relay answered");
        self.view.render(&ViewState {
            messages: self.conversation.messages(),
            pending_input: self.pending_input,
            awaiting_reply: false,
            can_send: !self.pending_input.trim().is_empty(),
        });
    }
}

/// One relay call bounded by `timeout`; expiry is reported as
/// [`ExchangeError::Timeout`].
pub async fn bounded_send<T: RelayTransport + ?Sized>(
    transport: &T,
    request: &ExchangeRequest,
    timeout: Duration,
) -> Result<ExchangeReply, ExchangeError> {
    match tokio::time::timeout(timeout, transport.send(request)).await {
        Ok(result) => result,
        Err(_) => Err(ExchangeError::Timeout(timeout)),
    }
}

pub struct ConversationController<T: RelayTransport, V: ChatView> {
    conversation: Conversation,
    pending_input: String,
    awaiting_reply: bool,
    transport: T,
    view: V,
    timeout: Duration,
}

impl<T: RelayTransport, V: ChatView> ConversationController<T, V> {
    /// Start a conversation seeded with the assistant greeting
    pub fn new(session_id: impl Into<String>, transport: T, view: V) -> Self {
        let mut controller = Self {
            conversation: Conversation::new(session_id).with_greeting(),
            pending_input: String::new(),
            awaiting_reply: false,
            transport,
            view,
            timeout: DEFAULT_TIMEOUT,
        };

        if let Some(greeting) = controller.conversation.last() {
            controller.view.reveal_latest(greeting);
        }
        controller.render();
        controller
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn session_id(&self) -> &str {
        &self.conversation.session_id
    }

    pub fn messages(&self) -> &[Message] {
        self.conversation.messages()
    }

    pub fn pending_input(&self) -> &str {
        &self.pending_input
    }

    pub fn awaiting_reply(&self) -> bool {
        self.awaiting_reply
    }

    /// Whether the send affordance should be enabled
    pub fn can_send(&self) -> bool {
        !self.awaiting_reply && !self.pending_input.trim().is_empty()
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_state(&self) -> ViewState<'_> {
        ViewState {
            messages: self.conversation.messages(),
            pending_input: &self.pending_input,
            awaiting_reply: self.awaiting_reply,
            can_send: self.can_send(),
        }
    }

    /// Replace the pending input
    pub fn set_input(&mut self, text: impl Into<String>) {
        self.pending_input = text.into();
        self.render();
    }

    /// Line break in the composer; never sends
    pub fn insert_newline(&mut self) {
        self.pending_input.push('\n');
        self.render();
    }

    /// Enter sends, Shift+Enter inserts a line break
    pub async fn on_key(&mut self, key: Key) -> KeyOutcome {
        match key {
            Key::Enter { shift: false } => KeyOutcome::Sent(self.submit().await),
            Key::Enter { shift: true } => {
                self.insert_newline();
                KeyOutcome::NewlineInserted
            }
            Key::Other => KeyOutcome::Ignored,
        }
    }

    /// Run one full send cycle. Never fails: every error ends up as an
    /// assistant message in the conversation.
    pub async fn submit(&mut self) -> SendOutcome {
        let Some(exchange) = self.begin_send() else {
            return SendOutcome::Rejected;
        };

        let mut busy = BusyGuard {
            awaiting_reply: &mut self.awaiting_reply,
            view: &mut self.view,
            conversation: &self.conversation,
            pending_input: &self.pending_input,
            finished: false,
        };
        let result = bounded_send(&self.transport, &exchange.request, self.timeout).await;
        busy.finished = true;
        drop(busy);

        self.complete_send(exchange, result)
    }

    /// First half of a send: admission control, optimistic user message,
    /// busy flag. Returns `None` when the submit is rejected.
    pub fn begin_send(&mut self) -> Option<PendingExchange> {
        if self.awaiting_reply {
            tracing::debug!("Send rejected, reply still pending");
            return None;
        }

        let content = self.pending_input.trim().to_string();
        if content.is_empty() {
            return None;
        }

        let message = self.conversation.add_user(&content);
        self.view.reveal_latest(message);
        self.pending_input.clear();
        self.awaiting_reply = true;
        self.render();

        tracing::debug!(session_id = %self.conversation.session_id, "Sending chat message");

        Some(PendingExchange {
            request: ExchangeRequest {
                session_id: self.conversation.session_id.clone(),
                message: content,
            },
        })
    }

    /// Second half of a send: append the reply or the error, back to idle.
    pub fn complete_send(
        &mut self,
        exchange: PendingExchange,
        result: Result<ExchangeReply, ExchangeError>,
    ) -> SendOutcome {
        drop(exchange);
        self.awaiting_reply = false;

        let outcome = match result {
            Ok(reply) => {
                let message = self.conversation.add_assistant(&reply.assistant_message);
                self.view.reveal_latest(message);
                SendOutcome::Replied
            }
            Err(err) => {
                tracing::warn!(error = %err, "Error sending message");
                let description = describe(&err);
                let message = self.conversation.add_assistant(&error_message(&description));
                self.view.reveal_latest(message);
                SendOutcome::Failed(description)
            }
        };

        self.render();
        outcome
    }

    fn render(&mut self) {
        let can_send = self.can_send();
        let state = ViewState {
            messages: self.conversation.messages(),
            pending_input: &self.pending_input,
            awaiting_reply: self.awaiting_reply,
            can_send,
        };
        self.view.render(&state);
    }
}

fn describe(err: &ExchangeError) -> String {
    let description = err.to_string();
    if description.trim().is_empty() {
        ExchangeError::Unknown.to_string()
    } else {
        description
    }
}

/// Assistant-authored text shown in place of a reply
pub fn error_message(description: &str) -> String {
    format!(
        "Oops! My AI brain hit a snag: {}. Could you try asking again?",
        description
    )
}
