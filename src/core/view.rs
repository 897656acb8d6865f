//! Presentation seam
//!
//! The controller never draws anything itself. After every transition it hands
//! a [`ViewState`] to a [`ChatView`]; after every append it asks the view to
//! bring the newest message into sight.

use std::io::Write;

use crate::conversation::{Message, Role};

/// Busy indicator shown while a reply is pending
pub const THINKING: &str = "Thinking...";

/// Input hint for the composer
pub const SEND_HINT: &str = "Press Enter to send, Shift + Enter for new line";

/// Everything a renderer needs, borrowed from the controller
#[derive(Debug, Clone, Copy)]
pub struct ViewState<'a> {
    pub messages: &'a [Message],
    pub pending_input: &'a str,
    pub awaiting_reply: bool,
    pub can_send: bool,
}

pub trait ChatView: Send {
    fn render(&mut self, state: &ViewState<'_>);
    fn reveal_latest(&mut self, message: &Message);
}

/// Discards everything
#[derive(Debug, Default)]
pub struct NullView;

impl ChatView for NullView {
    fn render(&mut self, _state: &ViewState<'_>) {}
    fn reveal_latest(&mut self, _message: &Message) {}
}

/// Line-oriented terminal renderer.
///
/// Terminals cannot scroll back to an arbitrary message, so revealing the
/// newest message means printing it; renders only toggle the busy line.
pub struct TerminalView<W: Write + Send> {
    out: W,
    showing_busy: bool,
}

impl<W: Write + Send> TerminalView<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            showing_busy: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn author(role: Role) -> &'static str {
        match role {
            Role::User => "You",
            Role::Assistant => "AI Assistant",
        }
    }
}

impl<W: Write + Send> ChatView for TerminalView<W> {
    fn render(&mut self, state: &ViewState<'_>) {
        if state.awaiting_reply && !self.showing_busy {
            let _ = writeln!(self.out, "{}", THINKING);
        }
        self.showing_busy = state.awaiting_reply;
        let _ = self.out.flush();
    }

    fn reveal_latest(&mut self, message: &Message) {
        // The user already sees what they typed
        if message.role == Role::User {
            return;
        }
        let _ = writeln!(
            self.out,
            "{} [{}]\n{}\n",
            Self::author(message.role),
            message.timestamp,
            message.content
        );
        let _ = self.out.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_view_prints_assistant_messages_and_busy_once() {
        let mut view = TerminalView::new(Vec::new());
        let greeting = Message::assistant("Hello!");
        let messages = vec![greeting.clone()];

        view.reveal_latest(&greeting);
        let busy = ViewState {
            messages: &messages,
            pending_input: "",
            awaiting_reply: true,
            can_send: false,
        };
        view.render(&busy);
        view.render(&busy);
        view.reveal_latest(&Message::user("typed by me"));

        let output = String::from_utf8(view.into_inner()).unwrap();
        assert!(output.contains("AI Assistant"));
        assert!(output.contains("Hello!"));
        assert_eq!(output.matches(THINKING).count(), 1);
        assert!(!output.contains("typed by me"));
    }
}
