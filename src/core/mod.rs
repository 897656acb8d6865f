//! Client-side conversation core
//!
//! The controller drives every user-visible transition. It talks to the relay
//! through [`RelayTransport`] and to the presentation layer through [`ChatView`].

mod controller;
mod transport;
pub mod view;

pub use controller::{
    bounded_send, error_message, ConversationController, Key, KeyOutcome, PendingExchange, SendOutcome,
    DEFAULT_TIMEOUT,
};
pub use transport::{ExchangeError, HttpRelayClient, RelayTransport};
pub use view::{ChatView, NullView, TerminalView, ViewState};
