//! View-facing state snapshot.
//!
//! [`ChatState`] is the only thing the view layer ever sees. It is an
//! immutable projection of the session: system turns are filtered out and the
//! error is flattened to its display text.

use minichat_core::Session;
use minichat_proto::{ChatMessage, SafeAreaInsets};
use serde::Serialize;

/// Read-only snapshot published to the view.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatState {
    /// Conversation without system turns, chronological.
    pub conversation_history: Vec<ChatMessage>,
    /// A request is in flight.
    pub is_loading: bool,
    /// Latest error text.
    pub error: Option<String>,
    /// Host acknowledged the session.
    pub is_initialized: bool,
    /// Safe-area insets pushed by the host.
    pub safe_area_insets: SafeAreaInsets,
}

impl From<&Session> for ChatState {
    fn from(session: &Session) -> Self {
        Self {
            conversation_history: session.history(),
            is_loading: session.is_loading(),
            error: session.last_error().map(|e| e.message.clone()),
            is_initialized: session.is_initialized(),
            safe_area_insets: session.safe_area_insets(),
        }
    }
}
