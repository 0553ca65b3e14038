//! Observable state snapshots for invariant checking.
//!
//! Snapshots capture the observable state of a session at a point in time.
//! Invariants operate on snapshots rather than live state so checks are
//! consistent and atomic.

use minichat_app::{Adapter, ChatState};
use minichat_core::{Environment, TransportVariant};
use minichat_proto::ChatMessage;

/// Snapshot of one session, plus what was observed before it.
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    /// Prompt the session was seeded with.
    pub system_prompt: String,
    /// Full conversation, system seed included.
    pub messages: Vec<ChatMessage>,
    /// Projection published to the view.
    pub view: ChatState,
    /// Selected transport. `None` if detection has not succeeded.
    pub transport: Option<TransportVariant>,
    /// Whether any transport was ever selected.
    pub ever_detected: bool,
    /// Init handshakes the host has received.
    pub handshakes: usize,
    /// Earlier observations of `messages`, oldest first.
    pub message_history: Vec<Vec<ChatMessage>>,
}

impl SessionSnapshot {
    /// Empty snapshot for a session seeded with `system_prompt`.
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self { system_prompt: system_prompt.into(), ..Self::default() }
    }

    /// Record the adapter's current state, keeping the previous conversation
    /// in the history.
    pub fn observe<E: Environment>(&mut self, adapter: &Adapter<E>, handshakes: usize) {
        let previous = std::mem::replace(&mut self.messages, adapter.session().messages().to_vec());
        if !previous.is_empty() {
            self.message_history.push(previous);
        }
        self.view = adapter.state();
        self.transport = adapter.transport();
        self.ever_detected |= self.transport.is_some();
        self.handshakes = handshakes;
    }

    /// Replace the conversation without touching history.
    #[must_use]
    pub fn with_messages(mut self, messages: Vec<ChatMessage>) -> Self {
        self.messages = messages;
        self
    }

    /// Append an earlier observation.
    #[must_use]
    pub fn with_history(mut self, messages: Vec<ChatMessage>) -> Self {
        self.message_history.push(messages);
        self
    }
}
