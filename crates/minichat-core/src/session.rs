//! Conversation and session state.
//!
//! [`Session`] is the data the bridge owns for the lifetime of the mini-app
//! view. It is a plain value with no I/O: the adapter mutates it in response
//! to events, and the view only ever sees projections of it.
//!
//! # Invariants
//!
//! - `messages[0]` is the system prompt seeded at construction; it is never
//!   removed or reordered
//! - `messages` only grows
//! - `loading` is false whenever `last_error` was set by the most recent
//!   request outcome

use minichat_proto::{ChatMessage, RequestId, Role, SafeAreaInsets};

use crate::ErrorKind;

/// Latest error shown to the view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionError {
    /// Failure category.
    pub kind: ErrorKind,
    /// User-visible text.
    pub message: String,
}

impl SessionError {
    /// Create an error of `kind`.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }
}

/// In-memory session state.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    initialized: bool,
    messages: Vec<ChatMessage>,
    pending_request_id: Option<RequestId>,
    loading: bool,
    last_error: Option<SessionError>,
    safe_area_insets: SafeAreaInsets,
}

impl Session {
    /// New session seeded with `system_prompt`.
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            initialized: false,
            messages: vec![ChatMessage::system(system_prompt)],
            pending_request_id: None,
            loading: false,
            last_error: None,
            safe_area_insets: SafeAreaInsets::ZERO,
        }
    }

    /// Full conversation, system seed included. This is what goes on the wire.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Conversation as the view sees it: every system-role entry removed.
    pub fn history(&self) -> Vec<ChatMessage> {
        self.messages.iter().filter(|m| m.role != Role::System).cloned().collect()
    }

    /// Append a turn.
    pub fn append(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Mark a request as in flight.
    pub fn begin_request(&mut self, request_id: RequestId) {
        self.pending_request_id = Some(request_id);
        self.loading = true;
    }

    /// Clear the in-flight marker after a result, failure, or dispatch error.
    pub fn finish_request(&mut self) {
        self.pending_request_id = None;
        self.loading = false;
    }

    /// Record the latest error.
    ///
    /// Errors are sticky: a later success does not clear them.
    pub fn record_error(&mut self, error: SessionError) {
        self.last_error = Some(error);
    }

    /// Mark the host handshake as acknowledged.
    pub fn mark_initialized(&mut self) {
        self.initialized = true;
    }

    /// Replace the safe-area insets wholesale.
    pub fn set_insets(&mut self, insets: SafeAreaInsets) {
        self.safe_area_insets = insets;
    }

    /// Whether the host acknowledged the session.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Whether a request is in flight.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Correlation token of the request in flight.
    pub fn pending_request_id(&self) -> Option<&RequestId> {
        self.pending_request_id.as_ref()
    }

    /// Latest error, if any.
    pub fn last_error(&self) -> Option<&SessionError> {
        self.last_error.as_ref()
    }

    /// Current safe-area insets.
    pub fn safe_area_insets(&self) -> SafeAreaInsets {
        self.safe_area_insets
    }
}
