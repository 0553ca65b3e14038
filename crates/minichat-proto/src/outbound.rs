//! Outbound requests from the mini-app to the host.
//!
//! Both request kinds carry a `request_id` correlation token. Completion
//! requests carry the full conversation on every call: the host's completion
//! endpoint keeps no state between invocations.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{ChatMessage, Result};

/// Correlation token attached to each outbound request.
///
/// Opaque to the host. Unique per call within a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    /// Wrap an existing token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Token text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Payload of `MiniAppInit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitRequest {
    /// Correlation token.
    pub request_id: RequestId,
}

/// Payload of `MiniAppChatCompletions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatCompletionsRequest {
    /// Correlation token.
    pub request_id: RequestId,
    /// Full conversation, system seed first.
    pub messages: Vec<ChatMessage>,
}

/// A request the mini-app dispatches to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundEvent {
    /// Startup handshake.
    Init(InitRequest),
    /// Chat completion over the whole conversation.
    ChatCompletions(ChatCompletionsRequest),
}

impl OutboundEvent {
    /// Event and method name of the startup handshake.
    pub const INIT: &'static str = "MiniAppInit";

    /// Event and method name of a completion request.
    pub const CHAT_COMPLETIONS: &'static str = "MiniAppChatCompletions";

    /// Build a handshake request.
    pub fn init(request_id: RequestId) -> Self {
        Self::Init(InitRequest { request_id })
    }

    /// Build a completion request over `messages`.
    pub fn chat_completions(request_id: RequestId, messages: Vec<ChatMessage>) -> Self {
        Self::ChatCompletions(ChatCompletionsRequest { request_id, messages })
    }

    /// Event name used by push-style and namespaced-method hosts.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Init(_) => Self::INIT,
            Self::ChatCompletions(_) => Self::CHAT_COMPLETIONS,
        }
    }

    /// Correlation token of this request.
    pub fn request_id(&self) -> &RequestId {
        match self {
            Self::Init(req) => &req.request_id,
            Self::ChatCompletions(req) => &req.request_id,
        }
    }

    /// Newest turn of a completion request. `None` for handshakes and empty
    /// conversations.
    ///
    /// Single-turn hosts receive only this turn.
    pub fn latest_turn(&self) -> Option<&ChatMessage> {
        match self {
            Self::Init(_) => None,
            Self::ChatCompletions(req) => req.messages.last(),
        }
    }

    /// JSON payload handed to the host.
    pub fn payload(&self) -> Result<serde_json::Value> {
        let value = match self {
            Self::Init(req) => serde_json::to_value(req)?,
            Self::ChatCompletions(req) => serde_json::to_value(req)?,
        };
        Ok(value)
    }
}
