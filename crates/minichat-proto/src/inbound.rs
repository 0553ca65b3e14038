//! Inbound host events.
//!
//! The host delivers `{type, data}` envelopes through a single subscription
//! point. [`HostEvent::decode`] maps the tag to a variant and extracts the
//! fields the adapter needs, degrading malformed fields to `None` instead of
//! failing the whole event.

use serde_json::Value;

use crate::{ProtocolError, Result, SafeAreaInsets, errors::json_type_name};

/// Tags of the `receiveEvent` envelope.
pub mod tags {
    /// Completion finished (successfully or with an inline error).
    pub const COMPLETION_RESULT: &str = "MiniAppChatCompletionsResult";
    /// Completion failed on the host side.
    pub const COMPLETION_FAILED: &str = "MiniAppChatCompletionsFailed";
    /// Host acknowledged the startup handshake.
    pub const INIT_RESULT: &str = "MiniAppInitResult";
    /// Host pushed configuration (safe-area insets).
    pub const CONFIG_UPDATE: &str = "MiniAppDidUpdateConfig";
}

/// Tag given to replies from single-turn hosts.
///
/// These hosts emit `chat_completions_response` on their own `onEvent` hook
/// with a JSON-encoded string as data, not a `{type, data}` envelope.
pub const LEGACY_COMPLETION_TAG: &str = "chat_completions_response";

/// Data of a completion result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionResult {
    /// Assistant reply. `None` if absent or empty.
    pub response: Option<String>,
    /// Inline error reported with the result. Takes precedence over
    /// `response`.
    pub error: Option<String>,
}

/// Data of a completion failure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionFailure {
    /// Human-readable description (`error_description`).
    pub description: Option<String>,
    /// Machine reason code (`error_reason`).
    pub reason: Option<String>,
}

impl CompletionFailure {
    /// User-facing message combining description and reason.
    ///
    /// Missing parts fall back to generic text.
    pub fn message(&self) -> String {
        let description = self.description.as_deref().unwrap_or("Unknown error");
        let reason = self.reason.as_deref().unwrap_or("unknown reason");
        format!("Error: {description} ({reason})")
    }
}

/// Data of a configuration push.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ConfigUpdate {
    /// Coerced insets. `None` if the push carried no safe-area object.
    pub safe_area_insets: Option<SafeAreaInsets>,
}

/// A decoded host event.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    /// `MiniAppChatCompletionsResult`, or a legacy `chat_completions_response`.
    CompletionResult(CompletionResult),
    /// `MiniAppChatCompletionsFailed`.
    CompletionFailed(CompletionFailure),
    /// `MiniAppInitResult`.
    InitResult,
    /// `MiniAppDidUpdateConfig`.
    ConfigUpdate(ConfigUpdate),
    /// Any other tag. Ignored by the adapter.
    Unrecognized {
        /// Tag as delivered.
        tag: String,
    },
}

impl HostEvent {
    /// Decode a `{type, data}` envelope.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::NotAnObject`] if `envelope` is not an object
    /// - [`ProtocolError::MissingType`] if `type` is absent or not a string
    pub fn decode(envelope: &Value) -> Result<Self> {
        let Some(object) = envelope.as_object() else {
            return Err(ProtocolError::NotAnObject { found: json_type_name(envelope) });
        };

        let tag = object.get("type").and_then(Value::as_str).ok_or(ProtocolError::MissingType)?;
        let data = object.get("data").unwrap_or(&Value::Null);

        let event = match tag {
            tags::COMPLETION_RESULT => Self::CompletionResult(decode_result(data)),
            tags::COMPLETION_FAILED => Self::CompletionFailed(CompletionFailure {
                description: truthy_text(data.get("error_description")),
                reason: truthy_text(data.get("error_reason")),
            }),
            tags::INIT_RESULT => Self::InitResult,
            tags::CONFIG_UPDATE => Self::ConfigUpdate(ConfigUpdate {
                safe_area_insets: data
                    .get("safe_area_insets")
                    .filter(|v| v.is_object())
                    .map(SafeAreaInsets::from_loose),
            }),
            LEGACY_COMPLETION_TAG => Self::CompletionResult(decode_legacy_result(data)),
            other => Self::Unrecognized { tag: other.to_string() },
        };

        Ok(event)
    }

    /// Decode an envelope from raw JSON text.
    pub fn decode_str(raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw)?;
        Self::decode(&value)
    }

    /// Wire tag of this event.
    pub fn tag(&self) -> &str {
        match self {
            Self::CompletionResult(_) => tags::COMPLETION_RESULT,
            Self::CompletionFailed(_) => tags::COMPLETION_FAILED,
            Self::InitResult => tags::INIT_RESULT,
            Self::ConfigUpdate(_) => tags::CONFIG_UPDATE,
            Self::Unrecognized { tag } => tag,
        }
    }
}

fn decode_result(data: &Value) -> CompletionResult {
    CompletionResult {
        response: truthy_text(data.get("response")),
        error: truthy_text(data.get("error")),
    }
}

/// Single-turn hosts send the result as a JSON string.
fn decode_legacy_result(data: &Value) -> CompletionResult {
    match data {
        Value::String(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(parsed) => decode_result(&parsed),
            Err(_) => CompletionResult::default(),
        },
        other => decode_result(other),
    }
}

/// Text of a field, following the host's truthiness rules: missing, `null`,
/// empty strings, `false` and `0` carry no text.
fn truthy_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64().is_some_and(|f| f != 0.0) => Some(n.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        v @ (Value::Array(_) | Value::Object(_)) => Some(v.to_string()),
        _ => None,
    }
}
