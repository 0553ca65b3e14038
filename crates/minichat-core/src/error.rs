//! Error types for host access and outbound transport.
//!
//! Strongly-typed errors for two layers: [`HostError`] for raw access to the
//! host's namespace (probe, invoke, subscribe), and [`TransportError`] for a
//! strategy's view of the same failure. Every error is terminal for the call
//! that raised it only; none of them tears down the session.

use minichat_proto::ProtocolError;
use thiserror::Error;

use crate::Surface;

/// Failure categories surfaced to the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Host object or method absent at call time.
    CapabilityMissing,
    /// Host threw synchronously while a call was dispatched.
    TransportException,
    /// Host explicitly reported a failed request.
    HostReportedFailure,
    /// Inbound event had an unexpected shape.
    MalformedPayload,
}

/// Errors raised by a [`crate::Host`] implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// Namespace object does not exist.
    #[error("host {surface} is not initialized")]
    SurfaceMissing {
        /// Missing namespace object.
        surface: Surface,
    },

    /// Namespace object exists but the method does not.
    #[error("{surface}.{method} is not a function")]
    MethodMissing {
        /// Namespace object that was probed.
        surface: Surface,
        /// Missing method name.
        method: String,
    },

    /// Host code threw while running the call.
    #[error("host threw: {message}")]
    Threw {
        /// Stringified exception.
        message: String,
    },
}

/// Errors raised by a [`crate::Transport`] strategy.
///
/// The `Display` text is what the view shows as the latest error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// No strategy matched the host.
    #[error("host bridge is not available")]
    Unavailable,

    /// Selected strategy's method is gone from the host.
    #[error("{method} method not found")]
    MethodMissing {
        /// Missing method name.
        method: String,
    },

    /// Host threw during dispatch.
    #[error("Error sending message: {0}")]
    Threw(String),

    /// Inbound subscription point is missing.
    #[error("host {surface} is not initialized")]
    ListenerUnavailable {
        /// Missing namespace object.
        surface: Surface,
    },

    /// Request could not be encoded.
    #[error("failed to encode request: {0}")]
    Encode(#[from] ProtocolError),

    /// Single-turn host asked to send a conversation with no turns.
    #[error("conversation is empty")]
    EmptyConversation,
}

impl TransportError {
    /// Failure category for the view.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unavailable | Self::MethodMissing { .. } | Self::ListenerUnavailable { .. } => {
                ErrorKind::CapabilityMissing
            },
            Self::Threw(_) => ErrorKind::TransportException,
            Self::Encode(_) | Self::EmptyConversation => ErrorKind::MalformedPayload,
        }
    }
}

impl From<HostError> for TransportError {
    fn from(err: HostError) -> Self {
        match err {
            HostError::SurfaceMissing { surface } => Self::ListenerUnavailable { surface },
            HostError::MethodMissing { method, .. } => Self::MethodMissing { method },
            HostError::Threw { message } => Self::Threw(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_capabilities_share_a_kind() {
        assert_eq!(TransportError::Unavailable.kind(), ErrorKind::CapabilityMissing);
        assert_eq!(
            TransportError::MethodMissing { method: "MiniAppChatCompletions".into() }.kind(),
            ErrorKind::CapabilityMissing
        );
        assert_eq!(
            TransportError::ListenerUnavailable { surface: Surface::WebView }.kind(),
            ErrorKind::CapabilityMissing
        );
    }

    #[test]
    fn thrown_host_errors_are_transport_exceptions() {
        let err = TransportError::from(HostError::Threw { message: "TypeError".into() });
        assert_eq!(err.kind(), ErrorKind::TransportException);
        assert_eq!(err.to_string(), "Error sending message: TypeError");
    }

    #[test]
    fn method_missing_message_names_the_method() {
        let err = TransportError::from(HostError::MethodMissing {
            surface: Surface::WebApp,
            method: "MiniAppChatCompletions".into(),
        });
        assert_eq!(err.to_string(), "MiniAppChatCompletions method not found");
    }
}
