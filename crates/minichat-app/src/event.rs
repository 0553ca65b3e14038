//! Adapter input events.
//!
//! This module defines [`AdapterEvent`], the full set of inputs that drive the
//! [`crate::Adapter`] state machine.
//!
//! Events originate from three sources:
//! - The view (send, explicit init, teardown) and the runtime clock (ticks).
//! - The [`crate::Bridge`], reporting the outcome of actions it executed.
//! - The host, as decoded inbound envelopes.

use minichat_core::{TransportError, TransportVariant};
use minichat_proto::{HostEvent, Role};

/// Events processed by the Adapter state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum AdapterEvent<I> {
    /// Clock advanced.
    Tick {
        /// Current time.
        now: I,
    },

    /// User submitted a message.
    SendMessage {
        /// Message text.
        text: String,
        /// Role of the turn.
        role: Role,
    },

    /// Send the init handshake now instead of waiting for the grace delay.
    Initialize,

    /// Tear the bridge down.
    Teardown,

    /// Capability probe finished. `None` if no strategy matched.
    Detected(Option<TransportVariant>),

    /// Inbound listeners could not be attached.
    ListenFailed(TransportError),

    /// Chat request could not be dispatched.
    SendFailed(TransportError),

    /// Init handshake could not be dispatched.
    HandshakeFailed(TransportError),

    /// Host completed the init handshake synchronously.
    HandshakeAcknowledged,

    /// Host delivered an event.
    Host(HostEvent),
}
