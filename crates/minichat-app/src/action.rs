//! Adapter side-effects.
//!
//! [`AdapterAction`] values are instructions produced by the
//! [`crate::Adapter`] state machine for the runtime to execute.

use minichat_proto::OutboundEvent;

/// Actions produced by the Adapter state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterAction {
    /// Probe the host for a usable transport.
    Probe,

    /// Attach inbound listeners through the selected transport.
    Listen,

    /// Send a request through the selected transport.
    Dispatch(OutboundEvent),

    /// Neutralize host hooks and close the inbound channel.
    Detach,

    /// Publish a fresh state snapshot.
    Render,

    /// Stop the event loop.
    Stop,
}
