//! Host bridge wire contract.
//!
//! Types exchanged between the mini-app and the native host application that
//! embeds it. Nothing in this crate performs I/O: outbound events are built
//! and serialized here, inbound envelopes are decoded here, and the adapter
//! decides what to do with them.
//!
//! # Components
//!
//! - [`ChatMessage`] / [`Role`]: one conversation turn
//! - [`OutboundEvent`]: requests the mini-app sends (`MiniAppInit`,
//!   `MiniAppChatCompletions`)
//! - [`HostEvent`]: decoded `{type, data}` envelopes the host delivers
//! - [`SafeAreaInsets`]: layout padding pushed by the host, coerced from loose
//!   JSON
//!
//! # Leniency
//!
//! Hosts in the field send stringly-typed numbers, omit fields, and add
//! unknown tags. Decoding of recognized tags never fails on a bad field: the
//! field degrades to its empty value and the adapter handles the absence.
//! Only envelopes that are not objects, or lack a `type`, are rejected.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod errors;
mod inbound;
mod insets;
mod message;
mod outbound;

pub use errors::{ProtocolError, Result};
pub use inbound::{
    CompletionFailure, CompletionResult, ConfigUpdate, HostEvent, LEGACY_COMPLETION_TAG, tags,
};
pub use insets::SafeAreaInsets;
pub use message::{ChatMessage, Role};
pub use outbound::{ChatCompletionsRequest, InitRequest, OutboundEvent, RequestId};
