//! Mini-app bridge core
//!
//! Pure building blocks for talking to a host application's bridge: the host
//! capability model, transport strategies, session state, and the
//! environment abstraction. Nothing here owns an event loop or reads a global.
//!
//! # Architecture
//!
//! The host's global namespace is modeled as an injected [`Host`] capability
//! object. The historically observed host API shapes are modeled as
//! [`Transport`] strategies, ranked in a [`NegotiationTable`]; the first
//! strategy whose `can_send` probe succeeds is selected once and used for
//! every later call.
//!
//! Time and randomness come from an [`Environment`], so the same logic runs
//! against the real web view, a terminal demo, and deterministic simulation.
//!
//! # Components
//!
//! - [`mod@env`]: Environment abstraction (time, RNG)
//! - [`host`]: Host capability trait and inbound [`EventSink`]
//! - [`transport`]: Transport strategies and negotiation table
//! - [`session`]: Conversation and session state
//! - [`config`]: Adapter configuration
//! - [`error`]: Host and transport error types

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod env;
pub mod error;
pub mod host;
mod request_id;
pub mod session;
pub mod transport;

pub use config::{AdapterConfig, ConfigError};
pub use env::Environment;
pub use error::{ErrorKind, HostError, TransportError};
pub use host::{EventSink, Host, Surface};
pub use request_id::next_request_id;
pub use session::{Session, SessionError};
pub use transport::{
    Delivery, NamespacedMethod, NegotiationTable, ProxyPush, SingleTurn, Transport,
    TransportVariant,
};
