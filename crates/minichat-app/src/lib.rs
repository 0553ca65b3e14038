//! Application layer for minichat
//!
//! Pure state machine and generic runtime for the mini-app host bridge,
//! enabling deterministic simulation testing with the same code that runs in
//! the web view.
//!
//! # Components
//!
//! - [`Adapter`]: Session state machine (detection, handshake, demultiplexing)
//! - [`Bridge`]: Host bridge (executes Adapter actions against a `Host`)
//! - [`Driver`]: Trait for platform-specific view I/O
//! - [`Runtime`]: Generic orchestration loop using Driver

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod action;
mod adapter;
mod bridge;
mod driver;
mod event;
mod runtime;
mod state;

pub use action::AdapterAction;
pub use adapter::{Adapter, Phase};
pub use bridge::Bridge;
pub use driver::Driver;
pub use event::AdapterEvent;
pub use runtime::Runtime;
pub use state::ChatState;
