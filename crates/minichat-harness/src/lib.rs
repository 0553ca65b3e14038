//! Deterministic simulation harness for the mini-app host bridge.
//!
//! In-memory implementations of the Environment, Host and Driver traits for
//! deterministic, reproducible testing of every transport variant, including
//! hosts that appear late, throw, or never appear at all.
//!
//! # Invariant Testing
//!
//! The `invariants` module provides behavioral testing through invariant
//! checks. Use [`InvariantRegistry::standard()`] for the session invariants.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod invariants;
pub mod sim_driver;
pub mod sim_env;
pub mod sim_host;

pub use invariants::{
    HandshakeAtMostOnce, HistoryAppendOnly, HistoryHidesSystem, Invariant, InvariantRegistry,
    InvariantResult, NoReplyWithoutTransport, SessionSnapshot, SystemSeedPreserved, Violation,
};
pub use sim_driver::{SimDriver, SimDriverError};
pub use sim_env::{SimEnv, SimInstant};
pub use sim_host::{Invocation, SimHost};
