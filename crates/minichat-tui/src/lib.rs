//! Terminal UI for minichat
//!
//! A thin shell over [`minichat_app::Driver`] that provides terminal-specific
//! I/O. All orchestration logic lives in the generic [`minichat_app::Runtime`];
//! this crate only handles input editing, rendering, and an in-process
//! [`LoopbackHost`] standing in for a real host application.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod env;
pub mod input;
pub mod loopback;
pub mod terminal;
pub mod ui;

pub use env::SystemEnv;
pub use input::{InputState, KeyInput, KeyOutcome};
pub use loopback::{LoopbackConfig, LoopbackHost};
pub use minichat_app::{Adapter, AdapterEvent, ChatState, Driver, Runtime};
pub use terminal::{TerminalDriver, TerminalError};
