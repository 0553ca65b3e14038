//! minichat WebAssembly front end - web composition root
//!
//! Runs the adapter inside the host application's web view. It is
//! responsible for:
//! - Reaching the host's real globals through [`JsHost`]
//! - Providing browser time and randomness through [`WebEnv`]
//! - Driving the generic runtime with [`WebDriver`]
//! - Exposing the [`MiniApp`] class to JavaScript

// wasm-bindgen expands exported items into unsafe FFI glue.
#![allow(unsafe_code)]
#![deny(missing_docs)]

mod app;
pub mod config;
pub mod driver;
pub mod env;
pub mod error;
pub mod host;
mod utils;

pub use app::MiniApp;
pub use config::WebConfig;
pub use driver::WebDriver;
pub use env::{WebEnv, WebInstant};
pub use error::{WebError, WebResult};
pub use host::JsHost;
use wasm_bindgen::prelude::*;

/// Module initializer run by the JS loader.
#[wasm_bindgen(start)]
pub fn init_module() {
    utils::set_panic_hook();
    tracing_wasm::set_as_global_default();
}
