//! Error handling for the web bindings.

use minichat_core::ConfigError;
use minichat_proto::ProtocolError;
use thiserror::Error;
use wasm_bindgen::prelude::*;

/// Errors raised by the web bindings.
#[derive(Error, Debug)]
pub enum WebError {
    /// No `window` in this JavaScript context.
    #[error("no window object available")]
    NoWindow,

    /// A JavaScript call threw.
    #[error("JavaScript error: {0}")]
    JavaScript(String),

    /// Value could not cross the JS boundary.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_wasm_bindgen::Error),

    /// Adapter configuration is invalid.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// Role name is not `user`, `system` or `assistant`.
    #[error("invalid role: {0}")]
    Role(#[from] ProtocolError),

    /// The session was torn down.
    #[error("session has been torn down")]
    Closed,
}

impl From<JsValue> for WebError {
    fn from(value: JsValue) -> Self {
        Self::JavaScript(describe_js_error(&value))
    }
}

impl From<WebError> for JsValue {
    fn from(err: WebError) -> Self {
        js_sys::Error::new(&err.to_string()).into()
    }
}

/// Best-effort text of a thrown JS value.
pub fn describe_js_error(value: &JsValue) -> String {
    if let Some(error) = value.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

/// Result type for web operations.
pub type WebResult<T> = Result<T, WebError>;
