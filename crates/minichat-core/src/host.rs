//! Host capability abstraction.
//!
//! The host application exposes a handful of objects on the web view's global
//! namespace. [`Host`] models exactly the operations the bridge needs on them
//! (presence probes, method invocation, event subscription) so the bridge
//! never reads a global directly and tests can substitute a double.
//!
//! Inbound events flow through an [`EventSink`]: the host implementation
//! hands every delivered payload to the sink, and the owner of the matching
//! receiver processes them in delivery order.

use std::fmt;

use serde_json::{Value, json};
use tokio::sync::mpsc;

use crate::HostError;

/// A namespace object on the host's global scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Surface {
    /// Push-style proxy exposing `postEvent(name, payload)`.
    Proxy,
    /// Namespaced `WebApp` object carrying request methods.
    WebApp,
    /// Namespaced `WebView` object carrying the inbound subscription point.
    WebView,
}

impl Surface {
    /// Name used in logs and error messages.
    pub fn name(self) -> &'static str {
        match self {
            Self::Proxy => "WebViewProxy",
            Self::WebApp => "WebApp",
            Self::WebView => "WebView",
        }
    }
}

impl fmt::Display for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Receiving end for host-delivered events.
///
/// Cloned into every handler the bridge registers with the host. Once the
/// receiver is closed (teardown), deliveries are dropped and can no longer
/// reach session state.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<Value>,
    tag: Option<&'static str>,
}

impl EventSink {
    /// Create a sink and the receiver draining it.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Value>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx, tag: None }, rx)
    }

    /// Sink that wraps every payload as `{type: tag, data: payload}`.
    ///
    /// For hosts whose handlers receive bare data instead of an envelope.
    #[must_use]
    pub fn tagged(&self, tag: &'static str) -> Self {
        Self { tx: self.tx.clone(), tag: Some(tag) }
    }

    /// Hand a payload to the bridge.
    ///
    /// Returns `false` if the bridge has been torn down.
    pub fn deliver(&self, payload: Value) -> bool {
        let envelope = match self.tag {
            Some(tag) => json!({ "type": tag, "data": payload }),
            None => payload,
        };
        self.tx.send(envelope).is_ok()
    }

    /// Whether the receiving side is gone.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// The host application's bridge surface.
///
/// Implementations wrap whatever the platform provides: JS globals in the web
/// view, an in-process loopback in the terminal demo, a scripted double in
/// tests. All calls are synchronous and non-blocking; replies arrive later
/// through an [`EventSink`].
pub trait Host {
    /// Whether the namespace object exists.
    fn has_surface(&self, surface: Surface) -> bool;

    /// Whether the namespace object exposes a callable `method`.
    fn has_method(&self, surface: Surface, method: &str) -> bool;

    /// Call `surface.method(...args)`.
    ///
    /// # Errors
    ///
    /// - [`HostError::SurfaceMissing`] / [`HostError::MethodMissing`] if the
    ///   target is absent
    /// - [`HostError::Threw`] if the host raised during the call
    fn invoke(&self, surface: Surface, method: &str, args: &[Value]) -> Result<(), HostError>;

    /// Register `sink` through `surface.onEvent(event, handler)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the surface or its `onEvent` is absent, or the
    /// registration threw.
    fn subscribe(&self, surface: Surface, event: &str, sink: EventSink) -> Result<(), HostError>;

    /// Assign `WebView.receiveEvent` directly.
    ///
    /// `None` replaces the hook with a no-op so the host can keep calling it
    /// after teardown.
    ///
    /// # Errors
    ///
    /// Returns an error if the `WebView` surface is absent.
    fn set_receive_hook(&self, sink: Option<EventSink>) -> Result<(), HostError>;
}
