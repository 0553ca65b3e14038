//! Outbound transport strategies.
//!
//! Hosts have exposed three incompatible shapes over their lifetime. Each is a
//! [`Transport`] strategy answering two questions: can this host be reached
//! this way (`can_send`), and how is a request delivered (`send`). The
//! [`NegotiationTable`] ranks strategies; detection picks the first whose
//! probe succeeds and the choice is never revisited.
//!
//! | Variant | Outbound | Inbound |
//! |---|---|---|
//! | [`ProxyPush`] | `WebViewProxy.postEvent(name, payload)` | `WebView.onEvent("receiveEvent")` + `WebView.receiveEvent` |
//! | [`NamespacedMethod`] | `WebApp.<name>(payload)` | same as above |
//! | [`SingleTurn`] | `WebApp.chat_completions(prompt, role)` | `WebApp.onEvent("chat_completions_response")` |

use std::fmt;

use minichat_proto::{LEGACY_COMPLETION_TAG, OutboundEvent};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{EventSink, Host, Surface, TransportError};

/// Identifier of a transport strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransportVariant {
    /// Push-style proxy (`postEvent`).
    ProxyPush,
    /// Namespaced `WebApp` method taking the full conversation.
    NamespacedMethod,
    /// Legacy single-turn `chat_completions(prompt, role)`.
    SingleTurn,
}

impl TransportVariant {
    /// All variants in preference order.
    pub const RANKED: [Self; 3] = [Self::ProxyPush, Self::NamespacedMethod, Self::SingleTurn];

    /// Strategy implementing this variant.
    pub fn strategy(self) -> Box<dyn Transport> {
        match self {
            Self::ProxyPush => Box::new(ProxyPush),
            Self::NamespacedMethod => Box::new(NamespacedMethod),
            Self::SingleTurn => Box::new(SingleTurn),
        }
    }
}

impl fmt::Display for TransportVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ProxyPush => "proxy-push",
            Self::NamespacedMethod => "namespaced-method",
            Self::SingleTurn => "single-turn",
        };
        f.write_str(name)
    }
}

/// How the host took a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Handed off; the reply arrives later as an inbound event.
    Dispatched,
    /// Completed synchronously; no inbound acknowledgement will follow.
    Acknowledged,
}

/// One way of reaching the host.
pub trait Transport: fmt::Debug {
    /// Identifier of this strategy.
    fn variant(&self) -> TransportVariant;

    /// Whether `host` currently exposes what this strategy needs.
    fn can_send(&self, host: &dyn Host) -> bool;

    /// Deliver `event` to the host.
    ///
    /// # Errors
    ///
    /// Returns an error if the target method is missing, the host threw, or
    /// the request could not be encoded.
    fn send(&self, host: &dyn Host, event: &OutboundEvent) -> Result<Delivery, TransportError>;

    /// Register `sink` for inbound events.
    ///
    /// # Errors
    ///
    /// Returns an error if no subscription point accepted the sink.
    fn listen(&self, host: &dyn Host, sink: &EventSink) -> Result<(), TransportError>;

    /// Neutralize any hook installed by [`Transport::listen`].
    ///
    /// # Errors
    ///
    /// Returns an error if the host rejected the replacement.
    fn detach(&self, host: &dyn Host) -> Result<(), TransportError>;
}

/// Event name of the `WebView` subscription point.
const RECEIVE_EVENT: &str = "receiveEvent";

/// Subscription method on `WebView`.
const ON_EVENT: &str = "onEvent";

/// Subscribe through `WebView.onEvent` and install the direct
/// `WebView.receiveEvent` fallback. Either one succeeding is enough.
fn listen_on_web_view(host: &dyn Host, sink: &EventSink) -> Result<(), TransportError> {
    if !host.has_surface(Surface::WebView) {
        return Err(TransportError::ListenerUnavailable { surface: Surface::WebView });
    }

    let subscribed = host.subscribe(Surface::WebView, RECEIVE_EVENT, sink.clone());
    let hooked = host.set_receive_hook(Some(sink.clone()));

    match (subscribed, hooked) {
        (Ok(()), Ok(())) => Ok(()),
        (Err(e), Ok(())) => {
            tracing::warn!(error = %e, "onEvent registration failed, relying on receiveEvent hook");
            Ok(())
        },
        (Ok(()), Err(e)) => {
            tracing::warn!(error = %e, "receiveEvent hook not installed");
            Ok(())
        },
        (Err(e), Err(_)) => Err(e.into()),
    }
}

/// Push-style proxy: `WebViewProxy.postEvent(name, payload)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProxyPush;

impl ProxyPush {
    const POST_EVENT: &'static str = "postEvent";
}

impl Transport for ProxyPush {
    fn variant(&self) -> TransportVariant {
        TransportVariant::ProxyPush
    }

    fn can_send(&self, host: &dyn Host) -> bool {
        host.has_method(Surface::Proxy, Self::POST_EVENT)
    }

    fn send(&self, host: &dyn Host, event: &OutboundEvent) -> Result<Delivery, TransportError> {
        let payload = event.payload()?;
        host.invoke(Surface::Proxy, Self::POST_EVENT, &[Value::from(event.name()), payload])?;
        Ok(Delivery::Dispatched)
    }

    fn listen(&self, host: &dyn Host, sink: &EventSink) -> Result<(), TransportError> {
        listen_on_web_view(host, sink)
    }

    fn detach(&self, host: &dyn Host) -> Result<(), TransportError> {
        host.set_receive_hook(None)?;
        Ok(())
    }
}

/// Namespaced method: `WebApp.MiniAppChatCompletions(payload)` and
/// `WebApp.MiniAppInit(payload)`.
///
/// Available only when replies can come back too, so `WebView.onEvent` is
/// part of the capability. Method presence is re-checked per call: the
/// `WebApp` object is replaced by some hosts across page lifecycles.
#[derive(Debug, Clone, Copy, Default)]
pub struct NamespacedMethod;

impl Transport for NamespacedMethod {
    fn variant(&self) -> TransportVariant {
        TransportVariant::NamespacedMethod
    }

    fn can_send(&self, host: &dyn Host) -> bool {
        host.has_method(Surface::WebApp, OutboundEvent::CHAT_COMPLETIONS)
            && host.has_method(Surface::WebView, ON_EVENT)
    }

    fn send(&self, host: &dyn Host, event: &OutboundEvent) -> Result<Delivery, TransportError> {
        let method = event.name();
        if !host.has_method(Surface::WebApp, method) {
            return Err(TransportError::MethodMissing { method: method.to_string() });
        }

        let payload = event.payload()?;
        host.invoke(Surface::WebApp, method, &[payload])?;
        Ok(Delivery::Dispatched)
    }

    fn listen(&self, host: &dyn Host, sink: &EventSink) -> Result<(), TransportError> {
        listen_on_web_view(host, sink)
    }

    fn detach(&self, host: &dyn Host) -> Result<(), TransportError> {
        host.set_receive_hook(None)?;
        Ok(())
    }
}

/// Legacy single-turn form: `WebApp.chat_completions(prompt, role)`.
///
/// No conversation replay and no handshake event; readiness is signalled by
/// calling `ready()` and `expand()`, which completes synchronously.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleTurn;

impl SingleTurn {
    const CHAT_COMPLETIONS: &'static str = "chat_completions";
    const READINESS: [&'static str; 2] = ["ready", "expand"];
}

impl Transport for SingleTurn {
    fn variant(&self) -> TransportVariant {
        TransportVariant::SingleTurn
    }

    fn can_send(&self, host: &dyn Host) -> bool {
        host.has_method(Surface::WebApp, Self::CHAT_COMPLETIONS)
    }

    fn send(&self, host: &dyn Host, event: &OutboundEvent) -> Result<Delivery, TransportError> {
        match event {
            OutboundEvent::Init(_) => {
                for method in Self::READINESS {
                    if host.has_method(Surface::WebApp, method) {
                        host.invoke(Surface::WebApp, method, &[])?;
                    }
                }
                Ok(Delivery::Acknowledged)
            },
            OutboundEvent::ChatCompletions(_) => {
                let turn = event.latest_turn().ok_or(TransportError::EmptyConversation)?;
                if !host.has_method(Surface::WebApp, Self::CHAT_COMPLETIONS) {
                    return Err(TransportError::MethodMissing {
                        method: Self::CHAT_COMPLETIONS.to_string(),
                    });
                }

                let args = [Value::from(turn.content.as_str()), Value::from(turn.role.as_str())];
                host.invoke(Surface::WebApp, Self::CHAT_COMPLETIONS, &args)?;
                Ok(Delivery::Dispatched)
            },
        }
    }

    fn listen(&self, host: &dyn Host, sink: &EventSink) -> Result<(), TransportError> {
        host.subscribe(Surface::WebApp, LEGACY_COMPLETION_TAG, sink.tagged(LEGACY_COMPLETION_TAG))?;
        Ok(())
    }

    fn detach(&self, _host: &dyn Host) -> Result<(), TransportError> {
        // No direct hook was installed; closing the sink is enough.
        Ok(())
    }
}

/// Ranked list of transport strategies.
#[derive(Debug)]
pub struct NegotiationTable {
    strategies: Vec<Box<dyn Transport>>,
}

impl Default for NegotiationTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl NegotiationTable {
    /// All known strategies, most preferred first.
    pub fn standard() -> Self {
        Self::from_variants(&TransportVariant::RANKED)
    }

    /// Strategies for `variants`, in the given order. Duplicates are dropped.
    pub fn from_variants(variants: &[TransportVariant]) -> Self {
        let mut seen = Vec::with_capacity(variants.len());
        let mut strategies = Vec::with_capacity(variants.len());
        for &variant in variants {
            if !seen.contains(&variant) {
                seen.push(variant);
                strategies.push(variant.strategy());
            }
        }
        Self { strategies }
    }

    /// Ranked variants in this table.
    pub fn variants(&self) -> Vec<TransportVariant> {
        self.strategies.iter().map(|s| s.variant()).collect()
    }

    /// First strategy whose probe succeeds against `host`.
    pub fn negotiate(&self, host: &dyn Host) -> Option<&dyn Transport> {
        self.strategies.iter().map(|s| &**s).find(|s| s.can_send(host))
    }

    /// Strategy for `variant`, if ranked in this table.
    pub fn get(&self, variant: TransportVariant) -> Option<&dyn Transport> {
        self.strategies.iter().map(|s| &**s).find(|s| s.variant() == variant)
    }

    /// Number of ranked strategies.
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    /// Whether the table ranks no strategy.
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}
