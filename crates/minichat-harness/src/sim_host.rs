//! Scriptable host double.
//!
//! `SimHost` plays the host application: tests choose which namespace
//! objects and methods exist, make calls throw, inspect what the bridge
//! invoked, and push inbound events through whatever sinks the bridge
//! registered. Clones share state, so a test keeps a handle while the
//! runtime owns another.

use std::{cell::RefCell, collections::HashSet, rc::Rc};

use minichat_core::{EventSink, Host, HostError, Surface, TransportVariant};
use minichat_proto::{LEGACY_COMPLETION_TAG, OutboundEvent};
use serde_json::Value;

const ON_EVENT: &str = "onEvent";
const RECEIVE_EVENT: &str = "receiveEvent";

/// One recorded host call.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    /// Namespace object called.
    pub surface: Surface,
    /// Method name.
    pub method: String,
    /// Arguments as passed.
    pub args: Vec<Value>,
}

impl Invocation {
    /// Outbound event name this call carried, if any.
    ///
    /// Proxy calls carry it as the first argument; namespaced calls use it as
    /// the method name.
    pub fn event_name(&self) -> Option<&str> {
        match self.surface {
            Surface::Proxy => self.args.first().and_then(Value::as_str),
            Surface::WebApp | Surface::WebView => Some(self.method.as_str()),
        }
    }
}

#[derive(Default)]
struct HostState {
    methods: HashSet<(Surface, String)>,
    hidden: bool,
    throwing: HashSet<String>,
    invocations: Vec<Invocation>,
    subscriptions: Vec<(Surface, String, EventSink)>,
    hook: Option<Option<EventSink>>,
}

impl HostState {
    fn has_method(&self, surface: Surface, method: &str) -> bool {
        !self.hidden && self.methods.contains(&(surface, method.to_string()))
    }

    fn has_surface(&self, surface: Surface) -> bool {
        !self.hidden && self.methods.iter().any(|(s, _)| *s == surface)
    }
}

/// Scriptable in-memory host.
#[derive(Clone, Default)]
pub struct SimHost {
    state: Rc<RefCell<HostState>>,
}

impl SimHost {
    /// Host exposing nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Host exposing the push-style proxy and the `WebView` listeners.
    pub fn proxy() -> Self {
        Self::empty()
            .with_method(Surface::Proxy, "postEvent")
            .with_method(Surface::WebView, ON_EVENT)
            .with_method(Surface::WebView, RECEIVE_EVENT)
    }

    /// Host exposing namespaced `WebApp` request methods.
    pub fn namespaced() -> Self {
        Self::empty()
            .with_method(Surface::WebApp, OutboundEvent::CHAT_COMPLETIONS)
            .with_method(Surface::WebApp, OutboundEvent::INIT)
            .with_method(Surface::WebView, ON_EVENT)
            .with_method(Surface::WebView, RECEIVE_EVENT)
    }

    /// Legacy host exposing single-turn `chat_completions`.
    pub fn single_turn() -> Self {
        Self::empty()
            .with_method(Surface::WebApp, "chat_completions")
            .with_method(Surface::WebApp, "ready")
            .with_method(Surface::WebApp, "expand")
            .with_method(Surface::WebApp, ON_EVENT)
    }

    /// Host shaped for `variant`.
    pub fn for_variant(variant: TransportVariant) -> Self {
        match variant {
            TransportVariant::ProxyPush => Self::proxy(),
            TransportVariant::NamespacedMethod => Self::namespaced(),
            TransportVariant::SingleTurn => Self::single_turn(),
        }
    }

    /// Expose `surface.method`.
    #[must_use]
    pub fn with_method(self, surface: Surface, method: &str) -> Self {
        self.state.borrow_mut().methods.insert((surface, method.to_string()));
        self
    }

    /// Remove `surface.method`.
    pub fn remove_method(&self, surface: Surface, method: &str) {
        self.state.borrow_mut().methods.remove(&(surface, method.to_string()));
    }

    /// Hide every namespace object until [`SimHost::reveal`].
    #[must_use]
    pub fn hidden(self) -> Self {
        self.state.borrow_mut().hidden = true;
        self
    }

    /// Make hidden namespace objects visible.
    pub fn reveal(&self) {
        self.state.borrow_mut().hidden = false;
    }

    /// Make every call to `method` throw.
    pub fn throw_on(&self, method: &str) {
        self.state.borrow_mut().throwing.insert(method.to_string());
    }

    /// Every call made so far, in order.
    pub fn invocations(&self) -> Vec<Invocation> {
        self.state.borrow().invocations.clone()
    }

    /// Number of calls that carried `event_name`.
    pub fn dispatched(&self, event_name: &str) -> usize {
        self.state
            .borrow()
            .invocations
            .iter()
            .filter(|i| i.event_name() == Some(event_name))
            .count()
    }

    /// Number of init handshakes the host has seen, across all variants.
    pub fn handshakes(&self) -> usize {
        self.dispatched(OutboundEvent::INIT) + self.dispatched("ready")
    }

    /// Whether a live `receiveEvent` hook is installed.
    pub fn hook_live(&self) -> bool {
        matches!(&self.state.borrow().hook, Some(Some(sink)) if !sink.is_closed())
    }

    /// Whether the hook was replaced with a no-op.
    pub fn hook_neutralized(&self) -> bool {
        matches!(self.state.borrow().hook, Some(None))
    }

    /// Deliver a `{type, data}` envelope the way the host does: through the
    /// `onEvent("receiveEvent")` subscription, or the direct hook if nothing
    /// subscribed.
    ///
    /// Returns the number of sinks that accepted it.
    pub fn deliver(&self, envelope: Value) -> usize {
        let accepted = self.deliver_to(Surface::WebView, RECEIVE_EVENT, &envelope);
        if accepted > 0 { accepted } else { usize::from(self.deliver_via_hook(envelope)) }
    }

    /// Deliver through `WebView.receiveEvent` only.
    pub fn deliver_via_hook(&self, envelope: Value) -> bool {
        let sink = match &self.state.borrow().hook {
            Some(Some(sink)) => sink.clone(),
            _ => return false,
        };
        sink.deliver(envelope)
    }

    /// Deliver legacy `chat_completions_response` data.
    pub fn deliver_legacy(&self, data: Value) -> usize {
        self.deliver_to(Surface::WebApp, LEGACY_COMPLETION_TAG, &data)
    }

    fn deliver_to(&self, surface: Surface, event: &str, payload: &Value) -> usize {
        let sinks: Vec<EventSink> = self
            .state
            .borrow()
            .subscriptions
            .iter()
            .filter(|(s, e, _)| *s == surface && e == event)
            .map(|(_, _, sink)| sink.clone())
            .collect();

        sinks.iter().filter(|sink| sink.deliver(payload.clone())).count()
    }
}

impl Host for SimHost {
    fn has_surface(&self, surface: Surface) -> bool {
        self.state.borrow().has_surface(surface)
    }

    fn has_method(&self, surface: Surface, method: &str) -> bool {
        self.state.borrow().has_method(surface, method)
    }

    fn invoke(&self, surface: Surface, method: &str, args: &[Value]) -> Result<(), HostError> {
        let mut state = self.state.borrow_mut();
        if !state.has_surface(surface) {
            return Err(HostError::SurfaceMissing { surface });
        }
        if !state.has_method(surface, method) {
            return Err(HostError::MethodMissing { surface, method: method.to_string() });
        }

        state.invocations.push(Invocation {
            surface,
            method: method.to_string(),
            args: args.to_vec(),
        });

        if state.throwing.contains(method) {
            return Err(HostError::Threw { message: format!("{method} rejected the call") });
        }
        Ok(())
    }

    fn subscribe(&self, surface: Surface, event: &str, sink: EventSink) -> Result<(), HostError> {
        let mut state = self.state.borrow_mut();
        if !state.has_surface(surface) {
            return Err(HostError::SurfaceMissing { surface });
        }
        if !state.has_method(surface, ON_EVENT) {
            return Err(HostError::MethodMissing { surface, method: ON_EVENT.to_string() });
        }
        state.subscriptions.push((surface, event.to_string(), sink));
        Ok(())
    }

    fn set_receive_hook(&self, sink: Option<EventSink>) -> Result<(), HostError> {
        let mut state = self.state.borrow_mut();
        if !state.has_surface(Surface::WebView) {
            return Err(HostError::SurfaceMissing { surface: Surface::WebView });
        }
        state.hook = Some(sink);
        Ok(())
    }
}
