//! In-process host for running the terminal front end without a real host.
//!
//! [`LoopbackHost`] exposes the namespace shape of one transport variant and
//! answers requests itself: the handshake is acknowledged and every completion
//! request gets a canned assistant reply (or a simulated failure) after a
//! configurable latency. Replies queue up until the driver calls
//! [`LoopbackHost::pump`], so they arrive on the event loop like real host
//! callbacks.

use std::{
    cell::RefCell,
    collections::VecDeque,
    rc::Rc,
    time::{Duration, Instant},
};

use minichat_core::{EventSink, Host, HostError, Surface, TransportVariant};
use minichat_proto::{ChatMessage, LEGACY_COMPLETION_TAG, OutboundEvent, Role, tags};
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde_json::{Value, json};

const ON_EVENT: &str = "onEvent";
const RECEIVE_EVENT: &str = "receiveEvent";
const POST_EVENT: &str = "postEvent";
const CHAT_COMPLETIONS: &str = "chat_completions";

/// Settings for the loopback host.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopbackConfig {
    /// Namespace shape to expose.
    pub variant: TransportVariant,
    /// Delay before a reply is delivered.
    pub latency: Duration,
    /// Probability in `[0, 1]` that a completion fails.
    pub fail_rate: f64,
}

impl Default for LoopbackConfig {
    fn default() -> Self {
        Self {
            variant: TransportVariant::ProxyPush,
            latency: Duration::from_millis(600),
            fail_rate: 0.0,
        }
    }
}

/// Reply waiting to be delivered.
#[derive(Debug)]
enum Reply {
    /// `{type, data}` envelope for `receiveEvent`.
    Envelope(Value),
    /// Bare JSON string for the legacy `chat_completions_response` hook.
    Legacy(String),
}

struct LoopbackState {
    config: LoopbackConfig,
    rng: StdRng,
    /// Time of the most recent pump. Replies are scheduled relative to it.
    clock: Option<Instant>,
    pending: VecDeque<(Option<Instant>, Reply)>,
    subscriptions: Vec<(Surface, String, EventSink)>,
    hook: Option<EventSink>,
}

impl LoopbackState {
    fn methods(&self) -> &'static [(Surface, &'static str)] {
        match self.config.variant {
            TransportVariant::ProxyPush => &[
                (Surface::Proxy, POST_EVENT),
                (Surface::WebView, ON_EVENT),
                (Surface::WebView, RECEIVE_EVENT),
            ],
            TransportVariant::NamespacedMethod => &[
                (Surface::WebApp, OutboundEvent::INIT),
                (Surface::WebApp, OutboundEvent::CHAT_COMPLETIONS),
                (Surface::WebView, ON_EVENT),
                (Surface::WebView, RECEIVE_EVENT),
            ],
            TransportVariant::SingleTurn => &[
                (Surface::WebApp, CHAT_COMPLETIONS),
                (Surface::WebApp, "ready"),
                (Surface::WebApp, "expand"),
                (Surface::WebApp, ON_EVENT),
            ],
        }
    }

    fn has_method(&self, surface: Surface, method: &str) -> bool {
        self.methods().iter().any(|&(s, m)| s == surface && m == method)
    }

    fn schedule(&mut self, reply: Reply) {
        let due = self.clock.map(|now| now + self.config.latency);
        self.pending.push_back((due, reply));
    }

    fn on_event(&mut self, name: &str, payload: &Value) {
        match name {
            OutboundEvent::INIT => {
                tracing::debug!("loopback acknowledging handshake");
                self.schedule(Reply::Envelope(json!({ "type": tags::INIT_RESULT, "data": {} })));
            },
            OutboundEvent::CHAT_COMPLETIONS => {
                let messages: Vec<ChatMessage> = payload
                    .get("messages")
                    .cloned()
                    .and_then(|m| serde_json::from_value(m).ok())
                    .unwrap_or_default();
                let envelope = if self.should_fail() {
                    json!({
                        "type": tags::COMPLETION_FAILED,
                        "data": {
                            "error_description": "loopback host dropped the request",
                            "error_reason": "simulated",
                        }
                    })
                } else {
                    json!({
                        "type": tags::COMPLETION_RESULT,
                        "data": { "response": compose_reply(&messages) }
                    })
                };
                self.schedule(Reply::Envelope(envelope));
            },
            other => tracing::warn!(event = other, "loopback ignoring unknown event"),
        }
    }

    fn on_single_turn(&mut self, args: &[Value]) {
        let content = args.first().and_then(Value::as_str).unwrap_or_default();
        let role = args.get(1).and_then(Value::as_str).and_then(|r| r.parse().ok());
        let turn = ChatMessage::new(role.unwrap_or(Role::User), content);

        let data = if self.should_fail() {
            json!({ "response": Value::Null })
        } else {
            json!({ "response": compose_reply(&[turn]) })
        };
        self.schedule(Reply::Legacy(data.to_string()));
    }

    fn should_fail(&mut self) -> bool {
        let rate = self.config.fail_rate;
        rate > 0.0 && self.rng.random_bool(rate.min(1.0))
    }

    fn sinks_for(&self, surface: Surface, event: &str) -> Vec<EventSink> {
        self.subscriptions
            .iter()
            .filter(|(s, e, _)| *s == surface && e == event)
            .map(|(_, _, sink)| sink.clone())
            .collect()
    }
}

/// Text the loopback host answers with.
fn compose_reply(messages: &[ChatMessage]) -> String {
    let context = messages.len();
    match messages.iter().rev().find(|m| m.role == Role::User) {
        Some(turn) => format!("You said \"{}\" ({context} turns in context)", turn.content),
        None => format!("Noted ({context} turns in context)"),
    }
}

/// In-process host answering its own requests.
///
/// Clones share state; the driver keeps one to pump replies while the
/// runtime's bridge owns another.
#[derive(Clone)]
pub struct LoopbackHost {
    state: Rc<RefCell<LoopbackState>>,
}

impl LoopbackHost {
    /// Create a host with an OS-seeded RNG.
    pub fn new(config: LoopbackConfig) -> Self {
        Self::with_rng(config, StdRng::from_os_rng())
    }

    /// Create a host whose failure draws are reproducible.
    pub fn with_seed(config: LoopbackConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: LoopbackConfig, rng: StdRng) -> Self {
        let state = LoopbackState {
            config,
            rng,
            clock: None,
            pending: VecDeque::new(),
            subscriptions: Vec::new(),
            hook: None,
        };
        Self { state: Rc::new(RefCell::new(state)) }
    }

    /// Namespace shape this host exposes.
    pub fn variant(&self) -> TransportVariant {
        self.state.borrow().config.variant
    }

    /// Replies not yet delivered.
    pub fn pending(&self) -> usize {
        self.state.borrow().pending.len()
    }

    /// Deliver every reply due at `now`.
    ///
    /// Returns the number of replies delivered.
    pub fn pump(&self, now: Instant) -> usize {
        let due = {
            let mut state = self.state.borrow_mut();
            state.clock = Some(now);
            let latency = state.config.latency;

            for (at, _) in &mut state.pending {
                at.get_or_insert(now + latency);
            }

            let mut due = Vec::new();
            while let Some((Some(at), _)) = state.pending.front()
                && *at <= now
            {
                if let Some((_, reply)) = state.pending.pop_front() {
                    due.push(reply);
                }
            }
            due
        };

        // Sinks are invoked with the state released.
        due.into_iter().map(|reply| self.deliver(reply)).filter(|&accepted| accepted).count()
    }

    fn deliver(&self, reply: Reply) -> bool {
        let (sinks, payload) = {
            let state = self.state.borrow();
            match reply {
                Reply::Envelope(envelope) => {
                    let mut sinks = state.sinks_for(Surface::WebView, RECEIVE_EVENT);
                    if sinks.is_empty() {
                        sinks.extend(state.hook.clone());
                    }
                    (sinks, envelope)
                },
                Reply::Legacy(data) => {
                    (state.sinks_for(Surface::WebApp, LEGACY_COMPLETION_TAG), Value::String(data))
                },
            }
        };

        let accepted = sinks.iter().filter(|sink| sink.deliver(payload.clone())).count();
        if accepted == 0 {
            tracing::debug!("loopback reply had no live listener");
        }
        accepted > 0
    }
}

impl Host for LoopbackHost {
    fn has_surface(&self, surface: Surface) -> bool {
        self.state.borrow().methods().iter().any(|&(s, _)| s == surface)
    }

    fn has_method(&self, surface: Surface, method: &str) -> bool {
        self.state.borrow().has_method(surface, method)
    }

    fn invoke(&self, surface: Surface, method: &str, args: &[Value]) -> Result<(), HostError> {
        let mut state = self.state.borrow_mut();
        if !state.has_method(surface, method) {
            return Err(HostError::MethodMissing { surface, method: method.to_string() });
        }

        match (surface, method) {
            (Surface::Proxy, POST_EVENT) => {
                let name = args.first().and_then(Value::as_str).unwrap_or_default();
                state.on_event(name, args.get(1).unwrap_or(&Value::Null));
            },
            (Surface::WebApp, CHAT_COMPLETIONS) => state.on_single_turn(args),
            (Surface::WebApp, "ready" | "expand") => {},
            (_, name) => state.on_event(name, args.first().unwrap_or(&Value::Null)),
        }
        Ok(())
    }

    fn subscribe(&self, surface: Surface, event: &str, sink: EventSink) -> Result<(), HostError> {
        let mut state = self.state.borrow_mut();
        if !state.has_method(surface, ON_EVENT) {
            return Err(HostError::MethodMissing { surface, method: ON_EVENT.to_string() });
        }
        state.subscriptions.push((surface, event.to_string(), sink));
        Ok(())
    }

    fn set_receive_hook(&self, sink: Option<EventSink>) -> Result<(), HostError> {
        let mut state = self.state.borrow_mut();
        if !state.has_method(Surface::WebView, RECEIVE_EVENT) {
            return Err(HostError::SurfaceMissing { surface: Surface::WebView });
        }
        state.hook = sink;
        Ok(())
    }
}
