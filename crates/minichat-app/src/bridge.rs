//! Adapter-to-host translation layer.
//!
//! The [`Bridge`] wraps a [`Host`] and executes the [`crate::AdapterAction`]s
//! that touch it.
//!
//! # Responsibilities
//!
//! - Runs capability negotiation and remembers the selected strategy.
//! - Dispatches outbound requests and converts failures back into
//!   [`crate::AdapterEvent`]s.
//! - Owns the inbound channel: decodes host envelopes in delivery order and
//!   closes the channel on detach so nothing reaches the adapter afterwards.

use minichat_core::{
    AdapterConfig, Delivery, EventSink, Host, NegotiationTable, Transport, TransportError,
    TransportVariant,
};
use minichat_proto::{HostEvent, OutboundEvent};
use serde_json::Value;
use tokio::sync::mpsc;

use crate::{AdapterAction, AdapterEvent};

/// Bridge between the Adapter and the host.
///
/// Generic over [`Host`] so the same code drives the real web view, the
/// terminal loopback, and simulation doubles.
pub struct Bridge<H: Host> {
    host: H,
    table: NegotiationTable,
    selected: Option<TransportVariant>,
    sink: EventSink,
    inbound: mpsc::UnboundedReceiver<Value>,
}

impl<H: Host> Bridge<H> {
    /// Create a bridge negotiating over the variants enabled in `config`.
    pub fn new(host: H, config: &AdapterConfig) -> Self {
        let (sink, inbound) = EventSink::channel();
        Self {
            host,
            table: NegotiationTable::from_variants(&config.variants),
            selected: None,
            sink,
            inbound,
        }
    }

    /// The wrapped host.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Strategy selected by the last successful probe.
    pub fn selected(&self) -> Option<TransportVariant> {
        self.selected
    }

    /// Execute an action and return the resulting events.
    ///
    /// `Render` and `Stop` are not host actions and produce nothing.
    pub fn process_action<I>(&mut self, action: AdapterAction) -> Vec<AdapterEvent<I>> {
        match action {
            AdapterAction::Probe => {
                let variant = self.table.negotiate(&self.host).map(|t| t.variant());
                tracing::debug!(?variant, "probed host");
                if variant.is_some() {
                    self.selected = variant;
                }
                vec![AdapterEvent::Detected(variant)]
            },
            AdapterAction::Listen => match self.transport().map(|t| t.listen(&self.host, &self.sink)) {
                Some(Ok(())) => Vec::new(),
                Some(Err(err)) => vec![AdapterEvent::ListenFailed(err)],
                None => vec![AdapterEvent::ListenFailed(TransportError::Unavailable)],
            },
            AdapterAction::Dispatch(event) => self.dispatch(&event),
            AdapterAction::Detach => {
                if let Some(Err(err)) = self.transport().map(|t| t.detach(&self.host)) {
                    tracing::warn!(error = %err, "failed to neutralize host hook");
                }
                self.inbound.close();
                Vec::new()
            },
            AdapterAction::Render | AdapterAction::Stop => Vec::new(),
        }
    }

    /// Decode every inbound envelope delivered so far, in delivery order.
    ///
    /// Envelopes that are not `{type, data}` objects are dropped with a
    /// warning; unknown tags are passed through for the adapter to ignore.
    pub fn drain_inbound<I>(&mut self) -> Vec<AdapterEvent<I>> {
        let mut events = Vec::new();
        while let Ok(raw) = self.inbound.try_recv() {
            events.extend(Self::decode(&raw));
        }
        events
    }

    fn decode<I>(raw: &Value) -> Option<AdapterEvent<I>> {
        match HostEvent::decode(raw) {
            Ok(event) => {
                tracing::debug!(tag = event.tag(), "host event");
                Some(AdapterEvent::Host(event))
            },
            Err(err) => {
                tracing::warn!(error = %err, "dropping malformed host envelope");
                None
            },
        }
    }

    fn dispatch<I>(&self, event: &OutboundEvent) -> Vec<AdapterEvent<I>> {
        let is_init = matches!(event, OutboundEvent::Init(_));
        let result = self
            .transport()
            .ok_or(TransportError::Unavailable)
            .and_then(|t| t.send(&self.host, event));

        match result {
            Ok(Delivery::Dispatched) => {
                tracing::debug!(event = event.name(), request_id = %event.request_id(), "dispatched");
                Vec::new()
            },
            Ok(Delivery::Acknowledged) if is_init => vec![AdapterEvent::HandshakeAcknowledged],
            Ok(Delivery::Acknowledged) => Vec::new(),
            Err(err) if is_init => vec![AdapterEvent::HandshakeFailed(err)],
            Err(err) => vec![AdapterEvent::SendFailed(err)],
        }
    }

    fn transport(&self) -> Option<&dyn Transport> {
        self.selected.and_then(|variant| self.table.get(variant))
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use minichat_core::{HostError, Surface};
    use minichat_proto::{ChatMessage, RequestId};
    use serde_json::json;

    use super::*;

    /// Proxy-only host that records calls and keeps the subscribed sink.
    #[derive(Clone, Default)]
    struct ProxyHost {
        calls: Rc<RefCell<Vec<(String, Vec<Value>)>>>,
        sink: Rc<RefCell<Option<EventSink>>>,
        throws: bool,
    }

    impl Host for ProxyHost {
        fn has_surface(&self, _surface: Surface) -> bool {
            true
        }

        fn has_method(&self, surface: Surface, method: &str) -> bool {
            surface == Surface::Proxy && method == "postEvent"
        }

        fn invoke(&self, _surface: Surface, method: &str, args: &[Value]) -> Result<(), HostError> {
            if self.throws {
                return Err(HostError::Threw { message: "TypeError".into() });
            }
            self.calls.borrow_mut().push((method.into(), args.to_vec()));
            Ok(())
        }

        fn subscribe(&self, _surface: Surface, _event: &str, sink: EventSink) -> Result<(), HostError> {
            *self.sink.borrow_mut() = Some(sink);
            Ok(())
        }

        fn set_receive_hook(&self, _sink: Option<EventSink>) -> Result<(), HostError> {
            Ok(())
        }
    }

    type Event = AdapterEvent<u64>;

    fn bridge(host: ProxyHost) -> Bridge<ProxyHost> {
        Bridge::new(host, &AdapterConfig::default())
    }

    #[test]
    fn probe_selects_proxy() {
        let mut bridge = bridge(ProxyHost::default());

        let events: Vec<Event> = bridge.process_action(AdapterAction::Probe);

        assert_eq!(events, vec![AdapterEvent::Detected(Some(TransportVariant::ProxyPush))]);
        assert_eq!(bridge.selected(), Some(TransportVariant::ProxyPush));
    }

    #[test]
    fn dispatch_before_detection_is_unavailable() {
        let mut bridge = bridge(ProxyHost::default());
        let event = OutboundEvent::chat_completions(RequestId::new("r"), vec![ChatMessage::user("Hi")]);

        let events: Vec<Event> = bridge.process_action(AdapterAction::Dispatch(event));

        assert_eq!(events, vec![AdapterEvent::SendFailed(TransportError::Unavailable)]);
    }

    #[test]
    fn thrown_init_becomes_handshake_failure() {
        let mut bridge = bridge(ProxyHost { throws: true, ..ProxyHost::default() });
        let _: Vec<Event> = bridge.process_action(AdapterAction::Probe);

        let events: Vec<Event> =
            bridge.process_action(AdapterAction::Dispatch(OutboundEvent::init(RequestId::new("r"))));

        assert_eq!(events, vec![AdapterEvent::HandshakeFailed(TransportError::Threw("TypeError".into()))]);
    }

    #[test]
    fn inbound_is_decoded_in_order_and_malformed_dropped() {
        let host = ProxyHost::default();
        let mut bridge = bridge(host.clone());
        let _: Vec<Event> = bridge.process_action(AdapterAction::Probe);
        let _: Vec<Event> = bridge.process_action(AdapterAction::Listen);

        let sink = host.sink.borrow().clone().unwrap();
        sink.deliver(json!({"type": "MiniAppInitResult"}));
        sink.deliver(json!("garbage"));
        sink.deliver(json!({"type": "MiniAppChatCompletionsResult", "data": {"response": "Hello!"}}));

        let events: Vec<Event> = bridge.drain_inbound();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], AdapterEvent::Host(HostEvent::InitResult));
        assert!(matches!(&events[1], AdapterEvent::Host(HostEvent::CompletionResult(r)) if r.response.as_deref() == Some("Hello!")));
    }

    #[test]
    fn detach_closes_inbound() {
        let host = ProxyHost::default();
        let mut bridge = bridge(host.clone());
        let _: Vec<Event> = bridge.process_action(AdapterAction::Probe);
        let _: Vec<Event> = bridge.process_action(AdapterAction::Listen);
        let sink = host.sink.borrow().clone().unwrap();

        let _: Vec<Event> = bridge.process_action(AdapterAction::Detach);

        assert!(!sink.deliver(json!({"type": "MiniAppInitResult"})));
        assert!(bridge.drain_inbound::<u64>().is_empty());
    }
}
