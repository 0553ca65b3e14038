//! Fuzz target for the Adapter state machine
//!
//! # Strategy
//!
//! - Interleave view commands, bridge outcomes and host envelopes in any order
//! - Host envelopes carry arbitrary loose payloads (insets of any JSON type)
//! - Time only moves forward, in arbitrary steps
//!
//! # Invariants
//!
//! - At most one init handshake is dispatched per session
//! - Nothing is dispatched once the bridge is torn down
//! - Conversation history never shrinks
//! - Safe-area insets are never negative

#![no_main]

use std::time::Duration;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use minichat_app::{Adapter, AdapterAction, AdapterEvent, Phase};
use minichat_core::{AdapterConfig, Environment, TransportError, TransportVariant};
use minichat_harness::SimEnv;
use minichat_proto::{HostEvent, OutboundEvent, Role};
use serde_json::{Value, json};

#[derive(Debug, Clone, Arbitrary)]
enum Op {
    Send { text: String, system: bool },
    Initialize,
    Teardown,
    Detected(Option<u8>),
    SendFailed,
    HandshakeFailed,
    HandshakeAcknowledged,
    Envelope(Envelope),
    Advance(u16),
}

#[derive(Debug, Clone, Arbitrary)]
enum Envelope {
    Result { response: Option<String>, error: Option<String> },
    Legacy(Option<String>),
    Failed { description: Option<String>, reason: Option<String> },
    Init,
    Config { top: i32, left: f32, text: bool },
    Unknown(String),
}

impl Envelope {
    fn to_json(&self) -> Value {
        match self {
            Self::Result { response, error } => json!({
                "type": "MiniAppChatCompletionsResult",
                "data": { "response": response, "error": error },
            }),
            Self::Legacy(response) => json!({
                "type": "chat_completions_response",
                "data": { "response": response },
            }),
            Self::Failed { description, reason } => json!({
                "type": "MiniAppChatCompletionsFailed",
                "data": { "error_description": description, "error_reason": reason },
            }),
            Self::Init => json!({ "type": "MiniAppInitResult", "data": {} }),
            Self::Config { top, left, text } => {
                let bottom = if *text { json!("12") } else { json!(null) };
                json!({
                    "type": "MiniAppDidUpdateConfig",
                    "data": { "safeAreaInsets": { "top": top, "left": left, "bottom": bottom } },
                })
            },
            Self::Unknown(tag) => json!({ "type": tag, "data": null }),
        }
    }
}

fuzz_target!(|ops: Vec<Op>| {
    let env = SimEnv::with_seed(7);
    let mut adapter = Adapter::new(env.clone(), AdapterConfig::default());
    adapter.start();
    let mut handshakes = 0usize;
    let mut history = 0usize;

    for op in ops {
        let torn_down = adapter.phase() == Phase::TornDown;

        let event = match op {
            Op::Send { text, system } => {
                let role = if system { Role::System } else { Role::User };
                AdapterEvent::SendMessage { text, role }
            },
            Op::Initialize => AdapterEvent::Initialize,
            Op::Teardown => AdapterEvent::Teardown,
            Op::Detected(choice) => {
                let ranked = TransportVariant::RANKED;
                AdapterEvent::Detected(choice.map(|n| ranked[usize::from(n) % ranked.len()]))
            },
            Op::SendFailed => AdapterEvent::SendFailed(TransportError::Unavailable),
            Op::HandshakeFailed => AdapterEvent::HandshakeFailed(TransportError::Unavailable),
            Op::HandshakeAcknowledged => AdapterEvent::HandshakeAcknowledged,
            Op::Envelope(envelope) => match HostEvent::decode(&envelope.to_json()) {
                Ok(event) => AdapterEvent::Host(event),
                Err(_) => continue,
            },
            Op::Advance(millis) => {
                env.advance(Duration::from_millis(u64::from(millis)));
                AdapterEvent::Tick { now: env.now() }
            },
        };

        let actions = adapter.handle(event);

        for action in &actions {
            if let AdapterAction::Dispatch(outbound) = action {
                assert!(!torn_down, "dispatched {} after teardown", outbound.name());
                if matches!(outbound, OutboundEvent::Init(_)) {
                    handshakes += 1;
                }
            }
        }
        assert!(handshakes <= 1, "init handshake sent {handshakes} times");

        let state = adapter.state();
        assert!(state.conversation_history.len() >= history, "history shrank");
        history = state.conversation_history.len();

        let insets = state.safe_area_insets;
        assert!(insets.top >= 0.0 && insets.left >= 0.0 && insets.right >= 0.0 && insets.bottom >= 0.0);
    }

});
