//! Shared simulation fixture for integration tests.

#![allow(dead_code)]

use std::time::Duration;

use minichat_app::{AdapterEvent, ChatState, Runtime};
use minichat_core::{AdapterConfig, TransportVariant};
use minichat_harness::{InvariantRegistry, SessionSnapshot, SimDriver, SimEnv, SimHost};
use serde_json::{Value, json};

/// Runtime wired to simulated environment, host and driver.
pub type SimRuntime = Runtime<SimDriver, SimEnv, SimHost>;

/// One simulated session with invariants checked after every step.
pub struct Sim {
    pub env: SimEnv,
    pub host: SimHost,
    pub driver: SimDriver,
    pub runtime: SimRuntime,
    snapshot: SessionSnapshot,
    invariants: InvariantRegistry,
}

impl Sim {
    pub fn new(host: SimHost) -> Self {
        Self::with_config(host, AdapterConfig::default())
    }

    pub fn with_config(host: SimHost, config: AdapterConfig) -> Self {
        let env = SimEnv::with_seed(42);
        let driver = SimDriver::new(env.clone());
        let snapshot = SessionSnapshot::new(config.system_prompt.clone());
        let runtime = Runtime::new(driver.clone(), env.clone(), host.clone(), config).unwrap();

        Self { env, host, driver, runtime, snapshot, invariants: InvariantRegistry::standard() }
    }

    /// Begin detection.
    pub fn start(&mut self) {
        assert!(!self.runtime.start());
        self.check("after start");
    }

    /// Run one cycle. Returns `true` if the runtime asked to stop.
    pub async fn step(&mut self) -> bool {
        let stop = self.runtime.step().await.unwrap();
        self.check("after step");
        stop
    }

    /// Advance the virtual clock, then run one cycle.
    pub async fn advance(&mut self, millis: u64) -> bool {
        self.env.advance(Duration::from_millis(millis));
        self.step().await
    }

    /// Queue a user send and run one cycle.
    pub async fn send(&mut self, text: &str) {
        self.driver.inject_send(text);
        self.step().await;
    }

    /// Queue a view event and run one cycle.
    pub async fn inject(&mut self, event: AdapterEvent<minichat_harness::SimInstant>) -> bool {
        self.driver.inject_event(event);
        self.step().await
    }

    /// Deliver an assistant reply through whichever channel the host uses.
    pub fn deliver_reply(&self, text: &str) -> usize {
        match self.runtime.adapter().transport() {
            Some(TransportVariant::SingleTurn) => {
                self.host.deliver_legacy(Value::from(json!({"response": text}).to_string()))
            },
            _ => self.host.deliver(json!({
                "type": "MiniAppChatCompletionsResult",
                "data": {"response": text}
            })),
        }
    }

    pub fn state(&self) -> ChatState {
        self.runtime.adapter().state()
    }

    fn check(&mut self, context: &str) {
        self.snapshot.observe(self.runtime.adapter(), self.host.handshakes());
        self.invariants.assert_all(&self.snapshot, context);
    }
}
