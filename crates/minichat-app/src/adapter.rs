//! Bridge adapter state machine.
//!
//! [`Adapter`] owns the session and every decision about it, completely
//! decoupled from the host. It consumes [`AdapterEvent`] inputs and produces
//! [`AdapterAction`] instructions; the [`crate::Bridge`] executes them and
//! feeds the outcomes back as events.
//!
//! # Lifecycle
//!
//! ```text
//! Idle ──start──► Detecting ──Detected(Some)──► Ready ──Teardown──► TornDown
//!                     │
//!                     └──attempts exhausted──► Unavailable
//! ```
//!
//! Detection probes are spaced by `probe_interval` and bounded by
//! `max_probe_attempts`. Once a transport is selected it is never revisited.
//! The init handshake is scheduled `handshake_delay` after detection and is
//! dispatched at most once.

use minichat_core::{
    AdapterConfig, Environment, ErrorKind, Session, SessionError, TransportError,
    TransportVariant, next_request_id,
};
use minichat_proto::{ChatMessage, HostEvent, OutboundEvent, Role};

use crate::{AdapterAction, AdapterEvent, ChatState};

/// Detection lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Not started.
    Idle,
    /// Probing the host.
    Detecting {
        /// Probes that found nothing so far.
        attempts: u32,
    },
    /// Transport selected.
    Ready(TransportVariant),
    /// Probes exhausted without finding a transport.
    Unavailable,
    /// Torn down; every later event is ignored.
    TornDown,
}

/// Init handshake progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Handshake<I> {
    /// Waiting for detection.
    Pending,
    /// Explicit init arrived before detection; send as soon as ready.
    Requested,
    /// Deferred send after the grace delay.
    Scheduled { deadline: I },
    /// Dispatched.
    Sent,
    /// Host had already acknowledged the session when the send was due.
    Skipped,
    /// Teardown arrived before the send.
    Cancelled,
}

/// Bridge adapter state machine.
///
/// Pure state machine that processes events and produces actions. Time enters
/// only through [`AdapterEvent::Tick`]; the environment is used for
/// correlation tokens.
#[derive(Debug, Clone)]
pub struct Adapter<E: Environment> {
    env: E,
    config: AdapterConfig,
    session: Session,
    phase: Phase,
    handshake: Handshake<E::Instant>,
    next_probe_at: Option<E::Instant>,
    /// A send arrived after detection gave up; dispatch it if the re-probe
    /// finds the host.
    send_on_detect: bool,
    now: E::Instant,
}

impl<E: Environment> Adapter<E> {
    /// Create an adapter with a fresh session seeded from `config`.
    pub fn new(env: E, config: AdapterConfig) -> Self {
        let now = env.now();
        let session = Session::new(config.system_prompt.clone());
        Self {
            env,
            config,
            session,
            phase: Phase::Idle,
            handshake: Handshake::Pending,
            next_probe_at: None,
            send_on_detect: false,
            now,
        }
    }

    /// Begin capability detection.
    ///
    /// No-op unless the adapter is idle.
    pub fn start(&mut self) -> Vec<AdapterAction> {
        if self.phase != Phase::Idle {
            return Vec::new();
        }
        self.phase = Phase::Detecting { attempts: 0 };
        vec![AdapterAction::Probe, AdapterAction::Render]
    }

    /// Process an event and return actions.
    pub fn handle(&mut self, event: AdapterEvent<E::Instant>) -> Vec<AdapterAction> {
        if self.phase == Phase::TornDown {
            tracing::trace!(?event, "ignoring event after teardown");
            return Vec::new();
        }

        match event {
            AdapterEvent::Tick { now } => self.on_tick(now),
            AdapterEvent::SendMessage { text, role } => self.on_send(text, role),
            AdapterEvent::Initialize => self.on_initialize(),
            AdapterEvent::Teardown => self.on_teardown(),
            AdapterEvent::Detected(variant) => self.on_detected(variant),
            AdapterEvent::ListenFailed(err) => {
                tracing::warn!(error = %err, "inbound listeners not attached");
                self.record(&err);
                vec![AdapterAction::Render]
            },
            AdapterEvent::SendFailed(err) => {
                tracing::warn!(error = %err, "chat request not dispatched");
                self.session.finish_request();
                self.record(&err);
                vec![AdapterAction::Render]
            },
            AdapterEvent::HandshakeFailed(err) => {
                tracing::warn!(error = %err, "init handshake not dispatched");
                Vec::new()
            },
            AdapterEvent::HandshakeAcknowledged => {
                self.session.mark_initialized();
                vec![AdapterAction::Render]
            },
            AdapterEvent::Host(event) => self.on_host_event(event),
        }
    }

    /// Send a user-authored turn.
    pub fn send_message(&mut self, text: impl Into<String>, role: Role) -> Vec<AdapterAction> {
        self.handle(AdapterEvent::SendMessage { text: text.into(), role })
    }

    /// Send the init handshake immediately, cancelling the deferred send.
    pub fn initialize(&mut self) -> Vec<AdapterAction> {
        self.handle(AdapterEvent::Initialize)
    }

    /// Tear the bridge down.
    pub fn teardown(&mut self) -> Vec<AdapterAction> {
        self.handle(AdapterEvent::Teardown)
    }

    fn on_tick(&mut self, now: E::Instant) -> Vec<AdapterAction> {
        if now > self.now {
            self.now = now;
        }

        let mut actions = Vec::new();

        if matches!(self.phase, Phase::Detecting { .. })
            && self.next_probe_at.is_some_and(|at| self.now >= at)
        {
            self.next_probe_at = None;
            actions.push(AdapterAction::Probe);
        }

        if let Handshake::Scheduled { deadline } = self.handshake
            && self.now >= deadline
        {
            actions.extend(self.fire_handshake());
        }

        actions
    }

    fn on_detected(&mut self, variant: Option<TransportVariant>) -> Vec<AdapterAction> {
        let Phase::Detecting { attempts } = self.phase else {
            tracing::debug!(?variant, phase = ?self.phase, "late detection result ignored");
            return Vec::new();
        };

        if let Some(variant) = variant {
            tracing::info!(%variant, attempts, "host bridge detected");
            self.phase = Phase::Ready(variant);

            let mut actions = vec![AdapterAction::Listen];
            match self.handshake {
                Handshake::Requested => actions.extend(self.fire_handshake()),
                Handshake::Pending => {
                    let deadline = self.now + self.config.handshake_delay;
                    self.handshake = Handshake::Scheduled { deadline };
                },
                Handshake::Scheduled { .. }
                | Handshake::Sent
                | Handshake::Skipped
                | Handshake::Cancelled => {},
            }
            if std::mem::take(&mut self.send_on_detect) {
                actions.push(self.dispatch_chat());
            }
            actions.push(AdapterAction::Render);
            return actions;
        }

        let attempts = attempts + 1;
        if attempts >= self.config.max_probe_attempts {
            tracing::warn!(attempts, "host bridge not found, giving up");
            self.send_on_detect = false;
            self.phase = Phase::Unavailable;
            self.record(&TransportError::Unavailable);
            return vec![AdapterAction::Render];
        }

        self.phase = Phase::Detecting { attempts };
        self.next_probe_at = Some(self.now + self.config.probe_interval);
        Vec::new()
    }

    fn on_initialize(&mut self) -> Vec<AdapterAction> {
        match self.handshake {
            Handshake::Pending => {
                self.handshake = Handshake::Requested;
                Vec::new()
            },
            Handshake::Scheduled { .. } => self.fire_handshake(),
            Handshake::Requested | Handshake::Sent | Handshake::Skipped | Handshake::Cancelled => {
                Vec::new()
            },
        }
    }

    fn fire_handshake(&mut self) -> Vec<AdapterAction> {
        if self.session.is_initialized() {
            tracing::debug!("host already initialized, skipping handshake");
            self.handshake = Handshake::Skipped;
            return Vec::new();
        }

        let request_id = next_request_id(&self.env);
        tracing::info!(%request_id, "sending init handshake");
        self.handshake = Handshake::Sent;
        vec![AdapterAction::Dispatch(OutboundEvent::init(request_id))]
    }

    fn on_send(&mut self, text: String, role: Role) -> Vec<AdapterAction> {
        self.session.append(ChatMessage::new(role, text));

        // Detection gave up earlier; look for the host once more before failing.
        if self.phase == Phase::Unavailable {
            tracing::debug!("re-probing host for send");
            self.phase =
                Phase::Detecting { attempts: self.config.max_probe_attempts.saturating_sub(1) };
            self.send_on_detect = true;
            return vec![AdapterAction::Probe];
        }

        if !matches!(self.phase, Phase::Ready(_)) {
            tracing::warn!(phase = ?self.phase, "send without a host transport");
            self.record(&TransportError::Unavailable);
            return vec![AdapterAction::Render];
        }

        vec![self.dispatch_chat(), AdapterAction::Render]
    }

    /// Start a request carrying the whole conversation.
    fn dispatch_chat(&mut self) -> AdapterAction {
        let request_id = next_request_id(&self.env);
        tracing::debug!(%request_id, turns = self.session.messages().len(), "dispatching chat request");
        self.session.begin_request(request_id.clone());

        let event = OutboundEvent::chat_completions(request_id, self.session.messages().to_vec());
        AdapterAction::Dispatch(event)
    }

    fn on_host_event(&mut self, event: HostEvent) -> Vec<AdapterAction> {
        match event {
            HostEvent::CompletionResult(result) => {
                self.session.finish_request();
                if let Some(error) = result.error {
                    self.session.record_error(SessionError::new(ErrorKind::HostReportedFailure, error));
                } else if let Some(response) = result.response {
                    self.session.append(ChatMessage::assistant(response));
                } else {
                    tracing::warn!("completion result carried no response");
                }
            },
            HostEvent::CompletionFailed(failure) => {
                self.session.finish_request();
                self.session
                    .record_error(SessionError::new(ErrorKind::HostReportedFailure, failure.message()));
            },
            HostEvent::InitResult => self.session.mark_initialized(),
            HostEvent::ConfigUpdate(update) => {
                if let Some(insets) = update.safe_area_insets {
                    self.session.set_insets(insets);
                }
                self.session.mark_initialized();
            },
            HostEvent::Unrecognized { tag } => {
                tracing::debug!(%tag, "ignoring unrecognized host event");
                return Vec::new();
            },
        }
        vec![AdapterAction::Render]
    }

    fn on_teardown(&mut self) -> Vec<AdapterAction> {
        tracing::info!("tearing down host bridge");
        self.phase = Phase::TornDown;
        self.next_probe_at = None;
        self.send_on_detect = false;
        if matches!(self.handshake, Handshake::Requested | Handshake::Scheduled { .. }) {
            self.handshake = Handshake::Cancelled;
        }
        vec![AdapterAction::Detach, AdapterAction::Render, AdapterAction::Stop]
    }

    fn record(&mut self, err: &TransportError) {
        self.session.record_error(SessionError::new(err.kind(), err.to_string()));
    }

    /// Snapshot for the view.
    pub fn state(&self) -> ChatState {
        ChatState::from(&self.session)
    }

    /// Underlying session.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Detection lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Selected transport, once detected.
    pub fn transport(&self) -> Option<TransportVariant> {
        match self.phase {
            Phase::Ready(variant) => Some(variant),
            Phase::Idle | Phase::Detecting { .. } | Phase::Unavailable | Phase::TornDown => None,
        }
    }

    /// Whether the init handshake has been dispatched.
    pub fn handshake_sent(&self) -> bool {
        self.handshake == Handshake::Sent
    }

    /// Active configuration.
    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use std::{
        ops::{Add, Sub},
        sync::{
            Arc,
            atomic::{AtomicU64, Ordering},
        },
        time::Duration,
    };

    use minichat_proto::SafeAreaInsets;
    use serde_json::json;

    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
    struct Millis(u64);

    impl Sub for Millis {
        type Output = Duration;
        fn sub(self, rhs: Self) -> Duration {
            Duration::from_millis(self.0.saturating_sub(rhs.0))
        }
    }

    impl Add<Duration> for Millis {
        type Output = Millis;
        fn add(self, rhs: Duration) -> Millis {
            Millis(self.0 + rhs.as_millis() as u64)
        }
    }

    #[derive(Debug, Clone, Default)]
    struct TestEnv {
        rng: Arc<AtomicU64>,
    }

    impl Environment for TestEnv {
        type Instant = Millis;

        fn now(&self) -> Millis {
            Millis(0)
        }

        fn wall_clock_millis(&self) -> u64 {
            1_000
        }

        fn random_bytes(&self, buffer: &mut [u8]) {
            let n = self.rng.fetch_add(1, Ordering::Relaxed).to_be_bytes();
            for (i, byte) in buffer.iter_mut().enumerate() {
                *byte = n[i % 8];
            }
        }
    }

    fn adapter() -> Adapter<TestEnv> {
        let config = AdapterConfig { system_prompt: "seed".into(), ..AdapterConfig::default() };
        Adapter::new(TestEnv::default(), config)
    }

    fn ready(variant: TransportVariant) -> Adapter<TestEnv> {
        let mut adapter = adapter();
        let _ = adapter.start();
        let _ = adapter.handle(AdapterEvent::Detected(Some(variant)));
        adapter
    }

    fn host(envelope: serde_json::Value) -> AdapterEvent<Millis> {
        AdapterEvent::Host(HostEvent::decode(&envelope).unwrap())
    }

    fn dispatched_inits(actions: &[AdapterAction]) -> usize {
        actions
            .iter()
            .filter(|a| matches!(a, AdapterAction::Dispatch(OutboundEvent::Init(_))))
            .count()
    }

    #[test]
    fn start_probes_immediately() {
        let mut adapter = adapter();
        assert_eq!(adapter.start(), vec![AdapterAction::Probe, AdapterAction::Render]);
        assert!(adapter.start().is_empty());
    }

    #[test]
    fn failed_probe_retries_after_interval() {
        let mut adapter = adapter();
        let _ = adapter.start();

        assert!(adapter.handle(AdapterEvent::Detected(None)).is_empty());
        assert!(adapter.handle(AdapterEvent::Tick { now: Millis(50) }).is_empty());
        assert_eq!(adapter.handle(AdapterEvent::Tick { now: Millis(100) }), vec![
            AdapterAction::Probe
        ]);
    }

    #[test]
    fn probe_exhaustion_reports_capability_missing() {
        let config = AdapterConfig { max_probe_attempts: 2, ..AdapterConfig::default() };
        let mut adapter = Adapter::new(TestEnv::default(), config);
        let _ = adapter.start();

        let _ = adapter.handle(AdapterEvent::Detected(None));
        let _ = adapter.handle(AdapterEvent::Tick { now: Millis(100) });
        let actions = adapter.handle(AdapterEvent::Detected(None));

        assert_eq!(actions, vec![AdapterAction::Render]);
        assert_eq!(adapter.phase(), Phase::Unavailable);
        let error = adapter.session().last_error().unwrap();
        assert_eq!(error.kind, ErrorKind::CapabilityMissing);
        assert_eq!(error.message, "host bridge is not available");
    }

    fn exhausted() -> Adapter<TestEnv> {
        let config = AdapterConfig { max_probe_attempts: 1, ..AdapterConfig::default() };
        let mut adapter = Adapter::new(TestEnv::default(), config);
        let _ = adapter.start();
        let _ = adapter.handle(AdapterEvent::Detected(None));
        assert_eq!(adapter.phase(), Phase::Unavailable);
        adapter
    }

    #[test]
    fn send_after_exhaustion_probes_again() {
        let mut adapter = exhausted();

        assert_eq!(adapter.send_message("Hi", Role::User), vec![AdapterAction::Probe]);
        let actions = adapter.handle(AdapterEvent::Detected(Some(TransportVariant::ProxyPush)));

        assert_eq!(actions.first(), Some(&AdapterAction::Listen));
        let chat = actions.iter().find_map(|a| match a {
            AdapterAction::Dispatch(event @ OutboundEvent::ChatCompletions(_)) => Some(event),
            _ => None,
        });
        assert_eq!(chat.and_then(OutboundEvent::latest_turn), Some(&ChatMessage::user("Hi")));
        assert_eq!(adapter.phase(), Phase::Ready(TransportVariant::ProxyPush));
        assert!(adapter.state().is_loading);
    }

    #[test]
    fn failed_reprobe_reports_capability_missing_again() {
        let mut adapter = exhausted();

        let _ = adapter.send_message("Hi", Role::User);
        let actions = adapter.handle(AdapterEvent::Detected(None));

        assert_eq!(actions, vec![AdapterAction::Render]);
        assert_eq!(adapter.phase(), Phase::Unavailable);
        let state = adapter.state();
        assert!(!state.is_loading);
        assert_eq!(state.conversation_history, vec![ChatMessage::user("Hi")]);
        assert_eq!(state.error.as_deref(), Some("host bridge is not available"));
        assert!(adapter.handle(AdapterEvent::Tick { now: Millis(10_000) }).is_empty());
    }

    #[test]
    fn detection_listens_and_schedules_handshake() {
        let mut adapter = adapter();
        let _ = adapter.start();

        let actions = adapter.handle(AdapterEvent::Detected(Some(TransportVariant::ProxyPush)));
        assert_eq!(actions, vec![AdapterAction::Listen, AdapterAction::Render]);
        assert_eq!(adapter.transport(), Some(TransportVariant::ProxyPush));

        assert!(adapter.handle(AdapterEvent::Tick { now: Millis(299) }).is_empty());
        let actions = adapter.handle(AdapterEvent::Tick { now: Millis(300) });
        assert_eq!(dispatched_inits(&actions), 1);
        assert!(adapter.handshake_sent());
    }

    #[test]
    fn handshake_skipped_when_config_arrives_first() {
        let mut adapter = ready(TransportVariant::NamespacedMethod);

        let _ = adapter.handle(host(json!({"type": "MiniAppDidUpdateConfig", "data": {}})));
        let actions = adapter.handle(AdapterEvent::Tick { now: Millis(1_000) });

        assert_eq!(dispatched_inits(&actions), 0);
        assert!(!adapter.handshake_sent());
        assert!(adapter.state().is_initialized);
    }

    #[test]
    fn explicit_init_and_timer_send_once() {
        let mut adapter = ready(TransportVariant::ProxyPush);

        let mut inits = dispatched_inits(&adapter.initialize());
        inits += dispatched_inits(&adapter.handle(AdapterEvent::Tick { now: Millis(300) }));
        inits += dispatched_inits(&adapter.initialize());

        assert_eq!(inits, 1);
    }

    #[test]
    fn init_requested_before_detection_fires_on_detection() {
        let mut adapter = adapter();
        let _ = adapter.start();

        assert!(adapter.initialize().is_empty());
        let actions = adapter.handle(AdapterEvent::Detected(Some(TransportVariant::SingleTurn)));

        assert_eq!(actions.first(), Some(&AdapterAction::Listen));
        assert_eq!(dispatched_inits(&actions), 1);
        assert_eq!(dispatched_inits(&adapter.handle(AdapterEvent::Tick { now: Millis(900) })), 0);
    }

    #[test]
    fn send_without_transport_keeps_turn_and_reports_error() {
        let mut adapter = adapter();
        let _ = adapter.start();

        let actions = adapter.send_message("Hi", Role::User);

        assert_eq!(actions, vec![AdapterAction::Render]);
        let state = adapter.state();
        assert_eq!(state.conversation_history, vec![ChatMessage::user("Hi")]);
        assert!(!state.is_loading);
        assert_eq!(state.error.as_deref(), Some("host bridge is not available"));
    }

    #[test]
    fn send_replays_full_conversation() {
        let mut adapter = ready(TransportVariant::ProxyPush);

        let actions = adapter.send_message("Hi", Role::User);

        let Some(AdapterAction::Dispatch(event)) = actions.first() else {
            panic!("expected dispatch, got {actions:?}");
        };
        assert_eq!(event.name(), OutboundEvent::CHAT_COMPLETIONS);
        let payload = event.payload().unwrap();
        assert_eq!(
            payload["messages"],
            json!([{"role": "system", "content": "seed"}, {"role": "user", "content": "Hi"}])
        );
        assert!(adapter.state().is_loading);
        assert_eq!(adapter.session().pending_request_id(), Some(event.request_id()));
    }

    #[test]
    fn round_trip_appends_assistant_reply() {
        let mut adapter = ready(TransportVariant::ProxyPush);
        let _ = adapter.send_message("Hi", Role::User);

        let _ = adapter.handle(host(json!({
            "type": "MiniAppChatCompletionsResult",
            "data": {"response": "Hello!"}
        })));

        let state = adapter.state();
        assert!(!state.is_loading);
        assert_eq!(state.conversation_history, vec![
            ChatMessage::user("Hi"),
            ChatMessage::assistant("Hello!")
        ]);
    }

    #[test]
    fn result_with_error_appends_nothing() {
        let mut adapter = ready(TransportVariant::ProxyPush);
        let _ = adapter.send_message("Hi", Role::User);

        let _ = adapter.handle(host(json!({
            "type": "MiniAppChatCompletionsResult",
            "data": {"error": "quota exceeded"}
        })));

        let state = adapter.state();
        assert!(!state.is_loading);
        assert_eq!(state.conversation_history.len(), 1);
        assert_eq!(state.error.as_deref(), Some("quota exceeded"));
    }

    #[test]
    fn failure_event_formats_description_and_reason() {
        let mut adapter = ready(TransportVariant::ProxyPush);
        let _ = adapter.send_message("Hi", Role::User);

        let _ = adapter.handle(host(json!({
            "type": "MiniAppChatCompletionsFailed",
            "data": {"error_description": "Model offline", "error_reason": "UNAVAILABLE"}
        })));

        let state = adapter.state();
        assert!(!state.is_loading);
        assert_eq!(state.error.as_deref(), Some("Error: Model offline (UNAVAILABLE)"));
    }

    #[test]
    fn config_update_coerces_insets() {
        let mut adapter = ready(TransportVariant::ProxyPush);

        let _ = adapter.handle(host(json!({
            "type": "MiniAppDidUpdateConfig",
            "data": {"safe_area_insets": {"top": "20", "left": "0", "right": "0", "bottom": "34"}}
        })));

        let state = adapter.state();
        assert_eq!(state.safe_area_insets, SafeAreaInsets::new(20.0, 0.0, 0.0, 34.0));
        assert!(state.is_initialized);
    }

    #[test]
    fn send_failure_clears_loading() {
        let mut adapter = ready(TransportVariant::NamespacedMethod);
        let _ = adapter.send_message("Hi", Role::User);

        let _ = adapter.handle(AdapterEvent::SendFailed(TransportError::Threw("boom".into())));

        let state = adapter.state();
        assert!(!state.is_loading);
        assert_eq!(state.error.as_deref(), Some("Error sending message: boom"));
        assert_eq!(state.conversation_history, vec![ChatMessage::user("Hi")]);
    }

    #[test]
    fn teardown_freezes_state() {
        let mut adapter = ready(TransportVariant::ProxyPush);

        assert_eq!(adapter.teardown(), vec![
            AdapterAction::Detach,
            AdapterAction::Render,
            AdapterAction::Stop
        ]);

        let before = adapter.state();
        assert!(adapter.handle(host(json!({"type": "MiniAppInitResult"}))).is_empty());
        assert!(adapter.send_message("late", Role::User).is_empty());
        assert!(adapter.handle(AdapterEvent::Tick { now: Millis(10_000) }).is_empty());
        assert_eq!(adapter.state(), before);
        assert!(!adapter.handshake_sent());
    }

    #[test]
    fn unrecognized_events_do_not_render() {
        let mut adapter = ready(TransportVariant::ProxyPush);
        assert!(adapter.handle(host(json!({"type": "SomethingNew", "data": 1}))).is_empty());
    }
}
