//! Simulation driver implementing the Driver trait.
//!
//! `SimDriver` provides the same interface as the terminal and web drivers
//! but for deterministic testing. It implements [`Driver`] so the same
//! [`minichat_app::Runtime`] orchestration code runs in both production and
//! simulation.

use std::{cell::RefCell, collections::VecDeque, rc::Rc};

use minichat_app::{AdapterEvent, ChatState, Driver};
use minichat_core::Environment;
use minichat_proto::Role;
use thiserror::Error;

use crate::{SimEnv, sim_env::SimInstant};

/// Error type for simulation driver.
#[derive(Error, Debug, Clone)]
#[error("SimDriverError: {0}")]
pub struct SimDriverError(pub String);

/// Shared state for event injection.
#[derive(Default)]
struct SharedState {
    pending_events: VecDeque<AdapterEvent<SimInstant>>,
    renders: Vec<ChatState>,
    fail_render: bool,
    fail_poll: bool,
    stopped: bool,
}

/// Simulation driver for deterministic testing.
///
/// Clones share state, so a test can keep a handle for injecting view
/// events and inspecting renders while the runtime owns the driver.
#[derive(Clone)]
pub struct SimDriver {
    env: SimEnv,
    state: Rc<RefCell<SharedState>>,
}

impl SimDriver {
    /// Create a driver reading time from `env`.
    pub fn new(env: SimEnv) -> Self {
        Self { env, state: Rc::new(RefCell::new(SharedState::default())) }
    }

    /// Queue a view event.
    pub fn inject_event(&self, event: AdapterEvent<SimInstant>) {
        self.state.borrow_mut().pending_events.push_back(event);
    }

    /// Queue a user send.
    pub fn inject_send(&self, text: &str) {
        self.inject_event(AdapterEvent::SendMessage { text: text.to_string(), role: Role::User });
    }

    /// Whether queued events remain.
    pub fn has_pending(&self) -> bool {
        !self.state.borrow().pending_events.is_empty()
    }

    /// Every snapshot rendered so far.
    pub fn renders(&self) -> Vec<ChatState> {
        self.state.borrow().renders.clone()
    }

    /// Most recent render.
    pub fn last_render(&self) -> Option<ChatState> {
        self.state.borrow().renders.last().cloned()
    }

    /// Make subsequent renders fail.
    pub fn fail_renders(&self) {
        self.state.borrow_mut().fail_render = true;
    }

    /// Make subsequent polls fail, as a closed input would.
    pub fn fail_polls(&self) {
        self.state.borrow_mut().fail_poll = true;
    }

    /// Whether the runtime released the driver.
    pub fn is_stopped(&self) -> bool {
        self.state.borrow().stopped
    }
}

impl Driver for SimDriver {
    type Error = SimDriverError;
    type Instant = SimInstant;

    async fn poll_event(&mut self) -> Result<Option<AdapterEvent<SimInstant>>, Self::Error> {
        let mut shared = self.state.borrow_mut();
        if shared.fail_poll {
            return Err(SimDriverError("input closed".into()));
        }
        Ok(shared.pending_events.pop_front())
    }

    fn now(&self) -> SimInstant {
        self.env.now()
    }

    fn render(&mut self, state: &ChatState) -> Result<(), Self::Error> {
        let mut shared = self.state.borrow_mut();
        if shared.fail_render {
            return Err(SimDriverError("render failed".into()));
        }
        shared.renders.push(state.clone());
        Ok(())
    }

    fn stop(&mut self) {
        self.state.borrow_mut().stopped = true;
    }
}
