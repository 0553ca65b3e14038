//! Generic runtime for adapter orchestration.
//!
//! The Runtime drives the event loop, coordinating between:
//! - [`Adapter`]: Session state machine
//! - [`Bridge`]: Host bridge
//! - [`Driver`]: Platform-specific view I/O
//!
//! Every cycle polls the driver once, drains host events in delivery order,
//! then advances the adapter's clock. Snapshots are published through a
//! [`watch`] channel whenever the projected state changes.

use std::collections::VecDeque;

use minichat_core::{AdapterConfig, ConfigError, Environment, Host};
use tokio::sync::watch;

use crate::{Adapter, AdapterAction, AdapterEvent, Bridge, ChatState, Driver};

/// Generic runtime that orchestrates Adapter, Bridge, and Driver.
///
/// # Type Parameters
///
/// - `D`: Platform-specific view driver
/// - `E`: Environment for time and correlation tokens
/// - `H`: Host capability object
pub struct Runtime<D, E, H>
where
    D: Driver<Instant = E::Instant>,
    E: Environment,
    H: Host,
{
    driver: D,
    adapter: Adapter<E>,
    bridge: Bridge<H>,
    snapshots: watch::Sender<ChatState>,
}

impl<D, E, H> Runtime<D, E, H>
where
    D: Driver<Instant = E::Instant>,
    E: Environment,
    H: Host,
{
    /// Create a runtime over `host`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `config` fails validation.
    pub fn new(driver: D, env: E, host: H, config: AdapterConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let bridge = Bridge::new(host, &config);
        let adapter = Adapter::new(env, config);
        let (snapshots, _) = watch::channel(adapter.state());
        Ok(Self { driver, adapter, bridge, snapshots })
    }

    /// Subscribe to state snapshots.
    pub fn subscribe(&self) -> watch::Receiver<ChatState> {
        self.snapshots.subscribe()
    }

    /// Run the event loop until teardown.
    ///
    /// If the driver fails, the adapter is torn down before returning so the
    /// host hook is neutralized either way.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver encounters an I/O error.
    pub async fn run(mut self) -> Result<(), D::Error> {
        let result = self.drive().await;
        if let Err(e) = &result {
            tracing::error!(error = %e, "driver failed, tearing down");
            self.handle(AdapterEvent::Teardown);
        }

        self.driver.stop();
        result
    }

    async fn drive(&mut self) -> Result<(), D::Error> {
        if self.start() {
            return Ok(());
        }
        while !self.step().await? {}
        Ok(())
    }

    /// Begin capability detection.
    ///
    /// Returns `true` if the loop should stop.
    pub fn start(&mut self) -> bool {
        let actions = self.adapter.start();
        self.process_actions(actions)
    }

    /// Process one cycle of the event loop.
    ///
    /// Returns `true` if the loop should stop.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver cannot poll for events.
    pub async fn step(&mut self) -> Result<bool, D::Error> {
        if let Some(event) = self.driver.poll_event().await?
            && self.handle(event)
        {
            return Ok(true);
        }

        for event in self.bridge.drain_inbound() {
            if self.handle(event) {
                return Ok(true);
            }
        }

        let now = self.driver.now();
        Ok(self.handle(AdapterEvent::Tick { now }))
    }

    /// Feed one event to the adapter and execute the resulting actions.
    ///
    /// Returns `true` if the loop should stop.
    pub fn handle(&mut self, event: AdapterEvent<E::Instant>) -> bool {
        let actions = self.adapter.handle(event);
        self.process_actions(actions)
    }

    /// Execute actions, feeding bridge outcomes back into the adapter.
    fn process_actions(&mut self, actions: Vec<AdapterAction>) -> bool {
        let mut pending = VecDeque::from(actions);
        let mut stop = false;

        while let Some(action) = pending.pop_front() {
            match action {
                AdapterAction::Render => self.render(),
                AdapterAction::Stop => stop = true,

                // Host operations go through the bridge
                AdapterAction::Probe
                | AdapterAction::Listen
                | AdapterAction::Dispatch(_)
                | AdapterAction::Detach => {
                    for event in self.bridge.process_action(action) {
                        pending.extend(self.adapter.handle(event));
                    }
                },
            }
        }

        stop
    }

    /// Publish the current snapshot and hand it to the view.
    ///
    /// A failed render affects only the view; the session keeps running and
    /// the next change renders again.
    fn render(&mut self) {
        let state = self.adapter.state();
        self.snapshots.send_if_modified(|current| {
            if *current == state {
                return false;
            }
            current.clone_from(&state);
            true
        });
        if let Err(e) = self.driver.render(&state) {
            tracing::warn!(error = %e, "render failed");
        }
    }

    /// The adapter state machine.
    pub fn adapter(&self) -> &Adapter<E> {
        &self.adapter
    }

    /// The host bridge.
    pub fn bridge(&self) -> &Bridge<H> {
        &self.bridge
    }

    /// The view driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Mutable access to the view driver.
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }
}
