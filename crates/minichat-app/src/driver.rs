//! Driver trait for abstracting I/O operations.
//!
//! The [`Driver`] trait decouples the runtime from the platform's input and
//! display. Each front end implements it, while the generic
//! [`crate::Runtime`] handles all orchestration.

use std::{future::Future, ops::Sub, time::Duration};

use crate::{AdapterEvent, ChatState};

/// Abstracts view I/O for the runtime.
///
/// Implementations provide platform-specific I/O while the generic
/// [`Runtime`](crate::Runtime) handles orchestration logic. This ensures the
/// same orchestration code runs in the web view, the terminal and simulation.
///
/// # Implementations
///
/// - **Web**: Commands from the exported JS class, a JS callback for renders
/// - **TUI**: crossterm key events, ratatui rendering
/// - **Simulation**: Scripted events and captured snapshots
///
/// Host code is single-threaded, so drivers and their futures need not be
/// `Send`.
pub trait Driver {
    /// Platform-specific error type.
    type Error: std::error::Error + 'static;

    /// Time instant type. Enables virtual time in simulation.
    type Instant: Copy + Ord + Sub<Output = Duration>;

    /// Poll for the next view event.
    ///
    /// Must resolve in bounded time; returns `None` if no event is ready so
    /// the runtime can advance the clock and drain host events.
    fn poll_event(
        &mut self,
    ) -> impl Future<Output = Result<Option<AdapterEvent<Self::Instant>>, Self::Error>>;

    /// Current time instant.
    fn now(&self) -> Self::Instant;

    /// Render a state snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    fn render(&mut self, state: &ChatState) -> Result<(), Self::Error>;

    /// Release platform resources.
    fn stop(&mut self);
}
