//! Terminal driver for the TUI.
//!
//! Implements the [`Driver`] trait for terminal I/O using crossterm for
//! keyboard events and ratatui for rendering. Host replies come from the
//! in-process [`LoopbackHost`], pumped once per poll.

use std::{
    io::{self, Stdout, stdout},
    time::{Duration, Instant},
};

use crossterm::{
    ExecutableCommand,
    event::{Event, EventStream, KeyCode, KeyEventKind},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use minichat_app::{AdapterEvent, ChatState, Driver};
use ratatui::{Terminal, backend::CrosstermBackend};
use thiserror::Error;

use crate::{InputState, KeyInput, KeyOutcome, LoopbackHost, ui};

/// How long a poll waits for a key before letting the runtime tick.
const POLL_TIMEOUT: Duration = Duration::from_millis(100);

/// Terminal driver errors.
#[derive(Debug, Error)]
pub enum TerminalError {
    /// I/O error from terminal operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Terminal input stream ended.
    #[error("terminal input closed")]
    InputClosed,
}

/// Terminal driver implementing the [`Driver`] trait.
///
/// Handles terminal I/O (crossterm) and rendering (ratatui). Owns the input
/// state for text editing and the last rendered snapshot, so the input line
/// can be redrawn without waiting for the adapter.
pub struct TerminalDriver {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    event_stream: EventStream,
    input_state: InputState,
    last_state: ChatState,
    host: LoopbackHost,
    host_label: String,
}

impl TerminalDriver {
    /// Take over the terminal. The host is pumped on every poll.
    pub fn new(host: LoopbackHost) -> Result<Self, TerminalError> {
        enable_raw_mode()?;
        stdout().execute(EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout());
        let terminal = Terminal::new(backend)?;
        let host_label = format!("loopback ({})", host.variant());

        Ok(Self {
            terminal,
            event_stream: EventStream::new(),
            input_state: InputState::new(),
            last_state: ChatState::default(),
            host,
            host_label,
        })
    }

    /// Convert crossterm `KeyCode` to `KeyInput`.
    fn convert_key(code: KeyCode) -> Option<KeyInput> {
        match code {
            KeyCode::Char(c) => Some(KeyInput::Char(c)),
            KeyCode::Enter => Some(KeyInput::Enter),
            KeyCode::Backspace => Some(KeyInput::Backspace),
            KeyCode::Delete => Some(KeyInput::Delete),
            KeyCode::Tab => Some(KeyInput::Tab),
            KeyCode::Esc => Some(KeyInput::Esc),
            KeyCode::Left => Some(KeyInput::Left),
            KeyCode::Right => Some(KeyInput::Right),
            KeyCode::Home => Some(KeyInput::Home),
            KeyCode::End => Some(KeyInput::End),
            _ => None,
        }
    }

    fn handle_key(
        &mut self,
        key: KeyInput,
    ) -> Result<Option<AdapterEvent<Instant>>, TerminalError> {
        match self.input_state.handle_key(key) {
            KeyOutcome::Ignored => Ok(None),
            KeyOutcome::Redraw => {
                self.draw()?;
                Ok(None)
            },
            KeyOutcome::Submit { text, role } => {
                self.draw()?;
                Ok(Some(AdapterEvent::SendMessage { text, role }))
            },
            KeyOutcome::Quit => Ok(Some(AdapterEvent::Teardown)),
        }
    }

    fn draw(&mut self) -> Result<(), TerminalError> {
        self.terminal.draw(|frame| {
            ui::render(frame, &self.last_state, &self.input_state, &self.host_label);
        })?;
        Ok(())
    }
}

impl Driver for TerminalDriver {
    type Error = TerminalError;
    type Instant = Instant;

    async fn poll_event(&mut self) -> Result<Option<AdapterEvent<Instant>>, Self::Error> {
        self.host.pump(self.now());

        tokio::select! {
            biased;

            // Terminal events
            maybe_event = self.event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key_event))) if key_event.kind == KeyEventKind::Press => {
                        match Self::convert_key(key_event.code) {
                            Some(key) => self.handle_key(key),
                            None => Ok(None),
                        }
                    },
                    Some(Ok(Event::Resize(_, _))) => {
                        self.draw()?;
                        Ok(None)
                    },
                    Some(Err(e)) => Err(TerminalError::Io(e)),
                    None => Err(TerminalError::InputClosed),
                    _ => Ok(None),
                }
            }

            // Tick timeout
            () = tokio::time::sleep(POLL_TIMEOUT) => Ok(None),
        }
    }

    #[allow(clippy::disallowed_methods)]
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn render(&mut self, state: &ChatState) -> Result<(), Self::Error> {
        self.last_state.clone_from(state);
        self.draw()
    }

    fn stop(&mut self) {
        tracing::info!(pending = self.host.pending(), "terminal driver stopping");
        let _ = disable_raw_mode();
        let _ = stdout().execute(LeaveAlternateScreen);
    }
}

impl Drop for TerminalDriver {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = stdout().execute(LeaveAlternateScreen);
    }
}
