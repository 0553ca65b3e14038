//! Standard invariant checks.
//!
//! These invariants capture behavioral properties that must always hold.
//! They verify WHAT must be true, not specific test scenarios.

use minichat_proto::{ChatMessage, Role};

use super::{Invariant, InvariantResult, SessionSnapshot, Violation};

/// The system seed stays at the head of the conversation.
///
/// `messages[0]` is the prompt the session was created with, and no other
/// snapshot ever shows it moved or removed.
pub struct SystemSeedPreserved;

impl Invariant for SystemSeedPreserved {
    fn name(&self) -> &'static str {
        "system_seed_preserved"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        let seed = ChatMessage::system(state.system_prompt.clone());
        match state.messages.first() {
            Some(first) if *first == seed => Ok(()),
            other => Err(Violation {
                invariant: self.name(),
                message: format!("expected seed {seed:?} at head, found {other:?}"),
            }),
        }
    }
}

/// The conversation only grows.
///
/// Every earlier observation is a prefix of every later one.
pub struct HistoryAppendOnly;

impl Invariant for HistoryAppendOnly {
    fn name(&self) -> &'static str {
        "history_append_only"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        let observations = state.message_history.iter().chain(std::iter::once(&state.messages));
        for (earlier, later) in observations.clone().zip(observations.skip(1)) {
            if !later.starts_with(earlier) {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "conversation rewritten: {} turns → {} turns without prefix match",
                        earlier.len(),
                        later.len()
                    ),
                });
            }
        }
        Ok(())
    }
}

/// The view never sees a system turn, and sees every other turn in order.
pub struct HistoryHidesSystem;

impl Invariant for HistoryHidesSystem {
    fn name(&self) -> &'static str {
        "history_hides_system"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        let expected: Vec<_> =
            state.messages.iter().filter(|m| m.role != Role::System).cloned().collect();
        if state.view.conversation_history == expected {
            Ok(())
        } else {
            Err(Violation {
                invariant: self.name(),
                message: format!(
                    "view shows {} turns, session has {} non-system turns",
                    state.view.conversation_history.len(),
                    expected.len()
                ),
            })
        }
    }
}

/// The init handshake reaches the host at most once.
pub struct HandshakeAtMostOnce;

impl Invariant for HandshakeAtMostOnce {
    fn name(&self) -> &'static str {
        "handshake_at_most_once"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        if state.handshakes <= 1 {
            Ok(())
        } else {
            Err(Violation {
                invariant: self.name(),
                message: format!("host received {} init handshakes", state.handshakes),
            })
        }
    }
}

/// Without a detected transport, no assistant turn can exist and nothing is
/// loading.
pub struct NoReplyWithoutTransport;

impl Invariant for NoReplyWithoutTransport {
    fn name(&self) -> &'static str {
        "no_reply_without_transport"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        if state.ever_detected {
            return Ok(());
        }
        if state.view.is_loading {
            return Err(Violation {
                invariant: self.name(),
                message: "loading without a transport".into(),
            });
        }
        match state.messages.iter().position(|m| m.role == Role::Assistant) {
            Some(index) => Err(Violation {
                invariant: self.name(),
                message: format!("assistant turn at {index} without a transport"),
            }),
            None => Ok(()),
        }
    }
}
