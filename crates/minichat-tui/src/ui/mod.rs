//! UI rendering
//!
//! Rendering functions that convert a [`ChatState`] snapshot and the local
//! input state into terminal output using ratatui widgets. All functions are
//! pure (no I/O), taking state and drawing into the frame.

mod chat;
mod input;
mod status;

use minichat_app::ChatState;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
};

use crate::InputState;

/// Render the entire UI.
///
/// `host_label` names the host the session is talking to, for the status bar.
pub fn render(frame: &mut Frame, state: &ChatState, input: &InputState, host_label: &str) {
    const CHAT_AREA_MIN_HEIGHT: u16 = 3;
    const INPUT_HEIGHT: u16 = 3;
    const STATUS_HEIGHT: u16 = 1;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(CHAT_AREA_MIN_HEIGHT),
            Constraint::Length(INPUT_HEIGHT),
            Constraint::Length(STATUS_HEIGHT),
        ])
        .split(frame.area());

    let [chat_area, input_area, status_area] = chunks.as_ref() else {
        return;
    };

    chat::render(frame, state, *chat_area);
    input::render(frame, input, *input_area);
    status::render(frame, state, host_label, *status_area);
}

#[cfg(test)]
mod tests {
    use minichat_proto::{ChatMessage, SafeAreaInsets};
    use ratatui::{Terminal, backend::TestBackend};

    use super::*;
    use crate::KeyInput;

    fn draw(state: &ChatState, input: &InputState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 12)).unwrap();
        terminal.draw(|frame| render(frame, state, input, "loopback (proxy-push)")).unwrap();

        let buffer = terminal.backend().buffer();
        let area = buffer.area;
        (0..area.height)
            .map(|y| (0..area.width).map(|x| buffer[(x, y)].symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn conversation_and_typing_indicator_are_shown() {
        let state = ChatState {
            conversation_history: vec![ChatMessage::user("Hi"), ChatMessage::assistant("Hello!")],
            is_loading: true,
            ..ChatState::default()
        };

        let screen = draw(&state, &InputState::new());

        assert!(screen.contains("<you> Hi"));
        assert!(screen.contains("<assistant> Hello!"));
        assert!(screen.contains("assistant is typing..."));
        assert!(screen.contains("Connecting..."));
    }

    #[test]
    fn empty_conversation_shows_hint() {
        let screen = draw(&ChatState::default(), &InputState::new());
        assert!(screen.contains("Type a message and press Enter"));
        assert!(!screen.contains("typing"));
    }

    #[test]
    fn status_bar_shows_error_and_insets() {
        let state = ChatState {
            error: Some("host bridge is not available".into()),
            is_initialized: true,
            safe_area_insets: SafeAreaInsets::new(20.0, 0.0, 0.0, 34.0),
            ..ChatState::default()
        };

        let screen = draw(&state, &InputState::new());

        assert!(screen.contains("Ready"));
        assert!(screen.contains("Insets: 20/0/0/34"));
        assert!(screen.contains("host bridge is not available"));
    }

    #[test]
    fn input_line_shows_role_and_buffer() {
        let mut input = InputState::new();
        input.handle_key(KeyInput::Tab);
        for c in "be terse".chars() {
            input.handle_key(KeyInput::Char(c));
        }

        let screen = draw(&ChatState::default(), &input);

        assert!(screen.contains("[system] > be terse"));
    }
}
