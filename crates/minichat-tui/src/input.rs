//! Input state and key handling for the TUI.
//!
//! This module owns the only state the view keeps for itself: the text being
//! typed, the cursor, and the role the next message will be sent with.
//! Everything else is read from the adapter's [`minichat_app::ChatState`].

use minichat_proto::Role;

/// Key input events from the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    /// Character input.
    Char(char),
    /// Enter/Return key.
    Enter,
    /// Backspace key.
    Backspace,
    /// Delete key.
    Delete,
    /// Tab key.
    Tab,
    /// Escape key.
    Esc,
    /// Left arrow.
    Left,
    /// Right arrow.
    Right,
    /// Home key.
    Home,
    /// End key.
    End,
}

/// What a key press asks of the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Nothing visible changed.
    Ignored,
    /// Only the input line changed; redraw it.
    Redraw,
    /// Send `text` with `role`.
    Submit {
        /// Message text as typed, never blank.
        text: String,
        /// Role chosen with Tab.
        role: Role,
    },
    /// Tear the session down.
    Quit,
}

/// Input state for the TUI.
///
/// The cursor counts characters, not bytes, so multi-byte input edits
/// cleanly.
#[derive(Debug)]
pub struct InputState {
    buffer: String,
    cursor: usize,
    role: Role,
}

impl Default for InputState {
    fn default() -> Self {
        Self { buffer: String::new(), cursor: 0, role: Role::User }
    }
}

impl InputState {
    /// Create a new empty input state sending as `user`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current text in the input buffer.
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Cursor position in characters.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Role of the next message.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Handle a key input event.
    pub fn handle_key(&mut self, key: KeyInput) -> KeyOutcome {
        match key {
            KeyInput::Char(c) => {
                let at = self.byte_offset(self.cursor);
                self.buffer.insert(at, c);
                self.cursor = self.cursor.saturating_add(1);
                KeyOutcome::Redraw
            },
            KeyInput::Backspace => {
                if self.cursor == 0 {
                    return KeyOutcome::Ignored;
                }
                self.cursor = self.cursor.saturating_sub(1);
                let at = self.byte_offset(self.cursor);
                self.buffer.remove(at);
                KeyOutcome::Redraw
            },
            KeyInput::Delete => {
                if self.cursor >= self.char_len() {
                    return KeyOutcome::Ignored;
                }
                let at = self.byte_offset(self.cursor);
                self.buffer.remove(at);
                KeyOutcome::Redraw
            },
            KeyInput::Left => {
                self.cursor = self.cursor.saturating_sub(1);
                KeyOutcome::Redraw
            },
            KeyInput::Right => {
                self.cursor = self.cursor.saturating_add(1).min(self.char_len());
                KeyOutcome::Redraw
            },
            KeyInput::Home => {
                self.cursor = 0;
                KeyOutcome::Redraw
            },
            KeyInput::End => {
                self.cursor = self.char_len();
                KeyOutcome::Redraw
            },
            KeyInput::Tab => {
                self.role = match self.role {
                    Role::User => Role::System,
                    Role::System | Role::Assistant => Role::User,
                };
                KeyOutcome::Redraw
            },
            KeyInput::Enter => self.submit(),
            KeyInput::Esc => KeyOutcome::Quit,
        }
    }

    /// Take the buffer for sending. Blank input is dropped and left in place.
    fn submit(&mut self) -> KeyOutcome {
        if self.buffer.trim().is_empty() {
            return KeyOutcome::Ignored;
        }

        let text = std::mem::take(&mut self.buffer);
        self.cursor = 0;
        KeyOutcome::Submit { text, role: self.role }
    }

    fn char_len(&self) -> usize {
        self.buffer.chars().count()
    }

    fn byte_offset(&self, chars: usize) -> usize {
        self.buffer.char_indices().nth(chars).map_or(self.buffer.len(), |(i, _)| i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_text(input: &mut InputState, text: &str) {
        for c in text.chars() {
            input.handle_key(KeyInput::Char(c));
        }
    }

    #[test]
    fn char_input_adds_to_buffer() {
        let mut input = InputState::new();

        type_text(&mut input, "hi");

        assert_eq!(input.buffer(), "hi");
        assert_eq!(input.cursor(), 2);
    }

    #[test]
    fn backspace_removes_char() {
        let mut input = InputState::new();

        type_text(&mut input, "ab");
        input.handle_key(KeyInput::Backspace);

        assert_eq!(input.buffer(), "a");
        assert_eq!(input.cursor(), 1);
    }

    #[test]
    fn enter_submits_text_as_typed_and_clears() {
        let mut input = InputState::new();
        type_text(&mut input, "  test ");

        let outcome = input.handle_key(KeyInput::Enter);

        assert_eq!(outcome, KeyOutcome::Submit { text: "  test ".into(), role: Role::User });
        assert!(input.buffer().is_empty());
        assert_eq!(input.cursor(), 0);
    }

    #[test]
    fn blank_input_is_not_submitted() {
        let mut input = InputState::new();
        type_text(&mut input, "   ");

        assert_eq!(input.handle_key(KeyInput::Enter), KeyOutcome::Ignored);
        assert_eq!(input.buffer(), "   ");
    }

    #[test]
    fn tab_toggles_role() {
        let mut input = InputState::new();
        assert_eq!(input.role(), Role::User);

        input.handle_key(KeyInput::Tab);
        type_text(&mut input, "be terse");
        assert_eq!(input.handle_key(KeyInput::Enter), KeyOutcome::Submit {
            text: "be terse".into(),
            role: Role::System
        });

        input.handle_key(KeyInput::Tab);
        assert_eq!(input.role(), Role::User);
    }

    #[test]
    fn cursor_movement() {
        let mut input = InputState::new();
        type_text(&mut input, "abc");

        input.handle_key(KeyInput::Home);
        assert_eq!(input.cursor(), 0);

        input.handle_key(KeyInput::End);
        assert_eq!(input.cursor(), 3);

        input.handle_key(KeyInput::Left);
        assert_eq!(input.cursor(), 2);

        input.handle_key(KeyInput::Right);
        input.handle_key(KeyInput::Right);
        assert_eq!(input.cursor(), 3);
    }

    #[test]
    fn multibyte_editing_stays_on_char_boundaries() {
        let mut input = InputState::new();
        type_text(&mut input, "héllo");

        input.handle_key(KeyInput::Home);
        input.handle_key(KeyInput::Right);
        input.handle_key(KeyInput::Delete);
        assert_eq!(input.buffer(), "hllo");

        input.handle_key(KeyInput::Char('ë'));
        assert_eq!(input.buffer(), "hëllo");
        assert_eq!(input.cursor(), 2);
    }

    #[test]
    fn esc_quits() {
        assert_eq!(InputState::new().handle_key(KeyInput::Esc), KeyOutcome::Quit);
    }
}
