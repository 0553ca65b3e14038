//! Input line
//!
//! Displays the input buffer with cursor, prefixed by the role the message
//! will be sent with.

use minichat_proto::Role;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::InputState;

const INPUT_LINE_OFFSET_Y: u16 = 1; // inside top border
const LEFT_BORDER: u16 = 1;
const RIGHT_PADDING: u16 = 1; // inside right border

/// Render the input line.
pub fn render(frame: &mut Frame, input: &InputState, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" Tab: role  Esc: quit ");

    let role_color = match input.role() {
        Role::System => Color::Yellow,
        Role::User | Role::Assistant => Color::Green,
    };
    let prompt = format!("[{}] > ", input.role());
    let prompt_width = prompt.chars().count() as u16;

    let line = Line::from(vec![
        Span::styled(prompt, Style::default().fg(role_color)),
        Span::styled(input.buffer(), Style::default().fg(Color::White)),
    ]);
    frame.render_widget(Paragraph::new(line).block(block), area);

    let text_start = area.x.saturating_add(LEFT_BORDER).saturating_add(prompt_width);
    let max_x = area.x.saturating_add(area.width).saturating_sub(RIGHT_PADDING.saturating_add(1));
    let cursor_x = text_start.saturating_add(input.cursor() as u16).min(max_x);
    let cursor_y = area.y.saturating_add(INPUT_LINE_OFFSET_Y);

    frame.set_cursor_position((cursor_x, cursor_y));
}
