//! Chat area
//!
//! Displays the conversation and a typing indicator while a reply is pending.

use minichat_app::ChatState;
use minichat_proto::Role;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
};

const BORDER_SIZE: u16 = 2;

/// Render the chat area.
pub fn render(frame: &mut Frame, state: &ChatState, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" Chat ");

    let mut items: Vec<ListItem> = state
        .conversation_history
        .iter()
        .map(|msg| {
            let (label, color) = match msg.role {
                Role::User => ("you", Color::Green),
                Role::Assistant => ("assistant", Color::Cyan),
                Role::System => ("system", Color::DarkGray),
            };

            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("<{label}>"),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ),
                Span::raw(" "),
                Span::raw(msg.content.clone()),
            ]))
        })
        .collect();

    if items.is_empty() && !state.is_loading {
        items.push(ListItem::new(Line::from(Span::styled(
            "Type a message and press Enter",
            Style::default().fg(Color::DarkGray),
        ))));
    }

    if state.is_loading {
        items.push(ListItem::new(Line::from(Span::styled(
            "assistant is typing...",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        ))));
    }

    let visible_height = area.height.saturating_sub(BORDER_SIZE) as usize;
    let skip = items.len().saturating_sub(visible_height);
    let visible_items: Vec<_> = items.into_iter().skip(skip).collect();

    let list = List::new(visible_items).block(block);

    frame.render_widget(list, area);
}
