//! Status bar
//!
//! Displays session readiness, the host in use, insets and the latest error.

use minichat_app::ChatState;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

/// Render the status bar.
pub fn render(frame: &mut Frame, state: &ChatState, host_label: &str, area: Rect) {
    let readiness = if state.is_initialized {
        Span::styled("Ready", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
    } else {
        Span::styled("Connecting...", Style::default().fg(Color::Yellow))
    };

    let insets = state.safe_area_insets;
    let info = format!(
        " | Host: {host_label} | Insets: {}/{}/{}/{}",
        insets.top, insets.left, insets.right, insets.bottom
    );

    let mut spans = vec![Span::raw(" "), readiness, Span::raw(info)];
    if let Some(error) = &state.error {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(error.clone(), Style::default().fg(Color::Red)));
    }

    let paragraph = Paragraph::new(Line::from(spans))
        .style(Style::default().bg(Color::DarkGray).fg(Color::White));

    frame.render_widget(paragraph, area);
}
