use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::Line,
    widgets::Paragraph,
};

use super::pane::Modal;
use crate::config::ThemeConfig;

pub fn render_signin(f: &mut Frame, area: Rect, signing_in: bool, theme: &ThemeConfig) {
    let modal = Modal::new("Sweep", theme);
    let rect = modal.centered_rect(52, 8, area);
    f.render_widget(modal.block(), rect);

    let inner = rect.inner(ratatui::layout::Margin {
        horizontal: 2,
        vertical: 1,
    });

    let lines = if signing_in {
        vec![
            Line::raw(""),
            Line::styled(
                "Waiting for the browser...",
                Style::default().fg(theme.fg()),
            ),
            Line::styled(
                "Finish signing in, then come back here.",
                Style::default().fg(theme.fg_muted()),
            ),
        ]
    } else {
        vec![
            Line::styled(
                "Keep your inbox sorted automatically.",
                Style::default().fg(theme.fg()),
            ),
            Line::raw(""),
            Line::styled(
                "Enter  sign in with your browser",
                Style::default()
                    .fg(theme.primary())
                    .add_modifier(Modifier::BOLD),
            ),
            Line::styled("q      quit", Style::default().fg(theme.fg_muted())),
        ]
    };
    f.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
}
