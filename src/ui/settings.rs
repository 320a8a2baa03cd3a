use ratatui::{
    Frame,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
};

use super::pane::Pane;
use crate::api::types::UserSettings;
use crate::config::ThemeConfig;

/// Rows of the settings view, top to bottom.
pub const SETTINGS_ROWS: usize = 5;

pub fn render_settings(
    f: &mut Frame,
    area: Rect,
    settings: Option<&UserSettings>,
    watching: bool,
    cursor: usize,
    is_loading: bool,
    theme: &ThemeConfig,
) {
    let title = if is_loading {
        "Settings (loading...)"
    } else {
        "Settings"
    };
    let block = Pane::new(title, true, theme).block();
    let inner = block.inner(area);
    f.render_widget(block, area);

    let row = |index: usize, label: &str, value: String| {
        let style = if index == cursor {
            Style::default().fg(theme.primary())
        } else {
            Style::default().fg(theme.fg())
        };
        Line::from(vec![
            Span::styled(if index == cursor { "> " } else { "  " }, style),
            Span::styled(format!("{:28}", label), style),
            Span::styled(value, Style::default().fg(theme.fg_subtle())),
        ])
    };

    let checkbox = |on: bool| if on { "[x]" } else { "[ ]" }.to_string();
    let blackhole_enabled = settings.map(|s| s.blackhole_enabled).unwrap_or_default();
    let blackhole_days = settings
        .map(|s| format!("{} days", s.blackhole_delete_days))
        .unwrap_or_else(|| "-".to_string());

    let lines = vec![
        row(0, "Blackhole blocked senders", checkbox(blackhole_enabled)),
        row(1, "  delete after", blackhole_days),
        row(2, "Watch inbox", checkbox(watching)),
        Line::raw(""),
        row(3, "Set up magic folders", String::new()),
        row(4, "Sign out", String::new()),
        Line::raw(""),
        Line::styled(
            "space/enter toggle or run  h/l adjust days",
            Style::default().fg(theme.fg_muted()),
        ),
    ];
    f.render_widget(Paragraph::new(lines), inner);
}
