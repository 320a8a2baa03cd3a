use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::Line,
    widgets::Paragraph,
};

use super::pane::Pane;
use crate::api::types::ProcessingStats;
use crate::config::ThemeConfig;

pub fn render_stats(
    f: &mut Frame,
    area: Rect,
    stats: Option<&ProcessingStats>,
    is_loading: bool,
    error: Option<&str>,
    theme: &ThemeConfig,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(7), Constraint::Min(1)])
        .split(area);

    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(33),
            Constraint::Percentage(34),
            Constraint::Percentage(33),
        ])
        .split(chunks[0]);

    let processed = stats
        .map(|s| s.emails_processed.to_string())
        .unwrap_or_else(|| "-".to_string());
    let rules = stats
        .map(|s| s.rules_count.to_string())
        .unwrap_or_else(|| "-".to_string());
    let last = stats
        .and_then(|s| s.last_processed_at)
        .map(|t| t.format("%b %d %H:%M").to_string())
        .unwrap_or_else(|| "never".to_string());

    render_card(f, cards[0], "Emails sorted", &processed, theme);
    render_card(f, cards[1], "Active rules", &rules, theme);
    render_card(f, cards[2], "Last processed", &last, theme);

    let footer = if is_loading {
        Line::styled("Refreshing...", Style::default().fg(theme.fg_muted()))
    } else if let Some(error) = error {
        Line::styled(
            format!("{} (R to retry)", error),
            Style::default().fg(theme.error()),
        )
    } else {
        Line::styled("R refresh", Style::default().fg(theme.fg_muted()))
    };
    f.render_widget(
        Paragraph::new(footer).alignment(Alignment::Center),
        chunks[1],
    );
}

fn render_card(f: &mut Frame, area: Rect, label: &str, value: &str, theme: &ThemeConfig) {
    let block = Pane::new(label, false, theme).block();
    let inner = block.inner(area);
    f.render_widget(block, area);

    let lines = vec![
        Line::raw(""),
        Line::styled(
            value.to_string(),
            Style::default()
                .fg(theme.primary())
                .add_modifier(Modifier::BOLD),
        ),
    ];
    f.render_widget(
        Paragraph::new(lines).alignment(Alignment::Center),
        inner,
    );
}
