use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, List, ListItem, ListState, Paragraph},
};

use super::pane::{Modal, Pane, truncate};
use crate::api::types::Rule;
use crate::app::{FormField, RuleForm, SortColumn};
use crate::config::{LayoutConfig, ThemeConfig};

#[allow(clippy::too_many_arguments)]
pub fn render_rules(
    f: &mut Frame,
    area: Rect,
    rules: &[Rule],
    state: &mut ListState,
    search_query: &str,
    sort_column: SortColumn,
    sort_descending: bool,
    is_loading: bool,
    error: Option<&str>,
    theme: &ThemeConfig,
    layout: &LayoutConfig,
) {
    let title = if !search_query.is_empty() {
        format!("Rules ({} matches)", rules.len())
    } else if is_loading {
        "Rules (loading...)".to_string()
    } else {
        format!("Rules ({})", rules.len())
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(area);

    // Column header with the sort indicator
    let arrow = if sort_descending { "v" } else { "^" };
    let header_cell = |label: &str, column: SortColumn, width: usize| {
        let text = if column == sort_column {
            format!("{}{}", label, arrow)
        } else {
            label.to_string()
        };
        truncate(&text, width)
    };
    let header = format!(
        "   {} {} {} {} {} {}",
        header_cell("on", SortColumn::Status, 3),
        header_cell("pattern", SortColumn::Pattern, layout.pattern_width),
        header_cell("match", SortColumn::Match, 9),
        header_cell(
            "destination",
            SortColumn::Destination,
            layout.destination_width
        ),
        header_cell("created", SortColumn::Created, layout.date_width),
        header_cell("used", SortColumn::Used, 6),
    );
    f.render_widget(
        Paragraph::new(header).style(Style::default().fg(theme.fg_muted())),
        chunks[0],
    );

    let items: Vec<ListItem> = rules
        .iter()
        .map(|r| {
            let on = if r.enabled { "[x]" } else { "[ ]" };
            let created = r.created_at.format("%b %d %Y").to_string();
            let line = format!(
                "{} {} {} {} {} {}",
                on,
                truncate(&r.email_pattern, layout.pattern_width),
                truncate(r.match_type.label(), 9),
                truncate(r.destination_display(), layout.destination_width),
                truncate(&created, layout.date_width),
                truncate(&r.times_applied.to_string(), 6),
            );
            let style = if r.enabled {
                Style::default().fg(theme.fg())
            } else {
                Style::default().fg(theme.disabled())
            };
            ListItem::new(Line::styled(line, style))
        })
        .collect();

    let list = List::new(items)
        .block(Pane::new(&title, true, theme).block())
        .highlight_style(
            Style::default()
                .bg(theme.selected_bg())
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    f.render_stateful_widget(list, chunks[1], state);

    if let Some(error) = error {
        let message = Paragraph::new(format!("{} (R to retry)", error))
            .style(Style::default().fg(theme.error()));
        let line = Rect::new(
            chunks[1].x + 2,
            chunks[1].y + chunks[1].height.saturating_sub(2),
            chunks[1].width.saturating_sub(4),
            1,
        );
        f.render_widget(message, line);
    }
}

pub fn render_rule_form(f: &mut Frame, area: Rect, form: &RuleForm, theme: &ThemeConfig) {
    let title = if form.editing_id.is_some() {
        "Edit rule"
    } else {
        "New rule"
    };
    let modal = Modal::new(title, theme);
    let rect = modal.centered_rect(56, 12, area);
    f.render_widget(Clear, rect);
    f.render_widget(modal.block(), rect);

    let inner = rect.inner(ratatui::layout::Margin {
        horizontal: 2,
        vertical: 1,
    });
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(2),
            Constraint::Length(2),
            Constraint::Length(2),
            Constraint::Length(2),
        ])
        .split(inner);

    let field_line = |label: &str, value: String, active: bool, text_input: bool| {
        let label_style = if active {
            Style::default().fg(theme.primary())
        } else {
            Style::default().fg(theme.fg_muted())
        };
        let mut spans = vec![
            Span::styled(format!("{:12}", label), label_style),
            Span::styled(value, Style::default().fg(theme.fg())),
        ];
        if active && text_input {
            spans.push(Span::styled("_", Style::default().fg(theme.primary())));
        }
        Paragraph::new(Line::from(spans))
    };

    f.render_widget(
        field_line(
            "Pattern",
            form.email_pattern.clone(),
            form.field == FormField::Pattern,
            true,
        ),
        rows[0],
    );
    f.render_widget(
        field_line(
            "Match",
            format!("< {} >", form.match_type.label()),
            form.field == FormField::MatchType,
            false,
        ),
        rows[1],
    );
    f.render_widget(
        field_line(
            "Action",
            format!("< {} >", form.action.label()),
            form.field == FormField::Action,
            false,
        ),
        rows[2],
    );
    f.render_widget(
        field_line(
            "Destination",
            form.destination.clone(),
            form.field == FormField::Destination,
            true,
        ),
        rows[3],
    );
    f.render_widget(
        field_line(
            "Mark read",
            if form.mark_as_read { "[x]" } else { "[ ]" }.to_string(),
            form.field == FormField::MarkAsRead,
            false,
        ),
        rows[4],
    );
}

/// Yes/no confirmation box shared by the delete flows.
pub fn render_confirm(f: &mut Frame, area: Rect, message: &str, theme: &ThemeConfig) {
    let modal = Modal::new("Confirm", theme);
    let width = (message.len() as u16 + 6).max(30);
    let rect = modal.centered_rect(width, 5, area);
    f.render_widget(Clear, rect);
    f.render_widget(modal.block(), rect);

    let inner = rect.inner(ratatui::layout::Margin {
        horizontal: 2,
        vertical: 1,
    });
    let lines = vec![
        Line::styled(message.to_string(), Style::default().fg(theme.fg())),
        Line::from(vec![
            Span::styled("y", Style::default().fg(theme.primary())),
            Span::styled(" confirm  ", Style::default().fg(theme.fg_subtle())),
            Span::styled("n/Esc", Style::default().fg(theme.primary())),
            Span::styled(" cancel", Style::default().fg(theme.fg_subtle())),
        ]),
    ];
    f.render_widget(Paragraph::new(lines), inner);
}
