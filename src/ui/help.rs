use ratatui::{
    Frame,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::app::View;
use crate::config::ThemeConfig;

pub fn render_help(
    f: &mut Frame,
    area: Rect,
    view: View,
    status: Option<&str>,
    search_query: Option<&str>,
    theme: &ThemeConfig,
) {
    let key_style = Style::default().fg(theme.primary());
    let text_style = Style::default().fg(theme.fg_subtle());
    let search_style = Style::default().fg(theme.fg());
    let cursor_style = Style::default().fg(theme.primary());

    let help_text = if let Some(query) = search_query {
        vec![
            Span::styled("/", key_style),
            Span::raw(" "),
            Span::styled(query, search_style),
            Span::styled("_", cursor_style),
            Span::styled("  ", text_style),
            Span::styled("Enter", key_style),
            Span::styled(" confirm  ", text_style),
            Span::styled("Esc", key_style),
            Span::styled(" clear", text_style),
        ]
    } else {
        match view {
            View::SignIn => vec![
                Span::styled("Enter", key_style),
                Span::styled(" sign in  ", text_style),
                Span::styled("q", key_style),
                Span::styled(" quit", text_style),
            ],
            View::Rules => vec![
                Span::styled("Tab", key_style),
                Span::styled(" view  ", text_style),
                Span::styled("j/k", key_style),
                Span::styled(" nav  ", text_style),
                Span::styled("space", key_style),
                Span::styled(" toggle  ", text_style),
                Span::styled("n", key_style),
                Span::styled(" new  ", text_style),
                Span::styled("e", key_style),
                Span::styled(" edit  ", text_style),
                Span::styled("d", key_style),
                Span::styled(" delete  ", text_style),
                Span::styled("/", key_style),
                Span::styled(" filter  ", text_style),
                Span::styled("s", key_style),
                Span::styled(" sort  ", text_style),
                Span::styled("R", key_style),
                Span::styled(" refresh  ", text_style),
                Span::styled("q", key_style),
                Span::styled(" quit", text_style),
            ],
            View::Folders => vec![
                Span::styled("Tab", key_style),
                Span::styled(" view  ", text_style),
                Span::styled("j/k", key_style),
                Span::styled(" nav  ", text_style),
                Span::styled("Enter", key_style),
                Span::styled(" expand  ", text_style),
                Span::styled("n", key_style),
                Span::styled(" new  ", text_style),
                Span::styled("d", key_style),
                Span::styled(" delete  ", text_style),
                Span::styled("R", key_style),
                Span::styled(" refresh  ", text_style),
                Span::styled("q", key_style),
                Span::styled(" quit", text_style),
            ],
            View::Stats => vec![
                Span::styled("Tab", key_style),
                Span::styled(" view  ", text_style),
                Span::styled("R", key_style),
                Span::styled(" refresh  ", text_style),
                Span::styled("q", key_style),
                Span::styled(" quit", text_style),
            ],
            View::Settings => vec![
                Span::styled("Tab", key_style),
                Span::styled(" view  ", text_style),
                Span::styled("j/k", key_style),
                Span::styled(" nav  ", text_style),
                Span::styled("space", key_style),
                Span::styled(" toggle  ", text_style),
                Span::styled("h/l", key_style),
                Span::styled(" adjust  ", text_style),
                Span::styled("q", key_style),
                Span::styled(" quit", text_style),
            ],
        }
    };

    let mut line = Line::from(help_text);

    // Add status message if present
    if let Some(msg) = status {
        line.spans
            .push(Span::styled("  |  ", Style::default().fg(theme.border())));
        line.spans
            .push(Span::styled(msg, Style::default().fg(theme.warning())));
    }

    let paragraph = Paragraph::new(line).style(Style::default().bg(theme.bg_panel()));

    f.render_widget(paragraph, area);
}
