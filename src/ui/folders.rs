use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, List, ListItem, ListState, Paragraph},
};

use super::pane::{Modal, Pane};
use crate::api::types::{FolderSettings, MagicFolder};
use crate::config::ThemeConfig;

#[allow(clippy::too_many_arguments)]
pub fn render_folders(
    f: &mut Frame,
    area: Rect,
    folders: &[MagicFolder],
    state: &mut ListState,
    expanded: Option<(&str, Option<&FolderSettings>)>,
    setting_cursor: usize,
    is_loading: bool,
    theme: &ThemeConfig,
) {
    let title = if is_loading {
        "Folders (loading...)".to_string()
    } else {
        format!("Folders ({})", folders.len())
    };

    let (list_area, panel_area) = match expanded {
        Some(_) => {
            let halves = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
                .split(area);
            (halves[0], Some(halves[1]))
        }
        None => (area, None),
    };

    let items: Vec<ListItem> = folders
        .iter()
        .map(|folder| {
            let marker = match expanded {
                Some((id, _)) if id == folder.id => "- ",
                _ => "+ ",
            };
            ListItem::new(Line::from(vec![
                Span::styled(marker, Style::default().fg(theme.fg_muted())),
                Span::styled(folder.name.clone(), Style::default().fg(theme.fg())),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(Pane::new(&title, panel_area.is_none(), theme).block())
        .highlight_style(
            Style::default()
                .bg(theme.selected_bg())
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");
    f.render_stateful_widget(list, list_area, state);

    if let (Some(panel), Some((_, settings))) = (panel_area, expanded) {
        render_settings_panel(f, panel, settings, setting_cursor, theme);
    }
}

/// Archive-policy editor for the expanded folder. Two toggles, each with
/// a threshold value and unit.
fn render_settings_panel(
    f: &mut Frame,
    area: Rect,
    settings: Option<&FolderSettings>,
    cursor: usize,
    theme: &ThemeConfig,
) {
    let block = Pane::new("Auto-archive", true, theme).block();
    let inner = block.inner(area);
    f.render_widget(block, area);

    let Some(settings) = settings else {
        f.render_widget(
            Paragraph::new("Loading settings...").style(Style::default().fg(theme.fg_muted())),
            inner,
        );
        return;
    };

    let row = |index: usize, label: &str, value: String| {
        let style = if index == cursor {
            Style::default().fg(theme.primary())
        } else {
            Style::default().fg(theme.fg())
        };
        Line::from(vec![
            Span::styled(if index == cursor { "> " } else { "  " }, style),
            Span::styled(format!("{:22}", label), style),
            Span::styled(value, Style::default().fg(theme.fg_subtle())),
        ])
    };

    let lines = vec![
        row(
            0,
            "Archive read after",
            if settings.archive_read_enabled {
                "[x]".to_string()
            } else {
                "[ ]".to_string()
            },
        ),
        row(
            1,
            "  threshold",
            format!(
                "{} {}",
                settings.archive_read_value,
                settings.archive_read_unit.label()
            ),
        ),
        row(
            2,
            "Archive unread after",
            if settings.archive_unread_enabled {
                "[x]".to_string()
            } else {
                "[ ]".to_string()
            },
        ),
        row(
            3,
            "  threshold",
            format!(
                "{} {}",
                settings.archive_unread_value,
                settings.archive_unread_unit.label()
            ),
        ),
        Line::raw(""),
        Line::styled(
            "space toggle  h/l adjust  u unit  Esc close",
            Style::default().fg(theme.fg_muted()),
        ),
    ];
    f.render_widget(Paragraph::new(lines), inner);
}

/// Name prompt for a new magic folder.
pub fn render_folder_name(f: &mut Frame, area: Rect, name: &str, theme: &ThemeConfig) {
    let modal = Modal::new("New folder", theme);
    let rect = modal.centered_rect(40, 5, area);
    f.render_widget(Clear, rect);
    f.render_widget(modal.block(), rect);

    let inner = rect.inner(ratatui::layout::Margin {
        horizontal: 2,
        vertical: 1,
    });
    let lines = vec![
        Line::from(vec![
            Span::styled(name.to_string(), Style::default().fg(theme.fg())),
            Span::styled("_", Style::default().fg(theme.primary())),
        ]),
        Line::styled(
            "Enter create  Esc cancel",
            Style::default().fg(theme.fg_muted()),
        ),
    ];
    f.render_widget(Paragraph::new(lines), inner);
}
