use ratatui::{
    Frame,
    layout::Rect,
    style::Style,
    widgets::{Block, Borders, Clear, Paragraph},
};

use crate::config::ThemeConfig;
use crate::toast::{Toast, ToastKind};

/// Stack toasts in the top-right corner, newest at the bottom.
pub fn render_toasts(f: &mut Frame, area: Rect, toasts: &[Toast], theme: &ThemeConfig) {
    let mut y = area.y + 1;
    for toast in toasts {
        let width = (toast.message.len() as u16 + 4).min(area.width.saturating_sub(4));
        if y + 3 > area.y + area.height {
            break;
        }
        let rect = Rect::new(area.x + area.width.saturating_sub(width + 2), y, width, 3);

        let color = match toast.kind {
            ToastKind::Success => theme.success(),
            ToastKind::Error => theme.error(),
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(color))
            .style(Style::default().bg(theme.bg_panel()));

        f.render_widget(Clear, rect);
        f.render_widget(
            Paragraph::new(toast.message.clone())
                .style(Style::default().fg(color))
                .block(block),
            rect,
        );
        y += 3;
    }
}
