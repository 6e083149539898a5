//! Diff and help overlays.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use super::helpers::{centered_rect, diff_line_style, sanitize_line};
use crate::ui::app::App;

/// Render the diff overlay for the selected cell.
pub fn render_diff_overlay(frame: &mut Frame, app: &App) {
    let theme = &app.theme;
    let overlay = &app.overlay;
    let overlay_area = centered_rect(90, 85, frame.area());

    frame.render_widget(Clear, overlay_area);

    let path = overlay
        .path
        .as_ref()
        .map(|p| p.as_str())
        .unwrap_or_default();
    let title = match overlay.stages.as_slice() {
        [stage] => format!(" {} in {} ", path, stage.label()),
        _ => format!(" {} ", path),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.accent))
        .title(Span::styled(
            title,
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        ))
        .style(Style::default().bg(theme.bg_elevated));

    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);
    if inner.height == 0 {
        return;
    }

    let mut lines: Vec<Line> = Vec::new();
    if overlay.loading {
        lines.push(Line::from(Span::styled(
            "Loading…",
            Style::default().fg(theme.text_muted),
        )));
    } else if overlay.sections.is_empty() {
        lines.push(Line::from(Span::styled(
            "No diff (the repository may have changed since the table was built)",
            Style::default().fg(theme.text_muted),
        )));
    } else {
        for (stage, body) in &overlay.sections {
            lines.push(Line::from(Span::styled(
                format!("── {} ({}) ──", stage.label(), stage.description()),
                Style::default()
                    .fg(theme.accent)
                    .add_modifier(Modifier::BOLD),
            )));
            for line in body {
                lines.push(Line::from(Span::styled(
                    sanitize_line(line),
                    diff_line_style(line, theme),
                )));
            }
        }
    }

    let visible: Vec<Line> = lines
        .into_iter()
        .skip(overlay.scroll)
        .take(inner.height as usize)
        .collect();
    frame.render_widget(Paragraph::new(visible), inner);
}

/// Render the help overlay.
pub fn render_help_overlay(frame: &mut Frame, app: &App) {
    let entries = [
        ("j/k or ↑/↓", "Move between files"),
        ("h/l or ←/→", "Move between stage columns"),
        ("g / G", "First / last file"),
        ("1-8", "Sort by column, again to reverse"),
        ("0", "Back to path order"),
        ("Enter", "Diff of the selected cell (all stages on the file column)"),
        ("r", "Re-run the analysis"),
        ("?", "Close this help overlay"),
        ("q or Ctrl+C", "Quit gitradar"),
    ];

    let area = frame.area();
    let width = 72.min(area.width.saturating_sub(2).max(1));
    let height = (entries.len() as u16 + 4).min(area.height.saturating_sub(2).max(1));
    let x = (area.width.saturating_sub(width)) / 2;
    let y = (area.height.saturating_sub(height)) / 2;
    let overlay_area = Rect::new(x, y, width, height);

    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.accent))
        .title(Span::styled(
            " Help ",
            Style::default()
                .fg(app.theme.accent)
                .add_modifier(Modifier::BOLD),
        ))
        .style(Style::default().bg(app.theme.bg_elevated));

    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    let mut lines = vec![Line::from(Span::styled(
        "Cells: x present, blank absent, - stage unavailable",
        Style::default().fg(app.theme.text_muted),
    ))];
    lines.push(Line::default());
    for (key, desc) in entries {
        lines.push(Line::from(vec![
            Span::styled(format!("{:<16}", key), Style::default().fg(app.theme.accent)),
            Span::styled(desc, Style::default().fg(app.theme.text_normal)),
        ]));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}
