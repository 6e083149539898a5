//! Top and bottom bar rendering.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::ui::app::{App, Column, Mode};

/// Render the top bar with branch configuration and cursor position.
pub fn render_top_bar(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let bar = Style::default().bg(theme.bg_elevated);
    let config = app.analyzer.config();

    let mut spans = vec![
        Span::styled(
            " gitradar ",
            Style::default()
                .fg(theme.bg_dark)
                .bg(theme.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(
                "  main {}  dev {}",
                config.main_head(),
                config.dev_upstream()
            ),
            bar.fg(theme.text_normal),
        ),
    ];

    if app.is_loading() {
        spans.push(Span::styled("  loading…", bar.fg(theme.warning)));
    }

    let column = match app.selected_column() {
        Column::File => "file".to_string(),
        Column::Stage(stage) => stage.description().to_string(),
    };
    let right_text = format!(
        "{}  {}/{}  ",
        column,
        (app.table.selected_row + 1).min(app.table.order.len()),
        app.table.order.len()
    );

    let left_len: usize = spans.iter().map(|s| s.content.chars().count()).sum();
    let padding = (area.width as usize)
        .saturating_sub(left_len)
        .saturating_sub(right_text.chars().count());
    spans.push(Span::styled(" ".repeat(padding), bar));
    spans.push(Span::styled(right_text, bar.fg(theme.accent)));

    frame.render_widget(Paragraph::new(Line::from(spans)).style(bar), area);
}

/// Render the bottom bar with messages and mode-specific hints.
pub fn render_bottom_bar(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let bar = Style::default().bg(theme.bg_elevated);

    let hints = match app.ui.mode {
        Mode::Normal => " j/k: row  h/l: stage  1-8: sort  0: unsort  Enter: diff  r: reload  ?: help  q: quit",
        Mode::Diff => " j/k: scroll  PgUp/PgDn: page  g/G: top/bottom  Esc: close",
        Mode::Help => " Esc: close",
    };

    let mut spans = Vec::new();
    if let Some(error) = &app.ui.error {
        spans.push(Span::styled(
            format!(" {} ", error),
            bar.fg(theme.error).add_modifier(Modifier::BOLD),
        ));
    } else if let Some(status) = &app.ui.status {
        spans.push(Span::styled(format!(" {} ", status), bar.fg(theme.accent)));
    }
    spans.push(Span::styled(hints, bar.fg(theme.text_muted)));

    frame.render_widget(Paragraph::new(Line::from(spans)).style(bar), area);
}
