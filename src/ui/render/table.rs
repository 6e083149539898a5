//! The stage table.

use ratatui::{
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Cell, Row, Table},
    Frame,
};

use super::helpers::{presence_style, stage_header, truncate_str, STAGE_COL_MIN_WIDTH};
use crate::core::Stage;
use crate::ui::app::{App, Column};

/// Header height: titles plus environment annotations.
const HEADER_HEIGHT: u16 = 2;

fn sort_marker(app: &App, column: Column) -> &'static str {
    match app.table.sort {
        Some(key) if key.column == column && key.descending => " ▼",
        Some(key) if key.column == column => " ▲",
        _ => "",
    }
}

/// Render the file x stage table with a count footer.
pub fn render_table(frame: &mut Frame, app: &mut App, area: Rect) {
    let theme = app.theme.clone();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border_dim))
        .style(Style::default().bg(theme.bg_surface));
    let inner = block.inner(area);

    // Header, footer and their separators eat into the body.
    let body_height = inner.height.saturating_sub(HEADER_HEIGHT + 2) as usize;
    app.ensure_row_visible(body_height);

    let headers: Vec<(String, String)> = Stage::ALL
        .iter()
        .map(|&stage| {
            let result = app.analysis.result(stage);
            let envs = result
                .map(|r| app.environments.annotation(r))
                .unwrap_or_default();
            stage_header(stage, result, &envs)
        })
        .collect();

    let header_style = Style::default()
        .fg(theme.accent)
        .add_modifier(Modifier::BOLD);
    let mut header_cells = vec![Cell::from(Text::from(vec![
        Line::from(format!("file{}", sort_marker(app, Column::File))),
        Line::from(Span::styled(
            format!("{} files", app.view.len()),
            Style::default().fg(theme.text_muted),
        )),
    ]))
    .style(header_style)];
    for (stage, (title, envs)) in Stage::ALL.iter().zip(&headers) {
        header_cells.push(
            Cell::from(Text::from(vec![
                Line::from(format!(
                    "{}{}",
                    title,
                    sort_marker(app, Column::Stage(*stage))
                )),
                Line::from(Span::styled(
                    envs.clone(),
                    Style::default().fg(theme.warning),
                )),
            ]))
            .style(header_style),
        );
    }
    let header = Row::new(header_cells)
        .height(HEADER_HEIGHT)
        .bottom_margin(1);

    let stage_widths: Vec<u16> = headers
        .iter()
        .map(|(title, envs)| {
            let w = title.chars().count().max(envs.chars().count()) + 2;
            (w as u16).max(STAGE_COL_MIN_WIDTH)
        })
        .collect();
    let stage_total: u16 = stage_widths.iter().sum::<u16>() + Stage::COUNT as u16;
    let path_width = inner.width.saturating_sub(stage_total).max(8) as usize;

    let selected_col = app.table.selected_col;
    let rows: Vec<Row> = app
        .table
        .order
        .iter()
        .enumerate()
        .skip(app.table.scroll)
        .take(body_height)
        .map(|(pos, &idx)| {
            let row = &app.view.rows()[idx];
            let is_selected = pos == app.table.selected_row;
            let base = if is_selected {
                Style::default().bg(theme.bg_selected)
            } else {
                Style::default()
            };
            let cursor = Style::default()
                .fg(theme.bg_dark)
                .bg(theme.accent)
                .add_modifier(Modifier::BOLD);

            let path_text = truncate_str(&app.table.path_cache[idx], path_width);
            let path_style = if is_selected && selected_col == 0 {
                cursor
            } else if is_selected {
                base.fg(theme.text_bright)
            } else {
                base.fg(theme.text_normal)
            };
            let mut cells = vec![Cell::from(path_text).style(path_style)];

            for stage in Stage::ALL {
                let presence = row.presence(stage);
                let style = if is_selected && selected_col == stage.index() + 1 {
                    cursor
                } else {
                    base.patch(presence_style(presence, &theme))
                };
                cells.push(Cell::from(format!("  {}", presence.marker())).style(style));
            }
            Row::new(cells).style(base)
        })
        .collect();

    let mut footer_cells = vec![Cell::from("count").style(Style::default().fg(theme.text_muted))];
    for stage in Stage::ALL {
        let (text, color) = match app.view.count(stage) {
            Some(n) => (n.to_string(), theme.text_bright),
            None => ("-".to_string(), theme.cell_unavailable),
        };
        footer_cells.push(Cell::from(format!("  {}", text)).style(Style::default().fg(color)));
    }
    let footer = Row::new(footer_cells).top_margin(1);

    let mut widths = vec![Constraint::Min(path_width as u16)];
    widths.extend(stage_widths.iter().map(|&w| Constraint::Length(w)));

    let table = Table::new(rows, widths)
        .header(header)
        .footer(footer)
        .column_spacing(1)
        .block(block);

    frame.render_widget(table, area);
}
