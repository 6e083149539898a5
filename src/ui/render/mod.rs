//! UI rendering with ratatui.
//!
//! Layout: one-line top bar, the stage table, one-line bottom bar, and
//! overlays drawn on top.

mod bars;
mod helpers;
mod overlays;
mod table;

use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::Style,
    widgets::Block,
    Frame,
};

use super::app::{App, Mode};

pub use helpers::{centered_rect, diff_line_style, truncate_str};

/// Main render function.
pub fn render(frame: &mut Frame, app: &mut App) {
    let _timer = crate::metrics::Timer::start("render_frame");

    let bg_block = Block::default().style(Style::default().bg(app.theme.bg_dark));
    frame.render_widget(bg_block, frame.area());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Top bar
            Constraint::Min(0),    // Table
            Constraint::Length(1), // Bottom bar
        ])
        .split(frame.area());

    bars::render_top_bar(frame, app, chunks[0]);
    table::render_table(frame, app, chunks[1]);
    bars::render_bottom_bar(frame, app, chunks[2]);

    match app.ui.mode {
        Mode::Diff => overlays::render_diff_overlay(frame, app),
        Mode::Help => overlays::render_help_overlay(frame, app),
        Mode::Normal => {}
    }
}
