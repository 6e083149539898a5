//! Shared rendering helpers and constants.

use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};

use crate::core::{Presence, Stage, StageResult};
use crate::theme::Theme;

/// Minimum width of a stage column.
pub const STAGE_COL_MIN_WIDTH: u16 = 7;

/// Truncate to `max_len` chars, marking the cut with an ellipsis.
pub fn truncate_str(s: &str, max_len: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max_len {
        s.to_string()
    } else if max_len == 0 {
        String::new()
    } else {
        let truncated: String = s.chars().take(max_len - 1).collect();
        format!("{}…", truncated)
    }
}

/// Header text for a stage column: label plus tag, then environments.
pub fn stage_header(stage: Stage, result: Option<&StageResult>, envs: &str) -> (String, String) {
    let title = match result.and_then(StageResult::tag) {
        Some(tag) => format!("{} {}", stage.label(), tag),
        None => stage.label().to_string(),
    };
    (title, envs.trim_start().to_string())
}

/// Style for one cell marker.
pub fn presence_style(presence: Presence, theme: &Theme) -> Style {
    match presence {
        Presence::Present => Style::default()
            .fg(theme.cell_present)
            .add_modifier(Modifier::BOLD),
        Presence::Absent => Style::default().fg(theme.text_muted),
        Presence::Unavailable => Style::default().fg(theme.cell_unavailable),
    }
}

/// Style for one line of diff output.
pub fn diff_line_style(line: &str, theme: &Theme) -> Style {
    if line.starts_with("+++") || line.starts_with("---") {
        Style::default().fg(theme.text_bright)
    } else if line.starts_with('+') {
        Style::default().fg(theme.diff_insert)
    } else if line.starts_with('-') {
        Style::default().fg(theme.diff_delete)
    } else if line.starts_with("@@") {
        Style::default().fg(theme.diff_hunk)
    } else if line.starts_with("diff ")
        || line.starts_with("commit ")
        || line.starts_with("Diff of ")
    {
        Style::default()
            .fg(theme.text_bright)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme.text_normal)
    }
}

/// A rectangle centered in `area`, sized as a percentage of it.
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let width = (area.width.saturating_mul(percent_x) / 100).max(1);
    let height = (area.height.saturating_mul(percent_y) / 100).max(1);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

/// Expand tabs and replace control characters so lines render in place.
pub fn sanitize_line(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    for c in line.chars() {
        match c {
            '\t' => out.push_str("    "),
            '\x00'..='\x1f' | '\x7f' => out.push('\u{FFFD}'),
            _ => out.push(c),
        }
    }
    out
}
