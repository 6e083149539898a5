//! Input handling.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::app::{App, Column, Mode};

/// Lines moved by PageUp/PageDown.
const PAGE: isize = 20;

/// Handle a crossterm event.
/// Returns true if the event was handled.
pub fn handle_input(app: &mut App, event: Event) -> bool {
    match event {
        Event::Key(key) if key.kind != KeyEventKind::Release => handle_key(app, key),
        _ => false,
    }
}

/// Handle a key event.
fn handle_key(app: &mut App, key: KeyEvent) -> bool {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return true;
    }

    match app.ui.mode {
        Mode::Normal => handle_table_key(app, key),
        Mode::Diff => handle_diff_key(app, key),
        Mode::Help => handle_help_key(app, key),
    }
}

/// Handle keys when the table is focused.
fn handle_table_key(app: &mut App, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Char('q') => {
            app.should_quit = true;
            true
        }
        KeyCode::Char('j') | KeyCode::Down => {
            app.move_row(1);
            true
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.move_row(-1);
            true
        }
        KeyCode::Char('h') | KeyCode::Left => {
            app.move_col(-1);
            true
        }
        KeyCode::Char('l') | KeyCode::Right => {
            app.move_col(1);
            true
        }
        KeyCode::PageDown => {
            app.move_row(PAGE);
            true
        }
        KeyCode::PageUp => {
            app.move_row(-PAGE);
            true
        }
        KeyCode::Char('g') | KeyCode::Home => {
            app.first_row();
            true
        }
        KeyCode::Char('G') | KeyCode::End => {
            app.last_row();
            true
        }
        KeyCode::Char('0') => {
            app.reset_sort();
            true
        }
        KeyCode::Char(c @ '1'..='8') => {
            let index = c as usize - '1' as usize;
            match Column::at(index) {
                Some(column) => {
                    app.sort_by(column);
                    true
                }
                None => false,
            }
        }
        KeyCode::Enter => {
            app.open_diff();
            true
        }
        KeyCode::Char('r') => {
            app.reload();
            true
        }
        KeyCode::Char('?') => {
            app.toggle_help();
            true
        }
        _ => false,
    }
}

/// Handle keys when the diff overlay is open.
fn handle_diff_key(app: &mut App, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Enter => {
            app.close_diff();
            true
        }
        KeyCode::Char('j') | KeyCode::Down => {
            app.scroll_diff(1);
            true
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.scroll_diff(-1);
            true
        }
        KeyCode::PageDown | KeyCode::Char(' ') => {
            app.scroll_diff(PAGE);
            true
        }
        KeyCode::PageUp => {
            app.scroll_diff(-PAGE);
            true
        }
        KeyCode::Char('g') => {
            app.diff_top();
            true
        }
        KeyCode::Char('G') => {
            app.diff_bottom();
            true
        }
        _ => false,
    }
}

/// Handle keys while the help overlay is shown.
fn handle_help_key(app: &mut App, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q') => {
            app.toggle_help();
            true
        }
        _ => false,
    }
}
