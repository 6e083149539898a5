use std::cmp::Ordering;

use super::{App, Column, SortKey};
use crate::core::{AggregateRow, Presence};

fn presence_rank(p: Presence) -> u8 {
    match p {
        Presence::Present => 0,
        Presence::Absent => 1,
        Presence::Unavailable => 2,
    }
}

fn compare_rows(a: &AggregateRow, b: &AggregateRow, column: Column) -> Ordering {
    match column {
        Column::File => a.path.cmp(&b.path),
        Column::Stage(stage) => presence_rank(a.presence(stage))
            .cmp(&presence_rank(b.presence(stage)))
            .then_with(|| a.path.cmp(&b.path)),
    }
}

impl App {
    /// Move the row cursor by `delta`, clamped to the table.
    pub fn move_row(&mut self, delta: isize) {
        let len = self.table.order.len();
        if len == 0 {
            return;
        }
        let next = self
            .table
            .selected_row
            .saturating_add_signed(delta)
            .min(len - 1);
        if next != self.table.selected_row {
            self.table.selected_row = next;
            self.ui.dirty = true;
        }
    }

    /// Jump to the first row.
    pub fn first_row(&mut self) {
        self.table.selected_row = 0;
        self.ui.dirty = true;
    }

    /// Jump to the last row.
    pub fn last_row(&mut self) {
        self.table.selected_row = self.table.order.len().saturating_sub(1);
        self.ui.dirty = true;
    }

    /// Move the column cursor by `delta`, clamped to the table.
    pub fn move_col(&mut self, delta: isize) {
        let next = self
            .table
            .selected_col
            .saturating_add_signed(delta)
            .min(Column::COUNT - 1);
        if next != self.table.selected_col {
            self.table.selected_col = next;
            self.ui.dirty = true;
        }
    }

    /// Sort on a column, flipping direction when it is already the sort column.
    pub fn sort_by(&mut self, column: Column) {
        let descending = match self.table.sort {
            Some(key) if key.column == column => !key.descending,
            _ => false,
        };
        self.table.sort = Some(SortKey { column, descending });
        self.resort_keeping_selection();
        self.ui.status = Some(format!(
            "Sorted by {}{}",
            match column {
                Column::File => "file",
                Column::Stage(stage) => stage.label(),
            },
            if descending { " (desc)" } else { "" }
        ));
    }

    /// Back to path order.
    pub fn reset_sort(&mut self) {
        self.table.sort = None;
        self.resort_keeping_selection();
        self.ui.status = None;
    }

    fn resort_keeping_selection(&mut self) {
        let selected = self.table.order.get(self.table.selected_row).copied();
        self.apply_sort();
        if let Some(idx) = selected {
            if let Some(pos) = self.table.order.iter().position(|&i| i == idx) {
                self.table.selected_row = pos;
            }
        }
        self.ui.dirty = true;
    }

    /// Recompute the display order from the current sort key.
    pub(super) fn apply_sort(&mut self) {
        let rows = self.view.rows();
        let mut order: Vec<usize> = (0..rows.len()).collect();
        if let Some(key) = self.table.sort {
            order.sort_by(|&a, &b| {
                let ord = compare_rows(&rows[a], &rows[b], key.column);
                if key.descending {
                    ord.reverse()
                } else {
                    ord
                }
            });
        }
        self.table.order = order;
        self.clamp_selection();
    }

    pub(super) fn clamp_selection(&mut self) {
        let len = self.table.order.len();
        if self.table.selected_row >= len {
            self.table.selected_row = len.saturating_sub(1);
        }
        if self.table.scroll > self.table.selected_row {
            self.table.scroll = self.table.selected_row;
        }
    }

    /// Adjust the scroll offset so the cursor row fits in `height` rows.
    pub fn ensure_row_visible(&mut self, height: usize) {
        if height == 0 {
            return;
        }
        let row = self.table.selected_row;
        if row < self.table.scroll {
            self.table.scroll = row;
        } else if row >= self.table.scroll + height {
            self.table.scroll = row + 1 - height;
        }
    }
}
