use crate::core::{RelPath, Stage};

/// UI mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Table navigation.
    #[default]
    Normal,
    /// Diff overlay open.
    Diff,
    /// Viewing help overlay.
    Help,
}

/// A table column: the file path or one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    /// The path column.
    File,
    /// A stage column.
    Stage(Stage),
}

impl Column {
    /// Number of columns in the table.
    pub const COUNT: usize = Stage::COUNT + 1;

    /// Column at a 0-based position, `File` first.
    pub fn at(index: usize) -> Option<Self> {
        match index {
            0 => Some(Column::File),
            i => Stage::ALL.get(i - 1).copied().map(Column::Stage),
        }
    }

    /// 0-based position of this column.
    pub fn index(self) -> usize {
        match self {
            Column::File => 0,
            Column::Stage(stage) => stage.index() + 1,
        }
    }
}

/// Row ordering requested by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    /// Column sorted on.
    pub column: Column,
    /// Reverse the natural order.
    pub descending: bool,
}

/// Table navigation state.
#[derive(Debug, Default)]
pub struct TableState {
    /// Selected position in `order`.
    pub selected_row: usize,
    /// Selected column index (0 is the path column).
    pub selected_col: usize,
    /// First visible row.
    pub scroll: usize,
    /// Active sort, `None` for path order.
    pub sort: Option<SortKey>,
    /// Indices into the aggregate rows in display order.
    pub order: Vec<usize>,
    /// Compressed path per aggregate row.
    pub path_cache: Vec<String>,
}

/// Diff overlay contents.
#[derive(Debug, Default)]
pub struct DiffOverlay {
    /// File the diff belongs to.
    pub path: Option<RelPath>,
    /// Stages requested for the overlay.
    pub stages: Vec<Stage>,
    /// Sections received from the worker.
    pub sections: Vec<(Stage, Vec<String>)>,
    /// Still waiting for the worker.
    pub loading: bool,
    /// Vertical scroll offset.
    pub scroll: usize,
}

impl DiffOverlay {
    /// Total number of display lines including section titles.
    pub fn line_count(&self) -> usize {
        self.sections.iter().map(|(_, lines)| lines.len() + 1).sum()
    }
}

/// UI mode and message state.
#[derive(Debug, Default)]
pub struct UiState {
    /// Current mode.
    pub mode: Mode,
    /// Error message.
    pub error: Option<String>,
    /// Status message.
    pub status: Option<String>,
    /// Dirty flag for redraw.
    pub dirty: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_positions_round_trip() {
        assert_eq!(Column::at(0), Some(Column::File));
        assert_eq!(Column::at(1), Some(Column::Stage(Stage::Unstaged)));
        assert_eq!(
            Column::at(Column::COUNT - 1),
            Some(Column::Stage(Stage::InPreviousRelease))
        );
        assert_eq!(Column::at(Column::COUNT), None);
        for i in 0..Column::COUNT {
            assert_eq!(Column::at(i).unwrap().index(), i);
        }
    }

    #[test]
    fn overlay_line_count_includes_titles() {
        let overlay = DiffOverlay {
            sections: vec![
                (Stage::Unstaged, vec!["+a".into(), "-b".into()]),
                (Stage::Staged, vec!["+c".into()]),
            ],
            ..Default::default()
        };
        assert_eq!(overlay.line_count(), 5);
    }
}
