use super::super::worker::WorkerRequest;
use super::{App, Column, DiffOverlay, Mode};
use crate::core::{Presence, RelPath, Stage};

impl App {
    /// Open the diff overlay for the cell under the cursor.
    ///
    /// On the path column every stage that lists the file is included.
    pub fn open_diff(&mut self) {
        let Some(row) = self.selected_row() else {
            return;
        };
        let path = row.path.clone();
        let stages: Vec<Stage> = match self.selected_column() {
            Column::File => row.stages().collect(),
            Column::Stage(stage) => match row.presence(stage) {
                Presence::Present => vec![stage],
                Presence::Absent => {
                    self.ui.status = Some(format!("{} is not in {}", path, stage.label()));
                    self.ui.dirty = true;
                    return;
                }
                Presence::Unavailable => {
                    self.ui.status = Some(format!("{} is unavailable", stage.label()));
                    self.ui.dirty = true;
                    return;
                }
            },
        };
        if stages.is_empty() {
            return;
        }
        self.request_diff(path, stages);
    }

    fn request_diff(&mut self, path: RelPath, stages: Vec<Stage>) {
        let id = self.worker.next_id();
        let Some(tx) = &self.worker.worker.request_tx else {
            return;
        };
        let request = WorkerRequest::Diff {
            id,
            path: path.clone(),
            stages: stages.clone(),
        };
        if tx.send(request).is_err() {
            self.ui.error = Some("Background worker stopped".to_string());
            self.ui.dirty = true;
            return;
        }

        self.worker.pending_diff_id = Some(id);
        self.overlay = DiffOverlay {
            path: Some(path),
            stages,
            sections: Vec::new(),
            loading: true,
            scroll: 0,
        };
        self.ui.mode = Mode::Diff;
        self.ui.dirty = true;
    }

    pub(super) fn apply_diff(&mut self, path: RelPath, sections: Vec<(Stage, String)>) {
        if self.overlay.path.as_ref() != Some(&path) {
            return;
        }
        self.overlay.sections = sections
            .into_iter()
            .map(|(stage, text)| (stage, text.lines().map(str::to_string).collect()))
            .collect();
        self.overlay.loading = false;
        self.overlay.scroll = 0;
    }

    /// Close the diff overlay.
    pub fn close_diff(&mut self) {
        if self.ui.mode == Mode::Diff {
            self.ui.mode = Mode::Normal;
            self.worker.pending_diff_id = None;
            self.overlay = DiffOverlay::default();
            self.ui.dirty = true;
        }
    }

    /// Scroll the overlay by `delta` lines.
    pub fn scroll_diff(&mut self, delta: isize) {
        let max = self.overlay.line_count().saturating_sub(1);
        let next = self.overlay.scroll.saturating_add_signed(delta).min(max);
        if next != self.overlay.scroll {
            self.overlay.scroll = next;
            self.ui.dirty = true;
        }
    }

    /// Scroll the overlay to its top.
    pub fn diff_top(&mut self) {
        self.overlay.scroll = 0;
        self.ui.dirty = true;
    }

    /// Scroll the overlay to its last line.
    pub fn diff_bottom(&mut self) {
        self.overlay.scroll = self.overlay.line_count().saturating_sub(1);
        self.ui.dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use super::*;
    use crate::core::scripted::ScriptedGit;
    use crate::core::{AnalyzerConfig, StageAnalyzer};

    fn app() -> App {
        let git = ScriptedGit::new()
            .on("diff --name-only -z", "a.txt\0")
            .on("diff --name-only -z --cached", "a.txt\0b.txt\0")
            .on("diff -- a.txt", "+work\n")
            .on("diff --cached -- a.txt", "+index\n-old\n");
        let analyzer = StageAnalyzer::new(Arc::new(git), AnalyzerConfig::default());
        App::new(analyzer, None, None).unwrap()
    }

    fn wait_for_overlay(app: &mut App) {
        let start = Instant::now();
        while start.elapsed() < Duration::from_secs(5) {
            app.poll_worker();
            if !app.overlay.loading {
                return;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        panic!("diff load timed out");
    }

    #[test]
    fn file_column_collects_every_stage() {
        let mut app = app();
        app.open_diff();
        assert_eq!(app.ui.mode, Mode::Diff);
        assert_eq!(app.overlay.stages, vec![Stage::Unstaged, Stage::Staged]);
        wait_for_overlay(&mut app);

        let stages: Vec<Stage> = app.overlay.sections.iter().map(|(s, _)| *s).collect();
        assert_eq!(stages, vec![Stage::Unstaged, Stage::Staged]);
        assert_eq!(app.overlay.sections[1].1, vec!["+index", "-old"]);
        assert_eq!(app.overlay.line_count(), 5);
    }

    #[test]
    fn absent_cell_does_not_open() {
        let mut app = app();
        app.move_row(1);
        app.move_col(1);
        app.open_diff();
        assert_eq!(app.ui.mode, Mode::Normal);
        assert!(app.ui.status.as_deref().unwrap().contains("not in unstaged"));
    }

    #[test]
    fn unavailable_cell_does_not_open() {
        let mut app = app();
        app.move_col(Stage::InLastRelease.index() as isize + 1);
        app.open_diff();
        assert_eq!(app.ui.mode, Mode::Normal);
        assert!(app.ui.status.as_deref().unwrap().contains("unavailable"));
    }

    #[test]
    fn scroll_clamps_and_close_resets() {
        let mut app = app();
        app.move_col(2);
        app.open_diff();
        wait_for_overlay(&mut app);
        app.scroll_diff(100);
        assert_eq!(app.overlay.scroll, 2);
        app.scroll_diff(-1);
        assert_eq!(app.overlay.scroll, 1);
        app.diff_top();
        assert_eq!(app.overlay.scroll, 0);

        app.close_diff();
        assert_eq!(app.ui.mode, Mode::Normal);
        assert!(app.overlay.path.is_none());
    }
}
