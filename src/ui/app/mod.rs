//! Application state and lifecycle.

use std::sync::Arc;

use crate::core::{
    compress_path, AggregateRow, AggregateView, Analysis, EnvironmentIndex, EnvironmentSource,
    StageAnalyzer,
};
use crate::theme::Theme;

use super::worker::{index_environments, WorkerResponse};

mod navigation;
mod overlay;
mod state;
mod worker_state;

pub use state::{Column, DiffOverlay, Mode, SortKey, TableState, UiState};
use worker_state::WorkerState;

/// Application state.
pub struct App {
    /// Stage analyzer for the repository.
    pub analyzer: StageAnalyzer,
    /// Latest analysis.
    pub analysis: Analysis,
    /// Aggregated table built from `analysis`.
    pub view: AggregateView,
    /// Environment annotations for the latest analysis.
    pub environments: EnvironmentIndex,
    /// Table navigation and sort state.
    pub table: TableState,
    /// Diff overlay contents.
    pub overlay: DiffOverlay,
    /// UI state (mode, messages).
    pub ui: UiState,
    /// Current color theme.
    pub theme: Theme,
    /// Should the app quit?
    pub should_quit: bool,

    worker: WorkerState,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("rows", &self.view.len())
            .field("table", &self.table)
            .field("ui", &self.ui)
            .finish_non_exhaustive()
    }
}

impl App {
    /// Analyze the repository once and set up the background worker.
    pub fn new(
        analyzer: StageAnalyzer,
        environments: Option<Arc<dyn EnvironmentSource>>,
        theme_name: Option<&str>,
    ) -> anyhow::Result<Self> {
        let theme = Theme::load(theme_name.unwrap_or("default"));

        let analysis = {
            let _timer = crate::metrics::Timer::start("initial_analysis");
            analyzer.analyze_all()
        };
        let env_index = index_environments(&analyzer, environments.as_deref());
        let worker = WorkerState::new(&analyzer, environments);

        let mut app = Self {
            view: AggregateView::build(&analysis),
            analyzer,
            analysis,
            environments: env_index,
            table: TableState::default(),
            overlay: DiffOverlay::default(),
            ui: UiState {
                dirty: true,
                ..Default::default()
            },
            theme,
            should_quit: false,
            worker,
        };
        app.rebuild_rows();
        app.report_resolution_errors();
        Ok(app)
    }

    /// Whether the worker has outstanding requests.
    pub fn is_loading(&self) -> bool {
        self.worker.loading()
    }

    /// The aggregate row under the cursor.
    pub fn selected_row(&self) -> Option<&AggregateRow> {
        let idx = *self.table.order.get(self.table.selected_row)?;
        self.view.rows().get(idx)
    }

    /// The column under the cursor.
    pub fn selected_column(&self) -> Column {
        Column::at(self.table.selected_col).unwrap_or(Column::File)
    }

    /// Ask the worker to re-run the analysis.
    pub fn reload(&mut self) {
        let id = self.worker.next_id();
        let Some(tx) = &self.worker.worker.request_tx else {
            return;
        };
        if tx
            .send(super::worker::WorkerRequest::Analyze { id })
            .is_ok()
        {
            self.worker.pending_analysis_id = Some(id);
            self.ui.status = Some("Reloading...".to_string());
        } else {
            self.ui.error = Some("Background worker stopped".to_string());
        }
        self.ui.dirty = true;
    }

    /// Apply any finished worker responses.
    pub fn poll_worker(&mut self) {
        while let Ok(response) = self.worker.worker.response_rx.try_recv() {
            match response {
                WorkerResponse::Analyzed {
                    id,
                    analysis,
                    environments,
                } => {
                    if self.worker.pending_analysis_id != Some(id) {
                        continue;
                    }
                    self.worker.pending_analysis_id = None;
                    self.apply_analysis(analysis, environments);
                    self.ui.status = Some(format!("Reloaded: {} files", self.view.len()));
                }
                WorkerResponse::Diff { id, path, sections } => {
                    if self.worker.pending_diff_id != Some(id) {
                        continue;
                    }
                    self.worker.pending_diff_id = None;
                    self.apply_diff(path, sections);
                }
            }
            self.ui.dirty = true;
        }
    }

    /// Help overlay toggle.
    pub fn toggle_help(&mut self) {
        self.ui.mode = match self.ui.mode {
            Mode::Help => Mode::Normal,
            _ => Mode::Help,
        };
        self.ui.dirty = true;
    }

    /// Mark dirty for redraw.
    pub fn mark_dirty(&mut self) {
        self.ui.dirty = true;
    }

    /// Clear dirty flag after drawing.
    pub fn clear_dirty(&mut self) {
        self.ui.dirty = false;
    }

    fn apply_analysis(&mut self, analysis: Analysis, environments: EnvironmentIndex) {
        let selected = self.selected_row().map(|row| row.path.clone());

        self.view = AggregateView::build(&analysis);
        self.analysis = analysis;
        self.environments = environments;
        self.rebuild_rows();

        // Keep the cursor on the same file when it is still listed.
        if let Some(path) = selected {
            if let Some(pos) = self
                .table
                .order
                .iter()
                .position(|&i| self.view.rows()[i].path == path)
            {
                self.table.selected_row = pos;
            }
        }
        self.clamp_selection();
        self.report_resolution_errors();
    }

    fn rebuild_rows(&mut self) {
        self.table.path_cache = self
            .view
            .rows()
            .iter()
            .map(|row| compress_path(row.path.as_str()))
            .collect();
        self.apply_sort();
    }

    fn report_resolution_errors(&mut self) {
        let errors = self.view.errors();
        self.ui.error = if errors.is_empty() {
            None
        } else {
            let parts: Vec<String> = errors
                .iter()
                .map(|(stage, e)| format!("{}: {}", stage.label(), e))
                .collect();
            Some(parts.join("; "))
        };
    }
}
