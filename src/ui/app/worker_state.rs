use std::sync::Arc;

use super::super::worker::{spawn_stage_worker, StageWorker};
use crate::core::{EnvironmentSource, StageAnalyzer};

pub(super) struct WorkerState {
    pub(super) worker: StageWorker,
    pub(super) next_request_id: u64,
    pub(super) pending_analysis_id: Option<u64>,
    pub(super) pending_diff_id: Option<u64>,
}

impl WorkerState {
    pub(super) fn new(
        analyzer: &StageAnalyzer,
        environments: Option<Arc<dyn EnvironmentSource>>,
    ) -> Self {
        Self {
            worker: spawn_stage_worker(analyzer.clone(), environments),
            next_request_id: 1,
            pending_analysis_id: None,
            pending_diff_id: None,
        }
    }

    pub(super) fn next_id(&mut self) -> u64 {
        let id = self.next_request_id;
        self.next_request_id += 1;
        id
    }

    pub(super) fn loading(&self) -> bool {
        self.pending_analysis_id.is_some() || self.pending_diff_id.is_some()
    }
}
