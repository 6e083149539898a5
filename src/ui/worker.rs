//! Background worker for stage analysis and per-cell diffs.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::core::{
    Analysis, DiffProvider, EnvironmentIndex, EnvironmentSource, RelPath, Stage, StageAnalyzer,
};

#[derive(Debug, Clone)]
pub(crate) enum WorkerRequest {
    Analyze {
        id: u64,
    },
    Diff {
        id: u64,
        path: RelPath,
        stages: Vec<Stage>,
    },
}

#[derive(Debug)]
pub(crate) enum WorkerResponse {
    Analyzed {
        id: u64,
        analysis: Analysis,
        environments: EnvironmentIndex,
    },
    Diff {
        id: u64,
        path: RelPath,
        sections: Vec<(Stage, String)>,
    },
}

pub(crate) struct StageWorker {
    pub request_tx: Option<Sender<WorkerRequest>>,
    pub response_rx: Receiver<WorkerResponse>,
    handle: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for StageWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageWorker")
            .field("request_tx", &self.request_tx)
            .field("handle", &self.handle.as_ref().map(|_| "..."))
            .finish()
    }
}

pub(crate) fn spawn_stage_worker(
    analyzer: StageAnalyzer,
    environments: Option<Arc<dyn EnvironmentSource>>,
) -> StageWorker {
    let (request_tx, request_rx) = mpsc::channel::<WorkerRequest>();
    let (response_tx, response_rx) = mpsc::channel::<WorkerResponse>();

    let handle =
        thread::spawn(move || worker_loop(analyzer, environments, request_rx, response_tx));

    StageWorker {
        request_tx: Some(request_tx),
        response_rx,
        handle: Some(handle),
    }
}

impl Drop for StageWorker {
    fn drop(&mut self) {
        // Closing the request channel ends worker_loop.
        self.request_tx.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Build the environment annotations for a fresh analysis.
pub(crate) fn index_environments(
    analyzer: &StageAnalyzer,
    environments: Option<&dyn EnvironmentSource>,
) -> EnvironmentIndex {
    EnvironmentIndex::build(environments, &analyzer.resolver())
}

fn worker_loop(
    analyzer: StageAnalyzer,
    environments: Option<Arc<dyn EnvironmentSource>>,
    request_rx: Receiver<WorkerRequest>,
    response_tx: Sender<WorkerResponse>,
) {
    let provider = DiffProvider::new(analyzer.clone());

    while let Ok(first) = request_rx.recv() {
        // Keep only the newest request of each kind.
        let mut analyze = None;
        let mut diff = None;
        let mut next = Some(first);
        while let Some(req) = next {
            match req {
                WorkerRequest::Analyze { .. } => analyze = Some(req),
                WorkerRequest::Diff { .. } => diff = Some(req),
            }
            next = request_rx.try_recv().ok();
        }

        for req in [analyze, diff].into_iter().flatten() {
            let response = match req {
                WorkerRequest::Analyze { id } => {
                    tracing::debug!(id, "worker: analyzing");
                    let analysis = analyzer.analyze_all();
                    let environments = index_environments(&analyzer, environments.as_deref());
                    WorkerResponse::Analyzed {
                        id,
                        analysis,
                        environments,
                    }
                }
                WorkerRequest::Diff { id, path, stages } => {
                    tracing::debug!(id, path = %path, "worker: loading diff");
                    let sections = stages
                        .into_iter()
                        .filter_map(|stage| provider.diff(stage, &path).map(|d| (stage, d)))
                        .collect();
                    WorkerResponse::Diff { id, path, sections }
                }
            };
            if response_tx.send(response).is_err() {
                return;
            }
        }
    }
}
