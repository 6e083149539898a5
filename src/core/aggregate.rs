//! Union of all stage file sets into one dense path-by-stage table.

use std::collections::BTreeSet;

use super::analyzer::Analysis;
use super::refs::ResolutionError;
use super::repo::RelPath;
use super::stage::Stage;

/// Membership of a path in one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Presence {
    /// The stage touched the path.
    Present,
    /// The stage did not touch the path.
    Absent,
    /// The stage could not be computed.
    Unavailable,
}

impl Presence {
    /// Single-character cell marker.
    pub fn marker(self) -> &'static str {
        match self {
            Presence::Present => "x",
            Presence::Absent => " ",
            Presence::Unavailable => "-",
        }
    }
}

/// One path with its membership in every stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateRow {
    /// Repository-relative path.
    pub path: RelPath,
    /// Membership indexed by [`Stage::index`].
    pub cells: [Presence; Stage::COUNT],
}

impl AggregateRow {
    /// Membership in one stage.
    pub fn presence(&self, stage: Stage) -> Presence {
        self.cells[stage.index()]
    }

    /// Stages that touched this path, earliest first.
    pub fn stages(&self) -> impl Iterator<Item = Stage> + '_ {
        Stage::ALL
            .iter()
            .copied()
            .filter(|s| self.presence(*s) == Presence::Present)
    }
}

/// Sorted paths across all stages with dense per-stage membership.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AggregateView {
    rows: Vec<AggregateRow>,
    counts: [Option<usize>; Stage::COUNT],
    errors: Vec<(Stage, ResolutionError)>,
}

impl AggregateView {
    /// Aggregate an analysis pass.
    pub fn build(analysis: &Analysis) -> Self {
        let _timer = crate::metrics::Timer::start("aggregate");

        let mut all: BTreeSet<&RelPath> = BTreeSet::new();
        let mut counts = [None; Stage::COUNT];
        let mut errors = Vec::new();

        for (stage, outcome) in analysis.iter() {
            match outcome {
                Ok(result) => {
                    counts[stage.index()] = Some(result.files.len());
                    all.extend(result.files.iter());
                }
                Err(e) => errors.push((stage, e.clone())),
            }
        }

        let rows = all
            .into_iter()
            .map(|path| {
                let cells = Stage::ALL.map(|stage| match analysis.outcome(stage) {
                    Ok(result) if result.contains(path) => Presence::Present,
                    Ok(_) => Presence::Absent,
                    Err(_) => Presence::Unavailable,
                });
                AggregateRow {
                    path: path.clone(),
                    cells,
                }
            })
            .collect();

        Self {
            rows,
            counts,
            errors,
        }
    }

    /// Rows in lexicographic path order.
    pub fn rows(&self) -> &[AggregateRow] {
        &self.rows
    }

    /// Number of distinct paths.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether no stage touched any path.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Look up the row for a path.
    pub fn row(&self, path: &RelPath) -> Option<&AggregateRow> {
        self.rows
            .binary_search_by(|r| r.path.cmp(path))
            .ok()
            .map(|i| &self.rows[i])
    }

    /// Membership of a path in a stage; paths outside the view are absent.
    pub fn presence(&self, path: &RelPath, stage: Stage) -> Presence {
        self.row(path)
            .map(|r| r.presence(stage))
            .unwrap_or(Presence::Absent)
    }

    /// Files in a stage, or `None` when the stage is unavailable.
    pub fn count(&self, stage: Stage) -> Option<usize> {
        self.counts[stage.index()]
    }

    /// Stages that could not be resolved in this pass.
    pub fn errors(&self) -> &[(Stage, ResolutionError)] {
        &self.errors
    }
}
