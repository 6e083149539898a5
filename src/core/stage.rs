//! Lifecycle stages and per-stage analysis results.

use std::collections::{BTreeMap, BTreeSet};

use super::refs::{ReleaseRange, ResolutionError};
use super::repo::{GitRef, RelPath};

/// A point in the lifecycle a file's changes may have reached.
///
/// Ordered earliest-first; the order only matters for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    /// Working tree differs from the index.
    Unstaged,
    /// Index differs from HEAD.
    Staged,
    /// Local commits not yet on the personal branch's upstream.
    CommittedNotPushed,
    /// Pushed commits not yet applied to the integration branch.
    PushedNotMerged,
    /// On the integration branch but newer than the latest release tag.
    MergedNotReleased,
    /// Between the two most recent release tags.
    InLastRelease,
    /// One release further back.
    InPreviousRelease,
}

impl Stage {
    /// Number of stages.
    pub const COUNT: usize = 7;

    /// All stages in display order.
    pub const ALL: [Stage; Stage::COUNT] = [
        Stage::Unstaged,
        Stage::Staged,
        Stage::CommittedNotPushed,
        Stage::PushedNotMerged,
        Stage::MergedNotReleased,
        Stage::InLastRelease,
        Stage::InPreviousRelease,
    ];

    /// Short column label.
    pub fn label(self) -> &'static str {
        match self {
            Stage::Unstaged => "unstaged",
            Stage::Staged => "staged",
            Stage::CommittedNotPushed => "commit",
            Stage::PushedNotMerged => "review",
            Stage::MergedNotReleased => "main",
            Stage::InLastRelease => "prod",
            Stage::InPreviousRelease => "prod-1",
        }
    }

    /// Human-readable description for help text.
    pub fn description(self) -> &'static str {
        match self {
            Stage::Unstaged => "modified in the working tree, not staged",
            Stage::Staged => "staged, not committed",
            Stage::CommittedNotPushed => "committed, not pushed",
            Stage::PushedNotMerged => "pushed, not merged",
            Stage::MergedNotReleased => "merged, not released",
            Stage::InLastRelease => "in the last production release",
            Stage::InPreviousRelease => "in the previous production release",
        }
    }

    /// Position in [`Stage::ALL`].
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// How many releases back a release stage looks (1 = newest).
    pub fn release_rank(self) -> Option<usize> {
        match self {
            Stage::InLastRelease => Some(1),
            Stage::InPreviousRelease => Some(2),
            _ => None,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Stage-specific extras carried alongside the common file/commit sets.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StageDetail {
    /// Nothing beyond files and commits.
    #[default]
    None,
    /// Which commits touched each path.
    Attribution(BTreeMap<RelPath, Vec<GitRef>>),
    /// Latest release tag used as the lower bound of the range.
    Floor(GitRef),
    /// Tag pair bounding a release.
    Release(ReleaseRange),
}

/// Files and commits found for one stage.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StageResult {
    /// Changed paths, deduplicated.
    pub files: BTreeSet<RelPath>,
    /// Contributing commits, newest first, no duplicates.
    pub commits: Vec<GitRef>,
    /// Stage-specific metadata.
    pub detail: StageDetail,
}

impl StageResult {
    /// Result with the given files and no commits.
    pub fn with_files(files: impl IntoIterator<Item = RelPath>) -> Self {
        Self {
            files: files.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Whether the stage touched `path`.
    pub fn contains(&self, path: &RelPath) -> bool {
        self.files.contains(path)
    }

    /// Append a commit unless it is already listed.
    pub fn push_commit(&mut self, commit: GitRef) {
        if !self.commits.contains(&commit) {
            self.commits.push(commit);
        }
    }

    /// The tag this stage is anchored on, if any.
    pub fn tag(&self) -> Option<&GitRef> {
        match &self.detail {
            StageDetail::Floor(tag) => Some(tag),
            StageDetail::Release(range) => Some(&range.newer),
            _ => None,
        }
    }

    /// Commits that introduced `path`, for stages tracking attribution.
    pub fn attribution(&self, path: &RelPath) -> Option<&[GitRef]> {
        match &self.detail {
            StageDetail::Attribution(map) => map.get(path).map(Vec::as_slice),
            _ => None,
        }
    }
}

/// A stage result, or the reason the stage could not be computed.
pub type StageOutcome = Result<StageResult, ResolutionError>;
