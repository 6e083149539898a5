//! Per-stage classification of changed files.
//!
//! Each stage is computed from a handful of git queries. Query failures read
//! as empty output; only a missing release tag or integration head makes a
//! stage unavailable.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::{info, warn};

use super::query::GitQuery;
use super::refs::{ReferenceResolver, ResolutionError, DEFAULT_TAG_EXCLUDES};
use super::repo::{GitRef, RelPath};
use super::stage::{Stage, StageDetail, StageOutcome, StageResult};

const LABEL_UNSTAGED: &str = "analyze_unstaged";
const LABEL_STAGED: &str = "analyze_staged";
const LABEL_NOT_PUSHED_FILES: &str = "analyze_not_pushed_files";
const LABEL_NOT_PUSHED_COMMITS: &str = "analyze_not_pushed_commits";
const LABEL_CHERRY: &str = "analyze_cherry";
const LABEL_COMMIT_FILES: &str = "analyze_commit_files";
const LABEL_MERGED_FILES: &str = "analyze_merged_files";
const LABEL_RANGE_COMMITS: &str = "analyze_range_commits";
const LABEL_RELEASE_FILES: &str = "analyze_release_files";
const LABEL_ADHOC_COMMIT: &str = "inspect_commit_files";
const LABEL_ADHOC_BRANCH: &str = "inspect_branch_files";

/// Branch and tag settings the analyzer works against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzerConfig {
    /// Integration branch name (e.g. `master`).
    pub main_branch: String,
    /// Personal branch name (e.g. `dev`).
    pub dev_branch: String,
    /// Remote hosting the integration branch. Empty means a local branch.
    pub main_remote: String,
    /// Remote the personal branch is pushed to. Empty means a local branch.
    pub dev_remote: String,
    /// Tags containing any of these fragments never bound a release.
    pub tag_exclude: Vec<String>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            main_branch: "master".to_string(),
            dev_branch: "dev".to_string(),
            main_remote: "upstream".to_string(),
            dev_remote: "origin".to_string(),
            tag_exclude: DEFAULT_TAG_EXCLUDES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

fn qualified(remote: &str, branch: &str) -> String {
    if remote.is_empty() {
        branch.to_string()
    } else {
        format!("{}/{}", remote, branch)
    }
}

impl AnalyzerConfig {
    /// Integration branch head, e.g. `upstream/master`.
    pub fn main_head(&self) -> String {
        qualified(&self.main_remote, &self.main_branch)
    }

    /// Pushed personal branch, e.g. `origin/dev`.
    pub fn dev_upstream(&self) -> String {
        qualified(&self.dev_remote, &self.dev_branch)
    }

    /// Range of local commits not on the pushed personal branch.
    pub fn not_pushed_range(&self) -> String {
        format!("{}..HEAD", self.dev_upstream())
    }
}

/// Outcomes of all seven stages from one analysis pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    outcomes: [StageOutcome; Stage::COUNT],
}

impl Analysis {
    /// Assemble an analysis from per-stage outcomes in [`Stage::ALL`] order.
    pub fn from_outcomes(outcomes: [StageOutcome; Stage::COUNT]) -> Self {
        Self { outcomes }
    }

    /// Outcome for one stage.
    pub fn outcome(&self, stage: Stage) -> &StageOutcome {
        &self.outcomes[stage.index()]
    }

    /// Result for one stage, if it was available.
    pub fn result(&self, stage: Stage) -> Option<&StageResult> {
        self.outcome(stage).as_ref().ok()
    }

    /// Iterate stages with their outcomes.
    pub fn iter(&self) -> impl Iterator<Item = (Stage, &StageOutcome)> {
        Stage::ALL.iter().copied().zip(self.outcomes.iter())
    }

    /// Stages that could not be resolved, with the reason.
    pub fn resolution_errors(&self) -> Vec<(Stage, &ResolutionError)> {
        self.iter()
            .filter_map(|(stage, outcome)| outcome.as_ref().err().map(|e| (stage, e)))
            .collect()
    }
}

/// Computes stage results against one repository.
#[derive(Clone)]
pub struct StageAnalyzer {
    git: Arc<dyn GitQuery>,
    config: AnalyzerConfig,
}

impl std::fmt::Debug for StageAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageAnalyzer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl StageAnalyzer {
    /// Create an analyzer over a query runner.
    pub fn new(git: Arc<dyn GitQuery>, config: AnalyzerConfig) -> Self {
        Self { git, config }
    }

    /// Branch settings in use.
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Query runner in use.
    pub fn git(&self) -> &dyn GitQuery {
        self.git.as_ref()
    }

    /// Resolver sharing this analyzer's runner and tag exclusions.
    pub fn resolver(&self) -> ReferenceResolver<'_> {
        ReferenceResolver::new(self.git.as_ref(), &self.config.tag_exclude)
    }

    /// Run a `--name-only -z` listing. Paths are taken verbatim, never C-quoted.
    fn paths(&self, label: &'static str, args: &[&str]) -> BTreeSet<RelPath> {
        self.git
            .run(label, args)
            .into_records()
            .into_iter()
            .map(RelPath::new)
            .collect()
    }

    fn commits(&self, label: &'static str, args: &[&str]) -> Vec<GitRef> {
        self.git
            .run(label, args)
            .into_lines()
            .into_iter()
            .map(GitRef::new)
            .collect()
    }

    /// Files changed in a single commit.
    fn commit_paths(&self, label: &'static str, commit: &GitRef) -> BTreeSet<RelPath> {
        self.paths(
            label,
            &[
                "diff-tree",
                "--no-commit-id",
                "--name-only",
                "-z",
                "-r",
                commit.as_str(),
            ],
        )
    }

    /// Working tree vs index.
    pub fn unstaged(&self) -> StageResult {
        StageResult::with_files(self.paths(LABEL_UNSTAGED, &["diff", "--name-only", "-z"]))
    }

    /// Index vs HEAD.
    pub fn staged(&self) -> StageResult {
        StageResult::with_files(self.paths(
            LABEL_STAGED,
            &["diff", "--name-only", "-z", "--cached"],
        ))
    }

    /// Local commits not yet on the pushed personal branch.
    pub fn committed_not_pushed(&self) -> StageResult {
        let range = self.config.not_pushed_range();
        let mut result = StageResult::with_files(self.paths(
            LABEL_NOT_PUSHED_FILES,
            &["diff", "--name-only", "-z", &range],
        ));
        for commit in self.commits(LABEL_NOT_PUSHED_COMMITS, &["log", "--format=%H", &range]) {
            result.push_commit(commit);
        }
        result
    }

    /// Commits not yet applied to the integration branch, excluding local ones.
    ///
    /// `git cherry` marks commits with no equivalent upstream as `+`. It also
    /// reports commits that exist only locally, so those already counted in
    /// `not_pushed` are subtracted.
    pub fn pushed_not_merged(&self, not_pushed: &StageResult) -> StageResult {
        let main_head = self.config.main_head();
        let lines = self
            .git
            .run(LABEL_CHERRY, &["cherry", &main_head])
            .into_lines();

        // cherry lists oldest first
        let unmerged: Vec<GitRef> = parse_cherry(&lines)
            .into_iter()
            .rev()
            .filter(|c| !not_pushed.commits.contains(c))
            .collect();

        let mut result = StageResult::default();
        let mut attribution: BTreeMap<RelPath, Vec<GitRef>> = BTreeMap::new();
        for commit in unmerged {
            for path in self.commit_paths(LABEL_COMMIT_FILES, &commit) {
                attribution.entry(path.clone()).or_default().push(commit.clone());
                result.files.insert(path);
            }
            result.push_commit(commit);
        }
        result.detail = StageDetail::Attribution(attribution);
        result
    }

    /// Integration branch changes since the latest release tag.
    pub fn merged_not_released(&self) -> StageOutcome {
        let resolver = self.resolver();
        let tag = resolver.latest_release()?;
        let main_head = self.config.main_head();
        let head = resolver.require(&main_head)?;
        let range = format!("{}..{}", tag, main_head);

        let mut result = StageResult::with_files(self.paths(
            LABEL_MERGED_FILES,
            &["diff", "--name-only", "-z", &range],
        ));
        result.push_commit(head);
        for commit in self.range_commits(&range) {
            result.push_commit(commit);
        }
        result.detail = StageDetail::Floor(tag);
        Ok(result)
    }

    /// Changes shipped in the `rank`-th most recent release (1 = newest).
    pub fn release(&self, rank: usize) -> StageOutcome {
        let resolver = self.resolver();
        let range = resolver.release_range(rank)?;
        let newer_commit = resolver.require(range.newer.as_str())?;
        let revspec = range.revspec();

        let mut result = StageResult::with_files(self.paths(
            LABEL_RELEASE_FILES,
            &["diff", "--name-only", "-z", &revspec],
        ));
        result.push_commit(newer_commit);
        for commit in self.range_commits(&revspec) {
            result.push_commit(commit);
        }
        result.detail = StageDetail::Release(range);
        Ok(result)
    }

    fn range_commits(&self, range: &str) -> Vec<GitRef> {
        self.commits(
            LABEL_RANGE_COMMITS,
            &["log", "--no-merges", "--format=%H", range],
        )
    }

    /// Compute a single stage from scratch.
    pub fn analyze(&self, stage: Stage) -> StageOutcome {
        let _timer = crate::metrics::Timer::start("analyze_stage");
        match stage {
            Stage::Unstaged => Ok(self.unstaged()),
            Stage::Staged => Ok(self.staged()),
            Stage::CommittedNotPushed => Ok(self.committed_not_pushed()),
            Stage::PushedNotMerged => {
                let not_pushed = self.committed_not_pushed();
                Ok(self.pushed_not_merged(&not_pushed))
            }
            Stage::MergedNotReleased => self.merged_not_released(),
            Stage::InLastRelease | Stage::InPreviousRelease => {
                self.release(stage.release_rank().unwrap_or(1))
            }
        }
    }

    /// Compute every stage, reusing the not-pushed result for the review stage.
    pub fn analyze_all(&self) -> Analysis {
        let _timer = crate::metrics::Timer::start("analyze_all");
        let not_pushed = self.committed_not_pushed();

        let outcomes = Stage::ALL.map(|stage| match stage {
            Stage::CommittedNotPushed => Ok(not_pushed.clone()),
            Stage::PushedNotMerged => Ok(self.pushed_not_merged(&not_pushed)),
            other => self.analyze(other),
        });
        let analysis = Analysis::from_outcomes(outcomes);

        for (stage, outcome) in analysis.iter() {
            match outcome {
                Ok(result) => info!(
                    stage = stage.label(),
                    files = result.files.len(),
                    commits = result.commits.len(),
                    "stage analyzed"
                ),
                Err(e) => warn!(stage = stage.label(), error = %e, "stage unavailable"),
            }
        }
        analysis
    }

    /// Files touched by an explicit list of commits.
    pub fn inspect_commits(&self, commits: &[GitRef]) -> StageResult {
        let mut result = StageResult::default();
        let mut attribution: BTreeMap<RelPath, Vec<GitRef>> = BTreeMap::new();
        for commit in commits {
            let parent = format!("{}^", commit);
            for path in self.paths(
                LABEL_ADHOC_COMMIT,
                &["diff", "--name-only", "-z", &parent, commit.as_str()],
            ) {
                attribution.entry(path.clone()).or_default().push(commit.clone());
                result.files.insert(path);
            }
            result.push_commit(commit.clone());
        }
        result.detail = StageDetail::Attribution(attribution);
        result
    }

    /// Files differing between a branch and the integration head, with the
    /// branch's commits not yet applied upstream.
    pub fn inspect_branch(&self, branch: &str) -> StageResult {
        let main_head = self.config.main_head();
        let range = format!("{}..{}", branch, main_head);
        let mut result = StageResult::with_files(self.paths(
            LABEL_ADHOC_BRANCH,
            &["diff", "--name-only", "-z", &range],
        ));
        let lines = self
            .git
            .run(LABEL_CHERRY, &["cherry", &main_head, branch])
            .into_lines();
        for commit in parse_cherry(&lines).into_iter().rev() {
            result.push_commit(commit);
        }
        result
    }
}

/// Commits `git cherry` reports as having no upstream equivalent.
pub fn parse_cherry(lines: &[String]) -> Vec<GitRef> {
    lines
        .iter()
        .filter_map(|line| line.strip_prefix("+ "))
        .map(str::trim)
        .filter(|sha| !sha.is_empty())
        .map(GitRef::new)
        .collect()
}
