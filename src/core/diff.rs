//! Lazy per-file diff retrieval for a single stage.
//!
//! Every lookup re-derives the stage from the live repository, so it can be
//! called at any time after the table was built. If the repository moved on
//! in between, the diff reflects the new state.

use super::analyzer::StageAnalyzer;
use super::repo::RelPath;
use super::stage::{Stage, StageDetail};

const LABEL_DIFF: &str = "stage_diff";
const LABEL_SHOW: &str = "stage_commit_diff";

/// Retrieves the diff a stage contributes to one file.
#[derive(Debug, Clone)]
pub struct DiffProvider {
    analyzer: StageAnalyzer,
}

impl DiffProvider {
    /// Create a provider backed by an analyzer.
    pub fn new(analyzer: StageAnalyzer) -> Self {
        Self { analyzer }
    }

    /// Diff text for `path` within `stage`.
    ///
    /// Returns `None` when the path is not part of the stage, the stage is
    /// unavailable, or git produced no output.
    pub fn diff(&self, stage: Stage, path: &RelPath) -> Option<String> {
        let _timer = crate::metrics::Timer::start("stage_diff");
        let result = self.analyzer.analyze(stage).ok()?;
        if !result.contains(path) {
            return None;
        }

        let config = self.analyzer.config();
        let text = match stage {
            Stage::Unstaged => self.range_diff(&[], path),
            Stage::Staged => self.range_diff(&["--cached"], path),
            Stage::CommittedNotPushed => self.range_diff(&[config.not_pushed_range().as_str()], path),
            Stage::PushedNotMerged => {
                let mut out = String::new();
                for commit in result.attribution(path).unwrap_or_default() {
                    let body = self
                        .analyzer
                        .git()
                        .run(
                            LABEL_SHOW,
                            &["show", commit.as_str(), "--", path.as_str()],
                        )
                        .into_lines();
                    if !out.is_empty() {
                        out.push('\n');
                    }
                    out.push_str(&format!("Diff of {}\n", commit));
                    out.push_str(&body.join("\n"));
                }
                out
            }
            Stage::MergedNotReleased | Stage::InLastRelease | Stage::InPreviousRelease => {
                let range = match &result.detail {
                    StageDetail::Floor(tag) => format!("{}..{}", tag, config.main_head()),
                    StageDetail::Release(range) => range.revspec(),
                    _ => return None,
                };
                self.range_diff(&[range.as_str()], path)
            }
        };

        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// Diffs of every stage that touched `path`, each under a stage heading.
    pub fn diff_all(&self, path: &RelPath) -> Vec<(Stage, String)> {
        Stage::ALL
            .iter()
            .filter_map(|&stage| self.diff(stage, path).map(|d| (stage, d)))
            .collect()
    }

    fn range_diff(&self, extra: &[&str], path: &RelPath) -> String {
        let mut args = vec!["diff"];
        args.extend_from_slice(extra);
        args.push("--");
        args.push(path.as_str());
        self.analyzer
            .git()
            .run(LABEL_DIFF, &args)
            .into_lines()
            .join("\n")
    }
}
