//! Non-interactive summary output.

use std::fmt::Write as _;
use std::process::ExitCode;

use serde::Serialize;

use crate::core::{
    AggregateView, Analysis, EnvironmentIndex, GitRef, Stage, StageAnalyzer, StageResult,
};

/// What the summary should include.
#[derive(Debug, Clone, Default)]
pub struct SummaryOptions {
    /// List every file under its stage.
    pub verbose: bool,
    /// Emit JSON instead of text.
    pub json: bool,
    /// Extra commits to inspect.
    pub commits: Vec<String>,
    /// Extra branch to inspect against the integration head.
    pub branch: Option<String>,
}

#[derive(Debug, Serialize)]
struct StageJson<'a> {
    stage: &'static str,
    description: &'static str,
    available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    tag: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    environments: Vec<String>,
    files: Vec<&'a str>,
    commits: Vec<&'a str>,
}

#[derive(Debug, Serialize)]
struct PathJson<'a> {
    path: &'a str,
    stages: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
struct InspectionJson<'a> {
    subject: String,
    files: Vec<&'a str>,
    commits: Vec<&'a str>,
}

#[derive(Debug, Serialize)]
struct SummaryJson<'a> {
    stages: Vec<StageJson<'a>>,
    paths: Vec<PathJson<'a>>,
    inspections: Vec<InspectionJson<'a>>,
}

fn stage_heading(stage: Stage, result: Option<&StageResult>) -> String {
    match result.and_then(StageResult::tag) {
        Some(tag) => format!("{} {}", stage.label(), tag),
        None => stage.label().to_string(),
    }
}

/// Render the per-stage text summary.
pub fn format_summary(
    analysis: &Analysis,
    environments: &EnvironmentIndex,
    verbose: bool,
) -> String {
    let mut out = String::new();
    for (stage, outcome) in analysis.iter() {
        match outcome {
            Ok(result) => {
                let heading = stage_heading(stage, Some(result));
                let envs = environments.annotation(result);
                if verbose {
                    for path in &result.files {
                        let _ = writeln!(out, "Stage {}: {}", stage.label(), path);
                    }
                }
                let _ = writeln!(
                    out,
                    "Stage {}{}: {} files modified.",
                    heading,
                    envs,
                    result.files.len()
                );
            }
            Err(e) => {
                let _ = writeln!(out, "Stage {}: unavailable ({}).", stage.label(), e);
            }
        }
    }
    out
}

/// Render the result of an ad hoc inspection.
pub fn format_inspection(subject: &str, result: &StageResult) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}: {} files, {} commits.",
        subject,
        result.files.len(),
        result.commits.len()
    );
    for path in &result.files {
        let _ = writeln!(out, "  {}", path);
    }
    out
}

fn summary_json<'a>(
    analysis: &'a Analysis,
    view: &'a AggregateView,
    environments: &EnvironmentIndex,
    inspections: &'a [(String, StageResult)],
) -> SummaryJson<'a> {
    let stages = analysis
        .iter()
        .map(|(stage, outcome)| {
            let result = outcome.as_ref().ok();
            StageJson {
                stage: stage.label(),
                description: stage.description(),
                available: result.is_some(),
                tag: result.and_then(StageResult::tag).map(GitRef::as_str),
                error: outcome.as_ref().err().map(|e| e.to_string()),
                environments: result
                    .map(|r| environments.environments_for(r).into_iter().collect())
                    .unwrap_or_default(),
                files: result
                    .map(|r| r.files.iter().map(|p| p.as_str()).collect())
                    .unwrap_or_default(),
                commits: result
                    .map(|r| r.commits.iter().map(GitRef::as_str).collect())
                    .unwrap_or_default(),
            }
        })
        .collect();

    let paths = view
        .rows()
        .iter()
        .map(|row| PathJson {
            path: row.path.as_str(),
            stages: row.stages().map(Stage::label).collect(),
        })
        .collect();

    let inspections = inspections
        .iter()
        .map(|(subject, result)| InspectionJson {
            subject: subject.clone(),
            files: result.files.iter().map(|p| p.as_str()).collect(),
            commits: result.commits.iter().map(GitRef::as_str).collect(),
        })
        .collect();

    SummaryJson {
        stages,
        paths,
        inspections,
    }
}

/// Analyze once and print a summary to stdout.
pub fn run_summary(
    analyzer: &StageAnalyzer,
    environments: &EnvironmentIndex,
    opts: &SummaryOptions,
) -> ExitCode {
    let analysis = analyzer.analyze_all();
    let view = AggregateView::build(&analysis);

    let mut inspections = Vec::new();
    if !opts.commits.is_empty() {
        let commits: Vec<GitRef> = opts.commits.iter().map(|c| GitRef::new(c.as_str())).collect();
        inspections.push((
            format!("Commits {}", opts.commits.join(" ")),
            analyzer.inspect_commits(&commits),
        ));
    }
    if let Some(branch) = &opts.branch {
        inspections.push((
            format!("Branch {}", branch),
            analyzer.inspect_branch(branch),
        ));
    }

    if opts.json {
        let doc = summary_json(&analysis, &view, environments, &inspections);
        match serde_json::to_string_pretty(&doc) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::from(1);
            }
        }
    } else {
        print!("{}", format_summary(&analysis, environments, opts.verbose));
        for (subject, result) in &inspections {
            print!("{}", format_inspection(subject, result));
        }
        println!("{} files across all stages.", view.len());
    }

    ExitCode::SUCCESS
}
