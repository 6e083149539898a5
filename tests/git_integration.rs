//! Integration tests with real git repositories.

use std::path::Path;
use std::process::Command;
use std::sync::Arc;

use gitradar::core::{
    AggregateView, AnalyzerConfig, DiffProvider, GitCli, GitRef, Presence, QueryConfig, RelPath,
    RepoRoot, Stage, StageAnalyzer,
};
use tempfile::TempDir;

/// Run git in `path`, panicking on failure.
fn git(path: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(path)
        .env("GIT_CONFIG_NOSYSTEM", "1")
        .env("GIT_AUTHOR_DATE", "2024-01-01T00:00:00Z")
        .env("GIT_COMMITTER_DATE", "2024-01-01T00:00:00Z")
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).unwrap().trim().to_string()
}

/// Create an empty repository on `master`.
fn init_repo(path: &Path) {
    git(path, &["init", "-q"]);
    git(path, &["symbolic-ref", "HEAD", "refs/heads/master"]);
    git(path, &["config", "user.email", "test@test.com"]);
    git(path, &["config", "user.name", "Test"]);
    git(path, &["config", "commit.gpgsign", "false"]);
    git(path, &["config", "tag.gpgsign", "false"]);
}

fn create_test_repo() -> TempDir {
    let dir = TempDir::new().unwrap();
    init_repo(dir.path());
    dir
}

fn write(path: &Path, name: &str, content: &str) {
    let file = path.join(name);
    if let Some(parent) = file.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(file, content).unwrap();
}

/// Write `name`, stage it and commit. Returns the new commit id.
fn commit_file(path: &Path, name: &str, content: &str, message: &str) -> String {
    write(path, name, content);
    git(path, &["add", name]);
    git(path, &["commit", "-q", "-m", message]);
    git(path, &["rev-parse", "HEAD"])
}

fn analyzer_for(path: &Path) -> StageAnalyzer {
    let repo = RepoRoot::discover(path).unwrap();
    let git = Arc::new(GitCli::new(repo, QueryConfig::default()));
    StageAnalyzer::new(git, AnalyzerConfig::default())
}

fn rel(s: &str) -> RelPath {
    RelPath::new(s)
}

fn files(analyzer: &StageAnalyzer, stage: Stage) -> Vec<String> {
    analyzer
        .analyze(stage)
        .unwrap()
        .files
        .iter()
        .map(|p| p.as_str().to_string())
        .collect()
}

#[test]
fn test_repo_discovery_from_subdirectory() {
    let dir = create_test_repo();
    commit_file(dir.path(), "src/lib.rs", "fn main() {}\n", "initial");

    let repo = RepoRoot::discover(&dir.path().join("src")).unwrap();
    assert_eq!(repo.path(), dir.path().canonicalize().unwrap());
}

#[test]
fn test_discovery_outside_repo_fails() {
    let dir = TempDir::new().unwrap();
    assert!(RepoRoot::discover(dir.path()).is_err());
}

#[test]
fn test_release_stages_follow_newest_tags() {
    let dir = create_test_repo();
    let path = dir.path();
    commit_file(path, "a.txt", "a\n", "one");
    git(path, &["tag", "v1.0.0"]);
    commit_file(path, "b.txt", "b\n", "two");
    git(path, &["tag", "v1.1.0"]);
    commit_file(path, "c.txt", "c\n", "three");
    git(path, &["tag", "v1.2.0"]);

    let analyzer = analyzer_for(path);
    assert_eq!(files(&analyzer, Stage::InLastRelease), vec!["c.txt"]);
    assert_eq!(files(&analyzer, Stage::InPreviousRelease), vec!["b.txt"]);

    let last = analyzer.analyze(Stage::InLastRelease).unwrap();
    assert_eq!(last.tag().map(GitRef::as_str), Some("v1.2.0"));
    assert_eq!(last.commits.len(), 1);
}

#[test]
fn test_release_order_is_numeric() {
    let dir = create_test_repo();
    let path = dir.path();
    commit_file(path, "a.txt", "a\n", "one");
    git(path, &["tag", "v1.9.0"]);
    commit_file(path, "b.txt", "b\n", "two");
    git(path, &["tag", "v1.10.0"]);

    let analyzer = analyzer_for(path);
    let tags = analyzer.resolver().release_tags();
    assert_eq!(tags, vec!["v1.10.0", "v1.9.0"]);
    assert_eq!(files(&analyzer, Stage::InLastRelease), vec!["b.txt"]);
}

#[test]
fn test_tag_filtering() {
    let dir = create_test_repo();
    let path = dir.path();
    commit_file(path, "a.txt", "a\n", "one");
    git(path, &["tag", "v1.0.0"]);
    git(path, &["tag", "v1.0.0-stable"]);
    commit_file(path, "b.txt", "b\n", "two");
    git(path, &["tag", "v1.1.0"]);
    git(path, &["tag", "showcase-1"]);

    let analyzer = analyzer_for(path);
    assert_eq!(analyzer.resolver().release_tags(), vec!["v1.1.0", "v1.0.0"]);
}

#[test]
fn test_diff_provider_respects_stage_membership() {
    let dir = create_test_repo();
    let path = dir.path();
    commit_file(path, "a.txt", "a\n", "one");
    commit_file(path, "b.txt", "b\n", "two");

    write(path, "a.txt", "a staged\n");
    git(path, &["add", "a.txt"]);
    write(path, "b.txt", "b unstaged\n");

    let provider = DiffProvider::new(analyzer_for(path));

    let staged = provider.diff(Stage::Staged, &rel("a.txt")).unwrap();
    assert!(staged.contains("+a staged"));
    assert!(provider.diff(Stage::Staged, &rel("b.txt")).is_none());

    let unstaged = provider.diff(Stage::Unstaged, &rel("b.txt")).unwrap();
    assert!(unstaged.contains("+b unstaged"));
    assert!(provider.diff(Stage::Unstaged, &rel("a.txt")).is_none());

    let all = provider.diff_all(&rel("a.txt"));
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].0, Stage::Staged);
}

#[test]
fn test_diff_provider_sees_later_changes() {
    let dir = create_test_repo();
    let path = dir.path();
    commit_file(path, "a.txt", "a\n", "one");
    let provider = DiffProvider::new(analyzer_for(path));
    assert!(provider.diff(Stage::Unstaged, &rel("a.txt")).is_none());

    write(path, "a.txt", "later\n");
    assert!(provider.diff(Stage::Unstaged, &rel("a.txt")).is_some());
}

#[test]
fn test_latin1_file_still_has_a_diff() {
    let dir = create_test_repo();
    let path = dir.path();
    std::fs::write(path.join("notes.txt"), b"caf\xe9\n").unwrap();
    git(path, &["add", "notes.txt"]);
    git(path, &["commit", "-q", "-m", "latin-1 notes"]);
    std::fs::write(path.join("notes.txt"), b"caf\xe9 au lait\n").unwrap();

    let analyzer = analyzer_for(path);
    assert_eq!(files(&analyzer, Stage::Unstaged), vec!["notes.txt"]);

    let diff = DiffProvider::new(analyzer)
        .diff(Stage::Unstaged, &rel("notes.txt"))
        .expect("latin-1 edit has a diff");
    assert!(diff.contains("au lait"));
}

#[cfg(unix)]
#[test]
fn test_paths_git_would_quote_are_kept_verbatim() {
    let dir = create_test_repo();
    let path = dir.path();
    commit_file(path, "base.txt", "base\n", "initial");

    let names = ["a\"b.txt", "back\\slash.txt", "tab\tname.txt", "star*.txt", "trailing "];
    for name in names {
        write(path, name, "content\n");
        git(path, &["add", "--", name]);
    }

    let analyzer = analyzer_for(path);
    let mut expected: Vec<String> = names.iter().map(|n| n.to_string()).collect();
    expected.sort();
    assert_eq!(files(&analyzer, Stage::Staged), expected);

    let diffs = DiffProvider::new(analyzer);
    for name in names {
        let diff = diffs.diff(Stage::Staged, &rel(name));
        assert!(
            diff.is_some_and(|d| d.contains("+content")),
            "no diff for {:?}",
            name
        );
    }
}

#[test]
fn test_without_tags_release_stages_unavailable() {
    let dir = create_test_repo();
    let path = dir.path();
    commit_file(path, "a.txt", "a\n", "one");
    write(path, "a.txt", "changed\n");

    let analysis = analyzer_for(path).analyze_all();
    assert!(analysis.result(Stage::Unstaged).is_some());
    assert!(analysis.result(Stage::Staged).is_some());
    assert!(analysis.result(Stage::MergedNotReleased).is_none());
    assert!(analysis.result(Stage::InLastRelease).is_none());
    assert!(analysis.result(Stage::InPreviousRelease).is_none());

    let view = AggregateView::build(&analysis);
    assert_eq!(view.count(Stage::Unstaged), Some(1));
    assert_eq!(view.count(Stage::InLastRelease), None);
    assert_eq!(
        view.presence(&rel("a.txt"), Stage::InLastRelease),
        Presence::Unavailable
    );
}

#[test]
fn test_unstaged_staged_and_released_scenario() {
    let dir = create_test_repo();
    let path = dir.path();
    commit_file(path, "x.py", "print(1)\n", "initial");
    git(path, &["tag", "v1.0"]);
    commit_file(path, "x.py", "print(2)\n", "bump");
    git(path, &["tag", "v2.0"]);

    write(path, "x.py", "print(3)\n");
    write(path, "y.py", "print('new')\n");
    git(path, &["add", "y.py"]);

    let view = AggregateView::build(&analyzer_for(path).analyze_all());
    let paths: Vec<&str> = view.rows().iter().map(|r| r.path.as_str()).collect();
    assert_eq!(paths, vec!["x.py", "y.py"]);

    let x = view.row(&rel("x.py")).unwrap();
    assert_eq!(
        x.stages().collect::<Vec<_>>(),
        vec![Stage::Unstaged, Stage::InLastRelease]
    );
    let y = view.row(&rel("y.py")).unwrap();
    assert_eq!(y.stages().collect::<Vec<_>>(), vec![Stage::Staged]);
    assert_eq!(y.presence(Stage::InLastRelease), Presence::Absent);
    assert_eq!(y.presence(Stage::InPreviousRelease), Presence::Unavailable);
}

#[test]
fn test_analysis_is_idempotent() {
    let dir = create_test_repo();
    let path = dir.path();
    commit_file(path, "a.txt", "a\n", "one");
    git(path, &["tag", "v1"]);
    commit_file(path, "b.txt", "b\n", "two");
    git(path, &["tag", "v2"]);
    write(path, "a.txt", "edited\n");

    let analyzer = analyzer_for(path);
    let first = AggregateView::build(&analyzer.analyze_all());
    let second = AggregateView::build(&analyzer.analyze_all());
    assert_eq!(first, second);
}

/// A work repository with `upstream` and `origin` bare remotes.
///
/// `master` with tag `v1.0` is pushed to upstream. `dev` carries one commit
/// pushed to origin and one local-only commit.
struct RemoteFixture {
    _dir: TempDir,
    work: std::path::PathBuf,
    pushed: String,
    local: String,
}

impl RemoteFixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let work = dir.path().join("work");
        std::fs::create_dir_all(&work).unwrap();
        init_repo(&work);

        commit_file(&work, "base.txt", "base\n", "initial");
        git(&work, &["tag", "v1.0"]);

        for remote in ["upstream", "origin"] {
            let bare = dir.path().join(format!("{}.git", remote));
            git(dir.path(), &["init", "-q", "--bare", bare.to_str().unwrap()]);
            git(&work, &["remote", "add", remote, bare.to_str().unwrap()]);
        }
        git(&work, &["push", "-q", "upstream", "master"]);

        git(&work, &["checkout", "-q", "-b", "dev"]);
        let pushed = commit_file(&work, "feature/one.txt", "one\n", "feature one");
        git(&work, &["push", "-q", "origin", "dev"]);
        let local = commit_file(&work, "feature/two.txt", "two\n", "feature two");

        Self {
            _dir: dir,
            work,
            pushed,
            local,
        }
    }
}

#[test]
fn test_remote_stages_are_disjoint() {
    let fixture = RemoteFixture::new();
    let analysis = analyzer_for(&fixture.work).analyze_all();

    let not_pushed = analysis.result(Stage::CommittedNotPushed).unwrap();
    assert_eq!(
        not_pushed.files.iter().map(|p| p.as_str()).collect::<Vec<_>>(),
        vec!["feature/two.txt"]
    );
    assert_eq!(not_pushed.commits, vec![GitRef::new(fixture.local.as_str())]);

    let review = analysis.result(Stage::PushedNotMerged).unwrap();
    assert_eq!(
        review.files.iter().map(|p| p.as_str()).collect::<Vec<_>>(),
        vec!["feature/one.txt"]
    );
    assert_eq!(review.commits, vec![GitRef::new(fixture.pushed.as_str())]);
    assert_eq!(
        review.attribution(&rel("feature/one.txt")),
        Some(&[GitRef::new(fixture.pushed.as_str())][..])
    );
    assert!(review.commits.iter().all(|c| !not_pushed.commits.contains(c)));

    let merged = analysis.result(Stage::MergedNotReleased).unwrap();
    assert!(merged.files.is_empty());
    assert_eq!(merged.tag().map(GitRef::as_str), Some("v1.0"));
}

#[test]
fn test_review_diff_names_each_commit() {
    let fixture = RemoteFixture::new();
    let provider = DiffProvider::new(analyzer_for(&fixture.work));

    let diff = provider
        .diff(Stage::PushedNotMerged, &rel("feature/one.txt"))
        .unwrap();
    assert!(diff.starts_with(&format!("Diff of {}", fixture.pushed)));
    assert!(diff.contains("+one"));
    assert!(provider
        .diff(Stage::PushedNotMerged, &rel("feature/two.txt"))
        .is_none());
}

#[test]
fn test_adhoc_inspections() {
    let fixture = RemoteFixture::new();
    let analyzer = analyzer_for(&fixture.work);

    let commits = analyzer.inspect_commits(&[GitRef::new(fixture.local.as_str())]);
    assert_eq!(
        commits.files.iter().map(|p| p.as_str()).collect::<Vec<_>>(),
        vec!["feature/two.txt"]
    );

    let branch = analyzer.inspect_branch("origin/dev");
    assert_eq!(
        branch.files.iter().map(|p| p.as_str()).collect::<Vec<_>>(),
        vec!["feature/one.txt"]
    );
    assert_eq!(branch.commits, vec![GitRef::new(fixture.pushed.as_str())]);
}
