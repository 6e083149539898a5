//! The repository query primitive the stage engine is built on.
//!
//! Every git interaction goes through [`GitQuery::run`], which takes a static
//! operation label (for tracing) and the git arguments, and returns standard
//! output plus the exit status. Callers read it either as trimmed lines or,
//! for `-z` path listings, as NUL-separated records.

use std::io::Read;
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use super::repo::RepoRoot;

/// Default per-query timeout.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Why a single query produced no usable output.
///
/// Never propagated past the query primitive: callers see an empty
/// [`QueryOutput`] and the failure is logged.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QueryFailure {
    /// `git` could not be spawned or its output could not be read.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// The query ran longer than the configured timeout and was killed.
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    /// The child produced no stdout handle, or its reader died.
    #[error("no output handle")]
    NoOutput,
}

/// Captured output of one query.
///
/// Invalid UTF-8 in stdout is replaced rather than rejected, so a Latin-1
/// file still produces a diff.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOutput {
    /// Decoded stdout, untouched.
    pub stdout: String,
    /// Whether git exited with status zero.
    pub success: bool,
}

impl QueryOutput {
    /// Successful output from raw stdout text.
    pub fn from_stdout(text: &str) -> Self {
        Self {
            stdout: text.to_string(),
            success: true,
        }
    }

    /// A failed query.
    pub fn failed() -> Self {
        Self {
            stdout: String::new(),
            success: false,
        }
    }

    /// Lines of a successful query, or nothing.
    pub fn into_lines(self) -> Vec<String> {
        if self.success {
            split_lines(&self.stdout)
        } else {
            Vec::new()
        }
    }

    /// NUL-terminated records of a successful `-z` query, or nothing.
    pub fn into_records(self) -> Vec<String> {
        if self.success {
            split_records(&self.stdout)
        } else {
            Vec::new()
        }
    }

    /// First line of a successful query.
    pub fn first(self) -> Option<String> {
        self.into_lines().into_iter().next()
    }
}

/// Split stdout into right-trimmed, non-blank lines.
pub fn split_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim_end)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Split `-z` output on NUL. Records are kept byte for byte.
pub fn split_records(text: &str) -> Vec<String> {
    text.split('\0')
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect()
}

/// Something that can answer git queries.
///
/// Implementations must be safe to share across the analysis worker thread.
pub trait GitQuery: Send + Sync {
    /// Run `git <args>` and capture its output.
    fn run(&self, label: &'static str, args: &[&str]) -> QueryOutput;
}

/// Settings for the production query runner.
#[derive(Debug, Clone)]
pub struct QueryConfig {
    /// Echo every command at `info` level instead of `debug`.
    pub verbose: bool,
    /// Kill queries running longer than this.
    pub timeout: Option<Duration>,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            timeout: Some(DEFAULT_QUERY_TIMEOUT),
        }
    }
}

/// Runs queries by spawning the `git` binary in the repository root.
#[derive(Debug, Clone)]
pub struct GitCli {
    root: RepoRoot,
    config: QueryConfig,
}

impl GitCli {
    /// Create a runner for the given repository.
    pub fn new(root: RepoRoot, config: QueryConfig) -> Self {
        Self { root, config }
    }

    /// Repository this runner queries.
    pub fn root(&self) -> &RepoRoot {
        &self.root
    }

    fn execute(&self, args: &[&str]) -> Result<QueryOutput, QueryFailure> {
        let mut child = Command::new("git")
            .args(["--literal-pathspecs", "-c", "core.quotepath=off", "-c", "color.ui=never"])
            .args(args)
            .current_dir(self.root.path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        let mut stdout = child.stdout.take().ok_or(QueryFailure::NoOutput)?;

        let bytes = match self.config.timeout {
            None => {
                let mut buf = Vec::new();
                stdout.read_to_end(&mut buf)?;
                buf
            }
            Some(timeout) => {
                // Read on a helper thread so a hung git can be killed.
                let (tx, rx) = mpsc::channel();
                thread::spawn(move || {
                    let mut buf = Vec::new();
                    let res = stdout.read_to_end(&mut buf).map(|_| buf);
                    let _ = tx.send(res);
                });
                match wait_for_reader(&rx, timeout) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(e);
                    }
                }
            }
        };

        let status = child.wait()?;
        Ok(QueryOutput {
            stdout: String::from_utf8_lossy(&bytes).into_owned(),
            success: status.success(),
        })
    }
}

/// Wait for the stdout reader thread. A reader that died without sending
/// means there is no output, not a timeout.
fn wait_for_reader(
    rx: &Receiver<std::io::Result<Vec<u8>>>,
    timeout: Duration,
) -> Result<Vec<u8>, QueryFailure> {
    match rx.recv_timeout(timeout) {
        Ok(res) => Ok(res?),
        Err(RecvTimeoutError::Timeout) => Err(QueryFailure::Timeout(timeout)),
        Err(RecvTimeoutError::Disconnected) => Err(QueryFailure::NoOutput),
    }
}

impl GitQuery for GitCli {
    fn run(&self, label: &'static str, args: &[&str]) -> QueryOutput {
        let _timer = crate::metrics::Timer::start(label);
        let command = args.join(" ");
        if self.config.verbose {
            info!(label, "git {}", command);
        } else {
            debug!(label, "git {}", command);
        }

        match self.execute(args) {
            Ok(out) => {
                if !out.success {
                    warn!(label, "git {} exited with failure", command);
                }
                out
            }
            Err(e) => {
                warn!(label, error = %e, "git {} failed", command);
                QueryOutput::failed()
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_lines_trims_and_drops_blanks() {
        let lines = split_lines("a.txt  \n\n  \nsrc/b.rs\n");
        assert_eq!(lines, vec!["a.txt".to_string(), "src/b.rs".to_string()]);
    }

    #[test]
    fn split_lines_keeps_leading_whitespace() {
        // diff context lines start with a space
        let lines = split_lines(" context\n+added\n");
        assert_eq!(lines, vec![" context".to_string(), "+added".to_string()]);
    }

    #[test]
    fn split_records_keeps_path_bytes() {
        let records = split_records("a\"b.txt\0tab\there\0trailing \0line\nbreak\0");
        assert_eq!(
            records,
            vec!["a\"b.txt", "tab\there", "trailing ", "line\nbreak"]
        );
    }

    #[test]
    fn dead_reader_is_not_a_timeout() {
        let (tx, rx) = mpsc::channel::<std::io::Result<Vec<u8>>>();
        drop(tx);
        let err = wait_for_reader(&rx, Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, QueryFailure::NoOutput), "got {:?}", err);
    }

    #[test]
    fn silent_reader_times_out() {
        let (_tx, rx) = mpsc::channel::<std::io::Result<Vec<u8>>>();
        let err = wait_for_reader(&rx, Duration::from_millis(10)).unwrap_err();
        assert!(matches!(err, QueryFailure::Timeout(_)));
    }

    #[test]
    fn reader_bytes_pass_through() {
        let (tx, rx) = mpsc::channel();
        tx.send(Ok(b"caf\xe9".to_vec())).unwrap();
        assert_eq!(
            wait_for_reader(&rx, Duration::from_secs(5)).unwrap(),
            b"caf\xe9".to_vec()
        );
    }

    #[test]
    fn failed_output_reads_as_empty() {
        let out = QueryOutput {
            stdout: "fatal: bad revision\n".into(),
            success: false,
        };
        assert!(out.clone().into_lines().is_empty());
        assert!(out.clone().into_records().is_empty());
        assert_eq!(out.first(), None);
    }

    #[test]
    fn scripted_git_records_calls() {
        let git = scripted::ScriptedGit::new().on("diff --name-only", "a.txt\n");
        assert_eq!(
            git.run("t", &["diff", "--name-only"]).into_lines(),
            vec!["a.txt".to_string()]
        );
        assert!(!git.run("t", &["status"]).success);
        assert_eq!(git.calls(), vec!["diff --name-only", "status"]);
    }
}
