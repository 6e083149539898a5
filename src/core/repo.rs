//! Git repository discovery and the value types shared by the stage engine.

use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;

/// Errors from repository operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RepoError {
    /// Path is not inside a git repository.
    #[error("not inside a git repository")]
    NotARepo,
    /// I/O error during git operation.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Git output contained invalid UTF-8.
    #[error("invalid utf-8 in git output")]
    InvalidUtf8,
}

/// Canonicalized path to a git repository root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoRoot(PathBuf);

impl RepoRoot {
    /// Discover the git repository containing the given path.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use gitradar::core::RepoRoot;
    /// use std::path::Path;
    ///
    /// let repo = RepoRoot::discover(Path::new(".")).expect("not in a git repo");
    /// println!("Repo at: {}", repo.path().display());
    /// ```
    #[must_use = "this returns a Result that should be checked"]
    pub fn discover(path: &Path) -> Result<Self, RepoError> {
        let output = Command::new("git")
            .arg("rev-parse")
            .arg("--show-toplevel")
            .current_dir(path)
            .output()?;

        if !output.status.success() {
            return Err(RepoError::NotARepo);
        }

        let root = std::str::from_utf8(&output.stdout)
            .map_err(|_| RepoError::InvalidUtf8)?
            .trim();

        let canonical = PathBuf::from(root)
            .canonicalize()
            .map_err(|_| RepoError::NotARepo)?;

        Ok(Self(canonical))
    }

    /// Get the repository root path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.0
    }
}

/// A repository-relative path. Never absolute.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelPath(String);

impl RelPath {
    /// Create a RelPath from trusted git output.
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        debug_assert!(
            !path.starts_with('/'),
            "RelPath must not be absolute: {}",
            path
        );
        Self(path)
    }

    /// Get the path as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get the file name.
    #[must_use]
    pub fn file_name(&self) -> &str {
        Path::new(&self.0)
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.0)
    }
}

impl std::fmt::Display for RelPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An opaque reference to a commit, branch or tag.
///
/// Only ever passed by value to git; never parsed beyond string comparison.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GitRef(String);

impl GitRef {
    /// Wrap a reference name or object id.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the reference as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for display (first 7 characters).
    #[must_use]
    pub fn short(&self) -> String {
        self.0.chars().take(7).collect()
    }
}

impl std::fmt::Display for GitRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for GitRef {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Compress a path to fit a fixed-width column.
///
/// Paths longer than 68 characters keep their first and last 32 characters.
pub fn compress_path(path: &str) -> String {
    let count = path.chars().count();
    if count <= 68 {
        return path.to_string();
    }
    let head: String = path.chars().take(32).collect();
    let tail: String = path.chars().skip(count - 32).collect();
    format!("{}..{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relpath_basics() {
        let p = RelPath::new("src/main.rs");
        assert_eq!(p.as_str(), "src/main.rs");
        assert_eq!(p.file_name(), "main.rs");
    }

    #[test]
    fn gitref_short() {
        let r = GitRef::new("0123456789abcdef");
        assert_eq!(r.short(), "0123456");
        assert_eq!(GitRef::new("v1").short(), "v1");
    }

    #[test]
    fn compress_path_keeps_short_paths() {
        assert_eq!(compress_path("src/lib.rs"), "src/lib.rs");
        let exactly = "a".repeat(68);
        assert_eq!(compress_path(&exactly), exactly);
    }

    #[test]
    fn compress_path_elides_middle() {
        let long = format!("{}{}{}", "a".repeat(32), "m".repeat(10), "z".repeat(32));
        let out = compress_path(&long);
        assert_eq!(out, format!("{}..{}", "a".repeat(32), "z".repeat(32)));
    }

    #[test]
    fn compress_path_unicode() {
        let long = "日".repeat(80);
        let out = compress_path(&long);
        assert_eq!(out.chars().count(), 66);
    }
}
