//! Startup configuration.
//!
//! Read once from `<config dir>/config.json` (or an explicit path); command
//! line flags override individual fields. Nothing is ever written back.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use super::analyzer::AnalyzerConfig;
use super::environment::StaticEnvironments;
use super::query::QueryConfig;
use super::refs::DEFAULT_TAG_EXCLUDES;

/// Errors loading configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// Config file is not valid JSON for [`Config`].
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// All tunables, with defaults matching a conventional fork workflow.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Integration branch.
    pub main_branch: String,
    /// Personal branch.
    pub dev_branch: String,
    /// Remote of the integration branch.
    pub main_remote: String,
    /// Remote of the personal branch.
    pub dev_remote: String,
    /// Tag fragments that disqualify a release tag.
    pub tag_exclude: Vec<String>,
    /// Per-query timeout in seconds; 0 disables it.
    pub query_timeout_secs: u64,
    /// Echo every git command to the log at info level.
    pub verbose: bool,
    /// Deployment environment to version.
    pub environments: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        let analyzer = AnalyzerConfig::default();
        Self {
            main_branch: analyzer.main_branch,
            dev_branch: analyzer.dev_branch,
            main_remote: analyzer.main_remote,
            dev_remote: analyzer.dev_remote,
            tag_exclude: DEFAULT_TAG_EXCLUDES.iter().map(|s| s.to_string()).collect(),
            query_timeout_secs: 30,
            verbose: false,
            environments: BTreeMap::new(),
        }
    }
}

/// Default config file location, if a home directory is known.
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "gitradar").map(|d| d.config_dir().join("config.json"))
}

impl Config {
    /// Parse a JSON document; missing fields take defaults.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load from `path`, or from the default location when `None`.
    ///
    /// An explicit path must exist. A missing default file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => match default_config_path() {
                Some(p) => (p, false),
                None => return Ok(Self::default()),
            },
        };

        match std::fs::read_to_string(&path) {
            Ok(text) => Self::from_json(&text),
            Err(e) if !required && e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Io { path, source }),
        }
    }

    /// Branch settings for the analyzer.
    pub fn analyzer_config(&self) -> AnalyzerConfig {
        AnalyzerConfig {
            main_branch: self.main_branch.clone(),
            dev_branch: self.dev_branch.clone(),
            main_remote: self.main_remote.clone(),
            dev_remote: self.dev_remote.clone(),
            tag_exclude: self.tag_exclude.clone(),
        }
    }

    /// Settings for the git query runner.
    pub fn query_config(&self) -> QueryConfig {
        QueryConfig {
            verbose: self.verbose,
            timeout: (self.query_timeout_secs > 0)
                .then(|| Duration::from_secs(self.query_timeout_secs)),
        }
    }

    /// Configured environments.
    pub fn environments(&self) -> StaticEnvironments {
        StaticEnvironments::new(self.environments.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = Config::default();
        assert_eq!(c.main_branch, "master");
        assert_eq!(c.dev_branch, "dev");
        assert_eq!(c.tag_exclude, vec!["stable", "show"]);
        assert_eq!(c.query_config().timeout, Some(Duration::from_secs(30)));
        assert_eq!(c.analyzer_config(), AnalyzerConfig::default());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let c = Config::from_json(r#"{"main_branch": "main", "query_timeout_secs": 0}"#).unwrap();
        assert_eq!(c.main_branch, "main");
        assert_eq!(c.dev_branch, "dev");
        assert_eq!(c.query_config().timeout, None);
    }

    #[test]
    fn environments_from_json() {
        let c = Config::from_json(r#"{"environments": {"prod": "v1.2"}}"#).unwrap();
        assert!(!c.environments().is_empty());
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(matches!(
            Config::from_json("{not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(matches!(
            Config::load(Some(&missing)),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"dev_branch": "feature"}"#).unwrap();
        let c = Config::load(Some(&path)).unwrap();
        assert_eq!(c.dev_branch, "feature");
    }
}
