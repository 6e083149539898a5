//! Deployment environment annotations for stage headers.
//!
//! Purely cosmetic: an empty mapping is the normal case.

use std::collections::{BTreeMap, BTreeSet};

use super::refs::ReferenceResolver;
use super::repo::GitRef;
use super::stage::StageResult;

/// Supplies which version each deployment environment currently runs.
pub trait EnvironmentSource: Send + Sync {
    /// Environment name to version identifier.
    fn environment_versions(&self) -> BTreeMap<String, String>;
}

/// A fixed environment mapping, typically from config or the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticEnvironments(BTreeMap<String, String>);

impl StaticEnvironments {
    /// Wrap an existing mapping.
    pub fn new(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }

    /// Parse `name=version` pairs. Malformed entries are skipped.
    pub fn from_pairs<S: AsRef<str>>(pairs: &[S]) -> Self {
        let map = pairs
            .iter()
            .filter_map(|p| {
                let (name, version) = p.as_ref().split_once('=')?;
                let (name, version) = (name.trim(), version.trim());
                if name.is_empty() || version.is_empty() {
                    return None;
                }
                Some((name.to_string(), version.to_string()))
            })
            .collect();
        Self(map)
    }

    /// Add entries from `other`, replacing existing names.
    pub fn merge(&mut self, other: StaticEnvironments) {
        self.0.extend(other.0);
    }

    /// Whether no environment is configured.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl EnvironmentSource for StaticEnvironments {
    fn environment_versions(&self) -> BTreeMap<String, String> {
        self.0.clone()
    }
}

/// Environment name shortened for a column header.
pub fn shorten_env_name(name: &str) -> String {
    let first = name.split('.').next().unwrap_or(name);
    if first.chars().count() > 5 {
        let head: String = first.chars().take(5).collect();
        format!("{}..", head)
    } else {
        first.to_string()
    }
}

fn strip_v(version: &str) -> &str {
    version.strip_prefix('v').unwrap_or(version)
}

/// Lookup tables relating environments, versions and commits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentIndex {
    env_version: BTreeMap<String, String>,
    version_envs: BTreeMap<String, Vec<String>>,
    commit_versions: BTreeMap<GitRef, Vec<String>>,
}

impl EnvironmentIndex {
    /// An index with no environments.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build the index, resolving each version to a commit.
    ///
    /// Versions are tried verbatim first, then with a `v` prefix.
    pub fn build(source: Option<&dyn EnvironmentSource>, resolver: &ReferenceResolver<'_>) -> Self {
        let Some(source) = source else {
            return Self::empty();
        };
        let env_version = source.environment_versions();

        let mut version_envs: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (env, version) in &env_version {
            version_envs
                .entry(version.clone())
                .or_default()
                .push(env.clone());
        }

        let mut commit_versions: BTreeMap<GitRef, Vec<String>> = BTreeMap::new();
        for version in version_envs.keys() {
            let commit = resolver
                .resolve(version)
                .or_else(|| resolver.resolve(&format!("v{}", strip_v(version))));
            if let Some(commit) = commit {
                commit_versions.entry(commit).or_default().push(version.clone());
            }
        }

        Self {
            env_version,
            version_envs,
            commit_versions,
        }
    }

    /// Whether any environment is known.
    pub fn is_empty(&self) -> bool {
        self.env_version.is_empty()
    }

    /// Environments running the stage's newest commit or its tag.
    pub fn environments_for(&self, result: &StageResult) -> BTreeSet<String> {
        let mut envs = BTreeSet::new();

        if let Some(latest) = result.commits.first() {
            for version in self.commit_versions.get(latest).into_iter().flatten() {
                for env in self.version_envs.get(version).into_iter().flatten() {
                    envs.insert(env.clone());
                }
            }
        }

        if let Some(tag) = result.tag() {
            for (env, version) in &self.env_version {
                if strip_v(version) == strip_v(tag.as_str()) {
                    envs.insert(env.clone());
                }
            }
        }

        envs
    }

    /// Header suffix listing matching environments, e.g. `" prod stagi.."`.
    pub fn annotation(&self, result: &StageResult) -> String {
        let envs = self.environments_for(result);
        if envs.is_empty() {
            return String::new();
        }
        let names: Vec<String> = envs.iter().map(|e| shorten_env_name(e)).collect();
        format!(" {}", names.join(" "))
    }
}
