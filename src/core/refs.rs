//! Release tag discovery and reference resolution.

use std::cmp::Ordering;

use thiserror::Error;

use super::query::GitQuery;
use super::repo::GitRef;

const LABEL_TAGS: &str = "list_release_tags";
const LABEL_RESOLVE: &str = "resolve_ref";

/// Tag name fragments excluded from release ranges by default.
pub const DEFAULT_TAG_EXCLUDES: [&str; 2] = ["stable", "show"];

/// A required reference could not be found.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ResolutionError {
    /// Not enough qualifying release tags exist.
    #[error("need {needed} release tags, found {found}")]
    InsufficientTags {
        /// Tags required.
        needed: usize,
        /// Qualifying tags present.
        found: usize,
    },
    /// A branch or tag name did not resolve to a commit.
    #[error("reference does not resolve: {0}")]
    UnresolvedRef(String),
}

/// The two tags bounding a release, read as `(older, newer]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseRange {
    /// The release itself.
    pub newer: GitRef,
    /// The release before it.
    pub older: GitRef,
}

impl ReleaseRange {
    /// `older..newer` revision range.
    pub fn revspec(&self) -> String {
        format!("{}..{}", self.older, self.newer)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    // Digits with leading zeros stripped, so length then lexical order is numeric order.
    Num(String),
}

impl Ord for Segment {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Segment::Num(a), Segment::Num(b)) => a.len().cmp(&b.len()).then_with(|| a.cmp(b)),
            (Segment::Text(a), Segment::Text(b)) => a.cmp(b),
            (Segment::Text(_), Segment::Num(_)) => Ordering::Less,
            (Segment::Num(_), Segment::Text(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for Segment {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Sort key giving version ordering: digit runs compare numerically.
///
/// A single leading `v`/`V` is ignored, so `v1.2` and `1.2` share a key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct VersionKey(Vec<Segment>);

impl VersionKey {
    /// Build the key for a tag name.
    pub fn parse(tag: &str) -> Self {
        let body = tag
            .strip_prefix('v')
            .or_else(|| tag.strip_prefix('V'))
            .unwrap_or(tag);

        let mut segments = Vec::new();
        let mut current = String::new();
        let mut in_digits = false;

        for c in body.chars() {
            let is_digit = c.is_ascii_digit();
            if !current.is_empty() && is_digit != in_digits {
                segments.push(make_segment(std::mem::take(&mut current), in_digits));
            }
            in_digits = is_digit;
            current.push(c);
        }
        if !current.is_empty() {
            segments.push(make_segment(current, in_digits));
        }

        Self(segments)
    }
}

fn make_segment(run: String, digits: bool) -> Segment {
    if digits {
        let trimmed = run.trim_start_matches('0');
        Segment::Num(if trimmed.is_empty() { "0" } else { trimmed }.to_string())
    } else {
        Segment::Text(run)
    }
}

/// Compare two tag names by version.
///
/// Equal keys fall back to the raw name, which makes the lexicographically
/// last name win when sorting newest first.
pub fn version_cmp(a: &str, b: &str) -> Ordering {
    VersionKey::parse(a)
        .cmp(&VersionKey::parse(b))
        .then_with(|| a.cmp(b))
}

/// Drop excluded tags and sort the rest newest first.
pub fn qualifying_tags<S: AsRef<str>>(tags: &[S], exclude: &[String]) -> Vec<String> {
    let mut kept: Vec<String> = tags
        .iter()
        .map(|t| t.as_ref().trim())
        .filter(|t| !t.is_empty())
        .filter(|t| !exclude.iter().any(|p| !p.is_empty() && t.contains(p.as_str())))
        .map(str::to_string)
        .collect();
    kept.sort_by(|a, b| version_cmp(b, a));
    kept.dedup();
    kept
}

/// Pick the range for the `rank`-th most recent release (1 = newest).
pub fn pick_release_range(
    tags: &[String],
    rank: usize,
) -> Result<ReleaseRange, ResolutionError> {
    let rank = rank.max(1);
    let needed = rank + 1;
    if tags.len() < needed {
        return Err(ResolutionError::InsufficientTags {
            needed,
            found: tags.len(),
        });
    }
    Ok(ReleaseRange {
        newer: GitRef::new(tags[rank - 1].as_str()),
        older: GitRef::new(tags[rank].as_str()),
    })
}

/// Resolves release tags and branch names through git.
pub struct ReferenceResolver<'a> {
    git: &'a dyn GitQuery,
    exclude: &'a [String],
}

impl<'a> ReferenceResolver<'a> {
    /// Create a resolver using the given exclusion patterns.
    pub fn new(git: &'a dyn GitQuery, exclude: &'a [String]) -> Self {
        Self { git, exclude }
    }

    /// Qualifying release tags, newest first.
    pub fn release_tags(&self) -> Vec<String> {
        let tags = self.git.run(LABEL_TAGS, &["tag", "--list"]).into_lines();
        qualifying_tags(&tags, self.exclude)
    }

    /// Most recent qualifying tag.
    pub fn latest_release(&self) -> Result<GitRef, ResolutionError> {
        self.release_tags()
            .into_iter()
            .next()
            .map(GitRef::new)
            .ok_or(ResolutionError::InsufficientTags {
                needed: 1,
                found: 0,
            })
    }

    /// Tag range for the `rank`-th most recent release.
    pub fn release_range(&self, rank: usize) -> Result<ReleaseRange, ResolutionError> {
        pick_release_range(&self.release_tags(), rank)
    }

    /// Commit id a name points at, if it resolves.
    pub fn resolve(&self, name: &str) -> Option<GitRef> {
        self.git
            .run(LABEL_RESOLVE, &["rev-list", "-n", "1", name])
            .first()
            .map(GitRef::new)
    }

    /// Like [`resolve`](Self::resolve) but reports a missing reference.
    pub fn require(&self, name: &str) -> Result<GitRef, ResolutionError> {
        self.resolve(name)
            .ok_or_else(|| ResolutionError::UnresolvedRef(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::query::scripted::ScriptedGit;
    use proptest::prelude::*;

    fn excludes() -> Vec<String> {
        DEFAULT_TAG_EXCLUDES.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn numeric_segments_compare_numerically() {
        assert_eq!(version_cmp("v1.10.0", "v1.9.0"), Ordering::Greater);
        assert_eq!(version_cmp("v2.0", "v10.0"), Ordering::Less);
        assert_eq!(version_cmp("1.01", "1.1"), Ordering::Less); // same key, raw order
    }

    #[test]
    fn shorter_prefix_sorts_first() {
        assert_eq!(version_cmp("v1.0", "v1.0.1"), Ordering::Less);
    }

    #[test]
    fn leading_v_is_ignored() {
        assert_eq!(VersionKey::parse("v3.2"), VersionKey::parse("3.2"));
        assert_eq!(VersionKey::parse("V3.2"), VersionKey::parse("3.2"));
    }

    #[test]
    fn excluded_tags_are_dropped() {
        let tags = ["v1.0.0", "v1.0.0-stable", "v1.1.0", "showcase-1"];
        assert_eq!(qualifying_tags(&tags, &excludes()), vec!["v1.1.0", "v1.0.0"]);
    }

    #[test]
    fn tie_break_prefers_lexicographically_last() {
        let tags = ["v1.0", "1.0"];
        assert_eq!(qualifying_tags(&tags, &[]), vec!["v1.0", "1.0"]);
    }

    #[test]
    fn release_range_by_rank() {
        let tags = qualifying_tags(&["v1.0.0", "v1.2.0", "v1.1.0"], &[]);
        let last = pick_release_range(&tags, 1).unwrap();
        assert_eq!(last.newer.as_str(), "v1.2.0");
        assert_eq!(last.older.as_str(), "v1.1.0");
        assert_eq!(last.revspec(), "v1.1.0..v1.2.0");

        let prev = pick_release_range(&tags, 2).unwrap();
        assert_eq!(prev.newer.as_str(), "v1.1.0");
        assert_eq!(prev.older.as_str(), "v1.0.0");
    }

    #[test]
    fn release_range_needs_predecessor() {
        let tags = vec!["v1.0".to_string()];
        assert_eq!(
            pick_release_range(&tags, 1),
            Err(ResolutionError::InsufficientTags {
                needed: 2,
                found: 1
            })
        );
        assert!(pick_release_range(&[], 2).is_err());
    }

    #[test]
    fn resolver_reads_tags_through_git() {
        let git = ScriptedGit::new()
            .on("tag --list", "v1.0.0\nshowcase-1\nv1.1.0\nv1.0.0-stable\n")
            .on("rev-list -n 1 upstream/master", "abc123\n");
        let ex = excludes();
        let resolver = ReferenceResolver::new(&git, &ex);

        assert_eq!(resolver.release_tags(), vec!["v1.1.0", "v1.0.0"]);
        assert_eq!(resolver.latest_release().unwrap().as_str(), "v1.1.0");
        assert_eq!(
            resolver.resolve("upstream/master").map(|r| r.to_string()),
            Some("abc123".to_string())
        );
        assert_eq!(
            resolver.require("origin/dev"),
            Err(ResolutionError::UnresolvedRef("origin/dev".into()))
        );
    }

    #[test]
    fn resolver_without_tags_fails_resolution() {
        let git = ScriptedGit::new().on("tag --list", "");
        let ex = excludes();
        let resolver = ReferenceResolver::new(&git, &ex);
        assert!(matches!(
            resolver.latest_release(),
            Err(ResolutionError::InsufficientTags { found: 0, .. })
        ));
        assert!(resolver.release_range(1).is_err());
    }

    proptest! {
        #[test]
        fn version_cmp_is_antisymmetric(a in "v?[0-9]{1,3}(\\.[0-9]{1,3}){0,3}", b in "v?[0-9]{1,3}(\\.[0-9]{1,3}){0,3}") {
            prop_assert_eq!(version_cmp(&a, &b), version_cmp(&b, &a).reverse());
        }

        #[test]
        fn sorted_tags_are_newest_first(tags in proptest::collection::vec("v[0-9]{1,2}\\.[0-9]{1,2}\\.[0-9]{1,2}", 0..12)) {
            let sorted = qualifying_tags(&tags, &[]);
            for pair in sorted.windows(2) {
                prop_assert_eq!(version_cmp(&pair[0], &pair[1]), Ordering::Greater);
            }
        }

        #[test]
        fn bumping_a_component_orders_after(major in 0u32..50, minor in 0u32..50, patch in 0u32..50) {
            let base = format!("v{}.{}.{}", major, minor, patch);
            let bumped = format!("v{}.{}.{}", major, minor, patch + 1);
            prop_assert_eq!(version_cmp(&bumped, &base), Ordering::Greater);
        }
    }
}
