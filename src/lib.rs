//! gitradar - where did each changed file get to?
//!
//! Classifies the files changed in a repository into lifecycle stages, from
//! unstaged edits to the previous production release, and shows the result
//! as a table in the terminal.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use gitradar::prelude::*;
//!
//! let repo = RepoRoot::discover(std::path::Path::new("."))?;
//! let git = Arc::new(GitCli::new(repo, Default::default()));
//! let analyzer = StageAnalyzer::new(git, AnalyzerConfig::default());
//! let view = AggregateView::build(&analyzer.analyze_all());
//! ```

#![deny(missing_docs)]

pub mod cli;
pub mod core;
pub mod logging;
pub mod metrics;
pub mod prelude;
pub mod theme;
pub mod ui;
