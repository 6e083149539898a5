//! Common re-exports for convenient importing.
//!
//! # Example
//!
//! ```rust,ignore
//! use gitradar::prelude::*;
//! ```

pub use crate::core::{
    AggregateView, Analysis, AnalyzerConfig, Config, DiffProvider, GitCli, GitQuery, GitRef,
    Presence, RelPath, RepoError, RepoRoot, ResolutionError, Stage, StageAnalyzer, StageResult,
};
