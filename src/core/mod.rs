//! Stage classification engine (no TUI dependencies).

mod aggregate;
mod analyzer;
mod config;
mod diff;
mod environment;
mod query;
mod refs;
mod repo;
mod stage;

pub use aggregate::*;
pub use analyzer::*;
pub use config::*;
pub use diff::*;
pub use environment::*;
pub use query::*;
pub use refs::*;
pub use repo::*;
pub use stage::*;

#[cfg(test)]
pub(crate) use query::scripted;
