//! Command-line entry points that do not start the TUI.

mod summary;

pub use summary::{format_inspection, format_summary, run_summary, SummaryOptions};
