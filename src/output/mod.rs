//! Output module for run summaries and store reports
//!
//! This module handles:
//! - Per-run summaries of the listing and code-host collectors
//! - Store statistics for the `--stats` report

pub mod stats;
mod summary;

pub use stats::{load_statistics, print_statistics, StoreStatistics};
pub use summary::{CodeHostSummary, ListingSummary, PageReport, RunSummary, StopReason};
