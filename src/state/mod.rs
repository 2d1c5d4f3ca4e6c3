//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `DedupIndex`: processed natural keys or owners, loaded once per run
//! - `CrawlProgress`: page index and empty-page streak of the outer loop
//! - `PageTally`: ok/skip/error counts for one listing page
//! - `TaskOutcome`: tri-state result of one extraction task

mod dedup;
mod outcome;
mod progress;

// Re-export main types
pub use dedup::DedupIndex;
pub use outcome::{SkipReason, TaskOutcome};
pub use progress::{CrawlProgress, PageTally, PageVerdict};
