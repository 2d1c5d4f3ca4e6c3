//! Statistics generation from the component store
//!
//! This module provides functionality for extracting and displaying
//! store statistics from the storage layer.

use crate::storage::{RunRecord, Storage};
use crate::SwatchError;

/// Store statistics summary
#[derive(Debug, Clone)]
pub struct StoreStatistics {
    /// Total number of stored components
    pub total_components: u64,

    /// Component counts per (library, category)
    pub by_category: Vec<(String, String, u64)>,

    /// Number of distinct authors
    pub unique_authors: u64,

    /// Most recent runs, newest first
    pub recent_runs: Vec<RunRecord>,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
/// * `run_limit` - How many recent runs to include
///
/// # Returns
///
/// * `Ok(StoreStatistics)` - Successfully loaded statistics
/// * `Err(SwatchError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn Storage, run_limit: u32) -> Result<StoreStatistics, SwatchError> {
    Ok(StoreStatistics {
        total_components: storage.count_components()?,
        by_category: storage.count_by_category()?,
        unique_authors: storage.count_authors()?,
        recent_runs: storage.recent_runs(run_limit)?,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &StoreStatistics) {
    println!("=== Store Statistics ===\n");

    println!("Overview:");
    println!("  Total components: {}", stats.total_components);
    println!("  Unique authors: {}", stats.unique_authors);
    println!();

    if !stats.by_category.is_empty() {
        println!("Components by Library / Category:");
        for (library, category, count) in &stats.by_category {
            let percentage = if stats.total_components > 0 {
                (*count as f64 / stats.total_components as f64) * 100.0
            } else {
                0.0
            };
            println!("  {} / {}: {} ({:.1}%)", library, category, count, percentage);
        }
        println!();
    }

    if !stats.recent_runs.is_empty() {
        println!("Recent Runs:");
        for run in &stats.recent_runs {
            println!(
                "  #{} {} {} committed={} started={}{}",
                run.id,
                run.mode.to_db_string(),
                run.status.to_db_string(),
                run.committed,
                run.started_at,
                run.finished_at
                    .as_ref()
                    .map(|f| format!(" finished={}", f))
                    .unwrap_or_default()
            );
        }
    }
}
