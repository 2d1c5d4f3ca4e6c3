//! Storage traits and error types
//!
//! [`Sink`] is the narrow interface the crawlers persist through; [`Storage`] adds
//! the run ledger and the statistics queries used by reports.

use crate::normalize::NormalizedDocument;
use crate::storage::{RunMode, RunRecord, RunStatus};
use std::collections::HashSet;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Result of inserting one record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Committed with this row id
    Inserted(i64),
    /// Rolled back on a uniqueness or other constraint
    Conflict,
}

/// Which existing keys to load into a dedup index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyScope<'a> {
    /// Natural keys already stored for a library
    NaturalKeys { library: &'a str },
    /// Distinct authors (owners) already stored for a library
    Authors { library: &'a str },
}

/// Destination of normalized documents
///
/// Each `insert` is its own transaction: committed on success, rolled back on any
/// failure, never batched with other records.
pub trait Sink {
    fn insert(&mut self, document: &NormalizedDocument) -> StorageResult<InsertOutcome>;

    fn existing_keys(&self, scope: KeyScope<'_>) -> StorageResult<HashSet<String>>;
}

/// Full storage backend: sink, run ledger and statistics
pub trait Storage: Sink {
    // ===== Run Management =====

    /// Creates a new run record and returns its ID
    fn create_run(&mut self, mode: RunMode, config_hash: &str) -> StorageResult<i64>;

    /// Gets a run record by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Closes a run with its final status and committed count
    fn finish_run(&mut self, run_id: i64, status: RunStatus, committed: u64) -> StorageResult<()>;

    /// Most recent runs, newest first
    fn recent_runs(&self, limit: u32) -> StorageResult<Vec<RunRecord>>;

    // ===== Statistics =====

    /// Total number of stored components
    fn count_components(&self) -> StorageResult<u64>;

    /// Component counts per (library, category), sorted by library then category
    fn count_by_category(&self) -> StorageResult<Vec<(String, String, u64)>>;

    /// Number of distinct authors
    fn count_authors(&self) -> StorageResult<u64>;
}
