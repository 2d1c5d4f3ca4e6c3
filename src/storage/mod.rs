//! Storage module for persisting harvested components
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - One transaction per component insert, with conflicts rolled back
//! - Loading existing natural keys and authors for dedup indexes
//! - Run tracking and summary statistics

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{InsertOutcome, KeyScope, Sink, Storage, StorageError, StorageResult};

use crate::SwatchError;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ValueRef};
use std::path::Path;

/// Opens the SQLite store at `path`, creating it if needed
pub fn open_storage(path: &Path) -> Result<SqliteStorage, SwatchError> {
    SqliteStorage::new(path)
}

/// Represents a harvest run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub mode: RunMode,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub committed: u64,
    pub status: RunStatus,
}

/// Which collector a run drove
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Listing,
    CodeHost,
}

impl RunMode {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Listing => "listing",
            Self::CodeHost => "code_host",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "listing" => Some(Self::Listing),
            "code_host" => Some(Self::CodeHost),
            _ => None,
        }
    }
}

impl FromSql for RunMode {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;
        Self::from_db_string(text)
            .ok_or_else(|| FromSqlError::Other(format!("unknown run mode '{}'", text).into()))
    }
}

/// Status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl FromSql for RunStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;
        Self::from_db_string(text)
            .ok_or_else(|| FromSqlError::Other(format!("unknown run status '{}'", text).into()))
    }
}
