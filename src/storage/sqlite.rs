//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Sink and Storage traits.

use crate::normalize::NormalizedDocument;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{
    InsertOutcome, KeyScope, Sink, Storage, StorageError, StorageResult,
};
use crate::storage::{RunMode, RunRecord, RunStatus};
use crate::SwatchError;
use chrono::Utc;
use rusqlite::{params, Connection, ErrorCode};
use std::collections::HashSet;
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens (or creates) the database at `path` and initializes the schema
    pub fn new(path: &Path) -> Result<Self, SwatchError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, SwatchError> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn is_constraint_violation(error: &rusqlite::Error) -> bool {
    matches!(
        error,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

fn run_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        mode: row.get(1)?,
        started_at: row.get(2)?,
        finished_at: row.get(3)?,
        config_hash: row.get(4)?,
        committed: row.get::<_, i64>(5)? as u64,
        status: row.get(6)?,
    })
}

const RUN_COLUMNS: &str = "id, mode, started_at, finished_at, config_hash, committed, status";

impl Sink for SqliteStorage {
    fn insert(&mut self, document: &NormalizedDocument) -> StorageResult<InsertOutcome> {
        let tx = self.conn.transaction()?;

        let result = tx.execute(
            "INSERT INTO components
                (natural_key, library, name, code, source_url, author, category, license, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                document.natural_key,
                document.library,
                document.display_name,
                document.combined_markup,
                document.source_url,
                document.author,
                document.category,
                document.license,
                Utc::now().to_rfc3339(),
            ],
        );

        match result {
            Ok(_) => {
                let id = tx.last_insert_rowid();
                tx.commit()?;
                Ok(InsertOutcome::Inserted(id))
            }
            Err(e) if is_constraint_violation(&e) => {
                tracing::debug!("Insert of {} rolled back: {}", document.natural_key, e);
                tx.rollback()?;
                Ok(InsertOutcome::Conflict)
            }
            Err(e) => {
                tx.rollback()?;
                Err(StorageError::Sqlite(e))
            }
        }
    }

    fn existing_keys(&self, scope: KeyScope<'_>) -> StorageResult<HashSet<String>> {
        let (sql, library) = match scope {
            KeyScope::NaturalKeys { library } => (
                "SELECT DISTINCT natural_key FROM components WHERE library = ?1",
                library,
            ),
            KeyScope::Authors { library } => (
                "SELECT DISTINCT author FROM components
                 WHERE library = ?1 AND author IS NOT NULL AND author <> ''",
                library,
            ),
        };

        let mut stmt = self.conn.prepare(sql)?;
        let keys = stmt
            .query_map(params![library], |row| row.get::<_, String>(0))?
            .collect::<Result<HashSet<_>, _>>()?;
        Ok(keys)
    }
}

impl Storage for SqliteStorage {
    // ===== Run Management =====

    fn create_run(&mut self, mode: RunMode, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (mode, started_at, config_hash, status) VALUES (?1, ?2, ?3, ?4)",
            params![
                mode.to_db_string(),
                now,
                config_hash,
                RunStatus::Running.to_db_string()
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS))?;

        stmt.query_row(params![run_id], run_from_row)
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StorageError::RunNotFound(run_id),
                other => StorageError::Sqlite(other),
            })
    }

    fn finish_run(&mut self, run_id: i64, status: RunStatus, committed: u64) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, committed = ?3 WHERE id = ?4",
            params![status.to_db_string(), now, committed as i64, run_id],
        )?;
        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn recent_runs(&self, limit: u32) -> StorageResult<Vec<RunRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM runs ORDER BY id DESC LIMIT ?1",
            RUN_COLUMNS
        ))?;
        let runs = stmt
            .query_map(params![limit], run_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(runs)
    }

    // ===== Statistics =====

    fn count_components(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM components", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_by_category(&self) -> StorageResult<Vec<(String, String, u64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT library, category, COUNT(*) FROM components
             GROUP BY library, category ORDER BY library, category",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get::<_, i64>(2)? as u64))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn count_authors(&self) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(DISTINCT author) FROM components WHERE author IS NOT NULL AND author <> ''",
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}
