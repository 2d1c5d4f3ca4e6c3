//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Swatchbook database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track harvest runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    mode TEXT NOT NULL,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    committed INTEGER NOT NULL DEFAULT 0,
    status TEXT NOT NULL
);

-- One row per harvested component; the natural key is unique per library
CREATE TABLE IF NOT EXISTS components (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    natural_key TEXT NOT NULL,
    library TEXT NOT NULL,
    name TEXT NOT NULL,
    code TEXT NOT NULL,
    source_url TEXT NOT NULL,
    author TEXT,
    category TEXT NOT NULL,
    license TEXT,
    created_at TEXT NOT NULL,
    UNIQUE(library, natural_key)
);

CREATE INDEX IF NOT EXISTS idx_components_author ON components(library, author);
CREATE INDEX IF NOT EXISTS idx_components_category ON components(library, category);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        initialize_schema(&conn).unwrap();
        let result = initialize_schema(&conn);

        assert!(result.is_ok());
    }

    #[test]
    fn test_tables_exist_after_init() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();

        for table in ["runs", "components"] {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "Table {} should exist", table);
        }
    }
}
