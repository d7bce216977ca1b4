//! History storage trait and the SQLite implementation.

use rusqlite::{params, Connection};
use std::path::Path;
use thiserror::Error;

use crate::record::{NewTemperatureRecord, TemperatureRecord};

/// Errors that can occur during history store operations.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// Storage error (database open, query, constraint other than the natural key).
    #[error("Storage error: {0}")]
    Storage(String),

    /// Generic error wrapper.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl HistoryError {
    /// Create a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }
}

/// Result type for history store operations.
pub type HistoryResult<T> = Result<T, HistoryError>;

/// Result of an insert attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Stored under the given row id.
    Inserted(i64),
    /// A record with the same natural key already exists; nothing was written.
    Duplicate,
}

impl InsertOutcome {
    pub fn is_duplicate(self) -> bool {
        matches!(self, InsertOutcome::Duplicate)
    }
}

/// Persisted history of weather observations.
///
/// Implementations don't need to be Sync; `HistoryClient` serialises access
/// through a mutex.
pub trait HistoryStore: Send {
    /// Insert unless a record with the same `(date, place_name,
    /// temperature_c, description)` exists. Duplicates are not errors.
    fn insert(&self, record: &NewTemperatureRecord) -> HistoryResult<InsertOutcome>;

    /// All records, most recent first.
    fn query_all(&self) -> HistoryResult<Vec<TemperatureRecord>>;

    /// Remove every record, returning how many were deleted.
    fn delete_all(&self) -> HistoryResult<usize>;

    fn count(&self) -> HistoryResult<usize> {
        Ok(self.query_all()?.len())
    }
}

/// SQLite-based history storage.
pub struct SqliteHistoryStore {
    conn: Connection,
}

impl SqliteHistoryStore {
    /// Open (or create) the store at the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store.
    pub fn in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> anyhow::Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS temperature (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                date TEXT NOT NULL,
                place_name TEXT NOT NULL,
                description TEXT NOT NULL,
                temperature_c REAL NOT NULL,
                humidity_pct INTEGER NOT NULL,
                pressure_hpa INTEGER NOT NULL,
                is_local INTEGER NOT NULL DEFAULT 0,
                captured_at_ms INTEGER NOT NULL
            );

            CREATE UNIQUE INDEX IF NOT EXISTS idx_temperature_natural_key
                ON temperature(date, place_name, temperature_c, description);
            CREATE INDEX IF NOT EXISTS idx_temperature_recent
                ON temperature(date DESC, captured_at_ms DESC);
            "#,
        )?;
        Ok(())
    }

    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<TemperatureRecord> {
        let is_local: i32 = row.get(7)?;
        Ok(TemperatureRecord {
            id: row.get(0)?,
            date: row.get(1)?,
            place_name: row.get(2)?,
            description: row.get(3)?,
            temperature_c: row.get(4)?,
            humidity_pct: row.get(5)?,
            pressure_hpa: row.get(6)?,
            is_local_origin: is_local != 0,
            captured_at_ms: row.get(8)?,
        })
    }
}

impl HistoryStore for SqliteHistoryStore {
    fn insert(&self, record: &NewTemperatureRecord) -> HistoryResult<InsertOutcome> {
        let changed = self
            .conn
            .execute(
                "INSERT INTO temperature
                    (date, place_name, description, temperature_c, humidity_pct, pressure_hpa, is_local, captured_at_ms)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT(date, place_name, temperature_c, description) DO NOTHING",
                params![
                    record.date,
                    record.place_name,
                    record.description,
                    record.temperature_c,
                    record.humidity_pct,
                    record.pressure_hpa,
                    record.is_local_origin as i32,
                    record.captured_at_ms,
                ],
            )
            .map_err(|e| HistoryError::storage(e.to_string()))?;

        if changed == 0 {
            tracing::debug!(
                "Skipping duplicate history record for {} on {}",
                record.place_name,
                record.date
            );
            return Ok(InsertOutcome::Duplicate);
        }

        let id = self.conn.last_insert_rowid();
        tracing::info!("Recorded {} on {} (id {})", record.place_name, record.date, id);
        Ok(InsertOutcome::Inserted(id))
    }

    fn query_all(&self) -> HistoryResult<Vec<TemperatureRecord>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, date, place_name, description, temperature_c, humidity_pct, pressure_hpa, is_local, captured_at_ms
                 FROM temperature
                 ORDER BY date DESC, captured_at_ms DESC, id DESC",
            )
            .map_err(|e| HistoryError::storage(e.to_string()))?;

        let rows = stmt
            .query_map([], Self::row_to_record)
            .map_err(|e| HistoryError::storage(e.to_string()))?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| HistoryError::storage(e.to_string()))
    }

    fn delete_all(&self) -> HistoryResult<usize> {
        let deleted = self
            .conn
            .execute("DELETE FROM temperature", [])
            .map_err(|e| HistoryError::storage(e.to_string()))?;
        tracing::info!("Cleared {} history records", deleted);
        Ok(deleted)
    }

    fn count(&self) -> HistoryResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM temperature", [], |row| row.get(0))
            .map_err(|e| HistoryError::storage(e.to_string()))?;
        Ok(count as usize)
    }
}
