//! SQLite-backed ledger storage
//!
//! Lives at `~/.ancient-monad/ledger.db` by default.

use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};

use super::{LedgerError, LedgerStore};

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY
);

CREATE TABLE IF NOT EXISTS ledger (
    key TEXT PRIMARY KEY,
    value INTEGER NOT NULL DEFAULT 0,
    updated_at INTEGER NOT NULL
);

INSERT OR IGNORE INTO schema_version VALUES (1);
"#;

/// Ledger store on a single SQLite file
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open or create the ledger database at `path`
    pub fn open(path: &Path) -> Result<Self, LedgerError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        Self::with_connection(conn)
    }

    /// In-memory database, gone when the store is dropped
    pub fn open_in_memory() -> Result<Self, LedgerError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, LedgerError> {
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl LedgerStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<u64>, LedgerError> {
        let conn = self.conn();
        let value: Option<i64> = conn
            .query_row("SELECT value FROM ledger WHERE key = ?1", [key], |r| r.get(0))
            .optional()?;

        match value {
            None => Ok(None),
            Some(v) => u64::try_from(v).map(Some).map_err(|_| LedgerError::OutOfRange {
                key: key.to_string(),
                value: v,
            }),
        }
    }

    fn set(&self, key: &str, value: u64) -> Result<(), LedgerError> {
        // SQLite integers are signed
        let value = i64::try_from(value).unwrap_or(i64::MAX);
        let conn = self.conn();
        conn.execute(
            r#"
            INSERT INTO ledger (key, value, updated_at) VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = ?3
            "#,
            (key, value, Utc::now().timestamp_millis()),
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), LedgerError> {
        let conn = self.conn();
        conn.execute("DELETE FROM ledger WHERE key = ?1", [key])?;
        Ok(())
    }
}
