//! Shared SQLite handle for the snapshot and diary tables.
//!
//! Both stores share one `Database`. The connection sits behind a mutex and
//! every call runs on the blocking thread pool, so async callers never block
//! the runtime on disk I/O.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use daybook_core::{DatabaseError, RusqliteErrorExt};
use parking_lot::Mutex;
use rusqlite::Connection;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Cloneable handle to the daybook database.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the database file at `path`.
    ///
    /// `busy_timeout` bounds how long a writer waits on another connection's
    /// lock; with zero, a conflicting transaction aborts immediately.
    pub fn open<P: AsRef<Path>>(path: P, busy_timeout: Duration) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path.as_ref())
            .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;
        conn.busy_timeout(busy_timeout)
            .map_err(RusqliteErrorExt::into_database_error)?;
        Self::with_connection(conn)
    }

    /// Create an in-memory database.
    pub fn in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, DatabaseError> {
        init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    pub async fn call<F, T>(&self, f: F) -> Result<T, DatabaseError>
    where
        F: FnOnce(&mut Connection) -> Result<T, DatabaseError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock();
            f(&mut guard)
        })
        .await
        .map_err(|e| DatabaseError::QueryFailed(format!("Database task failed: {}", e)))?
    }
}

/// Create tables and indexes if they don't exist.
fn init_schema(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS date_weather (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT NOT NULL,
            condition TEXT NOT NULL,
            icon TEXT NOT NULL,
            temperature REAL NOT NULL
        );

        CREATE TABLE IF NOT EXISTS diaries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT NOT NULL,
            text TEXT NOT NULL,
            condition TEXT NOT NULL,
            icon TEXT NOT NULL,
            temperature REAL NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_date_weather_date ON date_weather(date);
        CREATE INDEX IF NOT EXISTS idx_diaries_date ON diaries(date);
        "#,
    )
    .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))
}

/// Column representation of a date.
pub(crate) fn date_key(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Read a date column written by `date_key`.
pub(crate) fn read_date(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    NaiveDate::parse_from_str(&raw, DATE_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

pub(crate) fn db_err(e: rusqlite::Error) -> DatabaseError {
    e.into_database_error()
}
