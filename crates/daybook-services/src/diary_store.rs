//! SQLite-based diary storage.
//!
//! Every write runs in an `IMMEDIATE` transaction. SQLite transactions are
//! serializable, and taking the write lock up front means a concurrent writer
//! on another connection fails with `SQLITE_BUSY` (mapped to
//! `DatabaseError::Conflict`) instead of both committing.

use chrono::NaiveDate;
use daybook_core::DatabaseError;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

use crate::db::{date_key, db_err, read_date, Database};
use crate::diary::{DiaryEntry, NewDiaryEntry};

const SELECT_COLUMNS: &str = "SELECT id, date, text, condition, icon, temperature FROM diaries";

#[derive(Clone)]
pub struct DiaryStore {
    db: Database,
}

impl DiaryStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Store a new entry and return it with its assigned id.
    pub async fn insert(&self, entry: NewDiaryEntry) -> Result<DiaryEntry, DatabaseError> {
        self.db
            .call(move |conn| {
                let tx = conn
                    .transaction_with_behavior(TransactionBehavior::Immediate)
                    .map_err(db_err)?;
                tx.execute(
                    "INSERT INTO diaries (date, text, condition, icon, temperature) VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        date_key(entry.date),
                        entry.text,
                        entry.condition,
                        entry.icon,
                        entry.temperature
                    ],
                )
                .map_err(db_err)?;
                let id = tx.last_insert_rowid();
                tx.commit().map_err(db_err)?;

                tracing::debug!("Created diary with ID: {}", id);
                Ok(DiaryEntry {
                    id,
                    date: entry.date,
                    text: entry.text,
                    condition: entry.condition,
                    icon: entry.icon,
                    temperature: entry.temperature,
                })
            })
            .await
    }

    /// All entries for `date`, oldest first.
    pub async fn find_by_date(&self, date: NaiveDate) -> Result<Vec<DiaryEntry>, DatabaseError> {
        self.db
            .call(move |conn| {
                let mut stmt = conn
                    .prepare(&format!("{} WHERE date = ?1 ORDER BY id", SELECT_COLUMNS))
                    .map_err(db_err)?;
                let rows = stmt
                    .query_map(params![date_key(date)], row_to_entry)
                    .map_err(db_err)?;
                rows.collect::<Result<Vec<_>, _>>().map_err(db_err)
            })
            .await
    }

    /// All entries dated within `[start, end]`, ordered by date then creation.
    pub async fn find_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DiaryEntry>, DatabaseError> {
        self.db
            .call(move |conn| {
                let mut stmt = conn
                    .prepare(&format!(
                        "{} WHERE date BETWEEN ?1 AND ?2 ORDER BY date, id",
                        SELECT_COLUMNS
                    ))
                    .map_err(db_err)?;
                let rows = stmt
                    .query_map(params![date_key(start), date_key(end)], row_to_entry)
                    .map_err(db_err)?;
                rows.collect::<Result<Vec<_>, _>>().map_err(db_err)
            })
            .await
    }

    /// Replace the text of the first entry for `date`.
    ///
    /// Returns `None` without writing if no entry exists.
    pub async fn update_first_text(
        &self,
        date: NaiveDate,
        text: String,
    ) -> Result<Option<DiaryEntry>, DatabaseError> {
        self.db
            .call(move |conn| {
                let tx = conn
                    .transaction_with_behavior(TransactionBehavior::Immediate)
                    .map_err(db_err)?;

                let Some(mut entry) = first_by_date(&tx, date)? else {
                    return Ok(None);
                };

                tx.execute(
                    "UPDATE diaries SET text = ?1 WHERE id = ?2",
                    params![text, entry.id],
                )
                .map_err(db_err)?;
                tx.commit().map_err(db_err)?;

                tracing::debug!("Updated diary: {}", entry.id);
                entry.text = text;
                Ok(Some(entry))
            })
            .await
    }

    /// Delete every entry for `date` and return how many were removed.
    ///
    /// When nothing matches, no DELETE is issued.
    pub async fn delete_by_date(&self, date: NaiveDate) -> Result<usize, DatabaseError> {
        self.db
            .call(move |conn| {
                let tx = conn
                    .transaction_with_behavior(TransactionBehavior::Immediate)
                    .map_err(db_err)?;

                let existing: i64 = tx
                    .query_row(
                        "SELECT COUNT(*) FROM diaries WHERE date = ?1",
                        params![date_key(date)],
                        |row| row.get(0),
                    )
                    .map_err(db_err)?;
                if existing == 0 {
                    return Ok(0);
                }

                let removed = tx
                    .execute("DELETE FROM diaries WHERE date = ?1", params![date_key(date)])
                    .map_err(db_err)?;
                tx.commit().map_err(db_err)?;

                tracing::debug!("Deleted {} diaries for {}", removed, date);
                Ok(removed)
            })
            .await
    }

    /// Total number of stored entries.
    pub async fn count(&self) -> Result<usize, DatabaseError> {
        self.db
            .call(|conn| {
                let count: i64 = conn
                    .query_row("SELECT COUNT(*) FROM diaries", [], |row| row.get(0))
                    .map_err(db_err)?;
                Ok(usize::try_from(count).unwrap_or(0))
            })
            .await
    }
}

fn first_by_date(conn: &Connection, date: NaiveDate) -> Result<Option<DiaryEntry>, DatabaseError> {
    conn.query_row(
        &format!("{} WHERE date = ?1 ORDER BY id LIMIT 1", SELECT_COLUMNS),
        params![date_key(date)],
        row_to_entry,
    )
    .optional()
    .map_err(db_err)
}

fn row_to_entry(row: &rusqlite::Row) -> rusqlite::Result<DiaryEntry> {
    Ok(DiaryEntry {
        id: row.get(0)?,
        date: read_date(row, 1)?,
        text: row.get(2)?,
        condition: row.get(3)?,
        icon: row.get(4)?,
        temperature: row.get(5)?,
    })
}
