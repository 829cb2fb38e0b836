//! Per-date weather snapshot table.
//!
//! Rows are never updated. Several rows may share a date; lookups return them
//! in insertion order so callers can take the first as the definite one.

use chrono::NaiveDate;
use daybook_core::DatabaseError;
use daybook_weather::WeatherSnapshot;
use rusqlite::{params, Connection, TransactionBehavior};

use crate::db::{date_key, db_err, read_date, Database};

#[derive(Clone)]
pub struct SnapshotStore {
    db: Database,
}

impl SnapshotStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// All snapshots recorded for `date`, oldest first.
    pub async fn find_by_date(&self, date: NaiveDate) -> Result<Vec<WeatherSnapshot>, DatabaseError> {
        self.db.call(move |conn| query_by_date(conn, date)).await
    }

    /// Insert a snapshot in its own transaction and return its row id.
    pub async fn insert(&self, snapshot: WeatherSnapshot) -> Result<i64, DatabaseError> {
        self.db
            .call(move |conn| {
                let tx = conn
                    .transaction_with_behavior(TransactionBehavior::Immediate)
                    .map_err(db_err)?;
                tx.execute(
                    "INSERT INTO date_weather (date, condition, icon, temperature) VALUES (?1, ?2, ?3, ?4)",
                    params![
                        date_key(snapshot.date),
                        snapshot.condition,
                        snapshot.icon,
                        snapshot.temperature
                    ],
                )
                .map_err(db_err)?;
                let id = tx.last_insert_rowid();
                tx.commit().map_err(db_err)?;

                tracing::debug!("Stored weather snapshot {} for {}", id, snapshot.date);
                Ok(id)
            })
            .await
    }

    /// Total number of stored snapshots.
    pub async fn count(&self) -> Result<usize, DatabaseError> {
        self.db
            .call(|conn| {
                let count: i64 = conn
                    .query_row("SELECT COUNT(*) FROM date_weather", [], |row| row.get(0))
                    .map_err(db_err)?;
                Ok(usize::try_from(count).unwrap_or(0))
            })
            .await
    }
}

fn query_by_date(conn: &Connection, date: NaiveDate) -> Result<Vec<WeatherSnapshot>, DatabaseError> {
    let mut stmt = conn
        .prepare(
            "SELECT date, condition, icon, temperature FROM date_weather WHERE date = ?1 ORDER BY id",
        )
        .map_err(db_err)?;

    let rows = stmt
        .query_map(params![date_key(date)], |row| {
            Ok(WeatherSnapshot {
                date: read_date(row, 0)?,
                condition: row.get(1)?,
                icon: row.get(2)?,
                temperature: row.get(3)?,
            })
        })
        .map_err(db_err)?;

    rows.collect::<Result<Vec<_>, _>>().map_err(db_err)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    fn snapshot(date: NaiveDate, condition: &str, temperature: f64) -> WeatherSnapshot {
        WeatherSnapshot {
            date,
            condition: condition.to_string(),
            icon: "01d".to_string(),
            temperature,
        }
    }

    fn create_test_store() -> SnapshotStore {
        SnapshotStore::new(Database::in_memory().expect("Failed to create in-memory database"))
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let store = create_test_store();
        let date = NaiveDate::from_ymd_opt(2024, 11, 29).unwrap();

        store.insert(snapshot(date, "Clear", 4.5)).await.unwrap();

        let found = store.find_by_date(date).await.unwrap();
        assert_eq!(found, vec![snapshot(date, "Clear", 4.5)]);
    }

    #[tokio::test]
    async fn test_duplicates_come_back_in_insertion_order() {
        let store = create_test_store();
        let date = NaiveDate::from_ymd_opt(2024, 11, 29).unwrap();

        store.insert(snapshot(date, "Rain", 8.0)).await.unwrap();
        store.insert(snapshot(date, "Clear", 11.0)).await.unwrap();

        let found = store.find_by_date(date).await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].condition, "Rain");
        assert_eq!(found[1].condition, "Clear");
    }

    #[tokio::test]
    async fn test_find_other_date_is_empty() {
        let store = create_test_store();
        let date = NaiveDate::from_ymd_opt(2024, 11, 29).unwrap();
        store.insert(snapshot(date, "Clear", 4.5)).await.unwrap();

        let other = date.succ_opt().unwrap();
        assert!(store.find_by_date(other).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_count() {
        let store = create_test_store();
        let date = NaiveDate::from_ymd_opt(2024, 11, 29).unwrap();

        assert_eq!(store.count().await.unwrap(), 0);
        store.insert(snapshot(date, "Clear", 4.5)).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 1);
    }
}
