//! Diary operations: create, read, update, delete.
//!
//! Creating an entry resolves weather for its date first; if that fails the
//! entry is rejected and nothing is written. All failures are returned to the
//! caller as `DiaryError`.

use chrono::NaiveDate;

use crate::diary::{read_cutoff, DiaryEntry, DiaryError, NewDiaryEntry};
use crate::diary_store::DiaryStore;
use crate::resolver::WeatherResolver;

#[derive(Clone)]
pub struct DiaryService {
    resolver: WeatherResolver,
    diaries: DiaryStore,
}

impl DiaryService {
    pub fn new(resolver: WeatherResolver, diaries: DiaryStore) -> Self {
        Self { resolver, diaries }
    }

    /// Create an entry for `date` annotated with that date's weather.
    ///
    /// # Errors
    /// `DiaryError::WeatherUnavailable` if weather cannot be resolved, and
    /// `DiaryError::Storage` (possibly a conflict) if the insert is aborted.
    pub async fn create_diary(
        &self,
        date: NaiveDate,
        text: impl Into<String>,
    ) -> Result<DiaryEntry, DiaryError> {
        let weather = self.resolver.resolve(date).await.map_err(|e| {
            tracing::error!("Failed to create diary for {}: {}", date, e);
            DiaryError::WeatherUnavailable(e)
        })?;

        let entry = self
            .diaries
            .insert(NewDiaryEntry::new(date, text, &weather))
            .await?;

        tracing::info!("Created diary {} for {}", entry.id, entry.date);
        Ok(entry)
    }

    /// All entries for `date`.
    ///
    /// # Errors
    /// `DiaryError::InvalidDate` for dates after the read cutoff; storage is
    /// not consulted in that case.
    pub async fn read_diary(&self, date: NaiveDate) -> Result<Vec<DiaryEntry>, DiaryError> {
        if date > read_cutoff() {
            return Err(DiaryError::InvalidDate(date));
        }
        Ok(self.diaries.find_by_date(date).await?)
    }

    /// All entries dated from `start` through `end`.
    pub async fn read_diaries(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DiaryEntry>, DiaryError> {
        Ok(self.diaries.find_between(start, end).await?)
    }

    /// Replace the text of the first entry for `date`.
    pub async fn update_diary(
        &self,
        date: NaiveDate,
        text: impl Into<String>,
    ) -> Result<DiaryEntry, DiaryError> {
        let entry = self
            .diaries
            .update_first_text(date, text.into())
            .await?
            .ok_or(DiaryError::NotFound(date))?;

        tracing::info!("Updated diary {} for {}", entry.id, date);
        Ok(entry)
    }

    /// Delete every entry for `date`, returning how many were removed.
    pub async fn delete_diary(&self, date: NaiveDate) -> Result<usize, DiaryError> {
        let removed = self.diaries.delete_by_date(date).await?;
        if removed == 0 {
            return Err(DiaryError::NotFound(date));
        }

        tracing::info!("Deleted {} diaries for {}", removed, date);
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use std::sync::Arc;

    use daybook_weather::{WeatherError, WeatherSnapshot};

    use crate::db::Database;
    use crate::resolver::ResolutionError;
    use crate::snapshot_store::SnapshotStore;
    use crate::test_support::{FakeFetcher, CLOUDS_PAYLOAD};

    struct Fixture {
        service: DiaryService,
        snapshots: SnapshotStore,
        diaries: DiaryStore,
        db: Database,
    }

    fn fixture(fetcher: Arc<FakeFetcher>) -> Fixture {
        let db = Database::in_memory().unwrap();
        let snapshots = SnapshotStore::new(db.clone());
        let diaries = DiaryStore::new(db.clone());
        let resolver = WeatherResolver::new(fetcher, snapshots.clone());
        Fixture {
            service: DiaryService::new(resolver, diaries.clone()),
            snapshots,
            diaries,
            db,
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 11, d).unwrap()
    }

    fn stored(date: NaiveDate, condition: &str, temperature: f64) -> WeatherSnapshot {
        WeatherSnapshot {
            date,
            condition: condition.into(),
            icon: "09d".into(),
            temperature,
        }
    }

    #[tokio::test]
    async fn test_create_uses_stored_snapshot() {
        let fetcher = Arc::new(FakeFetcher::ok(CLOUDS_PAYLOAD));
        let f = fixture(fetcher.clone());
        f.snapshots.insert(stored(day(29), "Drizzle", 6.5)).await.unwrap();

        let entry = f.service.create_diary(day(29), "rainy walk").await.unwrap();

        assert_eq!(entry.date, day(29));
        assert_eq!(entry.text, "rainy walk");
        assert_eq!(entry.condition, "Drizzle");
        assert_eq!(entry.temperature, 6.5);
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn test_create_on_miss_uses_live_weather() {
        let fetcher = Arc::new(FakeFetcher::ok(CLOUDS_PAYLOAD));
        let f = fixture(fetcher.clone());

        let entry = f.service.create_diary(day(3), "quiet day").await.unwrap();

        assert_eq!(entry.date, day(3));
        assert_eq!(entry.condition, "Clouds");
        assert_eq!(entry.icon, "04d");
        assert_eq!(fetcher.calls(), 1);
        assert_eq!(f.snapshots.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_create_fails_without_weather_and_writes_nothing() {
        let f = fixture(Arc::new(FakeFetcher::unreachable()));

        let err = f.service.create_diary(day(1), "lost").await.unwrap_err();

        assert!(matches!(
            err,
            DiaryError::WeatherUnavailable(ResolutionError::Weather(WeatherError::Transport(_)))
        ));
        assert!(err.to_string().starts_with("Failed to parse weather data"));
        assert_eq!(f.diaries.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_create_rejects_malformed_weather() {
        let f = fixture(Arc::new(FakeFetcher::ok("{not json")));

        let err = f.service.create_diary(day(1), "lost").await.unwrap_err();

        assert!(matches!(
            err,
            DiaryError::WeatherUnavailable(ResolutionError::Weather(WeatherError::Parse(_)))
        ));
        assert_eq!(f.diaries.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_weather_copy_is_not_a_live_reference() {
        let f = fixture(Arc::new(FakeFetcher::ok(CLOUDS_PAYLOAD)));
        f.snapshots.insert(stored(day(10), "Fog", 2.0)).await.unwrap();
        f.service.create_diary(day(10), "foggy").await.unwrap();

        // A later snapshot for the same date doesn't change the stored entry.
        f.snapshots.insert(stored(day(10), "Clear", 15.0)).await.unwrap();

        let entries = f.service.read_diary(day(10)).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].condition, "Fog");
        assert_eq!(entries[0].temperature, 2.0);
    }

    #[tokio::test]
    async fn test_read_after_cutoff_skips_storage() {
        let f = fixture(Arc::new(FakeFetcher::ok(CLOUDS_PAYLOAD)));
        // With the table gone any query would fail with a storage error.
        f.db.call(|conn| {
            conn.execute_batch("DROP TABLE diaries")
                .map_err(crate::db::db_err)
        })
        .await
        .unwrap();

        let far = NaiveDate::from_ymd_opt(2223, 1, 1).unwrap();
        let err = f.service.read_diary(far).await.unwrap_err();
        assert!(matches!(err, DiaryError::InvalidDate(d) if d == far));

        let err = f.service.read_diary(day(1)).await.unwrap_err();
        assert!(matches!(err, DiaryError::Storage(_)));
    }

    #[tokio::test]
    async fn test_read_on_cutoff_is_allowed() {
        let f = fixture(Arc::new(FakeFetcher::ok(CLOUDS_PAYLOAD)));
        let entries = f.service.read_diary(read_cutoff()).await.unwrap();
        assert!(entries.is_empty());

        let next = read_cutoff().succ_opt().unwrap();
        assert!(matches!(
            f.service.read_diary(next).await,
            Err(DiaryError::InvalidDate(_))
        ));
    }

    #[tokio::test]
    async fn test_read_diaries_has_no_cutoff() {
        let f = fixture(Arc::new(FakeFetcher::ok(CLOUDS_PAYLOAD)));
        let far = NaiveDate::from_ymd_opt(2300, 6, 1).unwrap();
        f.service.create_diary(far, "time capsule").await.unwrap();
        f.service.create_diary(day(2), "today").await.unwrap();

        let entries = f.service.read_diaries(day(1), far).await.unwrap();
        let texts: Vec<_> = entries.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["today", "time capsule"]);
    }

    #[tokio::test]
    async fn test_update_replaces_text() {
        let f = fixture(Arc::new(FakeFetcher::ok(CLOUDS_PAYLOAD)));
        let created = f.service.create_diary(day(4), "draft").await.unwrap();

        let updated = f.service.update_diary(day(4), "final").await.unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.text, "final");
        assert_eq!(updated.condition, created.condition);

        let entries = f.service.read_diary(day(4)).await.unwrap();
        assert_eq!(entries[0].text, "final");
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let f = fixture(Arc::new(FakeFetcher::ok(CLOUDS_PAYLOAD)));
        let err = f.service.update_diary(day(4), "nothing").await.unwrap_err();
        assert!(matches!(err, DiaryError::NotFound(d) if d == day(4)));
    }

    #[tokio::test]
    async fn test_delete_removes_all_for_date() {
        let f = fixture(Arc::new(FakeFetcher::ok(CLOUDS_PAYLOAD)));
        f.service.create_diary(day(7), "a").await.unwrap();
        f.service.create_diary(day(7), "b").await.unwrap();
        f.service.create_diary(day(8), "c").await.unwrap();

        assert_eq!(f.service.delete_diary(day(7)).await.unwrap(), 2);
        assert!(f.service.read_diary(day(7)).await.unwrap().is_empty());
        assert_eq!(f.diaries.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found_and_changes_nothing() {
        let f = fixture(Arc::new(FakeFetcher::ok(CLOUDS_PAYLOAD)));
        f.service.create_diary(day(8), "keep").await.unwrap();

        let err = f.service.delete_diary(day(7)).await.unwrap_err();
        assert!(matches!(err, DiaryError::NotFound(_)));
        assert_eq!(f.diaries.count().await.unwrap(), 1);
    }
}
