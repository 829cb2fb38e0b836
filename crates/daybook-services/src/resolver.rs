//! Cache-aside weather lookup for a date.
//!
//! The snapshot table is consulted first. On a miss the provider's current
//! conditions are fetched and returned, but never written back: only the
//! daily scheduler populates the table, so repeated misses for a date each
//! fetch live data.

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use daybook_core::DatabaseError;
use daybook_weather::{current_snapshot, WeatherError, WeatherFetcher, WeatherSnapshot};
use thiserror::Error;

use crate::snapshot_store::SnapshotStore;

/// Weather for a date could not be determined.
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("Weather resolution failed: {0}")]
    Weather(#[from] WeatherError),

    #[error("Weather resolution failed: {0}")]
    Storage(#[from] DatabaseError),
}

#[derive(Clone)]
pub struct WeatherResolver {
    fetcher: Arc<dyn WeatherFetcher>,
    snapshots: SnapshotStore,
}

impl WeatherResolver {
    pub fn new(fetcher: Arc<dyn WeatherFetcher>, snapshots: SnapshotStore) -> Self {
        Self { fetcher, snapshots }
    }

    /// Resolve the weather to attach to an entry dated `date`.
    ///
    /// A stored snapshot wins and the network is not touched. Otherwise the
    /// result reflects today's conditions whatever `date` was asked for.
    pub async fn resolve(&self, date: NaiveDate) -> Result<WeatherSnapshot, ResolutionError> {
        if let Some(stored) = self.snapshots.find_by_date(date).await?.into_iter().next() {
            tracing::debug!("Weather cache hit for {}", date);
            return Ok(stored);
        }

        tracing::debug!("Weather cache miss for {}, fetching current conditions", date);
        let today = Local::now().date_naive();
        let snapshot = current_snapshot(self.fetcher.as_ref(), today).await?;
        Ok(snapshot)
    }
}
