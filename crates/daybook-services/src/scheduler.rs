//! Daily weather snapshot job.
//!
//! Once per day the scheduler fetches current conditions and stores them as
//! that day's snapshot. This is the only writer of the snapshot table. A
//! failed run is logged and skipped; the loop keeps scheduling until it is
//! cancelled.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, NaiveTime, TimeDelta, TimeZone};
use daybook_core::{ConfigError, DatabaseError, SchedulerConfig};
use daybook_weather::{current_snapshot, WeatherError, WeatherFetcher, WeatherSnapshot};
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::snapshot_store::SnapshotStore;

/// A scheduled refresh failed; nothing was stored.
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("Failed to save weather data: {0}")]
    Weather(#[from] WeatherError),

    #[error("Failed to save weather data: {0}")]
    Storage(#[from] DatabaseError),
}

/// Source of the wait before the next fire.
pub trait FireSchedule: Send + Sync {
    fn next_delay(&self) -> Duration;
}

/// Fires once a day at a fixed local time.
#[derive(Debug, Clone, Copy)]
pub struct DailyAt {
    at: NaiveTime,
}

impl DailyAt {
    pub fn new(at: NaiveTime) -> Self {
        Self { at }
    }

    pub fn from_config(config: &SchedulerConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(config.fire_time()?))
    }

    /// First fire time strictly after `now`.
    ///
    /// If the wall-clock time doesn't exist that day (DST gap) the fire moves
    /// an hour later.
    pub fn next_fire_after<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> DateTime<Tz> {
        let tz = now.timezone();
        let mut day = now.date_naive();

        for _ in 0..3 {
            let local = day.and_time(self.at);
            let candidate = tz.from_local_datetime(&local).earliest().or_else(|| {
                tz.from_local_datetime(&(local + TimeDelta::hours(1)))
                    .earliest()
            });

            if let Some(fire) = candidate {
                if fire > *now {
                    return fire;
                }
            }

            match day.succ_opt() {
                Some(next) => day = next,
                None => break,
            }
        }

        now.clone() + TimeDelta::days(1)
    }
}

impl FireSchedule for DailyAt {
    fn next_delay(&self) -> Duration {
        let now = Local::now();
        (self.next_fire_after(&now) - now)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }
}

pub struct SnapshotScheduler {
    fetcher: Arc<dyn WeatherFetcher>,
    snapshots: SnapshotStore,
    schedule: Box<dyn FireSchedule>,
}

impl SnapshotScheduler {
    pub fn new(
        fetcher: Arc<dyn WeatherFetcher>,
        snapshots: SnapshotStore,
        schedule: impl FireSchedule + 'static,
    ) -> Self {
        Self {
            fetcher,
            snapshots,
            schedule: Box::new(schedule),
        }
    }

    /// Fetch, parse and store today's snapshot as one unit.
    ///
    /// Nothing is written unless every step succeeds.
    pub async fn refresh_once(&self) -> Result<WeatherSnapshot, RefreshError> {
        tracing::info!("Fetching weather data for the daily snapshot");
        let today = Local::now().date_naive();
        let snapshot = current_snapshot(self.fetcher.as_ref(), today).await?;
        self.snapshots.insert(snapshot.clone()).await?;

        tracing::info!(
            "Saved weather snapshot for {}: {} {}°C",
            snapshot.date,
            snapshot.condition,
            snapshot.temperature
        );
        Ok(snapshot)
    }

    /// Run until `shutdown` is cancelled.
    pub async fn run(self, shutdown: CancellationToken) {
        tracing::info!("Weather snapshot scheduler started");

        loop {
            let delay = self.schedule.next_delay();
            tracing::debug!("Next weather snapshot in {:?}", delay);

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }

            if let Err(e) = self.refresh_once().await {
                tracing::error!("Scheduled weather snapshot failed: {}", e);
            }
        }

        tracing::info!("Weather snapshot scheduler stopped");
    }

    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}
