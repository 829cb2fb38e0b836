use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use daybook_core::Config;
use daybook_services::{
    DailyAt, Database, DiaryService, DiaryStore, SnapshotScheduler, SnapshotStore,
    WeatherResolver,
};
use daybook_weather::{HttpWeatherFetcher, WeatherFetcher};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<()> {
    daybook_core::init()?;

    let (config, _) = Config::load_validated()?;

    std::fs::create_dir_all(&config.data_dir).context("Failed to create data directory")?;
    let db = Database::open(
        config.database_path(),
        Duration::from_millis(config.storage.busy_timeout_ms),
    )
    .context("Failed to open database")?;
    tracing::info!("Database opened at {}", config.database_path().display());

    let fetcher: Arc<dyn WeatherFetcher> = Arc::new(
        HttpWeatherFetcher::new(&config.weather).context("Failed to create weather client")?,
    );
    let snapshots = SnapshotStore::new(db.clone());
    let resolver = WeatherResolver::new(fetcher.clone(), snapshots.clone());
    let diaries = DiaryService::new(resolver, DiaryStore::new(db));

    let shutdown = CancellationToken::new();
    let scheduler = if config.scheduler.enabled {
        let schedule = DailyAt::from_config(&config.scheduler)?;
        Some(SnapshotScheduler::new(fetcher, snapshots, schedule).spawn(shutdown.clone()))
    } else {
        tracing::info!("Weather snapshot scheduler disabled");
        None
    };

    let today = chrono::Local::now().date_naive();
    match diaries.read_diary(today).await {
        Ok(entries) => tracing::info!("{} diary entries for {}", entries.len(), today),
        Err(e) => tracing::warn!("Could not read today's diaries: {}", e.user_message()),
    }

    tracing::info!("Daybook running, press Ctrl+C to stop");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    tracing::info!("Shutting down");
    shutdown.cancel();
    if let Some(handle) = scheduler {
        handle.await.context("Scheduler task panicked")?;
    }

    Ok(())
}
