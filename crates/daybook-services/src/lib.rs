pub mod db;
pub mod diary;
pub mod diary_service;
pub mod diary_store;
pub mod resolver;
pub mod scheduler;
pub mod snapshot_store;

#[cfg(test)]
mod test_support;

pub use db::Database;
pub use diary::{read_cutoff, DiaryEntry, DiaryError, NewDiaryEntry};
pub use diary_service::DiaryService;
pub use diary_store::DiaryStore;
pub use resolver::{ResolutionError, WeatherResolver};
pub use scheduler::{DailyAt, FireSchedule, RefreshError, SnapshotScheduler};
pub use snapshot_store::SnapshotStore;
