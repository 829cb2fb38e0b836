//! Diary entry types and error kinds.

use chrono::NaiveDate;
use daybook_core::DatabaseError;
use daybook_weather::WeatherSnapshot;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::resolver::ResolutionError;

/// Latest date `read_diary` accepts: year 2222, day 1.
pub fn read_cutoff() -> NaiveDate {
    NaiveDate::from_yo_opt(2222, 1).unwrap_or(NaiveDate::MAX)
}

/// A stored diary entry.
///
/// The weather columns are a copy taken when the entry was created; later
/// snapshots for the same date never change them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiaryEntry {
    pub id: i64,
    pub date: NaiveDate,
    pub text: String,
    pub condition: String,
    pub icon: String,
    pub temperature: f64,
}

/// A diary entry that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDiaryEntry {
    pub date: NaiveDate,
    pub text: String,
    pub condition: String,
    pub icon: String,
    pub temperature: f64,
}

impl NewDiaryEntry {
    /// Pair `text` with a copy of the resolved weather.
    pub fn new(date: NaiveDate, text: impl Into<String>, weather: &WeatherSnapshot) -> Self {
        Self {
            date,
            text: text.into(),
            condition: weather.condition.clone(),
            icon: weather.icon.clone(),
            temperature: weather.temperature,
        }
    }
}

/// Errors returned by diary operations.
#[derive(Debug, Error)]
pub enum DiaryError {
    /// Weather for the entry could not be resolved; nothing was written.
    #[error("Failed to parse weather data: {0}")]
    WeatherUnavailable(#[source] ResolutionError),

    #[error("Invalid date: {0} is after {}", read_cutoff())]
    InvalidDate(NaiveDate),

    #[error("No diary found for {0}")]
    NotFound(NaiveDate),

    #[error("Storage error: {0}")]
    Storage(#[from] DatabaseError),
}

impl DiaryError {
    /// Returns a user-friendly message suitable for display.
    pub fn user_message(&self) -> &'static str {
        match self {
            DiaryError::WeatherUnavailable(_) => {
                "Weather for this date is unavailable, so the diary was not saved."
            }
            DiaryError::InvalidDate(_) => "That date is too far in the future.",
            DiaryError::NotFound(_) => "There is no diary for that date.",
            DiaryError::Storage(e) => e.user_message(),
        }
    }

    /// Whether a request boundary should report this as bad input.
    ///
    /// Only an out-of-range read date qualifies; every other kind, including
    /// `NotFound`, is reported as a server-side failure.
    pub fn is_client_error(&self) -> bool {
        matches!(self, DiaryError::InvalidDate(_))
    }
}
