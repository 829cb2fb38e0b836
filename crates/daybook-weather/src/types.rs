use chrono::NaiveDate;
use daybook_core::NetworkError;
use serde::{Deserialize, Serialize};

/// Weather values extracted from a provider payload.
///
/// Each field is present only if the payload carried it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherFields {
    pub temperature: Option<f64>,
    pub condition: Option<String>,
    pub icon: Option<String>,
}

impl WeatherFields {
    /// True when the payload yielded nothing at all
    pub fn is_empty(&self) -> bool {
        self.temperature.is_none() && self.condition.is_none() && self.icon.is_none()
    }
}

/// Weather observed on a given date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub date: NaiveDate,
    /// Short condition label, e.g. "Clouds"
    pub condition: String,
    /// Provider icon code, e.g. "04d"
    pub icon: String,
    /// Degrees Celsius
    pub temperature: f64,
}

impl WeatherSnapshot {
    /// Build a snapshot for `date` from parsed fields.
    ///
    /// # Errors
    /// `WeatherError::NoData` if nothing was parsed, `WeatherError::Incomplete`
    /// naming the first absent field otherwise.
    pub fn from_fields(date: NaiveDate, fields: WeatherFields) -> Result<Self, WeatherError> {
        if fields.is_empty() {
            return Err(WeatherError::NoData);
        }

        let condition = fields.condition.ok_or(WeatherError::Incomplete("condition"))?;
        let icon = fields.icon.ok_or(WeatherError::Incomplete("icon"))?;
        let temperature = fields
            .temperature
            .ok_or(WeatherError::Incomplete("temperature"))?;

        Ok(Self {
            date,
            condition,
            icon,
            temperature,
        })
    }
}

/// Weather source errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Transport error: {0}")]
    Transport(#[from] NetworkError),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("No weather data in response")]
    NoData,
    #[error("Weather response is missing {0}")]
    Incomplete(&'static str),
    #[error("Invalid weather API URL: {0}")]
    InvalidUrl(String),
}

impl WeatherError {
    pub fn user_message(&self) -> &'static str {
        match self {
            WeatherError::Transport(e) => e.user_message(),
            WeatherError::Parse(_) => "The weather service returned unreadable data.",
            WeatherError::NoData | WeatherError::Incomplete(_) => {
                "No weather data is available right now."
            }
            WeatherError::InvalidUrl(_) => "The weather service URL is invalid. Check settings.",
        }
    }
}
