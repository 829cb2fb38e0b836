//! Decoding of the provider's current-weather payload.
//!
//! Only `main.temp`, `weather[0].main` and `weather[0].icon` are read; every
//! other field in the response is ignored.

use serde::Deserialize;

use crate::types::{WeatherError, WeatherFields};

#[derive(Debug, Deserialize)]
struct CurrentWeatherResponse {
    main: Option<MainBlock>,
    weather: Option<Vec<ConditionBlock>>,
}

#[derive(Debug, Deserialize)]
struct MainBlock {
    temp: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ConditionBlock {
    main: Option<String>,
    icon: Option<String>,
}

/// Parse a raw provider response.
///
/// Missing or empty input is not an error: it yields empty fields, which callers
/// treat as "no data available".
///
/// # Errors
/// Returns `WeatherError::Parse` if the text is not a JSON object of the
/// expected shape.
pub fn parse(raw: Option<&str>) -> Result<WeatherFields, WeatherError> {
    let raw = match raw {
        Some(text) if !text.is_empty() => text,
        _ => return Ok(WeatherFields::default()),
    };

    let response: CurrentWeatherResponse =
        serde_json::from_str(raw).map_err(|e| WeatherError::Parse(e.to_string()))?;

    let mut fields = WeatherFields {
        temperature: response.main.and_then(|m| m.temp),
        ..WeatherFields::default()
    };

    if let Some(first) = response.weather.and_then(|w| w.into_iter().next()) {
        fields.condition = first.main;
        fields.icon = first.icon;
    }

    Ok(fields)
}
