use async_trait::async_trait;
use chrono::NaiveDate;
use daybook_core::{ReqwestErrorExt, WeatherConfig};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::parser::parse;
use crate::types::{WeatherError, WeatherSnapshot};

/// Source of raw current-weather payloads.
#[async_trait]
pub trait WeatherFetcher: Send + Sync {
    /// Perform one request and return the response body as text.
    ///
    /// # Errors
    /// `WeatherError::Transport` when the request could not be completed.
    async fn fetch_raw(&self) -> Result<String, WeatherError>;
}

/// Fetches current weather from an OpenWeatherMap-style HTTP endpoint.
///
/// One GET per call; no retry and no backoff.
#[derive(Debug, Clone)]
pub struct HttpWeatherFetcher {
    client: Arc<Client>,
    url: Url,
}

impl HttpWeatherFetcher {
    pub fn new(config: &WeatherConfig) -> Result<Self, WeatherError> {
        let mut url = Url::parse(&config.api_url)
            .map_err(|e| WeatherError::InvalidUrl(format!("{}: {}", config.api_url, e)))?;
        url.query_pairs_mut()
            .append_pair(&config.credential_param, &config.api_key);

        let mut builder = Client::builder();
        if config.request_timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.request_timeout_secs));
        }
        let client = builder
            .build()
            .map_err(|e| WeatherError::Transport(e.into_network_error()))?;

        Ok(Self {
            client: Arc::new(client),
            url,
        })
    }
}

#[async_trait]
impl WeatherFetcher for HttpWeatherFetcher {
    async fn fetch_raw(&self) -> Result<String, WeatherError> {
        tracing::debug!("Fetching weather data from {}", self.url.path());

        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Error fetching weather data: {}", e);
                WeatherError::Transport(e.into_network_error())
            })?;

        let status = response.status();
        if status.is_success() {
            tracing::info!("Weather data fetched successfully");
        } else {
            tracing::error!("Weather API returned status {}", status);
        }

        // Non-success bodies are handed back as-is; the parser decides what they mean.
        response
            .text()
            .await
            .map_err(|e| WeatherError::Transport(e.into_network_error()))
    }
}

/// Fetch, parse and date the provider's current conditions.
///
/// # Errors
/// Propagates transport and parse failures, and `NoData`/`Incomplete` when the
/// payload lacks a usable reading.
pub async fn current_snapshot(
    fetcher: &dyn WeatherFetcher,
    today: NaiveDate,
) -> Result<WeatherSnapshot, WeatherError> {
    let raw = fetcher.fetch_raw().await?;
    let fields = parse(Some(&raw))?;
    WeatherSnapshot::from_fields(today, fields)
}
