//! In-process weather fetchers for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use daybook_core::NetworkError;
use daybook_weather::{WeatherError, WeatherFetcher};

pub const CLOUDS_PAYLOAD: &str =
    r#"{"main":{"temp":21.5},"weather":[{"main":"Clouds","icon":"04d"}]}"#;

/// Returns a canned body, or a connection failure, and counts calls.
pub struct FakeFetcher {
    body: Option<&'static str>,
    calls: AtomicUsize,
}

impl FakeFetcher {
    pub fn ok(body: &'static str) -> Self {
        Self {
            body: Some(body),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            body: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WeatherFetcher for FakeFetcher {
    async fn fetch_raw(&self) -> Result<String, WeatherError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.body {
            Some(body) => Ok(body.to_string()),
            None => Err(WeatherError::Transport(NetworkError::ConnectionFailed(
                "connection refused".to_string(),
            ))),
        }
    }
}
