//! Weather source for daybook
//!
//! Fetches the current conditions from the configured provider and turns the
//! raw payload into dated snapshots.

pub mod fetcher;
pub mod parser;
pub mod types;

pub use fetcher::{current_snapshot, HttpWeatherFetcher, WeatherFetcher};
pub use parser::parse;
pub use types::*;
