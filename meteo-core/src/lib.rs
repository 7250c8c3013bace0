//! Core library for the `meteo` rain and wind outlook.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Geocoding and forecast providers
//! - Target date resolution, forecast aggregation and color classification
//! - The request handler tying them together
//!
//! It is used by `meteo-cli`, but can also be reused by other binaries or services.

pub mod aggregate;
pub mod classify;
pub mod config;
pub mod error;
pub mod model;
pub mod provider;
pub mod service;
pub mod target_date;

pub use classify::{ColorScale, ColorThresholds, Severity};
pub use config::{Config, ProviderConfig};
pub use error::{Error, ErrorKind, Result};
pub use model::{AggregateResult, Forecast, ForecastSample, MeteoReport, MeteoRequest, Slot, TimeWindow};
pub use provider::{ProviderId, Region, WeatherProvider};
pub use service::{MeteoService, Settings};
