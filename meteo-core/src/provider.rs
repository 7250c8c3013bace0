use crate::{
    Config,
    error::{Error, Result},
    model::{Coordinates, Forecast},
    provider::{openmeteo::OpenMeteoProvider, openweather::OpenWeatherProvider},
};
use async_trait::async_trait;
use chrono_tz::Tz;
use reqwest::{Client, RequestBuilder};
use std::{convert::TryFrom, fmt::Debug, time::Duration};

pub mod openmeteo;
pub mod openweather;

const REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    OpenWeather,
    OpenMeteo,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => "openweather",
            ProviderId::OpenMeteo => "openmeteo",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::OpenWeather, ProviderId::OpenMeteo]
    }

    pub fn requires_api_key(&self) -> bool {
        matches!(self, ProviderId::OpenWeather)
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "openweather" => Ok(ProviderId::OpenWeather),
            "openmeteo" => Ok(ProviderId::OpenMeteo),
            _ => Err(Error::InvalidInput(format!(
                "Unknown provider '{value}'. Supported providers: openweather, openmeteo."
            ))),
        }
    }
}

/// Where requests are localized: the zone forecast hours are read in and an
/// optional ISO country code narrowing geocoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub timezone: Tz,
    pub country: Option<String>,
}

impl Default for Region {
    fn default() -> Self {
        Self { timezone: chrono_tz::Europe::Rome, country: Some("IT".to_string()) }
    }
}

/// Geocoding and forecast lookups against one weather service.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    fn id(&self) -> ProviderId;

    /// First match for a free-text city name.
    async fn geocode(&self, city: &str) -> Result<Coordinates>;

    async fn forecast(&self, coords: Coordinates) -> Result<Forecast>;
}

/// Construct a provider from config and explicit ProviderId.
pub fn provider_from_config(id: ProviderId, config: &Config) -> Result<Box<dyn WeatherProvider>> {
    let region = config.region()?;

    let boxed: Box<dyn WeatherProvider> = match id {
        ProviderId::OpenWeather => {
            let api_key = config
                .provider_api_key(id)
                .ok_or_else(|| Error::MissingApiKey(id.to_string()))?;
            Box::new(OpenWeatherProvider::new(api_key.to_owned(), region))
        }
        ProviderId::OpenMeteo => Box::new(OpenMeteoProvider::new(region)),
    };

    Ok(boxed)
}

/// Construct the default provider from config, using `default_provider` field.
pub fn default_provider_from_config(config: &Config) -> Result<Box<dyn WeatherProvider>> {
    let id = config.default_provider_id()?;
    provider_from_config(id, config)
}

/// Which upstream call a transport or decoding failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Upstream {
    Geocoding,
    Forecast,
}

impl Upstream {
    pub(crate) fn unavailable(self, detail: String) -> Error {
        match self {
            Upstream::Geocoding => Error::GeocodingUnavailable(detail),
            Upstream::Forecast => Error::ForecastUnavailable(detail),
        }
    }

    pub(crate) fn malformed(self, detail: String) -> Error {
        match self {
            Upstream::Geocoding => Error::GeocodingMalformed(detail),
            Upstream::Forecast => Error::ForecastMalformed(detail),
        }
    }
}

pub(crate) fn http_client() -> Client {
    Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .unwrap_or_default()
}

/// Send a request and return its body, mapping transport failures and
/// non-success statuses to `upstream`'s unavailable error.
pub(crate) async fn fetch_body(request: RequestBuilder, upstream: Upstream) -> Result<String> {
    let res = request.send().await.map_err(|e| {
        tracing::warn!(?upstream, error = %e, "upstream request failed");
        upstream.unavailable(e.to_string())
    })?;

    let status = res.status();
    let body = res.text().await.map_err(|e| upstream.unavailable(e.to_string()))?;

    if !status.is_success() {
        tracing::warn!(?upstream, %status, "upstream returned an error status");
        return Err(upstream.unavailable(format!("status {}: {}", status, truncate_body(&body))));
    }

    Ok(body)
}

pub(crate) fn parse_json<T: serde::de::DeserializeOwned>(body: &str, upstream: Upstream) -> Result<T> {
    serde_json::from_str(body).map_err(|e| {
        tracing::warn!(?upstream, error = %e, "could not decode upstream response");
        upstream.malformed(e.to_string())
    })
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
