use async_trait::async_trait;
use chrono::NaiveDateTime;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::{Error, Result},
    model::{Coordinates, Forecast, ForecastSample, Granularity, WindUnit},
    provider::{Region, Upstream, fetch_body, http_client, parse_json},
};

use super::{ProviderId, WeatherProvider};

const GEOCODING_URL: &str = "https://geocoding-api.open-meteo.com";
const FORECAST_URL: &str = "https://api.open-meteo.com";
const FORECAST_DAYS: &str = "7";
const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Open-Meteo: keyless geocoding and hourly forecast, wind in km/h.
#[derive(Debug, Clone)]
pub struct OpenMeteoProvider {
    region: Region,
    geocoding_url: String,
    forecast_url: String,
    http: Client,
}

impl OpenMeteoProvider {
    pub fn new(region: Region) -> Self {
        Self {
            region,
            geocoding_url: GEOCODING_URL.to_string(),
            forecast_url: FORECAST_URL.to_string(),
            http: http_client(),
        }
    }

    pub fn with_base_urls(mut self, geocoding: impl Into<String>, forecast: impl Into<String>) -> Self {
        self.geocoding_url = geocoding.into();
        self.forecast_url = forecast.into();
        self
    }
}

#[derive(Debug, Deserialize)]
struct OmPlace {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Deserialize)]
struct OmSearchResponse {
    #[serde(default)]
    results: Option<Vec<OmPlace>>,
}

#[derive(Debug, Deserialize)]
struct OmHourly {
    time: Vec<String>,
    precipitation_probability: Vec<Option<f64>>,
    wind_speed_10m: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct OmForecastResponse {
    hourly: Option<OmHourly>,
}

#[async_trait]
impl WeatherProvider for OpenMeteoProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenMeteo
    }

    async fn geocode(&self, city: &str) -> Result<Coordinates> {
        let url = format!("{}/v1/search", self.geocoding_url);

        let mut query = vec![
            ("name", city.to_string()),
            ("count", "1".to_string()),
            ("language", "it".to_string()),
            ("format", "json".to_string()),
        ];
        if let Some(country) = &self.region.country {
            query.push(("countryCode", country.clone()));
        }

        let body = fetch_body(self.http.get(url).query(&query), Upstream::Geocoding).await?;
        let parsed: OmSearchResponse = parse_json(&body, Upstream::Geocoding)?;

        let place = parsed
            .results
            .as_deref()
            .and_then(<[OmPlace]>::first)
            .ok_or_else(|| Error::CityNotFound(city.to_string()))?;

        Ok(Coordinates { latitude: place.latitude, longitude: place.longitude })
    }

    async fn forecast(&self, coords: Coordinates) -> Result<Forecast> {
        let url = format!("{}/v1/forecast", self.forecast_url);

        let request = self.http.get(url).query(&[
            ("latitude", coords.latitude.to_string()),
            ("longitude", coords.longitude.to_string()),
            ("hourly", "precipitation_probability,wind_speed_10m".to_string()),
            ("timezone", self.region.timezone.name().to_string()),
            ("forecast_days", FORECAST_DAYS.to_string()),
        ]);

        let body = fetch_body(request, Upstream::Forecast).await?;
        let parsed: OmForecastResponse = parse_json(&body, Upstream::Forecast)?;

        let hourly = parsed
            .hourly
            .ok_or_else(|| Error::ForecastMalformed("response has no 'hourly' block".to_string()))?;

        let samples = hourly_samples(&hourly)?;
        tracing::debug!(samples = samples.len(), "parsed Open-Meteo forecast");

        Ok(Forecast {
            samples,
            granularity: Granularity::Hourly,
            wind_unit: WindUnit::KilometersPerHour,
        })
    }
}

/// Zip the parallel hourly arrays; missing values count as 0.
fn hourly_samples(hourly: &OmHourly) -> Result<Vec<ForecastSample>> {
    let len = hourly.time.len();
    if hourly.precipitation_probability.len() != len || hourly.wind_speed_10m.len() != len {
        return Err(Error::ForecastMalformed("hourly arrays differ in length".to_string()));
    }

    hourly
        .time
        .iter()
        .zip(&hourly.precipitation_probability)
        .zip(&hourly.wind_speed_10m)
        .map(|((time, rain), wind)| {
            let local_time = NaiveDateTime::parse_from_str(time, TIME_FORMAT)
                .map_err(|e| Error::ForecastMalformed(format!("bad time '{time}': {e}")))?;

            Ok(ForecastSample {
                local_time,
                precipitation_pct: rain.unwrap_or(0.0),
                wind_speed: wind.unwrap_or(0.0),
            })
        })
        .collect()
}
