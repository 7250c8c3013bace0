use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime};
use chrono_tz::Tz;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::{Error, Result},
    model::{Coordinates, Forecast, ForecastSample, Granularity, WindUnit},
    provider::{Region, Upstream, fetch_body, http_client, parse_json},
};

use super::{ProviderId, WeatherProvider};

const BASE_URL: &str = "https://api.openweathermap.org";

/// OpenWeather: direct geocoding plus the free 5-day / 3-hour forecast.
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    region: Region,
    geocoding_url: String,
    forecast_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String, region: Region) -> Self {
        Self {
            api_key,
            region,
            geocoding_url: BASE_URL.to_string(),
            forecast_url: BASE_URL.to_string(),
            http: http_client(),
        }
    }

    /// Point both lookups at other hosts, e.g. a local mock server.
    pub fn with_base_urls(mut self, geocoding: impl Into<String>, forecast: impl Into<String>) -> Self {
        self.geocoding_url = geocoding.into();
        self.forecast_url = forecast.into();
        self
    }

    fn query_for(&self, city: &str) -> String {
        match &self.region.country {
            Some(country) => format!("{city},{country}"),
            None => city.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OwGeoEntry {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Default, Deserialize)]
struct OwWind {
    #[serde(default)]
    speed: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    #[serde(default)]
    pop: Option<f64>,
    #[serde(default)]
    wind: Option<OwWind>,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    list: Option<Vec<OwForecastEntry>>,
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenWeather
    }

    async fn geocode(&self, city: &str) -> Result<Coordinates> {
        let url = format!("{}/geo/1.0/direct", self.geocoding_url);
        let q = self.query_for(city);

        let request = self.http.get(url).query(&[
            ("q", q.as_str()),
            ("limit", "1"),
            ("appid", self.api_key.as_str()),
        ]);

        let body = fetch_body(request, Upstream::Geocoding).await?;
        let entries: Vec<OwGeoEntry> = parse_json(&body, Upstream::Geocoding)?;

        let first = entries.first().ok_or_else(|| Error::CityNotFound(city.to_string()))?;

        Ok(Coordinates { latitude: first.lat, longitude: first.lon })
    }

    async fn forecast(&self, coords: Coordinates) -> Result<Forecast> {
        let url = format!("{}/data/2.5/forecast", self.forecast_url);

        let request = self.http.get(url).query(&[
            ("lat", coords.latitude.to_string()),
            ("lon", coords.longitude.to_string()),
            ("appid", self.api_key.clone()),
            ("units", "metric".to_string()),
            ("lang", "it".to_string()),
        ]);

        let body = fetch_body(request, Upstream::Forecast).await?;
        let parsed: OwForecastResponse = parse_json(&body, Upstream::Forecast)?;

        let list = parsed
            .list
            .ok_or_else(|| Error::ForecastMalformed("response has no 'list' field".to_string()))?;

        let samples = list
            .iter()
            .map(|entry| {
                let local_time = unix_to_local(entry.dt, self.region.timezone).ok_or_else(|| {
                    Error::ForecastMalformed(format!("invalid timestamp {}", entry.dt))
                })?;

                Ok(ForecastSample {
                    local_time,
                    precipitation_pct: entry.pop.unwrap_or(0.0) * 100.0,
                    wind_speed: entry.wind.as_ref().and_then(|w| w.speed).unwrap_or(0.0),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(samples = samples.len(), "parsed OpenWeather forecast");

        Ok(Forecast {
            samples,
            granularity: Granularity::ThreeHourly,
            wind_unit: WindUnit::MetersPerSecond,
        })
    }
}

fn unix_to_local(ts: i64, tz: Tz) -> Option<NaiveDateTime> {
    DateTime::from_timestamp(ts, 0).map(|utc| utc.with_timezone(&tz).naive_local())
}
