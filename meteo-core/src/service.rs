//! Request handling: geocode, fetch, pick the date, aggregate, classify.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::{
    Config,
    aggregate::aggregate,
    classify::ColorThresholds,
    error::{Error, Result},
    model::{MeteoReport, MeteoRequest, Slot, TimeWindow},
    provider::{WeatherProvider, default_provider_from_config},
    target_date,
};

/// Everything a request needs besides the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub timezone: Tz,
    pub thresholds: ColorThresholds,
    pub slots: Vec<Slot>,
}

impl Settings {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            timezone: config.timezone()?,
            thresholds: config.color_thresholds(),
            slots: config.slots(),
        })
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::Europe::Rome,
            thresholds: ColorThresholds::default(),
            slots: Slot::defaults(),
        }
    }
}

#[derive(Debug)]
pub struct MeteoService {
    provider: Box<dyn WeatherProvider>,
    settings: Settings,
}

impl MeteoService {
    pub fn new(provider: Box<dyn WeatherProvider>, settings: Settings) -> Self {
        Self { provider, settings }
    }

    /// Build the service for the configured default provider.
    pub fn from_config(config: &Config) -> Result<Self> {
        let provider = default_provider_from_config(config)?;
        let settings = Settings::from_config(config)?;
        Ok(Self::new(provider, settings))
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn provider(&self) -> &dyn WeatherProvider {
        self.provider.as_ref()
    }

    /// Answer one request as of `now`.
    ///
    /// The city is geocoded before the weekday is checked, so an unknown city
    /// is reported even when the weekday is also invalid. No forecast is
    /// fetched for an invalid weekday.
    pub async fn check(&self, request: &MeteoRequest, now: DateTime<Utc>) -> Result<MeteoReport> {
        let window = self.window_for(request)?;

        let coords = self.provider.geocode(&request.city).await?;
        tracing::debug!(city = %request.city, ?coords, "geocoded city");

        let weekday = target_date::parse_weekday(&request.weekday)?;

        let forecast = self.provider.forecast(coords).await?;

        let today = target_date::today_in(self.settings.timezone, now);
        let date = target_date::resolve(weekday, today);
        tracing::info!(
            city = %request.city,
            provider = %self.provider.id(),
            %date,
            samples = forecast.samples.len(),
            "aggregating forecast"
        );

        Ok(aggregate(&forecast, date, &window, &self.settings.thresholds))
    }

    fn window_for(&self, request: &MeteoRequest) -> Result<TimeWindow> {
        match (request.start, request.end) {
            (Some(start), Some(end)) => TimeWindow::range(start, end),
            (None, None) => TimeWindow::slots(self.settings.slots.clone()),
            _ => Err(Error::InvalidInput(
                "Both 'start' and 'end' are required for an hour range.".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        classify::Severity,
        error::ErrorKind,
        model::{AggregateResult, Coordinates, Forecast, ForecastSample, Granularity, WindUnit},
        provider::ProviderId,
    };
    use async_trait::async_trait;
    use chrono::{NaiveDate, TimeZone};
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    #[derive(Debug)]
    enum Outcome {
        Ok(Forecast),
        CityMissing,
        GeocodingDown,
        ForecastBroken,
    }

    #[derive(Debug)]
    struct FakeProvider {
        outcome: Outcome,
        calls: Arc<AtomicUsize>,
    }

    impl FakeProvider {
        fn boxed(outcome: Outcome) -> (Box<dyn WeatherProvider>, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (Box::new(Self { outcome, calls: calls.clone() }), calls)
        }
    }

    #[async_trait]
    impl WeatherProvider for FakeProvider {
        fn id(&self) -> ProviderId {
            ProviderId::OpenWeather
        }

        async fn geocode(&self, city: &str) -> Result<Coordinates> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.outcome {
                Outcome::CityMissing => Err(Error::CityNotFound(city.to_string())),
                Outcome::GeocodingDown => Err(Error::GeocodingUnavailable("refused".into())),
                _ => Ok(Coordinates { latitude: 41.89, longitude: 12.48 }),
            }
        }

        async fn forecast(&self, _coords: Coordinates) -> Result<Forecast> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.outcome {
                Outcome::Ok(forecast) => Ok(forecast.clone()),
                _ => Err(Error::ForecastMalformed("no list".into())),
            }
        }
    }

    // Saturday 2026-10-17, 10:00 in Rome.
    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 17, 8, 0, 0).unwrap()
    }

    fn next_monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn sample(day: NaiveDate, hour: u32, rain: f64, wind: f64) -> ForecastSample {
        ForecastSample {
            local_time: day.and_hms_opt(hour, 0, 0).unwrap(),
            precipitation_pct: rain,
            wind_speed: wind,
        }
    }

    fn roma_forecast() -> Forecast {
        let monday = next_monday();
        let tuesday = monday.succ_opt().unwrap();
        Forecast {
            samples: vec![
                sample(monday, 6, 10.0, 1.0),
                sample(monday, 9, 20.0, 6.0),
                sample(monday, 12, 30.0, 9.0),
                sample(tuesday, 6, 100.0, 20.0),
            ],
            granularity: Granularity::ThreeHourly,
            wind_unit: WindUnit::MetersPerSecond,
        }
    }

    fn slots(report: MeteoReport) -> std::collections::BTreeMap<String, AggregateResult> {
        match report {
            MeteoReport::Slots(map) => map,
            MeteoReport::Range(_) => panic!("expected slot results"),
        }
    }

    #[tokio::test]
    async fn roma_monday_slots() {
        let (provider, _) = FakeProvider::boxed(Outcome::Ok(roma_forecast()));
        let service = MeteoService::new(provider, Settings::default());

        let report = service.check(&MeteoRequest::new("Roma", "lunedì"), now()).await.unwrap();
        let results = slots(report);

        let early = results["slot_6_8"];
        assert_eq!(early.precipitation_avg, 10.0);
        assert_eq!(early.precipitation_color, Severity::Green);
        assert_eq!(early.wind_avg, 1.0);
        assert_eq!(early.wind_color, Severity::Green);

        let mid = results["slot_9_11"];
        assert_eq!(mid.precipitation_avg, 20.0);
        assert_eq!(mid.precipitation_color, Severity::Green);
        assert_eq!(mid.wind_avg, 6.0);
        assert_eq!(mid.wind_color, Severity::Orange);

        let late = results["slot_12_14"];
        assert_eq!(late.precipitation_avg, 30.0);
        assert_eq!(late.precipitation_color, Severity::Yellow);
        assert_eq!(late.wind_avg, 9.0);
        assert_eq!(late.wind_color, Severity::Red);
    }

    #[tokio::test]
    async fn explicit_range_returns_single_result() {
        let (provider, _) = FakeProvider::boxed(Outcome::Ok(roma_forecast()));
        let service = MeteoService::new(provider, Settings::default());

        let request = MeteoRequest::new("Roma", "Lunedì").with_range(6, 12);
        let report = service.check(&request, now()).await.unwrap();

        match report {
            MeteoReport::Range(result) => {
                assert_eq!(result.precipitation_avg, 15.0);
                assert_eq!(result.wind_avg, 3.5);
            }
            MeteoReport::Slots(_) => panic!("expected a range result"),
        }
    }

    #[tokio::test]
    async fn today_with_no_remaining_data_is_zero() {
        let (provider, _) = FakeProvider::boxed(Outcome::Ok(roma_forecast()));
        let service = MeteoService::new(provider, Settings::default());

        let results = slots(service.check(&MeteoRequest::new("Roma", "sabato"), now()).await.unwrap());

        assert!(results.values().all(|r| r.precipitation_avg == 0.0 && r.wind_avg == 0.0));
    }

    #[tokio::test]
    async fn invalid_weekday_skips_forecast_call() {
        let (provider, calls) = FakeProvider::boxed(Outcome::Ok(roma_forecast()));
        let service = MeteoService::new(provider, Settings::default());

        let err = service.check(&MeteoRequest::new("Roma", "someday"), now()).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(err.status_code(), 400);
        // Geocoding only.
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unknown_city_wins_over_invalid_weekday() {
        let (provider, calls) = FakeProvider::boxed(Outcome::CityMissing);
        let service = MeteoService::new(provider, Settings::default());

        let err =
            service.check(&MeteoRequest::new("Atlantide", "funday"), now()).await.unwrap_err();

        assert!(matches!(err, Error::CityNotFound(_)));
        assert_eq!(err.status_code(), 404);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn half_open_range_is_rejected() {
        let (provider, _) = FakeProvider::boxed(Outcome::Ok(roma_forecast()));
        let service = MeteoService::new(provider, Settings::default());

        let mut request = MeteoRequest::new("Roma", "lunedì");
        request.start = Some(6);

        let err = service.check(&request, now()).await.unwrap_err();
        assert_eq!(err.status_code(), 400);

        let err = service
            .check(&MeteoRequest::new("Roma", "lunedì").with_range(14, 6), now())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn upstream_errors_pass_through() {
        let cases = [
            (Outcome::CityMissing, 404),
            (Outcome::GeocodingDown, 503),
            (Outcome::ForecastBroken, 500),
        ];

        for (outcome, status) in cases {
            let (provider, _) = FakeProvider::boxed(outcome);
            let service = MeteoService::new(provider, Settings::default());

            let err = service.check(&MeteoRequest::new("Nowhere", "lunedì"), now()).await.unwrap_err();
            assert_eq!(err.status_code(), status, "{err}");
        }
    }

    #[test]
    fn from_config_uses_configured_provider() {
        let mut cfg = Config::default();
        cfg.set_default_provider(ProviderId::OpenMeteo);

        let service = MeteoService::from_config(&cfg).unwrap();

        assert_eq!(service.provider().id(), ProviderId::OpenMeteo);
        assert_eq!(service.settings().thresholds, ColorThresholds::variant_b());
    }
}
