use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::{
    classify::Severity,
    error::{Error, Result},
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// One forecast point, already converted to the reference time zone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastSample {
    pub local_time: NaiveDateTime,
    /// Probability of precipitation, 0-100.
    pub precipitation_pct: f64,
    /// Unit given by [`Forecast::wind_unit`].
    pub wind_speed: f64,
}

impl ForecastSample {
    pub fn date(&self) -> NaiveDate {
        self.local_time.date()
    }

    pub fn hour(&self) -> u32 {
        self.local_time.hour()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Hourly,
    ThreeHourly,
}

impl Granularity {
    pub fn step_hours(&self) -> u32 {
        match self {
            Granularity::Hourly => 1,
            Granularity::ThreeHourly => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WindUnit {
    #[serde(rename = "m/s")]
    MetersPerSecond,
    #[serde(rename = "km/h")]
    KilometersPerHour,
}

impl WindUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            WindUnit::MetersPerSecond => "m/s",
            WindUnit::KilometersPerHour => "km/h",
        }
    }
}

/// A provider's forecast, ordered by time.
#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    pub samples: Vec<ForecastSample>,
    pub granularity: Granularity,
    pub wind_unit: WindUnit,
}

/// A named fixed block of local hours.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub name: String,
    pub hours: Vec<u32>,
}

impl Slot {
    pub fn new(name: impl Into<String>, hours: impl Into<Vec<u32>>) -> Self {
        Self { name: name.into(), hours: hours.into() }
    }

    /// The three morning blocks served to the market dashboard.
    pub fn defaults() -> Vec<Slot> {
        vec![
            Slot::new("slot_6_8", [6, 7, 8]),
            Slot::new("slot_9_11", [9, 10, 11]),
            Slot::new("slot_12_14", [12, 13, 14]),
        ]
    }
}

/// Which hours of the target date are aggregated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeWindow {
    Slots(Vec<Slot>),
    /// `start <= hour < end`.
    Range { start: u32, end: u32 },
}

impl TimeWindow {
    /// Fixed slots; each must be non-empty and no hour may appear in two slots.
    pub fn slots(slots: Vec<Slot>) -> Result<Self> {
        if slots.is_empty() {
            return Err(Error::InvalidInput("At least one slot is required.".into()));
        }

        let mut seen = Vec::new();
        for slot in &slots {
            if slot.hours.is_empty() {
                return Err(Error::InvalidInput(format!("Slot '{}' has no hours.", slot.name)));
            }
            for hour in &slot.hours {
                if *hour > 23 {
                    return Err(Error::InvalidInput(format!(
                        "Slot '{}' contains invalid hour {hour}.",
                        slot.name
                    )));
                }
                if seen.contains(hour) {
                    return Err(Error::InvalidInput(format!(
                        "Hour {hour} appears in more than one slot."
                    )));
                }
                seen.push(*hour);
            }
        }

        Ok(TimeWindow::Slots(slots))
    }

    pub fn range(start: u32, end: u32) -> Result<Self> {
        if start >= end || end > 24 {
            return Err(Error::InvalidInput(format!(
                "Invalid hour range {start}-{end}: start must be lower than end and end at most 24."
            )));
        }

        Ok(TimeWindow::Range { start, end })
    }
}

/// Averages and colors for one window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    #[serde(rename = "pioggia_avg")]
    pub precipitation_avg: f64,
    #[serde(rename = "pioggia_colore")]
    pub precipitation_color: Severity,
    #[serde(rename = "vento_avg")]
    pub wind_avg: f64,
    #[serde(rename = "vento_colore")]
    pub wind_color: Severity,
}

/// Body of a rain/wind request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeteoRequest {
    #[serde(rename = "citta", alias = "city")]
    pub city: String,
    #[serde(rename = "giorno", alias = "weekday")]
    pub weekday: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<u32>,
}

impl MeteoRequest {
    pub fn new(city: impl Into<String>, weekday: impl Into<String>) -> Self {
        Self { city: city.into(), weekday: weekday.into(), start: None, end: None }
    }

    pub fn with_range(mut self, start: u32, end: u32) -> Self {
        self.start = Some(start);
        self.end = Some(end);
        self
    }
}

/// Result of a request: one entry per slot, or a single aggregate for a range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MeteoReport {
    Range(AggregateResult),
    Slots(BTreeMap<String, AggregateResult>),
}
