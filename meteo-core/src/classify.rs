//! Color severity for averaged rain probability and wind speed.

use serde::{Deserialize, Serialize};

/// Severity levels, in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    #[serde(rename = "verde")]
    Green,
    #[serde(rename = "giallo")]
    Yellow,
    #[serde(rename = "arancio")]
    Orange,
    #[serde(rename = "rosso")]
    Red,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Green => "verde",
            Severity::Yellow => "giallo",
            Severity::Orange => "arancio",
            Severity::Red => "rosso",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Whether a band's upper bound belongs to that band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Boundary {
    /// `value <= bound` stays in the lower band.
    Inclusive,
    /// `value < bound` stays in the lower band.
    Exclusive,
}

/// Upper bounds for green, yellow and orange; anything above is red.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorScale {
    pub bounds: [f64; 3],
    pub boundary: Boundary,
}

impl ColorScale {
    /// Rain probability in percent, `<=25 / <=50 / <=75`.
    pub const fn precipitation_a() -> Self {
        Self { bounds: [25.0, 50.0, 75.0], boundary: Boundary::Inclusive }
    }

    /// Rain probability in percent, `<=20 / <=50 / <=80`.
    pub const fn precipitation_b() -> Self {
        Self { bounds: [20.0, 50.0, 80.0], boundary: Boundary::Inclusive }
    }

    /// Wind speed in m/s.
    pub const fn wind_mps() -> Self {
        Self { bounds: [2.8, 5.5, 8.3], boundary: Boundary::Exclusive }
    }

    /// Wind speed in km/h.
    pub const fn wind_kmh() -> Self {
        Self { bounds: [10.0, 20.0, 30.0], boundary: Boundary::Exclusive }
    }

    pub fn classify(&self, value: f64) -> Severity {
        let below = |bound: f64| match self.boundary {
            Boundary::Inclusive => value <= bound,
            Boundary::Exclusive => value < bound,
        };

        if below(self.bounds[0]) {
            Severity::Green
        } else if below(self.bounds[1]) {
            Severity::Yellow
        } else if below(self.bounds[2]) {
            Severity::Orange
        } else {
            Severity::Red
        }
    }
}

/// The pair of scales applied to one aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorThresholds {
    pub precipitation: ColorScale,
    pub wind: ColorScale,
}

impl ColorThresholds {
    /// OpenWeather deployment: 3-hourly data, wind in m/s.
    pub const fn variant_a() -> Self {
        Self { precipitation: ColorScale::precipitation_a(), wind: ColorScale::wind_mps() }
    }

    /// Open-Meteo deployment: hourly data, wind in km/h.
    pub const fn variant_b() -> Self {
        Self { precipitation: ColorScale::precipitation_b(), wind: ColorScale::wind_kmh() }
    }
}

impl Default for ColorThresholds {
    fn default() -> Self {
        Self::variant_a()
    }
}
