//! Resolve an Italian weekday name to the next matching calendar date.

use chrono::{DateTime, Datelike, Days, NaiveDate, Utc, Weekday};
use chrono_tz::Tz;

use crate::error::{Error, Result};

/// Accepted names, Monday first.
pub const WEEKDAY_NAMES: [&str; 7] =
    ["lunedì", "martedì", "mercoledì", "giovedì", "venerdì", "sabato", "domenica"];

/// Parse a weekday name, ignoring case and surrounding whitespace.
pub fn parse_weekday(name: &str) -> Result<Weekday> {
    let lower = name.trim().to_lowercase();

    WEEKDAY_NAMES
        .iter()
        .position(|candidate| *candidate == lower)
        .and_then(|idx| Weekday::try_from(idx as u8).ok())
        .ok_or_else(|| Error::InvalidInput("Nome del giorno non valido.".to_string()))
}

/// Next date falling on `weekday`, counting `today` itself as offset 0.
pub fn resolve(weekday: Weekday, today: NaiveDate) -> NaiveDate {
    let target = weekday.num_days_from_monday();
    let current = today.weekday().num_days_from_monday();
    let offset = (target + 7 - current) % 7;

    today + Days::new(u64::from(offset))
}

/// The calendar date of `now` in the reference zone.
pub fn today_in(tz: Tz, now: DateTime<Utc>) -> NaiveDate {
    now.with_timezone(&tz).date_naive()
}
