//! Reduce a forecast to averaged rain probability and wind speed for a date and window.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::{
    classify::ColorThresholds,
    model::{AggregateResult, Forecast, ForecastSample, MeteoReport, Slot, TimeWindow},
};

/// Aggregate every sample of `date` that falls inside `window`.
///
/// Windows with no matching samples average to 0.
pub fn aggregate(
    forecast: &Forecast,
    date: NaiveDate,
    window: &TimeWindow,
    thresholds: &ColorThresholds,
) -> MeteoReport {
    let on_date = forecast.samples.iter().filter(|s| s.date() == date);

    match window {
        TimeWindow::Slots(slots) => {
            let step = forecast.granularity.step_hours();
            let day: Vec<&ForecastSample> = on_date.collect();

            let results = slots
                .iter()
                .map(|slot| {
                    let matching = day.iter().filter(|s| slot_contains(slot, s.hour(), step));
                    let (rain, wind) = distinct_values(matching.copied());
                    (slot.name.clone(), summarize(mean(&rain), mean(&wind), thresholds))
                })
                .collect::<BTreeMap<_, _>>();

            MeteoReport::Slots(results)
        }
        TimeWindow::Range { start, end } => {
            let (rain, wind): (Vec<f64>, Vec<f64>) = on_date
                .filter(|s| (*start..*end).contains(&s.hour()))
                .map(|s| (s.precipitation_pct, s.wind_speed))
                .unzip();

            MeteoReport::Range(summarize(mean(&rain), mean(&wind), thresholds))
        }
    }
}

/// A sample belongs to a slot when its hour, or the start of the provider block
/// containing it, is one of the slot's hours.
fn slot_contains(slot: &Slot, hour: u32, step: u32) -> bool {
    let block_start = hour / step * step;
    slot.hours.contains(&hour) || slot.hours.contains(&block_start)
}

/// Distinct rain and wind values, each deduplicated on its own.
fn distinct_values<'a>(samples: impl Iterator<Item = &'a ForecastSample>) -> (Vec<f64>, Vec<f64>) {
    let mut rain: Vec<f64> = Vec::new();
    let mut wind: Vec<f64> = Vec::new();

    for sample in samples {
        if !rain.contains(&sample.precipitation_pct) {
            rain.push(sample.precipitation_pct);
        }
        if !wind.contains(&sample.wind_speed) {
            wind.push(sample.wind_speed);
        }
    }

    (rain, wind)
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

// Colors come from the unrounded means.
fn summarize(rain: f64, wind: f64, thresholds: &ColorThresholds) -> AggregateResult {
    AggregateResult {
        precipitation_avg: round1(rain),
        precipitation_color: thresholds.precipitation.classify(rain),
        wind_avg: round1(wind),
        wind_color: thresholds.wind.classify(wind),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        classify::Severity,
        model::{Granularity, WindUnit},
    };

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn sample(day: NaiveDate, hour: u32, rain: f64, wind: f64) -> ForecastSample {
        ForecastSample {
            local_time: day.and_hms_opt(hour, 0, 0).unwrap(),
            precipitation_pct: rain,
            wind_speed: wind,
        }
    }

    fn forecast(granularity: Granularity, samples: Vec<ForecastSample>) -> Forecast {
        Forecast { samples, granularity, wind_unit: WindUnit::MetersPerSecond }
    }

    fn slots(report: MeteoReport) -> BTreeMap<String, AggregateResult> {
        match report {
            MeteoReport::Slots(map) => map,
            MeteoReport::Range(_) => panic!("expected slot results"),
        }
    }

    fn single(report: MeteoReport) -> AggregateResult {
        match report {
            MeteoReport::Range(result) => result,
            MeteoReport::Slots(_) => panic!("expected a range result"),
        }
    }

    #[test]
    fn empty_window_defaults_to_zero() {
        let fc = forecast(Granularity::ThreeHourly, Vec::new());
        let window = TimeWindow::slots(Slot::defaults()).unwrap();

        let results = slots(aggregate(&fc, date(), &window, &ColorThresholds::variant_a()));

        assert_eq!(results.len(), 3);
        for result in results.values() {
            assert_eq!(result.precipitation_avg, 0.0);
            assert_eq!(result.wind_avg, 0.0);
            assert_eq!(result.precipitation_color, Severity::Green);
            assert_eq!(result.wind_color, Severity::Green);
        }

        let range = single(aggregate(
            &fc,
            date(),
            &TimeWindow::range(6, 14).unwrap(),
            &ColorThresholds::variant_a(),
        ));
        assert_eq!(range.precipitation_avg, 0.0);
        assert_eq!(range.wind_avg, 0.0);
    }

    #[test]
    fn slot_mode_averages_distinct_values() {
        let day = date();
        // Three-hourly samples at 7 and 8 both report 40%, the one at 6 reports 60%.
        let fc = forecast(
            Granularity::ThreeHourly,
            vec![sample(day, 6, 60.0, 2.0), sample(day, 7, 40.0, 2.0), sample(day, 8, 40.0, 4.0)],
        );
        let window = TimeWindow::slots(vec![Slot::new("slot_6_8", [6, 7, 8])]).unwrap();

        let results = slots(aggregate(&fc, day, &window, &ColorThresholds::variant_a()));
        let slot = results["slot_6_8"];

        assert_eq!(slot.precipitation_avg, 50.0);
        assert_eq!(slot.precipitation_color, Severity::Yellow);
        assert_eq!(slot.wind_avg, 3.0);
        assert_eq!(slot.wind_color, Severity::Yellow);
    }

    #[test]
    fn three_hourly_block_start_joins_slot() {
        let day = date();
        // Rome is UTC+2 in October, so OpenWeather blocks land on 5, 8, 11, 14.
        let fc = forecast(
            Granularity::ThreeHourly,
            vec![
                sample(day, 5, 90.0, 9.0),
                sample(day, 8, 10.0, 1.0),
                sample(day, 11, 30.0, 3.0),
                sample(day, 14, 70.0, 6.0),
            ],
        );
        let window = TimeWindow::slots(vec![
            Slot::new("early", [3, 4]),
            Slot::new("late", [9, 10, 11]),
        ])
        .unwrap();

        let results = slots(aggregate(&fc, day, &window, &ColorThresholds::variant_a()));

        // 5 rounds down to 3.
        assert_eq!(results["early"].precipitation_avg, 90.0);
        // 11 matches directly; 14 rounds down to 12 and stays out.
        assert_eq!(results["late"].precipitation_avg, 30.0);
    }

    #[test]
    fn hourly_samples_match_only_their_own_hour() {
        let day = date();
        let fc = forecast(
            Granularity::Hourly,
            vec![sample(day, 5, 90.0, 9.0), sample(day, 6, 20.0, 1.0)],
        );
        let window = TimeWindow::slots(vec![Slot::new("dawn", [3, 6])]).unwrap();

        let results = slots(aggregate(&fc, day, &window, &ColorThresholds::variant_a()));

        assert_eq!(results["dawn"].precipitation_avg, 20.0);
    }

    #[test]
    fn range_mode_keeps_duplicates() {
        let day = date();
        let fc = forecast(
            Granularity::Hourly,
            vec![
                sample(day, 7, 10.0, 5.0),
                sample(day, 8, 10.0, 5.0),
                sample(day, 9, 20.0, 8.0),
                sample(day, 10, 99.0, 40.0),
            ],
        );

        let result = single(aggregate(
            &fc,
            day,
            &TimeWindow::range(7, 10).unwrap(),
            &ColorThresholds::variant_b(),
        ));

        assert_eq!(result.precipitation_avg, 13.3);
        assert_eq!(result.precipitation_color, Severity::Green);
        assert_eq!(result.wind_avg, 6.0);
        assert_eq!(result.wind_color, Severity::Green);
    }

    #[test]
    fn other_dates_are_ignored() {
        let day = date();
        let next = day.succ_opt().unwrap();
        let fc = forecast(
            Granularity::Hourly,
            vec![sample(day, 9, 30.0, 3.0), sample(next, 9, 100.0, 20.0)],
        );

        let result = single(aggregate(
            &fc,
            day,
            &TimeWindow::range(0, 24).unwrap(),
            &ColorThresholds::variant_a(),
        ));

        assert_eq!(result.precipitation_avg, 30.0);
        assert_eq!(result.wind_avg, 3.0);
    }

    #[test]
    fn colors_use_unrounded_mean() {
        let day = date();
        // Mean 25.03 rounds to 25.0 for display but is above the green bound.
        let fc = forecast(
            Granularity::Hourly,
            vec![sample(day, 9, 25.0, 0.0), sample(day, 10, 25.0, 0.0), sample(day, 11, 25.1, 0.0)],
        );

        let result = single(aggregate(
            &fc,
            day,
            &TimeWindow::range(9, 12).unwrap(),
            &ColorThresholds::variant_a(),
        ));

        assert_eq!(result.precipitation_avg, 25.0);
        assert_eq!(result.precipitation_color, Severity::Yellow);
    }
}
