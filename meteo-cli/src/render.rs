use std::fmt;

use meteo_core::{AggregateResult, MeteoReport, MeteoRequest};

/// Plain-text table for `meteo check`.
pub struct ReportTable<'a> {
    pub request: &'a MeteoRequest,
    pub report: &'a MeteoReport,
}

impl fmt::Display for ReportTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} - {}", self.request.city, self.request.weekday)?;
        writeln!(f, "{:<12} {:>8} {:<8} {:>8} {:<8}", "window", "rain %", "", "wind", "")?;

        match self.report {
            MeteoReport::Range(result) => {
                let label = match (self.request.start, self.request.end) {
                    (Some(start), Some(end)) => format!("{start}-{end}"),
                    _ => "range".to_string(),
                };
                write_row(f, &label, result)
            }
            MeteoReport::Slots(slots) => {
                let mut rows: Vec<_> = slots.iter().collect();
                // slot_6_8 sorts after slot_12_14 as a string; order by first hour instead.
                rows.sort_by_key(|(name, _)| first_hour(name));
                rows.into_iter().try_for_each(|(name, result)| write_row(f, name, result))
            }
        }
    }
}

pub fn report_table(request: &MeteoRequest, report: &MeteoReport) -> String {
    ReportTable { request, report }.to_string()
}

fn write_row(f: &mut fmt::Formatter<'_>, label: &str, result: &AggregateResult) -> fmt::Result {
    writeln!(
        f,
        "{:<12} {:>8.1} {:<8} {:>8.1} {:<8}",
        label,
        result.precipitation_avg,
        result.precipitation_color,
        result.wind_avg,
        result.wind_color,
    )
}

fn first_hour(name: &str) -> (u32, String) {
    let hour = name
        .split('_')
        .find_map(|part| part.parse::<u32>().ok())
        .unwrap_or(u32::MAX);
    (hour, name.to_string())
}
