//! Monthly rollups of daily weather records.

use std::collections::BTreeMap;

use chrono::Datelike;

use crate::domain::{Metric, MonthlySummary, SeriesRecord};

#[derive(Default)]
struct MonthAccumulator {
    temp_sum: f64,
    temp_n: usize,
    rain_sum: f64,
    rain_n: usize,
    days: usize,
}

/// Group records by `(year, month)`: mean temperature and total rainfall per month.
///
/// A month only appears if at least one record falls into it, so `days >= 1`.
/// Averages/totals skip records where the field is `None`; a month with no
/// values for a field reports `None` for it.
pub fn aggregate_monthly(records: &[SeriesRecord]) -> Vec<MonthlySummary> {
    let mut months: BTreeMap<(i32, u32), MonthAccumulator> = BTreeMap::new();
    let entity = records.first().map(|r| r.entity.clone()).unwrap_or_default();

    for record in records {
        let acc = months
            .entry((record.date.year(), record.date.month()))
            .or_default();
        acc.days += 1;
        if let Some(t) = record.value(Metric::Temperature) {
            acc.temp_sum += t;
            acc.temp_n += 1;
        }
        if let Some(r) = record.value(Metric::Rainfall) {
            acc.rain_sum += r;
            acc.rain_n += 1;
        }
    }

    months
        .into_iter()
        .map(|((year, month), acc)| MonthlySummary {
            year,
            month,
            entity: entity.clone(),
            average_temperature: (acc.temp_n > 0).then(|| acc.temp_sum / acc.temp_n as f64),
            total_rainfall: (acc.rain_n > 0).then_some(acc.rain_sum),
            days: acc.days,
        })
        .collect()
}
