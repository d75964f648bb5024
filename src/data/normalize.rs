//! Reshape upstream payloads into `SeriesRecord` sequences.
//!
//! One adapter per `UpstreamPayload` variant. All adapters:
//! - stamp the requested entity label on every record
//! - emit the full field set of the metric's sector (`None` where unknown)
//! - return records sorted ascending by date, one per date

use std::collections::BTreeMap;

use chrono::{DateTime, Local, NaiveDate};
use serde_json::{Map, Value};
use tracing::debug;

use crate::data::shape::{
    CompanyOverview, CurrentConditions, DailyMap, ForecastList, Snapshot, UpstreamPayload,
};
use crate::domain::{Metric, SeriesRecord};

/// Normalize a payload, dating snapshots without a timestamp as today.
pub fn normalize(payload: &UpstreamPayload, metric: Metric, entity: &str) -> Vec<SeriesRecord> {
    normalize_on(payload, metric, entity, Local::now().date_naive())
}

/// Normalize a payload with an explicit "today" for undated snapshots.
pub fn normalize_on(
    payload: &UpstreamPayload,
    metric: Metric,
    entity: &str,
    today: NaiveDate,
) -> Vec<SeriesRecord> {
    let template = Template { metric, entity };
    match payload {
        UpstreamPayload::ForecastList(list) => from_forecast(list, &template),
        UpstreamPayload::DailyMap(map) => from_daily_map(map, &template),
        UpstreamPayload::Snapshot(Snapshot::Weather(current)) => {
            vec![from_current(current, &template, today)]
        }
        UpstreamPayload::Snapshot(Snapshot::Company(overview)) => {
            vec![from_overview(overview, &template, today)]
        }
        UpstreamPayload::Records(rows) => from_records(rows, &template),
    }
}

/// `((high - low) / low) * 100`, or `None` when `low` is zero or the result isn't finite.
pub fn volatility_pct(high: f64, low: f64) -> Option<f64> {
    if low == 0.0 {
        return None;
    }
    let v = ((high - low) / low) * 100.0;
    v.is_finite().then_some(v)
}

struct Template<'a> {
    metric: Metric,
    entity: &'a str,
}

impl Template<'_> {
    fn record(&self, date: NaiveDate) -> SeriesRecord {
        SeriesRecord::empty(date, self.entity, self.metric.sector())
    }
}

#[derive(Default)]
struct DayAccumulator {
    temp_sum: f64,
    temp_n: usize,
    humidity_sum: f64,
    humidity_n: usize,
    rain_sum: f64,
}

fn mean(sum: f64, n: usize) -> Option<f64> {
    (n > 0).then(|| sum / n as f64)
}

fn from_forecast(list: &ForecastList, template: &Template<'_>) -> Vec<SeriesRecord> {
    let mut days: BTreeMap<NaiveDate, DayAccumulator> = BTreeMap::new();

    for entry in &list.list {
        let day_part = entry.dt_txt.split_whitespace().next().unwrap_or_default();
        let Ok(date) = NaiveDate::parse_from_str(day_part, "%Y-%m-%d") else {
            debug!(dt_txt = %entry.dt_txt, "skipping forecast entry with unparsable timestamp");
            continue;
        };

        let acc = days.entry(date).or_default();
        if entry.main.temp.is_finite() {
            acc.temp_sum += entry.main.temp;
            acc.temp_n += 1;
        }
        if let Some(h) = entry.main.humidity.filter(|h| h.is_finite()) {
            acc.humidity_sum += h;
            acc.humidity_n += 1;
        }
        // Entries without a rain block had no rain in that window.
        acc.rain_sum += entry
            .rain
            .as_ref()
            .and_then(|r| r.three_hours)
            .unwrap_or(0.0);
    }

    days.into_iter()
        .map(|(date, acc)| {
            template
                .record(date)
                .with(Metric::Temperature, mean(acc.temp_sum, acc.temp_n))
                .with(Metric::Humidity, mean(acc.humidity_sum, acc.humidity_n))
                .with(Metric::Rainfall, Some(acc.rain_sum))
        })
        .collect()
}

fn from_daily_map(map: &DailyMap, template: &Template<'_>) -> Vec<SeriesRecord> {
    let mut by_date: BTreeMap<NaiveDate, SeriesRecord> = BTreeMap::new();

    for (key, bar) in &map.series {
        let Ok(date) = NaiveDate::parse_from_str(key.trim(), "%Y-%m-%d") else {
            debug!(key = %key, "skipping daily bar with unparsable date key");
            continue;
        };

        let close = parse_number(&bar.close);
        let volume = parse_number(&bar.volume);
        let volatility = match (parse_number(&bar.high), parse_number(&bar.low)) {
            (Some(high), Some(low)) => volatility_pct(high, low),
            _ => None,
        };

        let record = template
            .record(date)
            .with(Metric::StockPrice, close)
            .with(Metric::TradingVolume, volume)
            .with(Metric::MarketCap, None)
            .with(Metric::Volatility, volatility);
        by_date.insert(date, record);
    }

    by_date.into_values().collect()
}

fn from_current(current: &CurrentConditions, template: &Template<'_>, today: NaiveDate) -> SeriesRecord {
    let date = current
        .dt
        .and_then(|ts| DateTime::from_timestamp(ts, 0))
        .map(|dt| dt.date_naive())
        .unwrap_or(today);

    let rain = current
        .rain
        .as_ref()
        .and_then(|r| r.one_hour)
        .unwrap_or(0.0);

    template
        .record(date)
        .with(Metric::Temperature, Some(current.main.temp))
        .with(Metric::Humidity, current.main.humidity)
        .with(Metric::Rainfall, Some(rain))
}

fn from_overview(overview: &CompanyOverview, template: &Template<'_>, today: NaiveDate) -> SeriesRecord {
    template
        .record(today)
        .with(Metric::MarketCap, parse_number(&overview.market_capitalization))
}

fn from_records(rows: &[Map<String, Value>], template: &Template<'_>) -> Vec<SeriesRecord> {
    let mut by_date: BTreeMap<NaiveDate, SeriesRecord> = BTreeMap::new();

    for row in rows {
        let Some(date) = row
            .get("date")
            .and_then(Value::as_str)
            .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok())
        else {
            debug!("skipping backend record without a usable date");
            continue;
        };

        let mut record = template.record(date);
        for metric in template.metric.sector().metrics() {
            let value = row.get(metric.key()).and_then(value_as_number);
            record.set(*metric, value);
        }
        by_date.insert(date, record);
    }

    by_date.into_values().collect()
}

fn value_as_number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_number(s),
        _ => None,
    }
}

fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") || trimmed == "-" {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}
