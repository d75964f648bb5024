//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - produced by the normalizer and the synthetic generator alike
//! - exported to JSON/CSV
//! - rendered without knowing where the data came from

use std::collections::BTreeMap;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Which side of the dashboard a selection belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Sector {
    /// Technology companies and their financial series.
    Tech,
    /// Crops/regions and their weather series.
    Agriculture,
}

impl Sector {
    pub const ALL: [Sector; 2] = [Sector::Tech, Sector::Agriculture];

    pub fn display_name(self) -> &'static str {
        match self {
            Sector::Tech => "Technology",
            Sector::Agriculture => "Agriculture",
        }
    }

    /// The full field set every record of this sector carries.
    pub fn metrics(self) -> &'static [Metric] {
        match self {
            Sector::Tech => &FINANCIAL_METRICS,
            Sector::Agriculture => &WEATHER_METRICS,
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            Sector::Tech => Sector::Agriculture,
            Sector::Agriculture => Sector::Tech,
        }
    }
}

const FINANCIAL_METRICS: [Metric; 4] = [
    Metric::StockPrice,
    Metric::TradingVolume,
    Metric::MarketCap,
    Metric::Volatility,
];

const WEATHER_METRICS: [Metric; 5] = [
    Metric::Temperature,
    Metric::Humidity,
    Metric::Rainfall,
    Metric::SoilMoisture,
    Metric::Sunshine,
];

/// A named numeric field of a series record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    StockPrice,
    TradingVolume,
    MarketCap,
    /// Daily high/low range as a percentage of the low.
    Volatility,
    Temperature,
    Humidity,
    Rainfall,
    SoilMoisture,
    Sunshine,
}

impl Metric {
    pub fn key(self) -> &'static str {
        match self {
            Metric::StockPrice => "stock_price",
            Metric::TradingVolume => "trading_volume",
            Metric::MarketCap => "market_cap",
            Metric::Volatility => "volatility",
            Metric::Temperature => "temperature",
            Metric::Humidity => "humidity",
            Metric::Rainfall => "rainfall",
            Metric::SoilMoisture => "soil_moisture",
            Metric::Sunshine => "sunshine",
        }
    }

    /// Upper-cased, space-separated key (`stock_price` -> `STOCK PRICE`).
    pub fn label(self) -> String {
        self.key().replace('_', " ").to_uppercase()
    }

    pub fn unit(self) -> &'static str {
        match self {
            Metric::StockPrice => "price",
            Metric::TradingVolume => "shares",
            Metric::MarketCap => "USD",
            Metric::Volatility | Metric::Humidity | Metric::SoilMoisture => "%",
            Metric::Temperature => "°C",
            Metric::Rainfall => "mm",
            Metric::Sunshine => "h",
        }
    }

    /// Y-axis label used by every chart surface.
    pub fn axis_label(self) -> String {
        format!("{} ({})", self.label(), self.unit())
    }

    pub fn sector(self) -> Sector {
        if FINANCIAL_METRICS.contains(&self) {
            Sector::Tech
        } else {
            Sector::Agriculture
        }
    }

    pub fn parse(raw: &str) -> Option<Metric> {
        let wanted = raw.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        FINANCIAL_METRICS
            .iter()
            .chain(WEATHER_METRICS.iter())
            .copied()
            .find(|m| m.key() == wanted)
    }

    /// Next metric within the same sector (wraps).
    pub fn next(self) -> Metric {
        let metrics = self.sector().metrics();
        let idx = metrics.iter().position(|m| *m == self).unwrap_or(0);
        metrics[(idx + 1) % metrics.len()]
    }

    /// Previous metric within the same sector (wraps).
    pub fn prev(self) -> Metric {
        let metrics = self.sector().metrics();
        let idx = metrics.iter().position(|m| *m == self).unwrap_or(0);
        metrics[(idx + metrics.len() - 1) % metrics.len()]
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// One dated observation of an entity.
///
/// `fields` always holds every metric of the record's sector; values the source
/// doesn't provide are `None` (serialized as `null`) rather than missing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesRecord {
    pub date: NaiveDate,
    pub entity: String,
    #[serde(flatten)]
    pub fields: BTreeMap<Metric, Option<f64>>,
}

impl SeriesRecord {
    /// A record with the full field set of `sector`, all values unset.
    pub fn empty(date: NaiveDate, entity: impl Into<String>, sector: Sector) -> Self {
        Self {
            date,
            entity: entity.into(),
            fields: sector.metrics().iter().map(|m| (*m, None)).collect(),
        }
    }

    pub fn value(&self, metric: Metric) -> Option<f64> {
        self.fields.get(&metric).copied().flatten()
    }

    /// Set a field. Metrics outside the record's field set are ignored so
    /// every record of a series keeps the same shape.
    pub fn set(&mut self, metric: Metric, value: Option<f64>) {
        if let Some(slot) = self.fields.get_mut(&metric) {
            *slot = value.filter(|v| v.is_finite());
        }
    }

    pub fn with(mut self, metric: Metric, value: Option<f64>) -> Self {
        self.set(metric, value);
        self
    }
}

/// Calendar-month rollup of daily weather records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySummary {
    pub year: i32,
    pub month: u32,
    pub entity: String,
    pub average_temperature: Option<f64>,
    pub total_rainfall: Option<f64>,
    /// Number of daily records that fell into the month.
    pub days: usize,
}
