//! Synthetic fallback series.
//!
//! Used whenever live data can't be fetched. Records have exactly the shape the
//! normalizer produces, so rendering doesn't care where a series came from.
//!
//! Model per metric (random walk with optional seasonality):
//!
//! ```text
//! level_0 = base_min + u * base_span
//! level_i = clamp(level_{i-1} + (u - 0.5) * step)
//! value_i = clamp(level_i + amplitude * sin(2π i / days))
//! ```

use std::f64::consts::TAU;

use chrono::{Duration, Local, NaiveDate};
use rand::Rng;

use crate::config::MAX_DAYS;
use crate::domain::{Metric, SeriesRecord};

/// A source of uniform draws in `[0, 1)`.
///
/// Every `rand::Rng` is one; tests can plug in a fixed sequence instead.
pub trait UnitRandom {
    fn next_unit(&mut self) -> f64;
}

impl<R: Rng + ?Sized> UnitRandom for R {
    fn next_unit(&mut self) -> f64 {
        self.r#gen::<f64>()
    }
}

/// Generation parameters and plausible range of one metric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricProfile {
    pub base_min: f64,
    pub base_span: f64,
    /// Scale of the per-day `(u - 0.5)` step.
    pub step: f64,
    /// Amplitude of the seasonal sine term (0 for financial metrics).
    pub amplitude: f64,
    pub min: f64,
    pub max: f64,
}

impl MetricProfile {
    pub fn for_metric(metric: Metric) -> Self {
        let (base_min, base_span, step, amplitude, min, max) = match metric {
            Metric::StockPrice => (50.0, 100.0, 5.0, 0.0, 1.0, 10_000.0),
            Metric::TradingVolume => (500_000.0, 500_000.0, 400_000.0, 0.0, 0.0, 1e10),
            Metric::MarketCap => (5e10, 1e11, 5e9, 0.0, 0.0, 1e13),
            Metric::Volatility => (0.5, 1.5, 1.0, 0.0, 0.0, 100.0),
            Metric::Temperature => (10.0, 30.0, 3.0, 5.0, 10.0, 40.0),
            Metric::Humidity => (50.0, 30.0, 10.0, 10.0, 30.0, 100.0),
            Metric::Rainfall => (0.0, 20.0, 8.0, 3.0, 0.0, 200.0),
            Metric::SoilMoisture => (30.0, 40.0, 8.0, 5.0, 0.0, 100.0),
            Metric::Sunshine => (4.0, 6.0, 2.0, 2.0, 0.0, 12.0),
        };
        Self {
            base_min,
            base_span,
            step,
            amplitude,
            min,
            max,
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}

/// Generate `days` records ending today (inclusive).
pub fn generate<R: UnitRandom + ?Sized>(
    rng: &mut R,
    entity: &str,
    metric: Metric,
    days: usize,
) -> Vec<SeriesRecord> {
    generate_until(rng, entity, metric, days, Local::now().date_naive())
}

/// Generate `days` records for the window `today - (days - 1) ..= today`.
///
/// Every metric of `metric`'s sector is filled in, each with its own walk.
/// Draw order is fixed (all starting levels, then one draw per metric per day)
/// so a fixed random sequence yields a fixed series.
pub fn generate_until<R: UnitRandom + ?Sized>(
    rng: &mut R,
    entity: &str,
    metric: Metric,
    days: usize,
    today: NaiveDate,
) -> Vec<SeriesRecord> {
    let days = days.min(MAX_DAYS);
    if days == 0 {
        return Vec::new();
    }
    let Some(start) = today.checked_sub_signed(Duration::days(days as i64 - 1)) else {
        return Vec::new();
    };

    let sector = metric.sector();
    let metrics = sector.metrics();
    let profiles: Vec<MetricProfile> = metrics.iter().map(|m| MetricProfile::for_metric(*m)).collect();

    let mut levels: Vec<f64> = profiles
        .iter()
        .map(|p| p.clamp(p.base_min + rng.next_unit() * p.base_span))
        .collect();

    let mut out = Vec::with_capacity(days);

    for i in 0..days {
        let Some(date) = start.checked_add_signed(Duration::days(i as i64)) else {
            break;
        };
        let phase = TAU * i as f64 / days as f64;
        let mut record = SeriesRecord::empty(date, entity, sector);

        for ((m, profile), level) in metrics.iter().zip(&profiles).zip(levels.iter_mut()) {
            let noise = (rng.next_unit() - 0.5) * profile.step;
            *level = profile.clamp(*level + noise);
            let value = profile.clamp(*level + profile.amplitude * phase.sin());
            record.set(*m, Some(value));
        }

        out.push(record);
    }

    out
}
