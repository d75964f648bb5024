//! Chart rendering.
//!
//! `render` turns a record sequence into a `LineChart` (one line-plus-marker
//! series over dates) and hands it to a `ChartSurface`. Surfaces:
//!
//! - `ascii::AsciiChart`: fixed-grid text plot for terminal output
//! - `svg::SvgChart`: plotters SVG file
//! - `crate::tui::chart::SeriesChartWidget`: plotters drawn into the ratatui buffer

use std::panic::{AssertUnwindSafe, catch_unwind};

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::domain::{Metric, SeriesRecord};
use crate::error::RenderError;

pub mod ascii;
pub mod svg;

pub use ascii::AsciiChart;
pub use svg::SvgChart;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartPoint {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub name: String,
    pub points: Vec<ChartPoint>,
}

/// Render-only chart description. Points are in ascending date order.
#[derive(Debug, Clone, PartialEq)]
pub struct LineChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub series: ChartSeries,
}

impl LineChart {
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.series.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.series.points.last().map(|p| p.date)
    }

    /// Day offset of `date` from the first point (the numeric x coordinate).
    pub fn x_of(&self, date: NaiveDate) -> f64 {
        self.first_date()
            .map(|first| (date - first).num_days() as f64)
            .unwrap_or(0.0)
    }

    /// Inverse of `x_of`, used by tick label formatters.
    pub fn date_at(&self, x: f64) -> Option<NaiveDate> {
        let first = self.first_date()?;
        first.checked_add_signed(chrono::Duration::days(x.round() as i64))
    }

    /// `(x, y)` pairs for numeric backends.
    pub fn xy(&self) -> Vec<(f64, f64)> {
        self.series
            .points
            .iter()
            .map(|p| (self.x_of(p.date), p.value))
            .collect()
    }

    /// X bounds in day offsets; at least one day wide.
    pub fn x_bounds(&self) -> [f64; 2] {
        let last = self.last_date().map(|d| self.x_of(d)).unwrap_or(0.0);
        [0.0, last.max(1.0)]
    }

    /// Y bounds padded by `frac` of the span; never degenerate.
    pub fn y_bounds(&self, frac: f64) -> [f64; 2] {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for p in &self.series.points {
            min = min.min(p.value);
            max = max.max(p.value);
        }
        if !(min.is_finite() && max.is_finite()) {
            return [0.0, 1.0];
        }
        let span = max - min;
        let pad = if span > 0.0 {
            span * frac
        } else {
            (min.abs() * frac).max(0.5)
        };
        [min - pad, max + pad]
    }
}

/// Something a `LineChart` can be drawn on.
pub trait ChartSurface {
    fn draw(&mut self, chart: &LineChart) -> Result<(), RenderError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutcome {
    Drawn(LineChart),
    /// Nothing to plot; the surface was not touched.
    NoData,
    Failed { detail: String },
}

impl RenderOutcome {
    pub fn chart(&self) -> Option<&LineChart> {
        match self {
            RenderOutcome::Drawn(chart) => Some(chart),
            _ => None,
        }
    }
}

/// Build the chart description for `metric` without drawing it.
///
/// `None` when no record carries a value for `metric`.
pub fn build_chart(records: &[SeriesRecord], title: &str, metric: Metric, y_label: &str) -> Option<LineChart> {
    let name = records.first()?.entity.clone();
    let points: Vec<ChartPoint> = records
        .iter()
        .filter_map(|r| r.value(metric).map(|value| ChartPoint { date: r.date, value }))
        .collect();
    if points.is_empty() {
        return None;
    }
    Some(LineChart {
        title: title.to_string(),
        x_label: "Date".to_string(),
        y_label: y_label.to_string(),
        series: ChartSeries { name, points },
    })
}

/// Draw `metric` from `records` on `surface`.
///
/// Surface errors and panics raised inside the chart library both come back as
/// `RenderOutcome::Failed`.
pub fn render(
    records: &[SeriesRecord],
    surface: &mut dyn ChartSurface,
    title: &str,
    metric: Metric,
    y_label: &str,
) -> RenderOutcome {
    let Some(chart) = build_chart(records, title, metric, y_label) else {
        debug!(%metric, records = records.len(), "nothing to plot");
        return RenderOutcome::NoData;
    };

    match catch_unwind(AssertUnwindSafe(|| surface.draw(&chart))) {
        Ok(Ok(())) => RenderOutcome::Drawn(chart),
        Ok(Err(err)) => {
            warn!(%title, "chart surface failed: {err}");
            RenderOutcome::Failed { detail: err.to_string() }
        }
        Err(panic) => {
            let detail = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "chart library panicked".to_string());
            warn!(%title, "chart surface panicked: {detail}");
            RenderOutcome::Failed { detail }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Sector;

    #[derive(Default)]
    struct Recording {
        calls: Vec<LineChart>,
    }

    impl ChartSurface for Recording {
        fn draw(&mut self, chart: &LineChart) -> Result<(), RenderError> {
            self.calls.push(chart.clone());
            Ok(())
        }
    }

    struct Broken;

    impl ChartSurface for Broken {
        fn draw(&mut self, _chart: &LineChart) -> Result<(), RenderError> {
            Err(RenderError::new("canvas gone"))
        }
    }

    struct Panicky;

    impl ChartSurface for Panicky {
        fn draw(&mut self, _chart: &LineChart) -> Result<(), RenderError> {
            panic!("bad coordinate range")
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, d).unwrap()
    }

    fn price(d: u32, v: Option<f64>) -> SeriesRecord {
        SeriesRecord::empty(day(d), "Samsung", Sector::Tech).with(Metric::StockPrice, v)
    }

    #[test]
    fn empty_input_leaves_the_surface_untouched() {
        let mut surface = Recording::default();
        let outcome = render(&[], &mut surface, "T", Metric::StockPrice, "Y");
        assert_eq!(outcome, RenderOutcome::NoData);
        assert!(surface.calls.is_empty());
    }

    #[test]
    fn records_without_the_metric_are_no_data() {
        let mut surface = Recording::default();
        let outcome = render(&[price(1, None)], &mut surface, "T", Metric::StockPrice, "Y");
        assert_eq!(outcome, RenderOutcome::NoData);
        assert!(surface.calls.is_empty());
    }

    #[test]
    fn one_record_is_one_point() {
        let mut surface = Recording::default();
        let outcome = render(
            &[price(3, Some(70_000.0))],
            &mut surface,
            "SAMSUNG - STOCK PRICE",
            Metric::StockPrice,
            "STOCK PRICE (USD)",
        );
        let chart = outcome.chart().unwrap();
        assert_eq!(chart.series.name, "Samsung");
        assert_eq!(chart.series.points, vec![ChartPoint { date: day(3), value: 70_000.0 }]);
        assert_eq!(chart.x_label, "Date");
        assert_eq!(surface.calls.len(), 1);
        assert_eq!(chart.x_bounds(), [0.0, 1.0]);
        let [lo, hi] = chart.y_bounds(0.05);
        assert!(lo < 70_000.0 && hi > 70_000.0);
    }

    #[test]
    fn gaps_are_skipped_and_x_is_days_from_start() {
        let records = [price(1, Some(1.0)), price(2, None), price(4, Some(3.0))];
        let chart = build_chart(&records, "T", Metric::StockPrice, "Y").unwrap();
        assert_eq!(chart.xy(), vec![(0.0, 1.0), (3.0, 3.0)]);
        assert_eq!(chart.date_at(3.0), Some(day(4)));
    }

    #[test]
    fn surface_errors_and_panics_are_failures() {
        let records = [price(1, Some(1.0))];
        let outcome = render(&records, &mut Broken, "T", Metric::StockPrice, "Y");
        assert!(matches!(outcome, RenderOutcome::Failed { ref detail } if detail.contains("canvas gone")));

        let outcome = render(&records, &mut Panicky, "T", Metric::StockPrice, "Y");
        assert_eq!(
            outcome,
            RenderOutcome::Failed {
                detail: "bad coordinate range".into()
            }
        );
    }
}
