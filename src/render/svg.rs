//! SVG file output via plotters.

use std::path::{Path, PathBuf};

use plotters::prelude::*;
use tracing::info;

use super::{ChartSurface, LineChart};
use crate::error::RenderError;

const DEFAULT_SIZE: (u32, u32) = (1024, 600);

const LINE_COLOR: RGBColor = RGBColor(31, 119, 180);
const GRID_COLOR: RGBColor = RGBColor(225, 225, 225);

/// Writes each drawn chart to `path`, replacing any previous file.
#[derive(Debug, Clone)]
pub struct SvgChart {
    path: PathBuf,
    size: (u32, u32),
}

impl SvgChart {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            size: DEFAULT_SIZE,
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = (width.max(200), height.max(150));
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ChartSurface for SvgChart {
    fn draw(&mut self, chart: &LineChart) -> Result<(), RenderError> {
        draw_svg(chart, &self.path, self.size)
            .map_err(|e| RenderError::new(format!("{}: {e}", self.path.display())))?;
        info!(path = %self.path.display(), points = chart.series.points.len(), "wrote SVG chart");
        Ok(())
    }
}

fn draw_svg(chart: &LineChart, path: &Path, size: (u32, u32)) -> Result<(), Box<dyn std::error::Error>> {
    let root = SVGBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;

    let [x0, x1] = chart.x_bounds();
    let [y0, y1] = chart.y_bounds(0.05);
    let points = chart.xy();

    let mut ctx = ChartBuilder::on(&root)
        .caption(&chart.title, ("sans-serif", 24))
        .margin(16)
        .set_label_area_size(LabelAreaPosition::Left, 80)
        .set_label_area_size(LabelAreaPosition::Bottom, 48)
        .build_cartesian_2d(x0..x1, y0..y1)?;

    let date_label = |x: &f64| {
        chart
            .date_at(*x)
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default()
    };
    let value_label = |y: &f64| format_value(*y);

    ctx.configure_mesh()
        .light_line_style(GRID_COLOR)
        .x_desc(&chart.x_label)
        .y_desc(&chart.y_label)
        .x_labels(8)
        .y_labels(8)
        .x_label_formatter(&date_label)
        .y_label_formatter(&value_label)
        .draw()?;

    ctx.draw_series(LineSeries::new(points.iter().copied(), LINE_COLOR.stroke_width(2)))?
        .label(&chart.series.name)
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], LINE_COLOR));

    ctx.draw_series(points.iter().map(|&(x, y)| Circle::new((x, y), 4, LINE_COLOR.filled())))?;

    ctx.configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

/// Compact tick labels for values spanning units to trillions.
pub(crate) fn format_value(v: f64) -> String {
    let a = v.abs();
    if a >= 1e12 {
        format!("{:.1}T", v / 1e12)
    } else if a >= 1e9 {
        format!("{:.1}B", v / 1e9)
    } else if a >= 1e6 {
        format!("{:.1}M", v / 1e6)
    } else if a >= 1e4 {
        format!("{:.0}", v)
    } else {
        format!("{:.2}", v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Metric, SeriesRecord, Sector};
    use crate::render::{RenderOutcome, render};
    use chrono::{Duration, NaiveDate};

    #[test]
    fn writes_an_svg_document() {
        let start = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
        let records: Vec<SeriesRecord> = (0..5)
            .map(|i| {
                SeriesRecord::empty(start + Duration::days(i), "Europe", Sector::Agriculture)
                    .with(Metric::Temperature, Some(15.0 + i as f64))
            })
            .collect();

        let path = std::env::temp_dir().join(format!("ht-svg-test-{}.svg", std::process::id()));
        let mut surface = SvgChart::new(&path).with_size(640, 400);
        let outcome = render(
            &records,
            &mut surface,
            "WHEAT - Europe - TEMPERATURE",
            Metric::Temperature,
            "TEMPERATURE (°C)",
        );
        assert!(matches!(outcome, RenderOutcome::Drawn(_)), "{outcome:?}");

        let svg = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("<circle"));
        assert!(svg.contains("WHEAT - Europe - TEMPERATURE"));
    }

    #[test]
    fn unwritable_path_is_a_failed_outcome() {
        let date = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
        let records = [SeriesRecord::empty(date, "X", Sector::Tech).with(Metric::StockPrice, Some(1.0))];
        let mut surface = SvgChart::new("/nonexistent-dir/for/sure/chart.svg");
        let outcome = render(&records, &mut surface, "T", Metric::StockPrice, "Y");
        assert!(matches!(outcome, RenderOutcome::Failed { .. }), "{outcome:?}");
    }

    #[test]
    fn value_labels_are_compact() {
        assert_eq!(format_value(2.5e12), "2.5T");
        assert_eq!(format_value(3.0e9), "3.0B");
        assert_eq!(format_value(1_300_000.0), "1.3M");
        assert_eq!(format_value(70_000.0), "70000");
        assert_eq!(format_value(12.5), "12.50");
    }
}
