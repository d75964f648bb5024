//! Plotters-powered line chart widget for Ratatui.
//!
//! We render Plotters output into the Ratatui buffer using `plotters-ratatui-backend`.
//! `FrameSurface` adapts a frame region to the `ChartSurface` trait so the TUI
//! goes through the same `render` path as the text and SVG outputs.

use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    Frame,
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

use crate::error::RenderError;
use crate::render::{ChartSurface, LineChart};

/// Below this the chart builder can't lay out axes.
pub const MIN_WIDTH: u16 = 20;
pub const MIN_HEIGHT: u16 = 8;

/// Render-only view over a prepared `LineChart`.
pub struct SeriesChartWidget<'a> {
    chart: &'a LineChart,
}

impl<'a> SeriesChartWidget<'a> {
    pub fn new(chart: &'a LineChart) -> Self {
        Self { chart }
    }
}

impl Widget for SeriesChartWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let chart = self.chart;
        let [x0, x1] = chart.x_bounds();
        let [y0, y1] = chart.y_bounds(0.05);
        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite()) || x1 <= x0 || y1 <= y0 {
            return;
        }

        let widget = widget_fn(move |root| {
            let mut ctx = ChartBuilder::on(&root)
                .margin(1)
                .set_label_area_size(LabelAreaPosition::Left, 6)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            ctx.configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_desc(chart.x_label.as_str())
                .y_desc(chart.y_label.as_str())
                .x_labels(5)
                .y_labels(5)
                .x_label_formatter(&|v| chart.date_at(*v).map(|d| d.format("%m-%d").to_string()).unwrap_or_default())
                .y_label_formatter(&|v| format!("{v:.1}"))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            let line_color = RGBColor(0, 255, 255);
            let point_color = RGBColor(255, 255, 0);
            let xy = chart.xy();

            ctx.draw_series(LineSeries::new(xy.iter().copied(), &line_color))?;

            // `Circle` radii come out far too large on this backend; a colored
            // `Pixel` reads as a dot at terminal resolution.
            ctx.draw_series(xy.iter().map(|&(x, y)| Pixel::new((x, y), point_color)))?;

            Ok(())
        });

        widget.render(area, buf);
    }
}

/// A `ChartSurface` over one region of a Ratatui frame.
pub struct FrameSurface<'f, 'b> {
    frame: &'f mut Frame<'b>,
    area: Rect,
}

impl<'f, 'b> FrameSurface<'f, 'b> {
    pub fn new(frame: &'f mut Frame<'b>, area: Rect) -> Self {
        Self { frame, area }
    }
}

impl ChartSurface for FrameSurface<'_, '_> {
    fn draw(&mut self, chart: &LineChart) -> Result<(), RenderError> {
        if self.area.width < MIN_WIDTH || self.area.height < MIN_HEIGHT {
            return Err(RenderError::new(format!(
                "chart area {}x{} is too small (resize terminal)",
                self.area.width, self.area.height
            )));
        }
        self.frame.render_widget(SeriesChartWidget::new(chart), self.area);
        Ok(())
    }
}
