//! ASCII plotting for terminal output.
//!
//! Fixed-size grid, deterministic output (golden tests). Plot elements:
//! - observations: `o`
//! - connecting line: `-`

use super::{ChartSurface, LineChart};
use crate::error::RenderError;

/// Text surface; the last drawn chart is kept in `output`.
#[derive(Debug, Clone)]
pub struct AsciiChart {
    width: usize,
    height: usize,
    output: String,
}

impl AsciiChart {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width: width.max(10),
            height: height.max(5),
            output: String::new(),
        }
    }

    pub fn output(&self) -> &str {
        &self.output
    }
}

impl ChartSurface for AsciiChart {
    fn draw(&mut self, chart: &LineChart) -> Result<(), RenderError> {
        self.output = plot_text(chart, self.width, self.height);
        Ok(())
    }
}

/// Render `chart` into a `width` x `height` grid with a two-line header.
pub fn plot_text(chart: &LineChart, width: usize, height: usize) -> String {
    let [x_min, x_max] = chart.x_bounds();
    let [y_min, y_max] = chart.y_bounds(0.05);
    let points = chart.xy();

    let mut grid = vec![vec![' '; width]; height];

    // Line first so markers overlay it.
    let mut prev = None;
    for &(x, y) in &points {
        let cell = (map_x(x, x_min, x_max, width), map_y(y, y_min, y_max, height));
        match prev {
            Some((x0, y0)) => draw_line(&mut grid, x0, y0, cell.0, cell.1, '-'),
            None => grid[cell.1][cell.0] = '-',
        }
        prev = Some(cell);
    }

    for &(x, y) in &points {
        grid[map_y(y, y_min, y_max, height)][map_x(x, x_min, x_max, width)] = 'o';
    }

    let mut out = String::new();
    out.push_str(&chart.title);
    out.push('\n');
    let span = match (chart.first_date(), chart.last_date()) {
        (Some(first), Some(last)) => format!("{first} .. {last}"),
        _ => String::from("-"),
    };
    out.push_str(&format!(
        "{}: [{y_min:.2}, {y_max:.2}] | {}: {span}\n",
        chart.y_label, chart.x_label
    ));

    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    out
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // Row 0 is the top (max).
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Integer line drawing (Bresenham). Only fills blank cells.
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if let Some(cell) = grid
            .get_mut(y0 as usize)
            .and_then(|row| row.get_mut(x0 as usize))
            .filter(|c| **c == ' ')
        {
            *cell = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Metric, SeriesRecord, Sector};
    use crate::render::{RenderOutcome, render};
    use chrono::NaiveDate;

    fn record(day: u32, price: f64) -> SeriesRecord {
        SeriesRecord::empty(NaiveDate::from_ymd_opt(2025, 5, day).unwrap(), "Samsung", Sector::Tech)
            .with(Metric::StockPrice, Some(price))
    }

    #[test]
    fn plot_golden_snapshot_small() {
        let records = [record(1, 100.0), record(5, 120.0), record(10, 110.0)];
        let mut surface = AsciiChart::new(10, 5);
        let outcome = render(
            &records,
            &mut surface,
            "SAMSUNG - STOCK PRICE",
            Metric::StockPrice,
            "STOCK PRICE (USD)",
        );
        assert!(matches!(outcome, RenderOutcome::Drawn(_)));

        let expected = concat!(
            "SAMSUNG - STOCK PRICE\n",
            "STOCK PRICE (USD): [99.00, 121.00] | Date: 2025-05-01 .. 2025-05-10\n",
            "    o-    \n",
            "   -  --  \n",
            "  -     -o\n",
            " -        \n",
            "o         \n",
        );
        assert_eq!(surface.output(), expected);
    }

    #[test]
    fn single_point_sits_on_the_left_edge() {
        let mut surface = AsciiChart::new(10, 5);
        render(&[record(1, 42.0)], &mut surface, "T", Metric::StockPrice, "Y");
        let rows: Vec<&str> = surface.output().lines().skip(2).collect();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows.iter().filter(|r| r.starts_with('o')).count(), 1);
        assert!(rows.iter().all(|r| !r.contains('-')));
    }
}
