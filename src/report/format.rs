//! Formatted terminal output: series summary, monthly rollups, correlations, catalog.
//!
//! Formatting lives here so the pipeline stays presentation-free and output
//! changes are localized.

use crate::app::pipeline::{Provenance, SeriesData};
use crate::config::LookupTables;
use crate::domain::{Metric, MonthlySummary, SeriesRecord};
use crate::math::Correlation;

/// First/last/min/max/mean of one field over a series.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldStats {
    pub metric: Metric,
    pub first: f64,
    pub last: f64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub n: usize,
}

/// Stats for `metric`, or `None` when no record has a value for it.
pub fn field_stats(records: &[SeriesRecord], metric: Metric) -> Option<FieldStats> {
    let values: Vec<f64> = records.iter().filter_map(|r| r.value(metric)).collect();
    let first = *values.first()?;
    let last = *values.last()?;
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    Some(FieldStats {
        metric,
        first,
        last,
        min,
        max,
        mean,
        n: values.len(),
    })
}

/// Header + per-field table. The selected metric is marked with `*`.
pub fn format_series_summary(data: &SeriesData) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== {} ===\n", data.title()));
    match &data.provenance {
        Provenance::Live => out.push_str("Source: live\n"),
        Provenance::Sample { reason } => out.push_str(&format!("Source: sample data ({reason})\n")),
    }
    match (data.records.first(), data.records.last()) {
        (Some(first), Some(last)) => out.push_str(&format!(
            "Records: {} | {} .. {}\n",
            data.records.len(),
            first.date,
            last.date
        )),
        _ => out.push_str("Records: 0\n"),
    }
    out.push('\n');

    out.push_str(
        format!(
            "  {:<16} {:>14} {:>14} {:>14} {:>14} {:>14} {:>4}",
            "field", "first", "last", "min", "max", "mean", "n"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!(
            "  {:-<16} {:-<14} {:-<14} {:-<14} {:-<14} {:-<14} {:-<4}",
            "", "", "", "", "", "", ""
        )
        .trim_end(),
    );
    out.push('\n');

    for &metric in data.request.sector().metrics() {
        let marker = if metric == data.request.metric { '*' } else { ' ' };
        let line = match field_stats(&data.records, metric) {
            Some(s) => format!(
                "{marker} {:<16} {:>14} {:>14} {:>14} {:>14} {:>14} {:>4}",
                metric.key(),
                fmt_num(s.first),
                fmt_num(s.last),
                fmt_num(s.min),
                fmt_num(s.max),
                fmt_num(s.mean),
                s.n
            ),
            None => format!("{marker} {:<16} {:>14}", metric.key(), "n/a"),
        };
        out.push_str(line.trim_end());
        out.push('\n');
    }

    out
}

pub fn format_monthly(months: &[MonthlySummary]) -> String {
    let mut out = String::new();
    out.push_str("Monthly summary:\n");
    if months.is_empty() {
        out.push_str("  (no records)\n");
        return out;
    }

    out.push_str(&format!("  {:<8} {:>12} {:>14} {:>5}\n", "month", "avg temp", "total rain", "days"));
    out.push_str(&format!("  {:-<8} {:-<12} {:-<14} {:-<5}\n", "", "", "", ""));
    for m in months {
        out.push_str(&format!(
            "  {:<8} {:>12} {:>14} {:>5}\n",
            format!("{}-{:02}", m.year, m.month),
            m.average_temperature
                .map(|t| format!("{t:.1} °C"))
                .unwrap_or_else(|| "n/a".into()),
            m.total_rainfall
                .map(|r| format!("{r:.1} mm"))
                .unwrap_or_else(|| "n/a".into()),
            m.days
        ));
    }
    out
}

pub fn format_correlations(left_title: &str, right_title: &str, correlations: &[Correlation]) -> String {
    let mut out = String::new();
    out.push_str(&format!("Correlation: {left_title} vs {right_title}\n"));
    if correlations.is_empty() {
        out.push_str("  (not enough overlapping data)\n");
        return out;
    }

    out.push_str(&format!("  {:<16} {:<16} {:>8} {:>4}\n", "field", "field", "r", "n"));
    out.push_str(&format!("  {:-<16} {:-<16} {:-<8} {:-<4}\n", "", "", "", ""));
    for c in correlations {
        out.push_str(&format!(
            "  {:<16} {:<16} {:>8.3} {:>4}\n",
            c.left.key(),
            c.right.key(),
            c.coefficient,
            c.n
        ));
    }
    out
}

/// Categories/companies (with tickers) and crops/regions from the local tables.
pub fn format_catalog(lookup: &LookupTables, include_untraded: bool) -> String {
    let mut out = String::new();

    out.push_str("Technology categories:\n");
    for category in lookup.categories() {
        out.push_str(&format!("  {category}\n"));
        for company in lookup.listed_companies(category, include_untraded) {
            let ticker = lookup.symbol(company).unwrap_or("not traded");
            out.push_str(&format!("    {company:<16} {ticker}\n"));
        }
    }

    out.push_str("\nCrops:\n");
    for crop in lookup.crops() {
        out.push_str(&format!("  {crop}\n"));
        for region in lookup.regions(crop).unwrap_or_default() {
            match lookup.coordinates(region) {
                Ok(c) => out.push_str(&format!("    {region:<16} ({:.4}, {:.4})\n", c.lat, c.lon)),
                Err(_) => out.push_str(&format!("    {region:<16} (no coordinates)\n")),
            }
        }
    }

    out
}

/// Compact fixed-width numbers: separators are not used, large values get a suffix.
fn fmt_num(v: f64) -> String {
    let a = v.abs();
    if a >= 1e12 {
        format!("{:.2}T", v / 1e12)
    } else if a >= 1e9 {
        format!("{:.2}B", v / 1e9)
    } else if a >= 1e6 {
        format!("{:.2}M", v / 1e6)
    } else {
        format!("{v:.2}")
    }
}
