//! Pearson correlation between the fields of two date-aligned series.
//!
//! The two series are inner-joined on date; every numeric field of the left
//! series is paired with every numeric field of the right series, and each
//! pair gets one coefficient:
//!
//! ```text
//! r = Σ (x_i - x̄)(y_i - ȳ) / sqrt(Σ (x_i - x̄)² · Σ (y_i - ȳ)²)
//! ```
//!
//! Fields of the same series are never paired with each other. Only rows where
//! both fields have a value contribute to a pair.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::{Metric, SeriesRecord};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Correlation {
    /// Field of the left series.
    pub left: Metric,
    /// Field of the right series.
    pub right: Metric,
    pub coefficient: f64,
    /// Joined rows that had both values.
    pub n: usize,
}

/// One date present in both series, with each side's non-null fields.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedRow {
    pub date: NaiveDate,
    pub left: BTreeMap<Metric, f64>,
    pub right: BTreeMap<Metric, f64>,
}

fn present(record: &SeriesRecord) -> BTreeMap<Metric, f64> {
    record.fields.iter().filter_map(|(m, v)| v.map(|v| (*m, v))).collect()
}

/// Inner join on date, in `left` order.
pub fn join_on_date(left: &[SeriesRecord], right: &[SeriesRecord]) -> Vec<JoinedRow> {
    let right_by_date: BTreeMap<NaiveDate, &SeriesRecord> = right.iter().map(|r| (r.date, r)).collect();

    left.iter()
        .filter_map(|l| {
            let r = right_by_date.get(&l.date)?;
            Some(JoinedRow {
                date: l.date,
                left: present(l),
                right: present(r),
            })
        })
        .collect()
}

fn field_set<'a>(rows: impl Iterator<Item = &'a BTreeMap<Metric, f64>>) -> Vec<Metric> {
    let mut metrics: Vec<Metric> = rows.flat_map(|fields| fields.keys().copied()).collect();
    metrics.sort();
    metrics.dedup();
    metrics
}

/// Correlate each left-series field with each right-series field.
///
/// Pairs with fewer than two joined values or zero variance are omitted.
/// Output is ordered by left field, then right field.
pub fn correlate(left: &[SeriesRecord], right: &[SeriesRecord]) -> Vec<Correlation> {
    let joined = join_on_date(left, right);

    let left_fields = field_set(joined.iter().map(|row| &row.left));
    let right_fields = field_set(joined.iter().map(|row| &row.right));

    let mut out = Vec::new();
    for &a in &left_fields {
        for &b in &right_fields {
            let (xs, ys): (Vec<f64>, Vec<f64>) = joined
                .iter()
                .filter_map(|row| Some((*row.left.get(&a)?, *row.right.get(&b)?)))
                .unzip();
            if let Some(coefficient) = pearson(&xs, &ys) {
                out.push(Correlation {
                    left: a,
                    right: b,
                    coefficient,
                    n: xs.len(),
                });
            }
        }
    }
    out
}

/// Pearson's r, or `None` for fewer than two points or a constant input.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return None;
    }
    let mean_x = xs[..n].iter().sum::<f64>() / n as f64;
    let mean_y = ys[..n].iter().sum::<f64>() / n as f64;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in xs[..n].iter().zip(&ys[..n]) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x <= 0.0 || var_y <= 0.0 {
        return None;
    }
    let r = (cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0);
    r.is_finite().then_some(r)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Sector;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, d).unwrap()
    }

    #[test]
    fn perfect_and_inverse_relationships() {
        assert!((pearson(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]).unwrap() - 1.0).abs() < 1e-12);
        assert!((pearson(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]).unwrap() + 1.0).abs() < 1e-12);
        assert_eq!(pearson(&[1.0], &[1.0]), None);
        assert_eq!(pearson(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]), None);
    }

    #[test]
    fn correlates_across_sectors_on_shared_dates() {
        let prices: Vec<SeriesRecord> = (1..=4)
            .map(|d| SeriesRecord::empty(day(d), "Samsung", Sector::Tech).with(Metric::StockPrice, Some(d as f64)))
            .collect();
        // Day 5 has no matching price and must be dropped by the join.
        let weather: Vec<SeriesRecord> = (2..=5)
            .map(|d| {
                SeriesRecord::empty(day(d), "Asia", Sector::Agriculture)
                    .with(Metric::Temperature, Some(10.0 * d as f64))
                    .with(Metric::Rainfall, Some(100.0 - d as f64))
            })
            .collect();

        assert_eq!(join_on_date(&prices, &weather).len(), 3);

        let result = correlate(&prices, &weather);
        let find = |a, b| result.iter().find(|c| c.left == a && c.right == b);

        let price_temp = find(Metric::StockPrice, Metric::Temperature).unwrap();
        assert_eq!(price_temp.n, 3);
        assert!((price_temp.coefficient - 1.0).abs() < 1e-12);

        let price_rain = find(Metric::StockPrice, Metric::Rainfall).unwrap();
        assert!((price_rain.coefficient + 1.0).abs() < 1e-12);

        // Only price x weather pairs; weather fields are not paired with each other.
        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|c| c.left.sector() == Sector::Tech && c.right.sector() == Sector::Agriculture));
        assert!(find(Metric::Temperature, Metric::Rainfall).is_none());

        // Fields that are always null never appear.
        assert!(result.iter().all(|c| c.left != Metric::MarketCap && c.right != Metric::MarketCap));
    }

    #[test]
    fn fields_of_one_series_are_never_paired() {
        let tech: Vec<SeriesRecord> = (1..=4)
            .map(|d| {
                SeriesRecord::empty(day(d), "Samsung", Sector::Tech)
                    .with(Metric::StockPrice, Some(d as f64))
                    .with(Metric::TradingVolume, Some(2.0 * d as f64 + 1.0))
            })
            .collect();
        let agri: Vec<SeriesRecord> = (1..=4)
            .map(|d| SeriesRecord::empty(day(d), "Asia", Sector::Agriculture).with(Metric::Temperature, Some(d as f64 * d as f64)))
            .collect();

        let pairs: Vec<(Metric, Metric)> = correlate(&tech, &agri).iter().map(|c| (c.left, c.right)).collect();
        assert_eq!(
            pairs,
            vec![
                (Metric::StockPrice, Metric::Temperature),
                (Metric::TradingVolume, Metric::Temperature),
            ]
        );
    }

    #[test]
    fn disjoint_dates_give_nothing() {
        let a = [SeriesRecord::empty(day(1), "A", Sector::Tech).with(Metric::StockPrice, Some(1.0))];
        let b = [SeriesRecord::empty(day(2), "B", Sector::Agriculture).with(Metric::Temperature, Some(1.0))];
        assert!(correlate(&a, &b).is_empty());
    }
}
