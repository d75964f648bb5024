//! Export an analyzed series to JSON or CSV.
//!
//! The format follows the file extension. Missing values are `null` in JSON
//! and empty cells in CSV.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::domain::SeriesRecord;
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn from_path(path: &Path) -> Result<Self, AppError> {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("json") => Ok(ExportFormat::Json),
            Some("csv") => Ok(ExportFormat::Csv),
            _ => Err(AppError::new(
                2,
                format!("Unsupported export format '{}' (use .json or .csv).", path.display()),
            )),
        }
    }
}

/// Write records to `path`, picking the format from its extension.
pub fn write_records(path: &Path, records: &[SeriesRecord]) -> Result<(), AppError> {
    let format = ExportFormat::from_path(path)?;
    let file = File::create(path)
        .map_err(|e| AppError::new(4, format!("Failed to create export '{}': {e}", path.display())))?;
    let mut out = BufWriter::new(file);

    match format {
        ExportFormat::Json => serde_json::to_writer_pretty(&mut out, records)
            .map_err(|e| AppError::new(4, format!("Failed to write export JSON: {e}")))?,
        ExportFormat::Csv => write_csv(&mut out, records)
            .map_err(|e| AppError::new(4, format!("Failed to write export CSV: {e}")))?,
    }

    out.flush()
        .map_err(|e| AppError::new(4, format!("Failed to write export '{}': {e}", path.display())))
}

/// `date,entity,<metric keys>` with one row per record.
pub fn write_csv<W: Write>(out: &mut W, records: &[SeriesRecord]) -> std::io::Result<()> {
    let Some(first) = records.first() else {
        return writeln!(out, "date,entity");
    };
    let metrics: Vec<_> = first.fields.keys().copied().collect();

    let mut header = String::from("date,entity");
    for m in &metrics {
        header.push(',');
        header.push_str(m.key());
    }
    writeln!(out, "{header}")?;

    for r in records {
        let mut row = format!("{},{}", r.date, csv_field(&r.entity));
        for m in &metrics {
            row.push(',');
            if let Some(v) = r.value(*m) {
                row.push_str(&v.to_string());
            }
        }
        writeln!(out, "{row}")?;
    }
    Ok(())
}

fn csv_field(s: &str) -> String {
    if s.contains([',', '"', '\n']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Metric, Sector};
    use chrono::NaiveDate;

    fn records() -> Vec<SeriesRecord> {
        let d = |day| NaiveDate::from_ymd_opt(2025, 5, day).unwrap();
        vec![
            SeriesRecord::empty(d(1), "Samsung", Sector::Tech)
                .with(Metric::StockPrice, Some(70100.0))
                .with(Metric::TradingVolume, Some(1200.0)),
            SeriesRecord::empty(d(2), "Samsung", Sector::Tech).with(Metric::StockPrice, Some(70250.5)),
        ]
    }

    #[test]
    fn csv_has_every_field_with_blank_missing_values() {
        let mut buf = Vec::new();
        write_csv(&mut buf, &records()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "date,entity,stock_price,trading_volume,market_cap,volatility");
        assert_eq!(lines[1], "2025-05-01,Samsung,70100,1200,,");
        assert_eq!(lines[2], "2025-05-02,Samsung,70250.5,,,");
    }

    #[test]
    fn json_keeps_nulls() {
        let path = std::env::temp_dir().join(format!("ht-export-test-{}.json", std::process::id()));
        write_records(&path, &records()).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value[0]["date"], "2025-05-01");
        assert_eq!(value[0]["entity"], "Samsung");
        assert_eq!(value[0]["stock_price"], 70100.0);
        assert!(value[1]["trading_volume"].is_null());
        assert!(value[1].get("market_cap").is_some());
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = ExportFormat::from_path(Path::new("out.xlsx")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert_eq!(ExportFormat::from_path(Path::new("OUT.CSV")).unwrap(), ExportFormat::Csv);
    }
}
