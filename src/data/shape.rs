//! Upstream payload shapes.
//!
//! Every endpoint we talk to answers with one of a small, closed set of JSON
//! shapes. `UpstreamPayload::detect` inspects a response once and tags it, so
//! the normalizer can match on the variant instead of probing fields ad hoc.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::FetchError;

/// OpenWeather 5 day / 3 hour forecast.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ForecastList {
    pub list: Vec<ForecastEntry>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ForecastEntry {
    /// `YYYY-MM-DD HH:MM:SS` (UTC).
    pub dt_txt: String,
    pub main: MainReadings,
    #[serde(default)]
    pub rain: Option<Precipitation>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MainReadings {
    pub temp: f64,
    #[serde(default)]
    pub humidity: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Precipitation {
    #[serde(rename = "1h", default)]
    pub one_hour: Option<f64>,
    #[serde(rename = "3h", default)]
    pub three_hours: Option<f64>,
}

/// OpenWeather current conditions.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CurrentConditions {
    pub main: MainReadings,
    #[serde(default)]
    pub rain: Option<Precipitation>,
    /// Observation time, unix seconds.
    #[serde(default)]
    pub dt: Option<i64>,
}

/// Alpha Vantage `TIME_SERIES_DAILY`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DailyMap {
    #[serde(rename = "Time Series (Daily)")]
    pub series: BTreeMap<String, DailyBar>,
}

/// One day of a daily series. Alpha Vantage sends every number as a string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DailyBar {
    #[serde(rename = "1. open", default)]
    pub open: Option<String>,
    #[serde(rename = "2. high")]
    pub high: String,
    #[serde(rename = "3. low")]
    pub low: String,
    #[serde(rename = "4. close")]
    pub close: String,
    #[serde(rename = "5. volume")]
    pub volume: String,
}

/// Alpha Vantage `OVERVIEW`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CompanyOverview {
    #[serde(rename = "Symbol", default)]
    pub symbol: Option<String>,
    #[serde(rename = "MarketCapitalization")]
    pub market_capitalization: String,
}

/// Single point-in-time readings.
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    Weather(CurrentConditions),
    Company(CompanyOverview),
}

/// A detected upstream response.
#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamPayload {
    ForecastList(ForecastList),
    DailyMap(DailyMap),
    Snapshot(Snapshot),
    /// Records already normalized by the dashboard backend.
    Records(Vec<Map<String, Value>>),
}

impl UpstreamPayload {
    /// Tag a parsed JSON response with its shape.
    pub fn detect(value: Value) -> Result<Self, FetchError> {
        match value {
            Value::Array(items) => {
                let mut records = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Value::Object(obj) if obj.contains_key("date") => records.push(obj),
                        other => {
                            return Err(FetchError::Payload(format!(
                                "record list contains a non-record entry: {}",
                                truncate(&other.to_string(), 80)
                            )));
                        }
                    }
                }
                Ok(UpstreamPayload::Records(records))
            }
            Value::Object(obj) => {
                if obj.contains_key("list") {
                    typed(obj).map(UpstreamPayload::ForecastList)
                } else if obj.contains_key("Time Series (Daily)") {
                    typed(obj).map(UpstreamPayload::DailyMap)
                } else if obj.contains_key("MarketCapitalization") {
                    typed(obj).map(|o| UpstreamPayload::Snapshot(Snapshot::Company(o)))
                } else if obj.contains_key("main") {
                    typed(obj).map(|c| UpstreamPayload::Snapshot(Snapshot::Weather(c)))
                } else {
                    let keys: Vec<&str> = obj.keys().map(String::as_str).take(6).collect();
                    Err(FetchError::Payload(format!(
                        "unrecognized response shape (keys: {})",
                        keys.join(", ")
                    )))
                }
            }
            other => Err(FetchError::Payload(format!(
                "expected a JSON object or array, got: {}",
                truncate(&other.to_string(), 80)
            ))),
        }
    }

    pub fn shape_name(&self) -> &'static str {
        match self {
            UpstreamPayload::ForecastList(_) => "forecast-list",
            UpstreamPayload::DailyMap(_) => "daily-map",
            UpstreamPayload::Snapshot(_) => "snapshot",
            UpstreamPayload::Records(_) => "records",
        }
    }
}

fn typed<T: serde::de::DeserializeOwned>(obj: Map<String, Value>) -> Result<T, FetchError> {
    serde_json::from_value(Value::Object(obj)).map_err(|e| FetchError::Payload(e.to_string()))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max).collect();
        format!("{head}…")
    }
}
