//! OpenWeather API integration (forecast and current conditions).

use reqwest::blocking::Client;
use serde_json::Value;
use tracing::debug;

use crate::config::{Coordinates, mask_key};
use crate::data::http::get_json;
use crate::data::shape::UpstreamPayload;
use crate::error::FetchError;

const BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

pub struct OpenWeatherClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenWeatherClient {
    pub fn new(client: Client, api_key: impl Into<String>) -> Self {
        Self::with_base_url(client, api_key, BASE_URL)
    }

    pub fn with_base_url(client: Client, api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// 5 day / 3 hour forecast for a location.
    pub fn forecast(&self, at: Coordinates) -> Result<UpstreamPayload, FetchError> {
        self.call("forecast", at)
    }

    /// Current conditions for a location.
    pub fn current(&self, at: Coordinates) -> Result<UpstreamPayload, FetchError> {
        self.call("weather", at)
    }

    fn call(&self, endpoint: &str, at: Coordinates) -> Result<UpstreamPayload, FetchError> {
        debug!(
            endpoint,
            lat = at.lat,
            lon = at.lon,
            key = %mask_key(&self.api_key),
            "openweather request"
        );
        let req = self.client.get(format!("{}/{endpoint}", self.base_url)).query(&[
            ("lat", at.lat.to_string()),
            ("lon", at.lon.to_string()),
            ("appid", self.api_key.clone()),
            ("units", "metric".to_string()),
        ]);
        let body = get_json(req)?;
        check_embedded_error(&body)?;
        UpstreamPayload::detect(body)
    }
}

/// OpenWeather can report failures in a 200 body as `{"cod": "401", "message": ...}`.
fn check_embedded_error(body: &Value) -> Result<(), FetchError> {
    let code = match body.get("cod") {
        Some(Value::String(s)) => s.parse::<u16>().ok(),
        Some(Value::Number(n)) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
        _ => None,
    };
    match code {
        Some(status) if !(200..300).contains(&status) => Err(FetchError::Upstream {
            status,
            message: body
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("OpenWeather request failed")
                .to_string(),
        }),
        _ => Ok(()),
    }
}
