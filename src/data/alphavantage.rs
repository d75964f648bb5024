//! Alpha Vantage API integration (daily series and company overview).

use reqwest::blocking::Client;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::mask_key;
use crate::data::http::get_json;
use crate::data::shape::UpstreamPayload;
use crate::error::FetchError;

const BASE_URL: &str = "https://www.alphavantage.co";

pub struct AlphaVantageClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl AlphaVantageClient {
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

    /// `TIME_SERIES_DAILY` (compact: the last 100 trading days).
    pub fn daily(&self, symbol: &str) -> Result<UpstreamPayload, FetchError> {
        self.query("TIME_SERIES_DAILY", symbol)
    }

    /// `OVERVIEW` (fundamentals, including current market capitalization).
    pub fn overview(&self, symbol: &str) -> Result<UpstreamPayload, FetchError> {
        self.query("OVERVIEW", symbol)
    }

    fn query(&self, function: &str, symbol: &str) -> Result<UpstreamPayload, FetchError> {
        debug!(function, symbol, key = %mask_key(&self.api_key), "alpha vantage request");
        let req = self.client.get(format!("{}/query", self.base_url)).query(&[
            ("function", function),
            ("symbol", symbol),
            ("apikey", self.api_key.as_str()),
        ]);
        let body = get_json(req)?;
        check_embedded_error(&body, symbol)?;
        UpstreamPayload::detect(body)
    }
}

/// Alpha Vantage answers 200 for most failures and reports them in the body.
///
/// `Error Message` is a bad request (unknown symbol, bad key); `Note` and
/// `Information` are rate-limit notices.
fn check_embedded_error(body: &Value, symbol: &str) -> Result<(), FetchError> {
    if let Some(msg) = body.get("Error Message").and_then(Value::as_str) {
        return Err(FetchError::Upstream {
            status: 400,
            message: msg.to_string(),
        });
    }
    for key in ["Note", "Information"] {
        if let Some(msg) = body.get(key).and_then(Value::as_str) {
            warn!(symbol, "alpha vantage rate limit: {msg}");
            return Err(FetchError::Upstream {
                status: 429,
                message: msg.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::data::http::build_client;
    use crate::data::http::test_server::serve_once;

    fn client_for(base_url: &str) -> AlphaVantageClient {
        AlphaVantageClient::with_base_url(build_client(Duration::from_secs(5)).unwrap(), "av-test-key", base_url)
    }

    #[test]
    fn daily_series_request() {
        let served = serve_once(
            200,
            r#"{"Meta Data":{},"Time Series (Daily)":{"2025-05-01":{"1. open":"10","2. high":"11","3. low":"9","4. close":"10.5","5. volume":"1000"}}}"#,
        );
        let payload = client_for(&served.base_url).daily("005930.KS").unwrap();
        assert_eq!(payload.shape_name(), "daily-map");

        let line = served.request_line();
        assert!(line.starts_with("GET /query?"), "{line}");
        assert!(line.contains("function=TIME_SERIES_DAILY"));
        assert!(line.contains("symbol=005930.KS"));
        assert!(line.contains("apikey=av-test-key"));
    }

    #[test]
    fn overview_request() {
        let served = serve_once(200, r#"{"Symbol":"AAPL","MarketCapitalization":"3000000000000"}"#);
        let payload = client_for(&served.base_url).overview("AAPL").unwrap();
        assert_eq!(payload.shape_name(), "snapshot");
        assert!(served.request_line().contains("function=OVERVIEW"));
    }

    #[test]
    fn embedded_error_message_is_a_bad_request() {
        let served = serve_once(200, r#"{"Error Message":"Invalid API call."}"#);
        let err = client_for(&served.base_url).daily("NOPE").unwrap_err();
        assert_eq!(
            err,
            FetchError::Upstream {
                status: 400,
                message: "Invalid API call.".into()
            }
        );
    }

    #[test]
    fn rate_limit_notes_are_429() {
        let served = serve_once(200, r#"{"Note":"Thank you for using Alpha Vantage! Our standard API rate limit is 25 requests per day."}"#);
        let err = client_for(&served.base_url).daily("AAPL").unwrap_err();
        assert!(matches!(err, FetchError::Upstream { status: 429, .. }));
        assert!(err.is_transient());
    }
}
