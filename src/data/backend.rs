//! Dashboard backend (`/api/...`) client.
//!
//! The backend fronts the same upstream APIs and answers with records that are
//! already normalized, plus the catalog endpoints used by `ht list --remote`.

use std::collections::BTreeMap;

use reqwest::Url;
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;

use crate::data::http::get_json;
use crate::data::shape::UpstreamPayload;
use crate::domain::Metric;
use crate::error::FetchError;

pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /api/tech/data?category&company&metric`. `company` is the ticker.
    pub fn tech_data(&self, category: &str, company: &str, metric: Metric) -> Result<UpstreamPayload, FetchError> {
        let req = self.client.get(self.url("/api/tech/data")).query(&[
            ("category", category),
            ("company", company),
            ("metric", metric.key()),
        ]);
        UpstreamPayload::detect(get_json(req)?)
    }

    /// `GET /api/agriculture/data?crop&region&metric`.
    pub fn agriculture_data(&self, crop: &str, region: &str, metric: Metric) -> Result<UpstreamPayload, FetchError> {
        let req = self.client.get(self.url("/api/agriculture/data")).query(&[
            ("crop", crop),
            ("region", region),
            ("metric", metric.key()),
        ]);
        UpstreamPayload::detect(get_json(req)?)
    }

    /// Ticker -> company name for a category.
    pub fn companies(&self, category: &str) -> Result<BTreeMap<String, String>, FetchError> {
        self.get_typed(&["api", "tech", "companies", category])
    }

    pub fn crops(&self) -> Result<Vec<String>, FetchError> {
        self.get_typed(&["api", "agriculture", "crops"])
    }

    pub fn regions(&self, crop: &str) -> Result<Vec<String>, FetchError> {
        self.get_typed(&["api", "agriculture", "regions", crop])
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Base URL plus one percent-encoded path segment per entry.
    fn segment_url(&self, segments: &[&str]) -> Result<Url, FetchError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| FetchError::config(format!("invalid backend URL {}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|()| FetchError::config(format!("backend URL {} cannot take a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn get_typed<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, FetchError> {
        let url = self.segment_url(segments)?;
        let path = url.path().to_string();
        let body = get_json(self.client.get(url))?;
        serde_json::from_value(body).map_err(|e| FetchError::Payload(format!("{path}: {e}")))
    }
}
