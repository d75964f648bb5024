//! Runtime configuration: API keys, backend location, fetch strategy, lookup tables.
//!
//! Values are layered:
//!
//! 1. built-in defaults (lookup tables, backend URL, timeout)
//! 2. environment / `.env` (`OPENWEATHER_API_KEY`, `ALPHA_VANTAGE_API_KEY`,
//!    `HARVEST_BACKEND_URL`, `HARVEST_TIMEOUT_SECS`)
//! 3. an optional JSON bundle (`--config`), same key names as the dashboard's
//!    `config.js` (`COMPANY_SYMBOLS`, `REGION_COORDINATES`, ...)

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use clap::ValueEnum;
use serde::Deserialize;

use crate::error::{AppError, FetchError};

pub mod lookup;

pub use lookup::{Coordinates, LookupTables};

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:5000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_DAYS: usize = 30;
/// Upper bound on records per series (about ten years of daily data).
pub const MAX_DAYS: usize = 3650;

/// Key values shipped in config templates; treated the same as a missing key.
const PLACEHOLDER_KEYS: [&str; 3] = [
    "YOUR_API_KEY_HERE",
    "YOUR_ALPHA_VANTAGE_API_KEY",
    "YOUR_OPENWEATHER_API_KEY",
];

/// Where live data comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FetchMode {
    /// Call OpenWeather / Alpha Vantage directly.
    Direct,
    /// Go through the dashboard backend (`/api/...`).
    Proxy,
    /// Never fetch; always show synthetic data.
    Sample,
}

/// How market capitalization is obtained in direct mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MarketCapSource {
    /// Separate company-overview call (single current value).
    Overview,
    /// Same daily series call as price/volume (market cap stays null).
    Daily,
}

/// Which OpenWeather endpoint backs weather series in direct mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum WeatherSource {
    /// 5 day / 3 hour forecast, windowed to one record per day.
    Forecast,
    /// Current conditions (single record).
    Current,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchStrategy {
    pub mode: FetchMode,
    pub market_cap: MarketCapSource,
    pub weather: WeatherSource,
    /// List companies without a ticker. Fetching them is always a configuration error.
    pub include_untraded: bool,
}

impl Default for FetchStrategy {
    fn default() -> Self {
        Self {
            mode: FetchMode::Direct,
            market_cap: MarketCapSource::Overview,
            weather: WeatherSource::Forecast,
            include_untraded: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub openweather_api_key: Option<String>,
    pub alpha_vantage_api_key: Option<String>,
    pub backend_url: String,
    pub timeout: Duration,
    /// Number of daily records shown per analysis.
    pub days: usize,
    pub strategy: FetchStrategy,
    pub lookup: LookupTables,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            openweather_api_key: None,
            alpha_vantage_api_key: None,
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            days: DEFAULT_DAYS,
            strategy: FetchStrategy::default(),
            lookup: LookupTables::default(),
        }
    }
}

impl Settings {
    /// Load from the process environment (and `.env`, if present).
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup (used by tests instead of the real env).
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let mut settings = Self::default();
        settings.openweather_api_key = get("OPENWEATHER_API_KEY").filter(|v| !v.trim().is_empty());
        settings.alpha_vantage_api_key = get("ALPHA_VANTAGE_API_KEY").filter(|v| !v.trim().is_empty());
        if let Some(url) = get("HARVEST_BACKEND_URL").filter(|v| !v.trim().is_empty()) {
            settings.backend_url = url.trim().trim_end_matches('/').to_string();
        }
        if let Some(secs) = get("HARVEST_TIMEOUT_SECS").and_then(|v| v.trim().parse::<u64>().ok()) {
            settings.timeout = Duration::from_secs(secs.max(1));
        }
        settings
    }

    /// Overlay a JSON config bundle on top of the current values.
    pub fn apply_bundle_file(&mut self, path: &Path) -> Result<(), AppError> {
        let raw = fs::read_to_string(path)
            .map_err(|e| AppError::new(2, format!("Failed to read config '{}': {e}", path.display())))?;
        let bundle: ConfigBundle = serde_json::from_str(&raw)
            .map_err(|e| AppError::new(2, format!("Invalid config '{}': {e}", path.display())))?;
        self.apply_bundle(bundle);
        Ok(())
    }

    pub fn apply_bundle(&mut self, bundle: ConfigBundle) {
        if let Some(key) = bundle.openweather_api_key {
            self.openweather_api_key = Some(key);
        }
        if let Some(key) = bundle.alpha_vantage_api_key {
            self.alpha_vantage_api_key = Some(key);
        }
        if let Some(url) = bundle.backend_url {
            self.backend_url = url.trim_end_matches('/').to_string();
        }
        if let Some(symbols) = bundle.company_symbols {
            self.lookup.company_symbols.extend(symbols);
        }
        if let Some(coords) = bundle.region_coordinates {
            self.lookup.region_coordinates.extend(coords);
        }
        if let Some(companies) = bundle.category_companies {
            self.lookup.category_companies = companies;
        }
        if let Some(regions) = bundle.crop_regions {
            self.lookup.crop_regions = regions;
        }
    }
}

/// On-disk config bundle.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ConfigBundle {
    pub openweather_api_key: Option<String>,
    pub alpha_vantage_api_key: Option<String>,
    pub backend_url: Option<String>,
    pub company_symbols: Option<BTreeMap<String, Option<String>>>,
    pub region_coordinates: Option<BTreeMap<String, Coordinates>>,
    pub category_companies: Option<BTreeMap<String, Vec<String>>>,
    pub crop_regions: Option<BTreeMap<String, Vec<String>>>,
}

/// Return the key if it is set to something other than a template placeholder.
pub fn require_api_key<'a>(name: &str, key: Option<&'a str>) -> Result<&'a str, FetchError> {
    match key.map(str::trim) {
        Some(k) if !k.is_empty() && !PLACEHOLDER_KEYS.contains(&k) => Ok(k),
        Some(_) => Err(FetchError::config(format!("{name} is still set to a placeholder value"))),
        None => Err(FetchError::config(format!("missing {name} (set it in the environment or .env)"))),
    }
}

/// `abcd...wxyz` form for logs.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_lookup_fills_keys_and_overrides() {
        let settings = Settings::from_lookup(|key| match key {
            "OPENWEATHER_API_KEY" => Some("ow-123".to_string()),
            "ALPHA_VANTAGE_API_KEY" => Some("   ".to_string()),
            "HARVEST_BACKEND_URL" => Some("http://10.0.0.5:8080/".to_string()),
            "HARVEST_TIMEOUT_SECS" => Some("3".to_string()),
            _ => None,
        });
        assert_eq!(settings.openweather_api_key.as_deref(), Some("ow-123"));
        assert_eq!(settings.alpha_vantage_api_key, None);
        assert_eq!(settings.backend_url, "http://10.0.0.5:8080");
        assert_eq!(settings.timeout, Duration::from_secs(3));
        assert_eq!(settings.days, DEFAULT_DAYS);
    }

    #[test]
    fn placeholder_and_missing_keys_are_rejected() {
        assert_eq!(require_api_key("K", Some("real-key")).unwrap(), "real-key");
        assert!(matches!(
            require_api_key("K", Some("YOUR_API_KEY_HERE")),
            Err(FetchError::Configuration(_))
        ));
        assert!(matches!(require_api_key("K", Some("")), Err(FetchError::Configuration(_))));
        assert!(matches!(require_api_key("K", None), Err(FetchError::Configuration(_))));
    }

    #[test]
    fn bundle_overrides_keys_and_extends_tables() {
        let bundle: ConfigBundle = serde_json::from_str(
            r#"{
                "ALPHA_VANTAGE_API_KEY": "av-key",
                "COMPANY_SYMBOLS": { "OnePlus": "1PLS", "Nokia": "NOK" },
                "REGION_COORDINATES": { "Antarctica": { "lat": -75.0, "lon": 0.0 } }
            }"#,
        )
        .unwrap();

        let mut settings = Settings::default();
        settings.apply_bundle(bundle);

        assert_eq!(settings.alpha_vantage_api_key.as_deref(), Some("av-key"));
        assert_eq!(settings.lookup.symbol("OnePlus").unwrap(), "1PLS");
        assert_eq!(settings.lookup.symbol("Apple").unwrap(), "AAPL");
        assert!(settings.lookup.coordinates("Antarctica").is_ok());
    }

    #[test]
    fn masked_keys_hide_the_middle() {
        assert_eq!(mask_key("PS7N6Y7CK2TQ5NLJ"), "PS7N...5NLJ");
        assert_eq!(mask_key("short"), "****");
    }
}
