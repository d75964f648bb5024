//! Strategy-level fetchers: turn a `SeriesRequest` into one upstream call.

use crate::config::{FetchMode, LookupTables, MarketCapSource, Settings, WeatherSource, require_api_key};
use crate::data::alphavantage::AlphaVantageClient;
use crate::data::backend::BackendClient;
use crate::data::http::build_client;
use crate::data::openweather::OpenWeatherClient;
use crate::data::shape::UpstreamPayload;
use crate::domain::{Metric, SeriesRequest, Target};
use crate::error::FetchError;

/// One outbound request per call, no retries.
pub trait RemoteFetcher {
    fn fetch(&self, request: &SeriesRequest) -> Result<UpstreamPayload, FetchError>;
}

/// Calls OpenWeather / Alpha Vantage directly.
///
/// Keys are checked per request, so a missing weather key doesn't block
/// financial series and vice versa.
pub struct DirectFetcher {
    weather: Result<OpenWeatherClient, FetchError>,
    markets: Result<AlphaVantageClient, FetchError>,
    lookup: LookupTables,
    market_cap: MarketCapSource,
    weather_source: WeatherSource,
}

impl DirectFetcher {
    pub fn new(
        weather: Result<OpenWeatherClient, FetchError>,
        markets: Result<AlphaVantageClient, FetchError>,
        settings: &Settings,
    ) -> Self {
        Self {
            weather,
            markets,
            lookup: settings.lookup.clone(),
            market_cap: settings.strategy.market_cap,
            weather_source: settings.strategy.weather,
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, FetchError> {
        let client = build_client(settings.timeout)?;
        let weather = require_api_key("OPENWEATHER_API_KEY", settings.openweather_api_key.as_deref())
            .map(|key| OpenWeatherClient::new(client.clone(), key));
        let markets = require_api_key("ALPHA_VANTAGE_API_KEY", settings.alpha_vantage_api_key.as_deref())
            .map(|key| AlphaVantageClient::new(client, key));
        Ok(Self::new(weather, markets, settings))
    }
}

impl RemoteFetcher for DirectFetcher {
    fn fetch(&self, request: &SeriesRequest) -> Result<UpstreamPayload, FetchError> {
        match &request.target {
            Target::Company { company, .. } => {
                let markets = self.markets.as_ref().map_err(|e| e.clone())?;
                let symbol = self.lookup.symbol(company)?;
                if request.metric == Metric::MarketCap && self.market_cap == MarketCapSource::Overview {
                    markets.overview(symbol)
                } else {
                    markets.daily(symbol)
                }
            }
            Target::Region { region, .. } => {
                let weather = self.weather.as_ref().map_err(|e| e.clone())?;
                let at = self.lookup.coordinates(region)?;
                match self.weather_source {
                    WeatherSource::Forecast => weather.forecast(at),
                    WeatherSource::Current => weather.current(at),
                }
            }
        }
    }
}

/// Goes through the dashboard backend.
pub struct ProxyFetcher {
    backend: BackendClient,
    lookup: LookupTables,
}

impl ProxyFetcher {
    pub fn new(backend: BackendClient, lookup: LookupTables) -> Self {
        Self { backend, lookup }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, FetchError> {
        let client = build_client(settings.timeout)?;
        Ok(Self::new(
            BackendClient::new(client, settings.backend_url.clone()),
            settings.lookup.clone(),
        ))
    }
}

impl RemoteFetcher for ProxyFetcher {
    fn fetch(&self, request: &SeriesRequest) -> Result<UpstreamPayload, FetchError> {
        match &request.target {
            // The backend keys companies by ticker.
            Target::Company { category, company } => {
                let symbol = self.lookup.symbol(company)?;
                self.backend.tech_data(category, symbol, request.metric)
            }
            Target::Region { crop, region } => self.backend.agriculture_data(crop, region, request.metric),
        }
    }
}

/// Fetcher for the configured mode; `None` in sample-only mode.
pub fn build_fetcher(settings: &Settings) -> Result<Option<Box<dyn RemoteFetcher + Send>>, FetchError> {
    let fetcher: Box<dyn RemoteFetcher + Send> = match settings.strategy.mode {
        FetchMode::Direct => Box::new(DirectFetcher::from_settings(settings)?),
        FetchMode::Proxy => Box::new(ProxyFetcher::from_settings(settings)?),
        FetchMode::Sample => return Ok(None),
    };
    Ok(Some(fetcher))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::data::http::test_server::{closed_port_url, serve_once};
    use crate::domain::Selection;

    fn client() -> reqwest::blocking::Client {
        build_client(Duration::from_secs(5)).unwrap()
    }

    fn request(selection: Selection) -> SeriesRequest {
        selection.resolve(&LookupTables::default()).unwrap()
    }

    fn samsung(metric: &str) -> SeriesRequest {
        request(Selection::Tech {
            category: "smartphones".into(),
            company: "Samsung".into(),
            metric: metric.into(),
        })
    }

    fn direct(base_url: &str, settings: &Settings) -> DirectFetcher {
        DirectFetcher::new(
            Ok(OpenWeatherClient::with_base_url(client(), "ow", base_url)),
            Ok(AlphaVantageClient::with_base_url(client(), "av", base_url)),
            settings,
        )
    }

    #[test]
    fn direct_price_uses_the_daily_series_for_the_ticker() {
        let served = serve_once(200, r#"{"Time Series (Daily)":{}}"#);
        let fetcher = direct(&served.base_url, &Settings::default());
        let payload = fetcher.fetch(&samsung("stock_price")).unwrap();
        assert_eq!(payload.shape_name(), "daily-map");
        let line = served.request_line();
        assert!(line.contains("function=TIME_SERIES_DAILY"));
        assert!(line.contains("symbol=005930.KS"));
    }

    #[test]
    fn market_cap_follows_the_strategy() {
        let served = serve_once(200, r#"{"MarketCapitalization":"400000000000"}"#);
        direct(&served.base_url, &Settings::default())
            .fetch(&samsung("market_cap"))
            .unwrap();
        assert!(served.request_line().contains("function=OVERVIEW"));

        let mut settings = Settings::default();
        settings.strategy.market_cap = MarketCapSource::Daily;
        let served = serve_once(200, r#"{"Time Series (Daily)":{}}"#);
        direct(&served.base_url, &settings).fetch(&samsung("market_cap")).unwrap();
        assert!(served.request_line().contains("function=TIME_SERIES_DAILY"));
    }

    #[test]
    fn weather_uses_region_coordinates() {
        let served = serve_once(200, r#"{"list":[]}"#);
        let req = request(Selection::Agriculture {
            crop: "wheat".into(),
            region: "Europe".into(),
            metric: "rainfall".into(),
        });
        direct(&served.base_url, &Settings::default()).fetch(&req).unwrap();
        let line = served.request_line();
        assert!(line.starts_with("GET /forecast?"));
        assert!(line.contains("lat=51.5074"));
    }

    #[test]
    fn untraded_company_is_a_configuration_error_without_a_request() {
        let fetcher = direct("http://127.0.0.1:9", &Settings::default());
        let err = fetcher.fetch(&request(Selection::Tech {
            category: "smartphones".into(),
            company: "OnePlus".into(),
            metric: "stock_price".into(),
        }));
        assert!(matches!(err, Err(FetchError::Configuration(_))));
    }

    #[test]
    fn missing_key_only_blocks_its_own_sector() {
        let settings = Settings {
            alpha_vantage_api_key: Some("YOUR_ALPHA_VANTAGE_API_KEY".into()),
            openweather_api_key: Some("real".into()),
            ..Settings::default()
        };
        let fetcher = DirectFetcher::from_settings(&settings).unwrap();
        let err = fetcher.fetch(&samsung("stock_price")).unwrap_err();
        assert!(!err.is_transient());
        assert!(fetcher.weather.is_ok());
    }

    #[test]
    fn proxy_sends_the_ticker() {
        let served = serve_once(200, r#"[{"date":"2025-05-01","stock_price":70000.0}]"#);
        let fetcher = ProxyFetcher::new(BackendClient::new(client(), served.base_url.clone()), LookupTables::default());
        let payload = fetcher.fetch(&samsung("stock_price")).unwrap();
        assert_eq!(payload.shape_name(), "records");
        assert!(served.request_line().contains("company=005930.KS"));
    }

    #[test]
    fn transport_errors_never_echo_api_keys() {
        let base_url = closed_port_url();
        let fetcher = DirectFetcher::new(
            Ok(OpenWeatherClient::with_base_url(client(), "OWSECRETKEY456", &base_url)),
            Ok(AlphaVantageClient::with_base_url(client(), "SUPERSECRETKEY123", &base_url)),
            &Settings::default(),
        );

        let err = fetcher.fetch(&samsung("stock_price")).unwrap_err();
        assert!(matches!(err, FetchError::Network(_)));
        assert!(!err.to_string().contains("SUPERSECRETKEY123"));

        let err = fetcher
            .fetch(&request(Selection::Agriculture {
                crop: "wheat".into(),
                region: "Europe".into(),
                metric: "temperature".into(),
            }))
            .unwrap_err();
        assert!(!err.to_string().contains("OWSECRETKEY456"));
        assert!(!err.to_string().contains("appid="));
    }

    #[test]
    fn sample_mode_has_no_fetcher() {
        let mut settings = Settings::default();
        settings.strategy.mode = FetchMode::Sample;
        assert!(build_fetcher(&settings).unwrap().is_none());
    }
}
