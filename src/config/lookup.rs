//! Static lookup tables: which companies/regions exist and how to reach them upstream.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::FetchError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// Immutable after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct LookupTables {
    /// Category -> companies, in display order.
    pub category_companies: BTreeMap<String, Vec<String>>,
    /// Crop -> candidate regions, in display order.
    pub crop_regions: BTreeMap<String, Vec<String>>,
    /// Company -> ticker; `None` for companies that aren't publicly traded.
    pub company_symbols: BTreeMap<String, Option<String>>,
    /// Region -> reference coordinates used for weather lookups.
    pub region_coordinates: BTreeMap<String, Coordinates>,
}

impl LookupTables {
    pub fn categories(&self) -> Vec<&str> {
        self.category_companies.keys().map(String::as_str).collect()
    }

    pub fn companies(&self, category: &str) -> Option<&[String]> {
        self.category_companies.get(category).map(Vec::as_slice)
    }

    /// Companies of a category, optionally hiding those without a ticker.
    pub fn listed_companies(&self, category: &str, include_untraded: bool) -> Vec<&str> {
        self.companies(category)
            .unwrap_or_default()
            .iter()
            .filter(|c| include_untraded || self.is_traded(c))
            .map(String::as_str)
            .collect()
    }

    pub fn crops(&self) -> Vec<&str> {
        self.crop_regions.keys().map(String::as_str).collect()
    }

    pub fn regions(&self, crop: &str) -> Option<&[String]> {
        self.crop_regions.get(crop).map(Vec::as_slice)
    }

    pub fn is_traded(&self, company: &str) -> bool {
        matches!(self.company_symbols.get(company), Some(Some(_)))
    }

    /// Ticker for a company.
    pub fn symbol(&self, company: &str) -> Result<&str, FetchError> {
        match self.company_symbols.get(company) {
            Some(Some(symbol)) if !symbol.trim().is_empty() => Ok(symbol),
            Some(_) => Err(FetchError::config(format!(
                "'{company}' is not publicly traded (no ticker symbol)"
            ))),
            None => Err(FetchError::config(format!("no ticker symbol configured for '{company}'"))),
        }
    }

    pub fn coordinates(&self, region: &str) -> Result<Coordinates, FetchError> {
        self.region_coordinates
            .get(region)
            .copied()
            .ok_or_else(|| FetchError::config(format!("no coordinates configured for region '{region}'")))
    }
}

impl Default for LookupTables {
    fn default() -> Self {
        let category_companies = [
            ("computers", &["Apple", "Dell", "HP", "Lenovo"][..]),
            ("smartphones", &["Apple", "Samsung", "Google", "OnePlus"][..]),
            ("semiconductors", &["Intel", "AMD", "NVIDIA", "TSMC"][..]),
            ("software", &["Microsoft", "Oracle", "SAP", "Salesforce"][..]),
        ];

        let crop_regions = [
            ("wheat", &["North America", "Europe", "Asia", "Australia"][..]),
            ("rice", &["South Asia", "East Asia", "Southeast Asia", "South America"][..]),
            ("corn", &["North America", "South America", "Europe", "Africa"][..]),
            ("soybeans", &["North America", "South America", "Asia", "Africa"][..]),
        ];

        let company_symbols = [
            ("Apple", Some("AAPL")),
            ("Microsoft", Some("MSFT")),
            ("Google", Some("GOOGL")),
            ("Amazon", Some("AMZN")),
            ("NVIDIA", Some("NVDA")),
            ("AMD", Some("AMD")),
            ("Intel", Some("INTC")),
            ("TSMC", Some("TSM")),
            ("Samsung", Some("005930.KS")),
            ("Dell", Some("DELL")),
            ("HP", Some("HPQ")),
            ("Lenovo", Some("0992.HK")),
            ("Oracle", Some("ORCL")),
            ("SAP", Some("SAP")),
            ("Salesforce", Some("CRM")),
            ("OnePlus", None),
        ];

        // Each region is represented by one reference city.
        let region_coordinates = [
            ("North America", 40.7128, -74.0060),  // New York
            ("South America", -23.5505, -46.6333), // São Paulo
            ("Europe", 51.5074, -0.1278),          // London
            ("Asia", 31.2304, 121.4737),           // Shanghai
            ("Africa", -26.2041, 28.0473),         // Johannesburg
            ("Australia", -33.8688, 151.2093),     // Sydney
            ("South Asia", 28.6139, 77.2090),      // Delhi
            ("East Asia", 35.6762, 139.6503),      // Tokyo
            ("Southeast Asia", 1.3521, 103.8198),  // Singapore
        ];

        Self {
            category_companies: category_companies
                .iter()
                .map(|(k, v)| (k.to_string(), v.iter().map(|s| s.to_string()).collect()))
                .collect(),
            crop_regions: crop_regions
                .iter()
                .map(|(k, v)| (k.to_string(), v.iter().map(|s| s.to_string()).collect()))
                .collect(),
            company_symbols: company_symbols
                .iter()
                .map(|(k, v)| (k.to_string(), v.map(str::to_string)))
                .collect(),
            region_coordinates: region_coordinates
                .iter()
                .map(|&(name, lat, lon)| (name.to_string(), Coordinates { lat, lon }))
                .collect(),
        }
    }
}
