//! User selections and their validation.
//!
//! A `Selection` mirrors what the front-end controls hold: plain strings where
//! an empty value means "not chosen yet". `resolve` turns a complete selection
//! into a typed `SeriesRequest` the fetch pipeline can act on.

use crate::config::LookupTables;
use crate::domain::{Metric, Sector};
use crate::error::FetchError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Tech {
        category: String,
        company: String,
        metric: String,
    },
    Agriculture {
        crop: String,
        region: String,
        metric: String,
    },
}

impl Selection {
    pub fn empty(sector: Sector) -> Self {
        match sector {
            Sector::Tech => Selection::Tech {
                category: String::new(),
                company: String::new(),
                metric: String::new(),
            },
            Sector::Agriculture => Selection::Agriculture {
                crop: String::new(),
                region: String::new(),
                metric: String::new(),
            },
        }
    }

    pub fn sector(&self) -> Sector {
        match self {
            Selection::Tech { .. } => Sector::Tech,
            Selection::Agriculture { .. } => Sector::Agriculture,
        }
    }

    /// The three dimensions in display order (group, entity, metric).
    pub fn dimensions(&self) -> [&str; 3] {
        match self {
            Selection::Tech {
                category,
                company,
                metric,
            } => [category, company, metric],
            Selection::Agriculture { crop, region, metric } => [crop, region, metric],
        }
    }

    pub fn dimension_labels(&self) -> [&'static str; 3] {
        match self {
            Selection::Tech { .. } => ["category", "company", "metric"],
            Selection::Agriculture { .. } => ["crop", "region", "metric"],
        }
    }

    /// Set one dimension by display index. Changing the group clears the entity.
    pub fn set_dimension(&mut self, idx: usize, value: impl Into<String>) {
        let value = value.into();
        let (group, entity, metric) = match self {
            Selection::Tech {
                category,
                company,
                metric,
            } => (category, company, metric),
            Selection::Agriculture { crop, region, metric } => (crop, region, metric),
        };
        match idx {
            0 => {
                if *group != value {
                    entity.clear();
                }
                *group = value;
            }
            1 => *entity = value,
            2 => *metric = value,
            _ => {}
        }
    }

    /// Whether the "Analyze" action should be enabled.
    pub fn is_ready(&self) -> bool {
        self.dimensions().iter().all(|d| !d.trim().is_empty())
    }

    /// Validate against the lookup tables and produce a typed request.
    pub fn resolve(&self, lookup: &LookupTables) -> Result<SeriesRequest, FetchError> {
        if !self.is_ready() {
            return Err(FetchError::config("selection is incomplete"));
        }

        let [group, entity, metric_raw] = self.dimensions().map(str::trim);
        let metric = Metric::parse(metric_raw)
            .ok_or_else(|| FetchError::config(format!("unknown metric '{metric_raw}'")))?;
        if metric.sector() != self.sector() {
            return Err(FetchError::config(format!(
                "metric '{metric}' does not apply to {}",
                self.sector().display_name()
            )));
        }

        let target = match self {
            Selection::Tech { .. } => {
                let companies = lookup
                    .companies(group)
                    .ok_or_else(|| FetchError::config(format!("unknown category '{group}'")))?;
                if !companies.iter().any(|c| c == entity) {
                    return Err(FetchError::config(format!(
                        "company '{entity}' is not listed under '{group}'"
                    )));
                }
                Target::Company {
                    category: group.to_string(),
                    company: entity.to_string(),
                }
            }
            Selection::Agriculture { .. } => {
                let regions = lookup
                    .regions(group)
                    .ok_or_else(|| FetchError::config(format!("unknown crop '{group}'")))?;
                if !regions.iter().any(|r| r == entity) {
                    return Err(FetchError::config(format!(
                        "region '{entity}' is not listed for '{group}'"
                    )));
                }
                Target::Region {
                    crop: group.to_string(),
                    region: entity.to_string(),
                }
            }
        };

        Ok(SeriesRequest { target, metric })
    }
}

/// What a request is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Company { category: String, company: String },
    Region { crop: String, region: String },
}

/// A validated selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesRequest {
    pub target: Target,
    pub metric: Metric,
}

impl SeriesRequest {
    /// Label stamped on every record (company name or region name).
    pub fn entity(&self) -> &str {
        match &self.target {
            Target::Company { company, .. } => company,
            Target::Region { region, .. } => region,
        }
    }

    pub fn sector(&self) -> Sector {
        self.metric.sector()
    }

    /// Chart title, e.g. `SAMSUNG - STOCK PRICE` or `WHEAT - Europe - RAINFALL`.
    pub fn title(&self) -> String {
        match &self.target {
            Target::Company { company, .. } => {
                format!("{} - {}", company.to_uppercase(), self.metric.label())
            }
            Target::Region { crop, region } => {
                format!("{} - {region} - {}", crop.to_uppercase(), self.metric.label())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tech(category: &str, company: &str, metric: &str) -> Selection {
        Selection::Tech {
            category: category.into(),
            company: company.into(),
            metric: metric.into(),
        }
    }

    #[test]
    fn changing_group_clears_entity() {
        let mut sel = tech("software", "Oracle", "stock_price");
        sel.set_dimension(0, "software");
        assert_eq!(sel.dimensions(), ["software", "Oracle", "stock_price"]);
        sel.set_dimension(0, "computers");
        assert_eq!(sel.dimensions(), ["computers", "", "stock_price"]);
        assert!(!sel.is_ready());
        sel.set_dimension(1, "Apple");
        assert!(sel.is_ready());
    }

    #[test]
    fn ready_only_when_all_three_are_set() {
        assert!(!Selection::empty(Sector::Tech).is_ready());
        assert!(!tech("", "Apple", "stock_price").is_ready());
        assert!(!tech("computers", "", "stock_price").is_ready());
        assert!(!tech("computers", "Apple", "  ").is_ready());

        let full = tech("computers", "Apple", "stock_price");
        assert!(full.is_ready());
        assert!(full.is_ready(), "repeated calls give the same answer");

        let agri = Selection::Agriculture {
            crop: "wheat".into(),
            region: String::new(),
            metric: "temperature".into(),
        };
        assert!(!agri.is_ready());
    }

    #[test]
    fn resolve_builds_typed_request() {
        let lookup = LookupTables::default();
        let req = tech("smartphones", "Samsung", "stock_price")
            .resolve(&lookup)
            .unwrap();
        assert_eq!(req.metric, Metric::StockPrice);
        assert_eq!(req.entity(), "Samsung");
        assert_eq!(req.title(), "SAMSUNG - STOCK PRICE");

        let agri = Selection::Agriculture {
            crop: "wheat".into(),
            region: "Europe".into(),
            metric: "rainfall".into(),
        }
        .resolve(&lookup)
        .unwrap();
        assert_eq!(agri.title(), "WHEAT - Europe - RAINFALL");
    }

    #[test]
    fn resolve_rejects_mismatches_as_configuration_errors() {
        let lookup = LookupTables::default();
        let wrong_company = tech("software", "Samsung", "stock_price").resolve(&lookup);
        assert!(matches!(wrong_company, Err(FetchError::Configuration(_))));

        let wrong_sector = tech("software", "Oracle", "temperature").resolve(&lookup);
        assert!(matches!(wrong_sector, Err(FetchError::Configuration(_))));

        let incomplete = tech("software", "", "stock_price").resolve(&lookup);
        assert!(matches!(incomplete, Err(FetchError::Configuration(_))));
    }
}
