//! Shared analysis pipeline used by both CLI and TUI front-ends.
//!
//! request -> fetch -> normalize -> (on transient failure) synthetic series -> render
//!
//! The front-ends only decide where the chart goes (text, SVG, terminal widget).

use chrono::{Local, NaiveDate};
use tracing::{info, warn};

use crate::data::fetch::RemoteFetcher;
use crate::data::normalize::normalize_on;
use crate::data::sample::{UnitRandom, generate_until};
use crate::domain::{SeriesRecord, SeriesRequest};
use crate::error::FetchError;
use crate::render::{ChartSurface, RenderOutcome, render};

/// Suffix appended to the title of synthetic series.
pub const SAMPLE_SUFFIX: &str = " (sample data)";

/// Where a series came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provenance {
    Live,
    /// Synthetic series shown because live data wasn't available.
    Sample { reason: String },
}

/// An acquired series, ready to render.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesData {
    pub request: SeriesRequest,
    pub records: Vec<SeriesRecord>,
    pub provenance: Provenance,
}

impl SeriesData {
    pub fn is_sample(&self) -> bool {
        matches!(self.provenance, Provenance::Sample { .. })
    }

    pub fn title(&self) -> String {
        let base = self.request.title();
        if self.is_sample() {
            format!("{base}{SAMPLE_SUFFIX}")
        } else {
            base
        }
    }

    pub fn y_label(&self) -> String {
        self.request.metric.axis_label()
    }

    /// Draw the requested metric on `surface`.
    pub fn render_on(&self, surface: &mut dyn ChartSurface) -> RenderOutcome {
        render(&self.records, surface, &self.title(), self.request.metric, &self.y_label())
    }
}

/// Result of a full analysis: the data plus what happened when drawing it.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub data: SeriesData,
    pub render: RenderOutcome,
}

/// Fetch and normalize a series, falling back to synthetic data on transient errors.
///
/// `fetcher == None` means live fetching is disabled (sample-only mode).
/// Configuration errors are returned, never papered over with sample data.
/// Live series are trimmed to their last `days` records.
pub fn acquire<R: UnitRandom + ?Sized>(
    request: &SeriesRequest,
    fetcher: Option<&dyn RemoteFetcher>,
    rng: &mut R,
    days: usize,
    today: NaiveDate,
) -> Result<SeriesData, FetchError> {
    let fallback = |rng: &mut R, reason: String| SeriesData {
        request: request.clone(),
        records: generate_until(rng, request.entity(), request.metric, days, today),
        provenance: Provenance::Sample { reason },
    };

    let Some(fetcher) = fetcher else {
        return Ok(fallback(rng, "live fetching disabled".to_string()));
    };

    match fetcher.fetch(request) {
        Ok(payload) => {
            let mut records = normalize_on(&payload, request.metric, request.entity(), today);
            if records.len() > days {
                records.drain(..records.len() - days);
            }
            info!(
                entity = request.entity(),
                metric = %request.metric,
                shape = payload.shape_name(),
                records = records.len(),
                "live series"
            );
            Ok(SeriesData {
                request: request.clone(),
                records,
                provenance: Provenance::Live,
            })
        }
        Err(err) if err.is_transient() => {
            warn!(entity = request.entity(), metric = %request.metric, "fetch failed, using sample data: {err}");
            Ok(fallback(rng, err.to_string()))
        }
        Err(err) => Err(err),
    }
}

/// `acquire` + `render` in one step, dated today.
pub fn analyze<R: UnitRandom + ?Sized>(
    request: &SeriesRequest,
    fetcher: Option<&dyn RemoteFetcher>,
    rng: &mut R,
    days: usize,
    surface: &mut dyn ChartSurface,
) -> Result<Analysis, FetchError> {
    let data = acquire(request, fetcher, rng, days, Local::now().date_naive())?;
    let render = data.render_on(surface);
    Ok(Analysis { data, render })
}
