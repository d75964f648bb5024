//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - sectors and metrics (`Sector`, `Metric`)
//! - normalized records (`SeriesRecord`, `MonthlySummary`)
//! - user selections and validated requests (`Selection`, `SeriesRequest`)

pub mod selection;
pub mod types;

pub use selection::*;
pub use types::*;
