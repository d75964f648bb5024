//! Terminal reports for analyzed series.

pub mod format;

pub use format::*;
