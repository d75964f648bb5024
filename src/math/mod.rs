//! Numeric helpers over record series.

pub mod correlation;

pub use correlation::*;
