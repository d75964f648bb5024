//! File output helpers.
//!
//! - record exports (JSON/CSV) (`export`)

pub mod export;

pub use export::*;
