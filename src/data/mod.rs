//! Data acquisition: upstream clients, payload shapes, normalization,
//! monthly rollups, and the synthetic fallback generator.

pub mod aggregate;
pub mod alphavantage;
pub mod backend;
pub mod fetch;
pub mod http;
pub mod normalize;
pub mod openweather;
pub mod sample;
pub mod shape;

pub use aggregate::aggregate_monthly;
pub use fetch::{RemoteFetcher, build_fetcher};
pub use normalize::normalize;
pub use shape::UpstreamPayload;
