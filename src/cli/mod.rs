//! Command-line parsing for `ht`.
//!
//! Argument parsing and command dispatch stay separate from data acquisition
//! and rendering.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{DEFAULT_DAYS, FetchMode, MAX_DAYS, MarketCapSource, WeatherSource};

pub mod picker;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "ht",
    version,
    about = "Tech-market and crop-weather time series in the terminal"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Chart a financial metric for a technology company.
    Tech(TechArgs),
    /// Chart a weather metric for a crop-growing region.
    Agri(AgriArgs),
    /// List categories/companies and crops/regions.
    List(ListArgs),
    /// Correlate a company's financial series with a region's weather series.
    Correlate(CorrelateArgs),
    /// Launch the interactive TUI.
    Tui(TuiArgs),
}

/// Where data comes from and how much of it.
#[derive(Debug, Args, Clone)]
pub struct SourceArgs {
    /// JSON config bundle (API keys, backend URL, lookup tables).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Fetch directly from the upstream APIs, through the backend, or never.
    #[arg(long, value_enum, default_value_t = FetchMode::Direct)]
    pub mode: FetchMode,

    /// How market capitalization is fetched in direct mode.
    #[arg(long, value_enum, default_value_t = MarketCapSource::Overview)]
    pub market_cap: MarketCapSource,

    /// Weather endpoint used in direct mode.
    #[arg(long, value_enum, default_value_t = WeatherSource::Forecast)]
    pub weather: WeatherSource,

    /// Also list companies without a ticker symbol.
    #[arg(long)]
    pub include_untraded: bool,

    /// Number of daily records per series (1-3650).
    #[arg(
        long,
        default_value_t = DEFAULT_DAYS as u16,
        value_parser = clap::value_parser!(u16).range(1..=MAX_DAYS as i64)
    )]
    pub days: u16,

    /// Seed for sample data (random when omitted).
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Terminal plot and file outputs.
#[derive(Debug, Args, Clone)]
pub struct OutputArgs {
    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,

    /// Also write the chart as SVG.
    #[arg(long)]
    pub svg: Option<PathBuf>,

    /// Export the records (`.json` or `.csv`).
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct TechArgs {
    /// Technology category (e.g. smartphones). Prompted when omitted.
    #[arg(short = 'c', long)]
    pub category: Option<String>,

    /// Company name (e.g. Samsung). Prompted when omitted.
    #[arg(short = 'n', long)]
    pub company: Option<String>,

    /// stock_price, trading_volume, market_cap or volatility. Prompted when omitted.
    #[arg(short = 'm', long)]
    pub metric: Option<String>,

    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args, Clone)]
pub struct AgriArgs {
    /// Crop (e.g. wheat). Prompted when omitted.
    #[arg(short = 'c', long)]
    pub crop: Option<String>,

    /// Region (e.g. Europe). Prompted when omitted.
    #[arg(short = 'r', long)]
    pub region: Option<String>,

    /// temperature, humidity, rainfall, soil_moisture or sunshine. Prompted when omitted.
    #[arg(short = 'm', long)]
    pub metric: Option<String>,

    /// Also print monthly average temperature / total rainfall.
    #[arg(long)]
    pub monthly: bool,

    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args, Clone)]
pub struct ListArgs {
    /// Ask the backend instead of using the local tables.
    #[arg(long)]
    pub remote: bool,

    #[command(flatten)]
    pub source: SourceArgs,
}

#[derive(Debug, Args, Clone)]
pub struct CorrelateArgs {
    #[arg(long)]
    pub category: String,

    #[arg(long)]
    pub company: String,

    #[arg(long)]
    pub crop: String,

    #[arg(long)]
    pub region: String,

    /// Metric fetched for the company (the whole financial record is correlated).
    #[arg(long, default_value = "stock_price")]
    pub tech_metric: String,

    /// Metric fetched for the region.
    #[arg(long, default_value = "temperature")]
    pub agri_metric: String,

    #[command(flatten)]
    pub source: SourceArgs,
}

#[derive(Debug, Args, Clone)]
pub struct TuiArgs {
    /// Write logs here (the TUI owns the terminal, so nothing is logged otherwise).
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    #[command(flatten)]
    pub source: SourceArgs,
}
