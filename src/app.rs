//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and fills in missing selections
//! - acquires series (live, or sample data on transient failures)
//! - prints charts/reports
//! - writes optional SVG/exports

use std::collections::BTreeMap;

use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::cli::picker::prompt_choice;
use crate::cli::{AgriArgs, Command, CorrelateArgs, ListArgs, OutputArgs, SourceArgs, TechArgs, TuiArgs};
use crate::config::{FetchStrategy, MAX_DAYS, Settings};
use crate::data::backend::BackendClient;
use crate::data::http::build_client;
use crate::data::{RemoteFetcher, aggregate_monthly, build_fetcher};
use crate::domain::{Sector, Selection};
use crate::error::AppError;
use crate::logging::{self, LogTarget};
use crate::render::{AsciiChart, RenderOutcome, SvgChart};

use pipeline::{Provenance, SeriesData};

pub mod pipeline;
pub mod sequence;

/// Entry point for the `ht` binary.
pub fn run() -> Result<(), AppError> {
    // `ht` on its own (or with only flags) opens the TUI.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Tech(args) => {
            logging::init(LogTarget::Stderr)?;
            handle_tech(args)
        }
        Command::Agri(args) => {
            logging::init(LogTarget::Stderr)?;
            handle_agri(args)
        }
        Command::List(args) => {
            logging::init(LogTarget::Stderr)?;
            handle_list(args)
        }
        Command::Correlate(args) => {
            logging::init(LogTarget::Stderr)?;
            handle_correlate(args)
        }
        Command::Tui(args) => handle_tui(args),
    }
}

/// Env/.env, then the optional bundle file, then CLI flags.
pub fn settings_from(source: &SourceArgs) -> Result<Settings, AppError> {
    let mut settings = Settings::from_env();
    if let Some(path) = &source.config {
        settings.apply_bundle_file(path)?;
    }
    settings.strategy = FetchStrategy {
        mode: source.mode,
        market_cap: source.market_cap,
        weather: source.weather,
        include_untraded: source.include_untraded,
    };
    settings.days = usize::from(source.days).clamp(1, MAX_DAYS);
    Ok(settings)
}

fn rng_from(source: &SourceArgs) -> StdRng {
    source.seed.map(StdRng::seed_from_u64).unwrap_or_else(StdRng::from_entropy)
}

fn handle_tech(args: TechArgs) -> Result<(), AppError> {
    let settings = settings_from(&args.source)?;
    let lookup = &settings.lookup;
    let include_untraded = settings.strategy.include_untraded;

    let category = match args.category {
        Some(c) => c,
        None => prompt_choice("category", &owned(lookup.categories()))?,
    };
    let company = match args.company {
        Some(c) => c,
        None => prompt_choice("company", &owned(lookup.listed_companies(&category, include_untraded)))?,
    };
    let metric = match args.metric {
        Some(m) => m,
        None => prompt_choice("metric", &metric_keys(Sector::Tech))?,
    };

    let selection = Selection::Tech {
        category,
        company,
        metric,
    };
    let data = analyze_selection(&settings, &selection, &args.source, &args.output)?;
    write_outputs(&data, &args.output)
}

fn handle_agri(args: AgriArgs) -> Result<(), AppError> {
    let settings = settings_from(&args.source)?;
    let lookup = &settings.lookup;

    let crop = match args.crop {
        Some(c) => c,
        None => prompt_choice("crop", &owned(lookup.crops()))?,
    };
    let region = match args.region {
        Some(r) => r,
        None => {
            let regions = lookup.regions(&crop).map(<[String]>::to_vec).unwrap_or_default();
            prompt_choice("region", &regions)?
        }
    };
    let metric = match args.metric {
        Some(m) => m,
        None => prompt_choice("metric", &metric_keys(Sector::Agriculture))?,
    };

    let selection = Selection::Agriculture { crop, region, metric };
    let data = analyze_selection(&settings, &selection, &args.source, &args.output)?;

    if args.monthly {
        println!("{}", crate::report::format_monthly(&aggregate_monthly(&data.records)));
    }

    write_outputs(&data, &args.output)
}

/// Resolve, acquire, print the text chart and summary.
fn analyze_selection(
    settings: &Settings,
    selection: &Selection,
    source: &SourceArgs,
    output: &OutputArgs,
) -> Result<SeriesData, AppError> {
    let request = selection.resolve(&settings.lookup)?;
    let fetcher = build_fetcher(settings)?;
    let mut rng = rng_from(source);
    let mut surface = AsciiChart::new(output.width, output.height);

    let analysis = pipeline::analyze(
        &request,
        fetcher.as_deref().map(|f| f as &dyn RemoteFetcher),
        &mut rng,
        settings.days,
        &mut surface,
    )?;

    if let Provenance::Sample { reason } = &analysis.data.provenance {
        eprintln!("Live data unavailable ({reason}); showing sample data.");
    }

    println!("{}", crate::report::format_series_summary(&analysis.data));

    if !output.no_plot {
        match &analysis.render {
            RenderOutcome::Drawn(_) => println!("{}", surface.output()),
            RenderOutcome::NoData => println!("No data available for {}.", request.title()),
            RenderOutcome::Failed { detail } => eprintln!("Chart could not be drawn: {detail}"),
        }
    }

    Ok(analysis.data)
}

fn write_outputs(data: &SeriesData, output: &OutputArgs) -> Result<(), AppError> {
    if let Some(path) = &output.svg {
        let mut svg = SvgChart::new(path);
        match data.render_on(&mut svg) {
            RenderOutcome::Drawn(_) => eprintln!("Wrote {}", svg.path().display()),
            RenderOutcome::NoData => eprintln!("No data to plot; {} not written.", svg.path().display()),
            RenderOutcome::Failed { detail } => {
                return Err(AppError::new(4, format!("Failed to write SVG: {detail}")));
            }
        }
    }

    if let Some(path) = &output.export {
        crate::io::write_records(path, &data.records)?;
        eprintln!("Exported {} records to {}", data.records.len(), path.display());
    }

    Ok(())
}

fn handle_list(args: ListArgs) -> Result<(), AppError> {
    let settings = settings_from(&args.source)?;

    if !args.remote {
        print!(
            "{}",
            crate::report::format_catalog(&settings.lookup, settings.strategy.include_untraded)
        );
        return Ok(());
    }

    let backend = BackendClient::new(build_client(settings.timeout)?, settings.backend_url.clone());
    let mut out = String::new();
    out.push_str(&format!("Technology categories ({}):\n", backend.base_url()));
    for category in settings.lookup.categories() {
        out.push_str(&format!("  {category}\n"));
        out.push_str(&company_lines(&backend.companies(category)?));
    }
    out.push_str("\nCrops:\n");
    for crop in backend.crops()? {
        out.push_str(&format!("  {crop}\n"));
        for region in backend.regions(&crop)? {
            out.push_str(&format!("    {region}\n"));
        }
    }
    print!("{out}");
    Ok(())
}

/// One `name  ticker` line per backend company (keyed by ticker).
fn company_lines(companies: &BTreeMap<String, String>) -> String {
    companies
        .iter()
        .map(|(ticker, company)| format!("    {company:<16} {ticker}\n"))
        .collect()
}

fn handle_correlate(args: CorrelateArgs) -> Result<(), AppError> {
    let settings = settings_from(&args.source)?;
    let fetcher = build_fetcher(&settings)?;
    let fetcher = fetcher.as_deref().map(|f| f as &dyn RemoteFetcher);
    let mut rng = rng_from(&args.source);
    let today = chrono::Local::now().date_naive();

    let tech = Selection::Tech {
        category: args.category,
        company: args.company,
        metric: args.tech_metric,
    }
    .resolve(&settings.lookup)?;
    let agri = Selection::Agriculture {
        crop: args.crop,
        region: args.region,
        metric: args.agri_metric,
    }
    .resolve(&settings.lookup)?;

    let left = pipeline::acquire(&tech, fetcher, &mut rng, settings.days, today)?;
    let right = pipeline::acquire(&agri, fetcher, &mut rng, settings.days, today)?;
    for side in [&left, &right] {
        if let Provenance::Sample { reason } = &side.provenance {
            eprintln!("{}: live data unavailable ({reason}); using sample data.", side.request.title());
        }
    }

    let correlations = crate::math::correlate(&left.records, &right.records);
    print!(
        "{}",
        crate::report::format_correlations(&left.title(), &right.title(), &correlations)
    );
    Ok(())
}

fn handle_tui(args: TuiArgs) -> Result<(), AppError> {
    let target = match &args.log_file {
        Some(path) => LogTarget::File(path.clone()),
        None => LogTarget::Off,
    };
    logging::init(target)?;

    let settings = settings_from(&args.source)?;
    crate::tui::run(settings, args.source.seed)
}

fn owned(names: Vec<&str>) -> Vec<String> {
    names.into_iter().map(String::from).collect()
}

fn metric_keys(sector: Sector) -> Vec<String> {
    sector.metrics().iter().map(|m| m.key().to_string()).collect()
}

/// Rewrite argv so `ht` defaults to `ht tui`.
///
/// Rules:
/// - `ht`                      -> `ht tui`
/// - `ht --mode sample ...`    -> `ht tui --mode sample ...`
/// - `ht --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "tech" | "agri" | "list" | "correlate" | "tui");
    if is_subcommand {
        return argv;
    }

    // A leading flag is taken as a TUI flag.
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    argv
}
