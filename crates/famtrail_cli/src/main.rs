//! Command-line viewer for family location timelines.
//!
//! # Responsibility
//! - Load sources from a TOML config and/or command-line overrides.
//! - Run headless render passes and print the resulting markers.
//! - Inspect one person's timeline and its lifecycle classification.

use clap::{Args, Parser, Subcommand};
use famtrail_core::config::ViewerConfig;
use famtrail_core::service::photo_probe::probe_for;
use famtrail_core::timeline::keywords::LifecycleClassifier;
use famtrail_core::{
    logging, FinalKind, HttpPhotoProbe, LogSettings, MemoryLayer, PhotoProbe, RenderOutcome,
    TextSource, ViewerSession,
};
use log::info;
use serde_json::json;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

type CliResult<T> = Result<T, Box<dyn Error>>;

/// Family-history map viewer, headless edition.
#[derive(Parser, Debug)]
#[command(name = "famtrail")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    sources: SourceArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// TOML config file
    #[arg(short, long, global = true, env = "FAMTRAIL_CONFIG")]
    config: Option<PathBuf>,

    /// Location source (file path or http(s) URL)
    #[arg(short, long, global = true)]
    locations: Option<String>,

    /// Person → photo source
    #[arg(long, global = true)]
    photos: Option<String>,

    /// Group → members source
    #[arg(long, global = true)]
    groups: Option<String>,

    /// Co-location tolerance in degrees (0 = exact)
    #[arg(long, global = true)]
    tolerance: Option<f64>,

    /// Log level: trace|debug|info|warn|error
    #[arg(long, global = true, env = "FAMTRAIL_LOG_LEVEL")]
    log_level: Option<String>,

    /// Absolute directory for rolling log files (stderr when omitted)
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one render pass and print the markers
    Render {
        /// Year to display (defaults to the latest year in the data)
        #[arg(short, long)]
        year: Option<i32>,

        /// Person or group to show; repeat for several (defaults to everyone)
        #[arg(short, long = "select")]
        select: Vec<String>,

        /// Check photo URLs with HTTP HEAD requests
        #[arg(long)]
        probe_urls: bool,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print the year range of the location data
    Years,
    /// Print one person's timeline with lifecycle markers
    Timeline {
        person: String,

        /// Also resolve the person's position at this year
        #[arg(short, long)]
        year: Option<i32>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("famtrail: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult<()> {
    let config = build_config(&cli.sources)?;
    start_logging(&cli.sources, &config)?;

    match cli.command {
        Command::Render {
            year,
            select,
            probe_urls,
            json,
        } => render(&config, year, &select, probe_urls, json),
        Command::Years => years(&config),
        Command::Timeline { person, year } => timeline(&config, &person, year),
    }
}

fn build_config(args: &SourceArgs) -> CliResult<ViewerConfig> {
    let mut config = match &args.config {
        Some(path) => ViewerConfig::load(path)?,
        None => ViewerConfig::default(),
    };
    if let Some(locations) = &args.locations {
        config.sources.locations = TextSource::parse(locations);
    }
    if let Some(photos) = &args.photos {
        config.sources.photos = Some(TextSource::parse(photos));
    }
    if let Some(groups) = &args.groups {
        config.sources.groups = Some(TextSource::parse(groups));
    }
    if let Some(tolerance) = args.tolerance {
        config.markers.tolerance = tolerance;
    }
    config.validate()?;
    Ok(config)
}

fn start_logging(args: &SourceArgs, config: &ViewerConfig) -> CliResult<()> {
    let mut logging = config.logging.clone();
    if let Some(level) = &args.log_level {
        logging.level = level.clone();
    }
    if let Some(dir) = &args.log_dir {
        logging.dir = Some(dir.clone());
    }
    logging::start(LogSettings::from_config(&logging)?)?;
    Ok(())
}

fn render(
    config: &ViewerConfig,
    year: Option<i32>,
    select: &[String],
    probe_urls: bool,
    as_json: bool,
) -> CliResult<()> {
    let mut session = ViewerSession::from_config(config)?;
    if let Some(year) = year {
        session.set_year(year);
    }
    if !select.is_empty() {
        session.selection_mut().clear();
        for name in select {
            session.selection_mut().select(name.as_str());
        }
    }

    let probe: Box<dyn PhotoProbe> = if probe_urls {
        Box::new(HttpPhotoProbe::for_config(&config.markers)?)
    } else {
        probe_for(&config.markers)
    };
    let mut layer = MemoryLayer::new();
    let plan = match session.render(&mut layer, probe.as_ref())? {
        RenderOutcome::Rendered(plan) => plan,
        RenderOutcome::Superseded { generation } => {
            return Err(format!("render pass {generation} was superseded").into())
        }
    };
    info!(
        "event=cli_render module=cli status=ok year={} markers={}",
        plan.year,
        plan.markers.len()
    );

    if as_json {
        let document = json!({
            "year": plan.year,
            "visible": plan.visible,
            "groups": plan.group_count,
            "bounds": plan.bounds,
            "map": config.map,
            "icon": plan.icon,
            "markers": plan.markers,
        });
        println!("{}", serde_json::to_string_pretty(&document)?);
        return Ok(());
    }

    println!(
        "year {}: {} marker(s) in {} location(s)",
        plan.year,
        plan.markers.len(),
        plan.group_count
    );
    for marker in &plan.markers {
        let place = if marker.place.is_empty() {
            "-"
        } else {
            marker.place.as_str()
        };
        println!(
            "  [{}] {} @ {:.5},{:.5} {} ({}) photo={}",
            marker.group_index,
            marker.person,
            marker.lat,
            marker.lon,
            place,
            marker.year,
            marker.photo
        );
    }
    Ok(())
}

fn years(config: &ViewerConfig) -> CliResult<()> {
    let session = ViewerSession::from_config(config)?;
    match session.year_bounds() {
        Some((min, max)) => println!("{min} {max}"),
        None => println!("no entries"),
    }
    Ok(())
}

fn timeline(config: &ViewerConfig, person: &str, year: Option<i32>) -> CliResult<()> {
    let mut session = ViewerSession::from_config(config)?;
    let classifier = LifecycleClassifier::new(&config.keywords)?;
    let Some(timeline) = session.store().timeline(person) else {
        return Err(format!("no entries for `{person}`").into());
    };

    for entry in timeline.entries() {
        let lifecycle = classifier.classify(&entry.info);
        let mark = match (lifecycle.stop, lifecycle.final_event) {
            (true, _) => "stop",
            (false, Some(FinalKind::Deceased)) => "deceased",
            (false, Some(FinalKind::Divorced)) => "divorced",
            (false, None) => "",
        };
        println!(
            "{:>6} {:.5},{:.5} {:<20} {:<9} {}",
            entry.year, entry.lat, entry.lon, entry.place, mark, entry.info
        );
    }

    if let Some(year) = year {
        session.set_year(year);
        match session.resolve_person(person) {
            Some(position) => println!(
                "at {year}: {} ({}, entry year {})",
                position.place, position.info, position.year
            ),
            None => println!("at {year}: not shown"),
        }
    }
    Ok(())
}
