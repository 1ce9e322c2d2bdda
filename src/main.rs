//! CLI entry point for the track segment rater.
//!
//! Provides subcommands for scoring an inspection run per segment (optionally
//! against a prior run), checking kilometer coverage against the structure
//! reference, and listing the loaded station topology.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::ffi::OsStr;
use std::path::Path;
use tracing::{error, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};
use track_rater::analyzers::analyzer::{analyze, check_integrity};
use track_rater::{
    config::RaterConfig,
    context::ReferenceContext,
    inspection::load_optional_run,
    output::{
        DEFAULT_REPORT, log_summary, print_pretty, write_integrity_csv, write_report_csv,
        write_report_json,
    },
    topology::Topology,
};

#[derive(Parser)]
#[command(name = "track_rater")]
#[command(
    about = "Scores railway segments from per-kilometer inspection grades",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Reference data and filtering options shared by every subcommand.
#[derive(Args)]
struct ReferenceArgs {
    /// JSON config file with defaults for the options below
    #[arg(long)]
    config: Option<String>,

    /// Station reference (file, .gz, workbook directory or URL)
    #[arg(long)]
    stations: Option<String>,

    /// Directions to process, comma separated
    #[arg(long, value_delimiter = ',')]
    directions: Option<Vec<i64>>,

    /// Workbook sheet holding per-kilometer grades
    #[arg(long)]
    sheet_label: Option<String>,
}

impl ReferenceArgs {
    /// Config file (or defaults) with command-line overrides applied.
    fn resolve(&self, structure: Option<String>) -> Result<RaterConfig> {
        let mut config = match &self.config {
            Some(path) => RaterConfig::load(path)?,
            None => RaterConfig::default(),
        };
        if let Some(stations) = &self.stations {
            config.stations = stations.clone();
        }
        if let Some(directions) = &self.directions {
            config.directions = directions.clone();
        }
        if let Some(label) = &self.sheet_label {
            config.sheet_label = label.clone();
        }
        if structure.is_some() {
            config.structure = structure;
        }
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Score the current run per segment, optionally against a prior run
    Score {
        /// Current inspection run
        #[arg(short, long, value_name = "FILE_OR_URL")]
        current: String,

        /// Prior inspection run to compare against
        #[arg(short, long, value_name = "FILE_OR_URL")]
        prior: Option<String>,

        /// CSV report path (`-` for stdout)
        #[arg(short, long, default_value = DEFAULT_REPORT)]
        output: String,

        /// Also write the report as JSON
        #[arg(long)]
        json: Option<String>,

        /// Number of worst segments to log
        #[arg(long, default_value_t = 10)]
        worst: usize,

        #[command(flatten)]
        reference: ReferenceArgs,
    },
    /// Report structure segments whose kilometers are missing from a run
    Integrity {
        /// Inspection run to check
        #[arg(short, long, value_name = "FILE_OR_URL")]
        current: String,

        /// Administrative structure reference
        #[arg(long)]
        structure: Option<String>,

        /// CSV gap report path (`-` for stdout)
        #[arg(short, long, default_value = "integrity_gaps.csv")]
        output: String,

        #[command(flatten)]
        reference: ReferenceArgs,
    },
    /// List directions and stations in the station reference
    ListStations {
        #[command(flatten)]
        reference: ReferenceArgs,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/track_rater.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("track_rater.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Score {
            current,
            prior,
            output,
            json,
            worst,
            reference,
        } => score(&reference, &current, prior.as_deref(), &output, json.as_deref(), worst),
        Commands::Integrity {
            current,
            structure,
            output,
            reference,
        } => integrity(&reference, structure, &current, &output),
        Commands::ListStations { reference } => list_stations(&reference),
    };

    if let Err(e) = &result {
        error!(error = %format!("{e:#}"), "Computation halted");
    }
    result
}

#[tracing::instrument(skip(reference, output, json, worst))]
fn score(
    reference: &ReferenceArgs,
    current: &str,
    prior: Option<&str>,
    output: &str,
    json: Option<&str>,
    worst: usize,
) -> Result<()> {
    let config = reference.resolve(None)?;
    let context = ReferenceContext::load(&config)?;

    let Some(current_run) = load_optional_run(current, &config.sheet_label, "current") else {
        warn!("No results: the current run could not be loaded");
        return Ok(());
    };
    let prior_run = prior.and_then(|p| load_optional_run(p, &config.sheet_label, "prior"));
    if prior.is_some() && prior_run.is_none() {
        warn!("Continuing without comparison");
    }

    let report = analyze(&context, &current_run, prior_run.as_ref());
    if report.is_empty() {
        info!(
            directions = ?config.directions,
            records = current_run.records.len(),
            "No segments: no inspected kilometers fall between stations of the selected directions"
        );
        return Ok(());
    }

    print_pretty(&report);
    log_summary(&report, worst);
    write_report_csv(output, &report)?;
    info!(output, rows = report.rows.len(), "Segment report written");

    if let Some(json_path) = json {
        write_report_json(json_path, &report)?;
        info!(output = json_path, "JSON report written");
    }
    Ok(())
}

#[tracing::instrument(skip(reference, structure, output))]
fn integrity(
    reference: &ReferenceArgs,
    structure: Option<String>,
    current: &str,
    output: &str,
) -> Result<()> {
    let config = reference.resolve(structure)?;
    if config.structure.is_none() {
        anyhow::bail!("the integrity check needs a structure reference (--structure or config)");
    }
    let context = ReferenceContext::load(&config)?;

    let Some(run) = load_optional_run(current, &config.sheet_label, "current") else {
        warn!("No results: the run could not be loaded");
        return Ok(());
    };

    let gaps = check_integrity(&context, &run)?;
    if gaps.is_empty() {
        info!("All structure kilometers are present in the run");
    }
    write_integrity_csv(output, &gaps)?;
    info!(output, gaps = gaps.len(), "Integrity report written");
    Ok(())
}

fn list_stations(reference: &ReferenceArgs) -> Result<()> {
    let config = reference.resolve(None)?;
    let topology = Topology::load(&config.stations)?;

    for direction in topology.summary() {
        let selected = config.directions.contains(&direction.direction_id);
        info!(
            direction = direction.direction_id,
            stations = direction.stations,
            first = %direction.first,
            last = %direction.last,
            span_km = direction.span_km,
            selected,
            "Direction"
        );
    }

    info!(
        directions = topology.summary().len(),
        stations = topology.station_count(),
        "Station reference summary"
    );
    Ok(())
}
