//! `quake`: pull recent earthquakes from an FDSN catalog into a local store
//! and print the strongest ones.
//!
//! ```text
//! quake pull  --limit K --days N --min-magnitude M [--region NAME]
//! quake query --limit K --days N --min-magnitude M
//! quake init-regions [--force]
//! ```
//!
//! The report goes to stdout; logs go to stderr.

mod report;

use std::io::Write as _;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use quake_core::{DEFAULT_CONFIG_PATH, Pipeline, PipelineError, QuakeConfig, RegionTable};
use quake_types::{EventRecord, QueryParams};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "quake")]
#[command(about = "Fetch, store and rank recent earthquakes")]
#[command(version)]
struct Cli {
    /// Configuration file; defaults apply when it does not exist
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Database file, overriding the configuration
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Regions file, overriding the configuration
    #[arg(long, global = true)]
    regions: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the window from the catalog, store it, then print the top events
    Pull {
        #[command(flatten)]
        query: QueryArgs,

        /// Named region from the regions file (default region when omitted)
        #[arg(long)]
        region: Option<String>,
    },

    /// Print the top events already in the store
    Query {
        #[command(flatten)]
        query: QueryArgs,
    },

    /// Write a regions file holding the built-in default region
    InitRegions {
        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args)]
struct QueryArgs {
    /// Maximum number of events to print
    #[arg(long, default_value_t = 10)]
    limit: u32,

    /// Size of the recency window in days
    #[arg(long, default_value_t = 7)]
    days: u32,

    /// Minimum magnitude, inclusive
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    min_magnitude: f64,
}

impl QueryArgs {
    const fn params(&self) -> QueryParams {
        QueryParams {
            limit: self.limit,
            time_window_days: self.days,
            min_magnitude: self.min_magnitude,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if let Some(kind) = err.downcast_ref::<PipelineError>().map(PipelineError::kind) {
                error!(%kind, "quake failed");
            }
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let (config, config_found) = load_config(&cli).map_err(PipelineError::from)?;
    init_logging(&config.logging.level);
    if !config_found {
        info!(path = %cli.config.display(), "Config file not found, using defaults");
    }
    info!(
        config = %cli.config.display(),
        db = %config.storage.db_path.display(),
        regions = %config.regions.path.display(),
        "configuration loaded"
    );

    match cli.command {
        Commands::Pull { query, region } => {
            let pipeline = Pipeline::from_config(&config)?;
            let report = pipeline
                .pull(region.as_deref(), &query.params())
                .await
                .context("pull cycle failed")?;
            print_records(&report.results)
        }
        Commands::Query { query } => {
            let pipeline = Pipeline::from_config(&config)?;
            let results = pipeline
                .query(&query.params())
                .await
                .context("query failed")?;
            print_records(&results)
        }
        Commands::InitRegions { force } => {
            RegionTable::builtin()
                .write(&config.regions.path, force)
                .map_err(PipelineError::from)
                .context("could not write regions file")?;
            Ok(())
        }
    }
}

/// Config file, then environment, then command-line flags.
///
/// Also reports whether the config file existed, so the caller can log it
/// once logging is up.
fn load_config(cli: &Cli) -> Result<(QuakeConfig, bool), quake_core::ConfigError> {
    let found = cli.config.exists();
    let mut config = QuakeConfig::load_or_default(&cli.config)?;
    if let Some(db) = &cli.db {
        config.storage.db_path.clone_from(db);
    }
    if let Some(regions) = &cli.regions {
        config.regions.path.clone_from(regions);
    }
    Ok((config, found))
}

/// `RUST_LOG` wins; otherwise the configured level.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

fn print_records(records: &[EventRecord]) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(report::render(records).as_bytes())
        .and_then(|()| stdout.flush())
        .context("failed to write report")
}
