//! Tour Tracker CLI
//!
//! Local execution entry point.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tour_tracker::{
    error::Result,
    models::{Config, Snapshot},
    pipeline,
    services::{FileSource, HttpSource, PageSource, TourParser},
    storage::{LocalStorage, TourStorage},
};

/// Tour Tracker - scrape the tour listing and record changes
#[derive(Parser, Debug)]
#[command(
    name = "tour-tracker",
    version,
    about = "Tracks changes in a club's tour listing"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "data/config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch, parse, diff against the previous snapshot and save
    Run {
        /// Read the listing from a saved HTML file instead of the web
        #[arg(long)]
        html: Option<PathBuf>,

        /// Override the listing URL
        #[arg(long)]
        url: Option<String>,
    },

    /// Parse the listing and print the tours as JSON
    Parse {
        /// Read the listing from a saved HTML file instead of the web
        #[arg(long)]
        html: Option<PathBuf>,

        /// Write JSON to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compare two snapshot files and print the delta as JSON
    Diff {
        /// Older snapshot
        previous: PathBuf,

        /// Newer snapshot
        current: PathBuf,

        /// Write JSON to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate the configuration file
    Validate,

    /// Show the stored snapshot
    Info,
}

/// Initialize logging. `RUST_LOG` wins over `--verbose`, which wins over the config.
fn init_logging(verbose: bool, configured: &str) {
    let level = if verbose { "debug" } else { configured };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn page_source(config: &Config, html: Option<PathBuf>) -> Result<Box<dyn PageSource>> {
    Ok(match html {
        Some(path) => Box::new(FileSource::new(path)),
        None => Box::new(HttpSource::new(&config.source)?),
    })
}

fn write_output(output: Option<&Path>, json: &str) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, format!("{json}\n"))?;
            log::info!("Wrote {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn read_snapshot(path: &Path) -> Result<Snapshot> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = Config::load_or_default(&cli.config);
    let level = loaded
        .as_ref()
        .map(|c| c.logging.level.clone())
        .unwrap_or_else(|_| "info".to_string());
    init_logging(cli.verbose, &level);

    let mut config = loaded?;
    if cli.config.exists() {
        log::info!("Loaded configuration from {}", cli.config.display());
    } else {
        log::info!("No config at {}, using defaults", cli.config.display());
    }

    match cli.command {
        Command::Run { html, url } => {
            if let Some(url) = url {
                config.source.url = url;
            }
            config.validate()?;

            let source = page_source(&config, html)?;
            let storage = LocalStorage::new(&config.storage.dir);
            let report = pipeline::run_scrape(&config, source.as_ref(), &storage).await?;

            let summary = report.summary();
            log::info!(
                "Run complete: {} tours, {} added, {} removed, {} modified",
                report.snapshot.tour_count,
                summary.added,
                summary.removed,
                summary.modified
            );
            if report.duplicates > 0 {
                log::warn!("{} duplicate tour ids on the page", report.duplicates);
            }
        }

        Command::Parse { html, output } => {
            config.validate()?;
            let source = page_source(&config, html)?;
            let parser = TourParser::from_config(&config)?;

            let page = source.fetch().await?;
            let outcome = parser.parse_outcome(&page);
            log::info!(
                "Parsed {} tours ({} skipped)",
                outcome.tours.len(),
                outcome.skipped
            );

            let json = serde_json::to_string_pretty(&outcome.tours)?;
            write_output(output.as_deref(), &json)?;
        }

        Command::Diff {
            previous,
            current,
            output,
        } => {
            let previous = read_snapshot(&previous)?;
            let current = read_snapshot(&current)?;
            let delta = pipeline::calculate_delta(Some(&previous), &current);

            log::info!(
                "{} added, {} removed, {} modified",
                delta.summary.added,
                delta.summary.removed,
                delta.summary.modified
            );

            let json = serde_json::to_string_pretty(&delta)?;
            write_output(output.as_deref(), &json)?;
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            TourParser::from_config(&config)?;

            log::info!("✓ Config OK");
        }

        Command::Info => {
            let storage = LocalStorage::new(&config.storage.dir);
            log::info!("Storage directory: {}", storage.root_dir().display());
            log::info!("Listing: {}", config.source.url);

            match storage.load_snapshot(&config.storage.snapshot_key).await? {
                Some(snapshot) => {
                    log::info!("Last run: {}", snapshot.timestamp);
                    log::info!("Tours: {}", snapshot.tour_count);
                }
                None => log::info!("No snapshot found yet."),
            }
        }
    }

    Ok(())
}
