//! ckan-link-checker main entry point
//!
//! This is the command-line interface for the CKAN link checker.

use ckan_link_checker::config::{load_config_with_hash, Config};
use ckan_link_checker::crawler::run_check;
use ckan_link_checker::output::{aggregate, print_statistics};
use ckan_link_checker::ConfigError;
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// ckan-link-checker: checks every resource link of a CKAN catalog
///
/// Given a CKAN version 3 API endpoint (e.g. https://data.example.org/api/3),
/// every resource URL of every dataset is requested and the failures are
/// written to a fresh results directory. Given a results directory instead,
/// only the statistics are (re)computed.
#[derive(Parser, Debug)]
#[command(name = "ckan-link-checker")]
#[command(version)]
#[command(about = "Checks the resource links of a CKAN catalog", long_about = None)]
struct Cli {
    /// CKAN API endpoint URL, or a results directory to analyze
    #[arg(value_name = "TARGET")]
    target: String,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Treat TARGET as a results directory and only compute statistics
    #[arg(long)]
    analyze: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            match load_config_with_hash(path) {
                Ok((cfg, hash)) => {
                    tracing::info!("Configuration loaded successfully (hash: {})", hash);
                    cfg
                }
                Err(e) => {
                    tracing::error!("Failed to load configuration: {}", e);
                    return Err(e.into());
                }
            }
        }
        None => Config::default(),
    };

    if cli.analyze || !looks_like_endpoint(&cli.target) {
        handle_analyze(Path::new(&cli.target))
    } else {
        handle_check(&cli.target, &config).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("ckan_link_checker=info,warn"),
            1 => EnvFilter::new("ckan_link_checker=debug,info"),
            2 => EnvFilter::new("ckan_link_checker=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// A target is checked as an endpoint when it has an HTTP(S) scheme
fn looks_like_endpoint(target: &str) -> bool {
    let lower = target.trim().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Handles the aggregation-only mode
fn handle_analyze(dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Analyzing results in {}", dir.display());

    match aggregate(dir) {
        Ok(stats) => {
            print_statistics(&stats);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Analysis failed: {}", e);
            Err(e.into())
        }
    }
}

/// Handles the main link check
async fn handle_check(endpoint: &str, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    if url::Url::parse(endpoint).is_err() {
        let e = ConfigError::InvalidUrl(endpoint.to_string());
        tracing::error!("{}", e);
        return Err(e.into());
    }

    tracing::info!("Checking catalog at {}", endpoint);

    match run_check(endpoint, config).await {
        Ok(summary) => {
            print_statistics(&summary.statistics);
            println!(
                "\nResults written to {}",
                summary.results_dir.display()
            );
            tracing::info!(
                "Check completed: {} datasets ({} skipped), {} links",
                summary.counters.datasets,
                summary.counters.datasets_skipped,
                summary.counters.resources_probed
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Check failed: {}", e);
            Err(e.into())
        }
    }
}
