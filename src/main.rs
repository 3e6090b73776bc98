//! Magpie main entry point
//!
//! Command-line interface for the Magpie timeline harvester.

use anyhow::Context;
use clap::Parser;
use magpie::config::{load_config, validate, Config};
use magpie::{harvest, RunOptions};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Magpie: an incremental timeline harvester
///
/// Magpie walks a Nitter-style mirror one page at a time for a single feed
/// owner and merges newly discovered posts into a JSON collection, never
/// re-processing posts it has already seen.
#[derive(Parser, Debug)]
#[command(name = "magpie")]
#[command(version)]
#[command(about = "Incrementally harvest posts from a Nitter-style mirror", long_about = None)]
struct Cli {
    /// Feed owner to harvest (without the leading @)
    #[arg(value_name = "USERNAME")]
    username: String,

    /// Path to a TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Maximum number of pages to fetch
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..))]
    max_pages: u32,

    /// Only keep posts from the last N days, stopping pagination at the boundary
    #[arg(long, value_name = "DAYS")]
    since_days: Option<u32>,

    /// Walk the with-replies timeline instead of the default one
    #[arg(long)]
    with_replies: bool,

    /// Collection file to write (overrides the config file)
    #[arg(short, long, value_name = "FILE")]
    output: Option<String>,

    /// Directory receiving one raw HTML file per fetched page
    #[arg(long, value_name = "DIR")]
    archive_dir: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)
                .with_context(|| format!("failed to load config {}", path.display()))?
        }
        None => Config::default(),
    };

    // CLI flags override the config file
    if let Some(output) = cli.output {
        config.output.collection_path = output;
    }
    if let Some(dir) = cli.archive_dir {
        config.output.archive_dir = Some(dir);
    }
    validate(&config).context("invalid configuration")?;

    let mut options = RunOptions::new(&cli.username);
    options.max_pages = cli.max_pages;
    options.with_replies = cli.with_replies;
    options.since = cli
        .since_days
        .map(|days| chrono::Utc::now() - chrono::Duration::days(days as i64));

    tracing::info!(
        "Starting harvest for @{} (max {} pages)",
        cli.username,
        cli.max_pages
    );
    let posts = harvest(config.clone(), options).await?;

    println!(
        "Harvested {} new posts from @{} -> {}",
        posts.len(),
        cli.username,
        config.output.collection_path
    );

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("magpie=info,warn"),
            1 => EnvFilter::new("magpie=debug,info"),
            2 => EnvFilter::new("magpie=trace,debug"),
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
