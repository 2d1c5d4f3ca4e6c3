//! Swatchbook main entry point
//!
//! This is the command-line interface for the Swatchbook component harvester.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use swatchbook::config::{load_config_with_hash, Config};
use swatchbook::output::{load_statistics, print_statistics};
use swatchbook::remote::CodeHostCrawler;
use swatchbook::storage::{RunMode, RunStatus, SqliteStorage, Storage};
use swatchbook::ConfigError;
use tracing_subscriber::EnvFilter;

/// Swatchbook: a resilient UI component harvester
///
/// Swatchbook crawls component listing sites (or code-host repositories),
/// extracts markup and style code, normalizes each capture into a
/// self-contained preview document, and stores de-duplicated records.
#[derive(Parser, Debug)]
#[command(name = "swatchbook")]
#[command(version)]
#[command(about = "A resilient UI component harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Crawl the code host configured under [remote] instead of the listing site
    #[arg(long)]
    code_host: bool,

    /// Start the listing crawl at this page instead of the configured start page
    #[arg(long, value_name = "PAGE", conflicts_with = "code_host")]
    from_page: Option<u32>,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Token and other secrets may live in a .env file
    dotenvy::dotenv().ok();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if let Some(page) = cli.from_page {
        config.listing.start_page = page;
    }

    if cli.dry_run {
        handle_dry_run(&config, cli.code_host);
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.code_host {
        handle_code_host(config, &config_hash).await?;
    } else {
        handle_listing(config, &config_hash).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("swatchbook=info,warn"),
            1 => EnvFilter::new("swatchbook=debug,info"),
            2 => EnvFilter::new("swatchbook=trace,debug"),
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

/// Handles the --dry-run mode: prints the effective configuration
fn handle_dry_run(config: &Config, code_host: bool) {
    println!("=== Swatchbook Dry Run ===\n");

    println!("Listing:");
    println!("  Library: {}", config.listing.library);
    for target in config.listing.targets() {
        println!("  Category {}: {}", target.name, target.listing_url);
    }
    println!("  Start page: {}", config.listing.start_page);
    match config.listing.max_pages {
        Some(max) => println!("  Max pages: {}", max),
        None => println!("  Max pages: unlimited"),
    }
    println!("  Detail pattern: {}", config.listing.detail_pattern);
    println!("  Resume by author: {}", config.listing.resume_by_author);

    println!("\nBrowser:");
    println!("  Listing render mode: {}", config.browser.listing_render_mode);
    println!("  Detail render mode: {}", config.browser.detail_render_mode);
    println!("  Ready timeout: {}s", config.browser.ready_timeout_secs);
    println!("  Navigation retries: {}", config.browser.navigation_retries);

    println!("\nPipeline:");
    println!("  Workers per page: {}", config.pipeline.workers);
    println!("  Empty-page threshold: {}", config.pipeline.empty_page_threshold);

    match &config.remote {
        Some(remote) => {
            println!("\nRemote:");
            println!("  API base: {}", remote.api_base);
            println!("  Token variable: {}", remote.token_env);
            println!("  Explicit repos: {}", remote.repos.len());
            println!("  Search queries: {} x {} pages", remote.search_queries.len(), remote.search_pages);
            println!("  Library / category: {} / {}", remote.library, remote.category);
        }
        None => println!("\nRemote: not configured"),
    }

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    println!("\n✓ Configuration is valid");
    if code_host {
        println!("✓ Would crawl the code host");
    } else {
        for target in config.listing.targets() {
            let listing = config.listing.for_category(&target);
            println!("✓ Would start at {}", listing.page_url(listing.start_page));
        }
    }
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
    let stats = load_statistics(&storage, 10)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the listing crawl, recording it in the run ledger
async fn handle_listing(config: Config, config_hash: &str) -> Result<()> {
    let mut storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
    let run_id = storage.create_run(RunMode::Listing, config_hash)?;
    tracing::info!("Starting listing run #{}", run_id);

    match swatchbook::crawler::crawl(Arc::new(config), &mut storage).await {
        Ok(summary) => {
            summary.log();
            storage.finish_run(run_id, RunStatus::Completed, summary.committed())?;
            Ok(())
        }
        Err(e) => {
            tracing::error!("Listing run failed: {}", e);
            storage.finish_run(run_id, RunStatus::Failed, 0)?;
            Err(e.into())
        }
    }
}

/// Handles the code-host crawl, recording it in the run ledger
async fn handle_code_host(config: Config, config_hash: &str) -> Result<()> {
    let remote = config
        .remote
        .as_ref()
        .ok_or_else(|| ConfigError::Missing("[remote] section".to_string()))?;
    let api = swatchbook::remote::connect(remote)?;

    let mut storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
    let run_id = storage.create_run(RunMode::CodeHost, config_hash)?;
    tracing::info!("Starting code-host run #{}", run_id);

    let summary = match CodeHostCrawler::new(api, remote, &mut storage) {
        Ok(mut crawler) => crawler.run().await,
        Err(e) => {
            tracing::error!("Code-host run failed: {}", e);
            storage.finish_run(run_id, RunStatus::Failed, 0)?;
            return Err(e.into());
        }
    };

    summary.log();
    storage.finish_run(run_id, RunStatus::Completed, summary.committed())?;
    Ok(())
}
