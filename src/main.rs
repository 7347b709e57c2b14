//! Disclosure-Crawler main entry point
//!
//! Command-line interface for the disclosure scrape pipeline.

use clap::Parser;
use disclosure_crawler::config::{load_config_with_hash, Config};
use disclosure_crawler::extract::DocumentExtractor;
use disclosure_crawler::pipeline::{run_pipeline, SeedRequest};
use reqwest::Method;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Disclosure-Crawler: a polite scrape pipeline for financial disclosures
///
/// Crawls disclosure sites from a seed list, respecting each host's
/// robots.txt crawl delay, and appends every extracted document to a
/// newline-delimited JSON dataset.
#[derive(Parser, Debug)]
#[command(name = "disclosure-crawler")]
#[command(version = "1.0.0")]
#[command(about = "A polite scrape pipeline for financial disclosures", long_about = None)]
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

    /// Validate config and show what would be crawled without fetching
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    let seeds = seed_requests(&config);
    tracing::info!("Total seed requests: {}", seeds.len());

    match run_pipeline(config, seeds).await {
        Ok(()) => {
            tracing::info!("Crawl completed successfully");
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("disclosure_crawler=info,warn"),
            1 => EnvFilter::new("disclosure_crawler=debug,info"),
            2 => EnvFilter::new("disclosure_crawler=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows the crawl plan
fn handle_dry_run(config: &Config) {
    println!("=== Disclosure-Crawler Dry Run ===\n");

    println!("Pipeline:");
    println!("  Producers: {}", config.pipeline.producers);
    println!("  Request workers: {}", config.pipeline.request_workers);
    println!("  Response writers: {}", config.pipeline.response_writers);
    println!("  Idle sleep: {}ms", config.pipeline.idle_sleep_ms);
    println!("  Max retries per task: {}", config.pipeline.max_retries);

    println!("\nHTTP:");
    println!("  User agent: {}", config.http.user_agent);
    println!("  Timeout: {}s", config.http.timeout_secs);
    println!("  Connect timeout: {}s", config.http.connect_timeout_secs);

    println!("\nOutput:");
    println!("  Dataset: {}", config.output.dataset_path);
    println!("  Error log: {}", config.output.error_log_path);

    println!("\nSeeds ({}):", config.seed.len());
    for seed in &config.seed {
        let suffix = seed.url_append.as_deref().unwrap_or("");
        println!("  - {} {}{}", seed.method, seed.url, suffix);
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would start crawling with {} seed requests", config.seed.len());
}

/// Materializes configured seed entries into pipeline seed requests
///
/// Every configured seed uses the built-in document extractor; invalid
/// methods cannot occur here because the config was validated on load.
fn seed_requests(config: &Config) -> Vec<SeedRequest> {
    let extractor = Arc::new(DocumentExtractor);

    config
        .seed
        .iter()
        .map(|entry| {
            let method =
                Method::from_bytes(entry.method.as_bytes()).unwrap_or(Method::GET);
            let mut seed = SeedRequest::new(method, entry.url.clone(), extractor.clone());

            if let Some(append) = &entry.url_append {
                seed.metadata.set("url_append", append.clone());
            }
            if let Some(document_type) = &entry.document_type {
                seed.metadata.set("document_type", document_type.clone());
            }
            if let Some(year) = entry.year {
                seed.metadata.set("year", year);
            }
            if let (Some(title), Some(ticker)) = (&entry.title, &entry.ticker) {
                seed.metadata.set_share(title, ticker);
            }
            seed
        })
        .collect()
}
