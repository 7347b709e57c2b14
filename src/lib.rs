//! Disclosure-Crawler: a polite scrape pipeline for financial disclosures
//!
//! This crate implements a bounded-worker, queue-driven scrape pipeline that
//! turns a finite seed list into HTTP fetch tasks, executes them under
//! per-host politeness limits, resolves redirects explicitly, hands successful
//! responses to pluggable extractors that may discover further work, and
//! retries failures a bounded number of times with forensic logging.

pub mod config;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod politeness;
pub mod robots;

use thiserror::Error;

/// Main error type for pipeline operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Transport error for {url}: {source}")]
    Transport { url: String, source: reqwest::Error },

    #[error("Unexpected status {status} from {url}")]
    UnexpectedStatus { url: String, status: u16 },

    #[error("Extraction failed for {url}: {source}")]
    Extraction { url: String, source: anyhow::Error },

    #[error("Redirect from {url} carries no Location header")]
    MissingLocation { url: String },

    #[error("Task for {url} has not been sent yet")]
    NotSent { url: String },

    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Worker task panicked: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Errors raised when a metadata bag is missing required fields
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("Metadata is missing required key '{0}'")]
    MissingKey(&'static str),

    #[error("Metadata key '{key}' holds a non-string value")]
    NotAString { key: &'static str },
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use extract::{DocumentExtractor, Extractor};
pub use pipeline::{run_pipeline, Coordinator, Metadata, ScrapeOutcome, ScrapeTask, SeedRequest};
pub use politeness::PolitenessGovernor;
