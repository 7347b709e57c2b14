//! Configuration module for the scrape pipeline
//!
//! Handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use disclosure_crawler::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Request workers: {}", config.pipeline.request_workers);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, HttpConfig, OutputConfig, PipelineConfig, SeedEntry};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
