use crate::config::types::{Config, HttpConfig, OutputConfig, PipelineConfig, SeedEntry};
use crate::ConfigError;
use reqwest::Method;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_pipeline_config(&config.pipeline)?;
    validate_http_config(&config.http)?;
    validate_output_config(&config.output)?;
    validate_seeds(&config.seed)?;
    Ok(())
}

/// Validates worker-pool sizing and retry limits
fn validate_pipeline_config(config: &PipelineConfig) -> Result<(), ConfigError> {
    if config.producers < 1 {
        return Err(ConfigError::Validation(format!(
            "producers must be >= 1, got {}",
            config.producers
        )));
    }

    if config.request_workers < 1 {
        return Err(ConfigError::Validation(format!(
            "request-workers must be >= 1, got {}",
            config.request_workers
        )));
    }

    if config.response_writers < 1 {
        return Err(ConfigError::Validation(format!(
            "response-writers must be >= 1, got {}",
            config.response_writers
        )));
    }

    if config.max_retries < 1 {
        return Err(ConfigError::Validation(format!(
            "max-retries must be >= 1, got {}",
            config.max_retries
        )));
    }

    Ok(())
}

/// Validates HTTP client settings
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout-secs must be > 0".to_string(),
        ));
    }

    if config.connect_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "connect-timeout-secs must be > 0".to_string(),
        ));
    }

    if config.user_agent.is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates output file paths
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.dataset_path.is_empty() {
        return Err(ConfigError::Validation(
            "dataset-path cannot be empty".to_string(),
        ));
    }

    if config.error_log_path.is_empty() {
        return Err(ConfigError::Validation(
            "error-log-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates every seed entry's URL and method
fn validate_seeds(seeds: &[SeedEntry]) -> Result<(), ConfigError> {
    for seed in seeds {
        Url::parse(&seed.url)
            .map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", seed.url, e)))?;

        Method::from_bytes(seed.method.as_bytes()).map_err(|_| {
            ConfigError::Validation(format!(
                "seed {} declares invalid method '{}'",
                seed.url, seed.method
            ))
        })?;
    }
    Ok(())
}
