use serde::Deserialize;

/// Main configuration structure for the scrape pipeline
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub pipeline: PipelineConfig,
    pub http: HttpConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub seed: Vec<SeedEntry>,
}

/// Worker-pool sizing and retry behavior
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Number of concurrent seed producers
    pub producers: usize,

    /// Number of concurrent request workers
    #[serde(rename = "request-workers")]
    pub request_workers: usize,

    /// Number of concurrent response writers
    #[serde(rename = "response-writers")]
    pub response_writers: usize,

    /// Sleep between loop iterations of each worker (milliseconds)
    #[serde(rename = "idle-sleep-ms")]
    pub idle_sleep_ms: u64,

    /// Total attempts allowed per task before it is dropped
    #[serde(rename = "max-retries")]
    pub max_retries: u32,
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Overall request timeout (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Connection establishment timeout (seconds)
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,

    /// User agent header sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Accept-Language header sent with every request
    #[serde(rename = "accept-language", default = "default_accept_language")]
    pub accept_language: String,
}

fn default_accept_language() -> String {
    "en-US,en;q=0.9".to_string()
}

/// Output file locations
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the newline-delimited JSON dataset file
    #[serde(rename = "dataset-path")]
    pub dataset_path: String,

    /// Path to the newline-delimited JSON error log
    #[serde(rename = "error-log-path")]
    pub error_log_path: String,
}

/// One seed request declared in the configuration file
#[derive(Debug, Clone, Deserialize)]
pub struct SeedEntry {
    /// Target URL
    pub url: String,

    /// HTTP method (defaults to GET)
    #[serde(default = "default_method")]
    pub method: String,

    /// Suffix appended to the URL, preserved across redirects
    #[serde(rename = "url-append")]
    pub url_append: Option<String>,

    /// Free-form document-type tag carried into the dataset
    #[serde(rename = "document-type")]
    pub document_type: Option<String>,

    /// Reporting year tag
    pub year: Option<i64>,

    /// Firm title for the dataset record
    pub title: Option<String>,

    /// Firm ticker for the dataset record
    pub ticker: Option<String>,
}

fn default_method() -> String {
    "GET".to_string()
}
