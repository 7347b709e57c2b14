//! Pipeline orchestration
//!
//! The coordinator wires the two queues, the politeness governor, and the
//! output sinks together, spawns the configured worker pools against one
//! shared HTTP client, and shuts the pipeline down with a two-phase
//! drain-then-cancel sequence: request workers feed the response queue, so
//! they must be cancelled only after the task queue drains, and response
//! writers only after the response queue drains in turn.

use crate::config::{Config, HttpConfig};
use crate::output::JsonlAppender;
use crate::pipeline::{
    produce_seeds, RequestWorker, ResponseWriter, ScrapeOutcome, ScrapeTask, SeedRequest,
    WorkQueue,
};
use crate::politeness::PolitenessGovernor;
use crate::Result;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE};
use reqwest::redirect::Policy;
use reqwest::Client;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Builds the HTTP client shared by every producer and worker
///
/// Redirects are never followed by the transport; the request worker
/// resolves them explicitly so that redirect hops stay visible to the
/// pipeline.
pub fn build_http_client(config: &HttpConfig) -> std::result::Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&config.accept_language) {
        headers.insert(ACCEPT_LANGUAGE, value);
    }

    Client::builder()
        .user_agent(config.user_agent.clone())
        .default_headers(headers)
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .redirect(Policy::none())
        .gzip(true)
        .brotli(true)
        .build()
}

/// Owns the queues, governor, and sinks for one pipeline run
pub struct Coordinator {
    config: Config,
    client: Client,
    task_queue: Arc<WorkQueue<ScrapeTask>>,
    response_queue: Arc<WorkQueue<ScrapeOutcome>>,
    governor: Arc<PolitenessGovernor>,
    dataset: Arc<JsonlAppender>,
    error_log: Arc<JsonlAppender>,
}

impl Coordinator {
    /// Creates a coordinator from the given configuration
    ///
    /// Opens both output sinks, creating their parent directories first.
    /// This is the one place where failure is fatal to the caller; once the
    /// pipeline is running, per-task errors stay inside the worker loops.
    pub fn new(config: Config) -> Result<Self> {
        let client = build_http_client(&config.http)?;

        for path in [&config.output.dataset_path, &config.output.error_log_path] {
            if let Some(parent) = Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
        }
        let dataset = Arc::new(JsonlAppender::open(Path::new(&config.output.dataset_path))?);
        let error_log = Arc::new(JsonlAppender::open(Path::new(
            &config.output.error_log_path,
        ))?);

        let governor = Arc::new(PolitenessGovernor::new(
            client.clone(),
            config.http.user_agent.clone(),
        ));

        Ok(Self {
            config,
            client,
            task_queue: Arc::new(WorkQueue::new()),
            response_queue: Arc::new(WorkQueue::new()),
            governor,
            dataset,
            error_log,
        })
    }

    /// The shared task queue (the crawl frontier)
    pub fn task_queue(&self) -> Arc<WorkQueue<ScrapeTask>> {
        Arc::clone(&self.task_queue)
    }

    /// The response queue feeding the writers
    pub fn response_queue(&self) -> Arc<WorkQueue<ScrapeOutcome>> {
        Arc::clone(&self.response_queue)
    }

    /// The shared HTTP client
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Runs the pipeline to completion over the given seed requests
    ///
    /// Returns once both queues have fully drained and all workers are
    /// cancelled.
    pub async fn run(&self, seeds: Vec<SeedRequest>) -> Result<()> {
        let started = Instant::now();
        let seed_count = seeds.len();
        tracing::info!("Starting scrape pipeline with {} seed requests", seed_count);

        let seeds = Arc::new(Mutex::new(seeds));
        let idle_sleep = Duration::from_millis(self.config.pipeline.idle_sleep_ms);

        let producers: Vec<_> = (0..self.config.pipeline.producers)
            .map(|_| {
                tokio::spawn(produce_seeds(
                    self.client.clone(),
                    self.task_queue(),
                    Arc::clone(&seeds),
                ))
            })
            .collect();

        let workers: Vec<_> = (0..self.config.pipeline.request_workers)
            .map(|id| {
                let worker = RequestWorker::new(
                    id,
                    self.client.clone(),
                    self.task_queue(),
                    self.response_queue(),
                    Arc::clone(&self.governor),
                    Arc::clone(&self.error_log),
                    self.config.pipeline.max_retries,
                    idle_sleep,
                );
                tokio::spawn(worker.run())
            })
            .collect();

        let writers: Vec<_> = (0..self.config.pipeline.response_writers)
            .map(|id| {
                let writer = ResponseWriter::new(
                    id,
                    self.response_queue(),
                    Arc::clone(&self.dataset),
                    Arc::clone(&self.error_log),
                    idle_sleep,
                );
                tokio::spawn(writer.run())
            })
            .collect();

        // The seed list is finite, so the producers are too
        for producer in producers {
            producer.await?;
        }
        tracing::debug!("All producers finished");

        // Every task, including all dynamically discovered ones, must be
        // marked done before the workers that feed the response queue are
        // cancelled
        self.task_queue.join().await;
        for worker in &workers {
            worker.abort();
        }
        tracing::debug!("Task queue drained, request workers cancelled");

        self.response_queue.join().await;
        for writer in &writers {
            writer.abort();
        }
        tracing::debug!("Response queue drained, response writers cancelled");

        tracing::info!(
            "Pipeline finished: {} seeds expanded and drained in {:?}",
            seed_count,
            started.elapsed()
        );
        Ok(())
    }
}

/// Runs a complete pipeline over the seed requests
///
/// This is the main library entry point: it builds a coordinator from the
/// configuration, runs it to completion, and returns once both queues have
/// drained.
pub async fn run_pipeline(config: Config, seeds: Vec<SeedRequest>) -> Result<()> {
    Coordinator::new(config)?.run(seeds).await
}
