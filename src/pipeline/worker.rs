//! Request worker: the core fetch state machine
//!
//! Each worker loops over the task queue: pop, apply the politeness delay,
//! execute the fetch, then dispatch on the response — redirects spawn a
//! successor task, successes run the extractor and expand the frontier,
//! everything else takes the error/retry path. No per-task failure ever
//! terminates the worker loop.

use crate::output::JsonlAppender;
use crate::pipeline::{Disposition, ScrapeOutcome, ScrapeTask, WorkQueue};
use crate::politeness::PolitenessGovernor;
use crate::{CrawlError, Result};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Resolves a Location header against the request that produced it
///
/// An absolute Location is used verbatim; a relative one inherits the
/// original request's scheme and host.
fn resolve_location(base: &Url, location: &str) -> Result<Url> {
    match Url::parse(location) {
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => Ok(base.join(location)?),
        Err(e) => Err(e.into()),
    }
}

/// Pulls tasks from the queue and runs them through the fetch state machine
pub struct RequestWorker {
    id: usize,
    client: Client,
    task_queue: Arc<WorkQueue<ScrapeTask>>,
    response_queue: Arc<WorkQueue<ScrapeOutcome>>,
    governor: Arc<PolitenessGovernor>,
    error_log: Arc<JsonlAppender>,
    max_retries: u32,
    idle_sleep: Duration,
}

impl RequestWorker {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: usize,
        client: Client,
        task_queue: Arc<WorkQueue<ScrapeTask>>,
        response_queue: Arc<WorkQueue<ScrapeOutcome>>,
        governor: Arc<PolitenessGovernor>,
        error_log: Arc<JsonlAppender>,
        max_retries: u32,
        idle_sleep: Duration,
    ) -> Self {
        Self {
            id,
            client,
            task_queue,
            response_queue,
            governor,
            error_log,
            max_retries,
            idle_sleep,
        }
    }

    /// Runs until cancelled by the orchestrator
    pub async fn run(self) {
        tracing::debug!(worker = self.id, "Request worker started");
        loop {
            let mut task = self.task_queue.pop().await;
            tracing::debug!(worker = self.id, url = %task.url(), "Picked up task");

            if let Err(error) = self.process(&mut task).await {
                self.handle_failure(task, error);
            }

            // Required for drain detection, regardless of outcome
            self.task_queue.task_done();
            tokio::time::sleep(self.idle_sleep).await;
        }
    }

    async fn process(&self, task: &mut ScrapeTask) -> Result<()> {
        self.governor.wait_before(task.target_url()).await;
        task.send().await?;

        let disposition = task.response().map(|response| response.disposition());
        match disposition {
            Some(Disposition::Redirect) => self.follow_redirect(task),
            Some(Disposition::Success) => self.consume_success(task),
            Some(Disposition::Failure(status)) => Err(CrawlError::UnexpectedStatus {
                url: task.url(),
                status: status.as_u16(),
            }),
            None => Err(CrawlError::NotSent { url: task.url() }),
        }
    }

    /// Builds and enqueues the successor task for a 3xx response
    ///
    /// Redirects are not failures: the successor carries a copied metadata
    /// bag with `redirected_from` recorded, keeps the extractor, and starts
    /// with a fresh retry budget.
    fn follow_redirect(&self, task: &ScrapeTask) -> Result<()> {
        let response = task.response().ok_or_else(|| CrawlError::NotSent {
            url: task.url(),
        })?;
        let location = response
            .location()
            .ok_or_else(|| CrawlError::MissingLocation { url: task.url() })?;

        let mut target = resolve_location(&response.request_url, location)?.to_string();
        if let Some(suffix) = task.metadata().url_append() {
            target.push_str(suffix);
        }
        let target_url = Url::parse(&target)?;

        tracing::info!("Redirecting request {} to {}", task.url(), target);

        let mut metadata = task.metadata().clone();
        metadata.set("redirected_from", task.url());
        metadata.set("url", target);

        self.task_queue.push(ScrapeTask::new(
            self.client.clone(),
            response.request_method.clone(),
            target_url,
            metadata,
            task.extractor(),
        ));
        Ok(())
    }

    /// Runs the extractor and expands the frontier with discovered work
    fn consume_success(&self, task: &ScrapeTask) -> Result<()> {
        tracing::debug!("Dispatching {} to extractor", task.url());
        let mut outcome = task
            .extract(&self.client)
            .map_err(|source| CrawlError::Extraction {
                url: task.url(),
                source,
            })?;

        let follow_ups = outcome.take_follow_ups();
        if !follow_ups.is_empty() {
            tracing::debug!(
                "Discovered {} follow-up tasks from {}",
                follow_ups.len(),
                task.url()
            );
        }

        self.response_queue.push(outcome);
        for follow_up in follow_ups {
            self.task_queue.push(follow_up);
        }
        Ok(())
    }

    /// Error/retry path: log a postmortem, reset, requeue within budget
    fn handle_failure(&self, mut task: ScrapeTask, error: CrawlError) {
        tracing::warn!("Error processing task {}: {}", task.url(), error);

        let postmortem = task.postmortem(&error);
        if let Err(log_error) = self.error_log.append(&postmortem) {
            tracing::error!(
                "Failed to write postmortem for {}: {}",
                task.url(),
                log_error
            );
        }

        let resets = task.reset(&self.client);
        if resets < self.max_retries {
            tracing::debug!("Requeueing {} after {} resets", task.url(), resets);
            self.task_queue.push(task);
        } else {
            tracing::warn!("Retry budget exhausted for {}, dropping task", task.url());
        }
    }
}
