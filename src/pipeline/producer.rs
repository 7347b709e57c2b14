//! Seed producers
//!
//! Producers drain a shared, shrinking list of seed descriptors and
//! materialize each one into a task on the queue. Several producers may run
//! against the same list; removal happens under the list's lock.

use crate::extract::Extractor;
use crate::pipeline::{Metadata, ScrapeTask, WorkQueue};
use reqwest::{Client, Method};
use std::sync::{Arc, Mutex};
use url::Url;

/// A request descriptor supplied by site-specific discovery code
pub struct SeedRequest {
    pub method: Method,
    pub url: String,
    pub metadata: Metadata,
    pub extractor: Arc<dyn Extractor>,
}

impl SeedRequest {
    /// Creates a descriptor with a metadata bag seeded from the method and URL
    pub fn new(method: Method, url: impl Into<String>, extractor: Arc<dyn Extractor>) -> Self {
        let url = url.into();
        let metadata = Metadata::new(method.as_str(), &url);
        Self {
            method,
            url,
            metadata,
            extractor,
        }
    }
}

/// Drains the seed list into the task queue
///
/// Each descriptor's final URL (base plus any `url_append` suffix) is
/// written back into its metadata before the task is enqueued, so retry and
/// redirect logic always see a canonical source URL. Descriptors with
/// unparseable URLs are skipped with a warning.
pub async fn produce_seeds(
    client: Client,
    queue: Arc<WorkQueue<ScrapeTask>>,
    seeds: Arc<Mutex<Vec<SeedRequest>>>,
) {
    loop {
        let seed = seeds.lock().unwrap().pop();
        let Some(mut seed) = seed else {
            break;
        };

        let target = match seed.metadata.url_append() {
            Some(suffix) => format!("{}{}", seed.url, suffix),
            None => seed.url.clone(),
        };
        let url = match Url::parse(&target) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Skipping seed with invalid URL {}: {}", target, e);
                continue;
            }
        };

        tracing::debug!("Producing {} request: {}", seed.method, target);
        seed.metadata.set("url", target);
        queue.push(ScrapeTask::new(
            client.clone(),
            seed.method.clone(),
            url,
            seed.metadata,
            seed.extractor,
        ));

        tokio::task::yield_now().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ScrapeOutcome;

    fn terminal_extractor() -> Arc<dyn Extractor> {
        Arc::new(|task: &ScrapeTask, _client: &Client| -> anyhow::Result<ScrapeOutcome> {
            Ok(ScrapeOutcome::terminal(task.metadata().clone()))
        })
    }

    #[tokio::test]
    async fn test_produces_one_task_per_seed() {
        let queue = Arc::new(WorkQueue::new());
        let seeds = Arc::new(Mutex::new(vec![
            SeedRequest::new(Method::GET, "https://example.com/a", terminal_extractor()),
            SeedRequest::new(Method::GET, "https://example.com/b", terminal_extractor()),
        ]));

        produce_seeds(Client::new(), queue.clone(), seeds.clone()).await;

        assert_eq!(queue.len(), 2);
        assert!(seeds.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_annotates_metadata_with_final_url() {
        let queue = Arc::new(WorkQueue::new());
        let mut seed = SeedRequest::new(
            Method::GET,
            "https://example.com/shares/acme",
            terminal_extractor(),
        );
        seed.metadata
            .set("url_append", "/financial-statements-and-reports");
        let seeds = Arc::new(Mutex::new(vec![seed]));

        produce_seeds(Client::new(), queue.clone(), seeds).await;

        let task = queue.pop().await;
        assert_eq!(
            task.metadata().url(),
            "https://example.com/shares/acme/financial-statements-and-reports"
        );
        assert_eq!(
            task.target_url().as_str(),
            "https://example.com/shares/acme/financial-statements-and-reports"
        );
    }

    #[tokio::test]
    async fn test_invalid_seed_url_is_skipped() {
        let queue = Arc::new(WorkQueue::new());
        let seeds = Arc::new(Mutex::new(vec![
            SeedRequest::new(Method::GET, "not a url", terminal_extractor()),
            SeedRequest::new(Method::GET, "https://example.com/ok", terminal_extractor()),
        ]));

        produce_seeds(Client::new(), queue.clone(), seeds).await;

        assert_eq!(queue.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_producers_share_one_list() {
        let queue = Arc::new(WorkQueue::new());
        let seeds: Vec<SeedRequest> = (0..30)
            .map(|i| {
                SeedRequest::new(
                    Method::GET,
                    format!("https://example.com/page/{}", i),
                    terminal_extractor(),
                )
            })
            .collect();
        let seeds = Arc::new(Mutex::new(seeds));

        let producers: Vec<_> = (0..3)
            .map(|_| {
                tokio::spawn(produce_seeds(
                    Client::new(),
                    queue.clone(),
                    seeds.clone(),
                ))
            })
            .collect();
        for producer in producers {
            producer.await.unwrap();
        }

        // Every seed is materialized exactly once
        assert_eq!(queue.len(), 30);
        assert_eq!(queue.pending(), 30);
    }
}
