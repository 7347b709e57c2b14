//! Pluggable extraction interface
//!
//! Site-specific extraction logic lives behind the `Extractor` trait and is
//! injected per seed request rather than baked into the pipeline. An
//! extractor turns one completed task into a `ScrapeOutcome`, and may build
//! follow-up tasks with the shared client to expand the crawl.

use crate::pipeline::{Payload, ScrapeOutcome, ScrapeTask};
use anyhow::Context;
use reqwest::Client;

/// Turns a completed task into an outcome, possibly discovering further work
///
/// Implementations are invoked synchronously by the request worker once a
/// fetch succeeds. They must not mutate the task's own metadata bag; clone
/// it before augmenting. The shared client may be used to prepare follow-up
/// tasks but extraction itself must not block on it.
pub trait Extractor: Send + Sync {
    fn extract(&self, task: &ScrapeTask, client: &Client) -> anyhow::Result<ScrapeOutcome>;
}

/// Any matching closure is an extractor
impl<F> Extractor for F
where
    F: Fn(&ScrapeTask, &Client) -> anyhow::Result<ScrapeOutcome> + Send + Sync,
{
    fn extract(&self, task: &ScrapeTask, client: &Client) -> anyhow::Result<ScrapeOutcome> {
        self(task, client)
    }
}

/// Minimal built-in extractor: the response body becomes the payload
///
/// Used by the CLI for seeds whose target URL is the document itself; no
/// follow-up work is ever discovered.
pub struct DocumentExtractor;

impl Extractor for DocumentExtractor {
    fn extract(&self, task: &ScrapeTask, _client: &Client) -> anyhow::Result<ScrapeOutcome> {
        let response = task
            .response()
            .context("extractor invoked before the task was sent")?;
        let metadata = task.metadata().clone();
        let payload = Payload::Text(response.text().into_owned());
        Ok(ScrapeOutcome::new(metadata, Some(payload), None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{FetchedResponse, Metadata};
    use reqwest::header::HeaderMap;
    use reqwest::{Method, StatusCode};
    use std::sync::Arc;
    use url::Url;

    fn sent_task(body: &str) -> ScrapeTask {
        let url = Url::parse("https://example.com/report").unwrap();
        let mut metadata = Metadata::new("GET", url.as_str());
        metadata.set_share("Acme Plc", "ACM");
        metadata.set("document_type", "annual_report");

        let mut task = ScrapeTask::new(
            Client::new(),
            Method::GET,
            url.clone(),
            metadata,
            Arc::new(DocumentExtractor),
        );
        task.attach_response(FetchedResponse::new(
            StatusCode::OK,
            HeaderMap::new(),
            Method::GET,
            url,
            body.as_bytes().to_vec(),
        ));
        task
    }

    #[test]
    fn test_document_extractor_forwards_body() {
        let task = sent_task("the full report text");
        let outcome = DocumentExtractor.extract(&task, &Client::new()).unwrap();

        assert!(outcome.has_payload());
        let record = outcome.dataset_record().unwrap();
        assert_eq!(record.doc.as_deref(), Some("the full report text"));
        assert!(outcome.follow_ups().is_none());
    }

    #[test]
    fn test_document_extractor_requires_sent_task() {
        let url = Url::parse("https://example.com/report").unwrap();
        let task = ScrapeTask::new(
            Client::new(),
            Method::GET,
            url.clone(),
            Metadata::new("GET", url.as_str()),
            Arc::new(DocumentExtractor),
        );

        assert!(DocumentExtractor.extract(&task, &Client::new()).is_err());
    }

    #[test]
    fn test_closures_are_extractors() {
        let extractor = |task: &ScrapeTask, _client: &Client| -> anyhow::Result<ScrapeOutcome> {
            Ok(ScrapeOutcome::terminal(task.metadata().clone()))
        };
        let task = sent_task("ignored");
        let outcome = extractor.extract(&task, &Client::new()).unwrap();
        assert!(!outcome.has_payload());
    }

    #[test]
    fn test_extractor_leaves_task_metadata_untouched() {
        let task = sent_task("body");
        let outcome = DocumentExtractor.extract(&task, &Client::new()).unwrap();

        // The outcome carries a copy; the task's own bag is unchanged
        assert_eq!(task.metadata().share_field("title"), Some("Acme Plc"));
        assert_eq!(outcome.metadata().share_field("title"), Some("Acme Plc"));
    }
}
