//! Response writer: persists payload-bearing outcomes
//!
//! Writers drain the response queue and append one dataset line per
//! payload-bearing outcome. Payload-less outcomes (visits to listing or
//! redirect hubs) are marked done and discarded. A serialization failure is
//! logged as a postmortem and never crashes the writer loop.

use crate::output::JsonlAppender;
use crate::pipeline::{ScrapeOutcome, WorkQueue};
use std::sync::Arc;
use std::time::Duration;

/// Pulls outcomes from the response queue and persists them
pub struct ResponseWriter {
    id: usize,
    response_queue: Arc<WorkQueue<ScrapeOutcome>>,
    dataset: Arc<JsonlAppender>,
    error_log: Arc<JsonlAppender>,
    idle_sleep: Duration,
}

impl ResponseWriter {
    pub fn new(
        id: usize,
        response_queue: Arc<WorkQueue<ScrapeOutcome>>,
        dataset: Arc<JsonlAppender>,
        error_log: Arc<JsonlAppender>,
        idle_sleep: Duration,
    ) -> Self {
        Self {
            id,
            response_queue,
            dataset,
            error_log,
            idle_sleep,
        }
    }

    /// Runs until cancelled by the orchestrator
    pub async fn run(self) {
        tracing::debug!(writer = self.id, "Response writer started");
        loop {
            let outcome = self.response_queue.pop().await;
            self.persist(&outcome);
            self.response_queue.task_done();
            tokio::time::sleep(self.idle_sleep).await;
        }
    }

    fn persist(&self, outcome: &ScrapeOutcome) {
        if !outcome.has_payload() {
            tracing::debug!(
                "Skipping payload-less outcome for {}",
                outcome.metadata().url()
            );
            return;
        }

        match outcome.dataset_record() {
            Ok(record) => {
                if let Err(error) = self.dataset.append(&record) {
                    tracing::error!(
                        "Failed to persist record for {}: {}",
                        outcome.metadata().url(),
                        error
                    );
                    let _ = self.error_log.append(&outcome.postmortem(&error));
                } else {
                    tracing::debug!("Persisted document from {}", outcome.metadata().url());
                }
            }
            Err(error) => {
                tracing::warn!(
                    "Could not serialize outcome for {}: {}",
                    outcome.metadata().url(),
                    error
                );
                if let Err(log_error) = self.error_log.append(&outcome.postmortem(&error)) {
                    tracing::error!("Failed to write postmortem: {}", log_error);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Metadata;
    use tempfile::tempdir;

    fn test_writer(dir: &std::path::Path) -> ResponseWriter {
        ResponseWriter::new(
            0,
            Arc::new(WorkQueue::new()),
            Arc::new(JsonlAppender::open(&dir.join("data.jsonl")).unwrap()),
            Arc::new(JsonlAppender::open(&dir.join("error.jsonl")).unwrap()),
            Duration::ZERO,
        )
    }

    fn report_metadata() -> Metadata {
        let mut metadata = Metadata::new("GET", "https://example.com/report");
        metadata.set_share("Acme Plc", "ACM");
        metadata.set("document_type", "annual_report");
        metadata.set("year", 2023);
        metadata
    }

    #[test]
    fn test_persists_payload_bearing_outcome() {
        let dir = tempdir().unwrap();
        let writer = test_writer(dir.path());

        writer.persist(&ScrapeOutcome::terminal(report_metadata()).with_text("hello"));

        let data = std::fs::read_to_string(dir.path().join("data.jsonl")).unwrap();
        let record: serde_json::Value = serde_json::from_str(data.lines().next().unwrap()).unwrap();
        assert_eq!(record["title"], "Acme Plc");
        assert_eq!(record["ticker"], "ACM");
        assert_eq!(record["year"], 2023);
        assert_eq!(record["document_type"], "annual_report");
        assert_eq!(record["doc"], "hello");
    }

    #[test]
    fn test_skips_payload_less_outcome() {
        let dir = tempdir().unwrap();
        let writer = test_writer(dir.path());

        writer.persist(&ScrapeOutcome::terminal(report_metadata()));

        let data = std::fs::read_to_string(dir.path().join("data.jsonl")).unwrap();
        assert!(data.is_empty());
    }

    #[test]
    fn test_serialization_failure_is_logged_not_fatal() {
        let dir = tempdir().unwrap();
        let writer = test_writer(dir.path());

        // Payload present but firm identity missing
        let metadata = Metadata::new("GET", "https://example.com/report");
        writer.persist(&ScrapeOutcome::terminal(metadata).with_text("orphan"));

        let data = std::fs::read_to_string(dir.path().join("data.jsonl")).unwrap();
        assert!(data.is_empty());

        let errors = std::fs::read_to_string(dir.path().join("error.jsonl")).unwrap();
        assert_eq!(errors.lines().count(), 1);
        let postmortem: serde_json::Value =
            serde_json::from_str(errors.lines().next().unwrap()).unwrap();
        assert!(postmortem["response"].is_null());
        assert_eq!(postmortem["metadata"]["url"], "https://example.com/report");
    }
}
