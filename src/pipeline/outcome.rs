//! Outcome record produced by extraction
//!
//! Wraps whatever an extractor pulled out of a successful response: a
//! metadata bag (possibly augmented with extracted facts), an optional
//! payload, and any follow-up tasks discovered along the way. An outcome
//! with no follow-ups is terminal; an outcome with no payload records a
//! visited listing or redirect hub and is never persisted.

use crate::pipeline::{Metadata, Postmortem, ScrapeTask};
use crate::MetadataError;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Extracted payload, textual or binary
#[derive(Debug, Clone)]
pub enum Payload {
    Text(String),
    Binary(Vec<u8>),
}

/// Flat record appended to the output dataset, one JSON line per document
#[derive(Debug, Clone, Serialize)]
pub struct DatasetRecord {
    pub title: String,
    pub ticker: String,
    pub year: Option<Value>,
    pub document_type: String,
    pub doc: Option<String>,
}

/// The outcome of one completed extraction
pub struct ScrapeOutcome {
    metadata: Metadata,
    payload: Option<Payload>,
    follow_ups: Option<Vec<ScrapeTask>>,
}

impl ScrapeOutcome {
    /// Creates an outcome with the given payload and follow-up tasks
    ///
    /// The metadata bag is copied by the caller handing it in; a missing
    /// `method` defaults to GET.
    pub fn new(
        mut metadata: Metadata,
        payload: Option<Payload>,
        follow_ups: Option<Vec<ScrapeTask>>,
    ) -> Self {
        metadata.set_if_absent("method", "GET");
        Self {
            metadata,
            payload,
            follow_ups,
        }
    }

    /// Creates a terminal outcome: no payload, no further work
    pub fn terminal(metadata: Metadata) -> Self {
        Self::new(metadata, None, None)
    }

    /// Attaches a textual payload
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.payload = Some(Payload::Text(text.into()));
        self
    }

    /// Attaches discovered follow-up tasks
    pub fn with_follow_ups(mut self, tasks: Vec<ScrapeTask>) -> Self {
        self.follow_ups = Some(tasks);
        self
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn payload(&self) -> Option<&Payload> {
        self.payload.as_ref()
    }

    pub fn has_payload(&self) -> bool {
        self.payload.is_some()
    }

    pub fn follow_ups(&self) -> Option<&[ScrapeTask]> {
        self.follow_ups.as_deref()
    }

    /// Removes and returns the discovered follow-up tasks
    pub fn take_follow_ups(&mut self) -> Vec<ScrapeTask> {
        self.follow_ups.take().unwrap_or_default()
    }

    /// Builds the flat dataset row for this outcome
    ///
    /// # Errors
    ///
    /// Returns `MetadataError` when the firm identity or document-type tag
    /// is missing from the metadata bag.
    pub fn dataset_record(&self) -> Result<DatasetRecord, MetadataError> {
        let title = self
            .metadata
            .share_field("title")
            .ok_or(MetadataError::MissingKey("share.title"))?;
        let ticker = self
            .metadata
            .share_field("ticker")
            .ok_or(MetadataError::MissingKey("share.ticker"))?;
        let document_type = self
            .metadata
            .document_type()
            .ok_or(MetadataError::MissingKey("document_type"))?;

        let doc = self.payload.as_ref().map(|payload| match payload {
            Payload::Text(text) => text.clone(),
            Payload::Binary(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        });

        Ok(DatasetRecord {
            title: title.to_string(),
            ticker: ticker.to_string(),
            year: self.metadata.year().cloned(),
            document_type: document_type.to_string(),
            doc,
        })
    }

    /// Produces a loggable failure record for this outcome
    pub fn postmortem(&self, exception: &dyn fmt::Display) -> Postmortem {
        Postmortem {
            response: None,
            metadata: self.metadata.clone(),
            resets: 0,
            exception: exception.to_string(),
        }
    }
}

impl fmt::Debug for ScrapeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScrapeOutcome")
            .field("url", &self.metadata.url())
            .field("has_payload", &self.has_payload())
            .field(
                "follow_ups",
                &self.follow_ups.as_ref().map(Vec::len).unwrap_or(0),
            )
            .finish()
    }
}
