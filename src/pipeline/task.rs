//! Task record: one unit of crawl work
//!
//! A `ScrapeTask` pairs a pending-or-completed HTTP exchange with a metadata
//! bag and the extractor that will consume the response. Tasks are owned by
//! whichever queue currently holds them; only the worker processing a task
//! mutates it (response attached after send, counter bumped on reset).

use crate::extract::Extractor;
use crate::pipeline::Metadata;
use crate::{CrawlError, Result};
use reqwest::header::{HeaderMap, LOCATION};
use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use url::Url;

/// Method and URL of an exchange that has not been sent yet
#[derive(Debug, Clone)]
struct PreparedRequest {
    method: Method,
    url: Url,
}

/// A completed HTTP exchange with its body eagerly buffered
///
/// Bodies are read up front so extractors can work synchronously against
/// the full response.
#[derive(Debug, Clone)]
pub struct FetchedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// Method of the request that produced this response
    pub request_method: Method,
    /// URL of the request that produced this response
    pub request_url: Url,
    body: Vec<u8>,
}

impl FetchedResponse {
    /// Builds a response record directly, bypassing the network
    ///
    /// Useful for exercising extractors against canned responses.
    pub fn new(
        status: StatusCode,
        headers: HeaderMap,
        request_method: Method,
        request_url: Url,
        body: Vec<u8>,
    ) -> Self {
        Self {
            status,
            headers,
            request_method,
            request_url,
            body,
        }
    }

    /// Raw response body
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Response body decoded as UTF-8, lossily
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// The Location header, if the server sent one
    pub fn location(&self) -> Option<&str> {
        self.headers.get(LOCATION).and_then(|v| v.to_str().ok())
    }

    /// Classifies the response by status code
    pub fn disposition(&self) -> Disposition {
        if self.status.is_redirection() {
            Disposition::Redirect
        } else if self.status.is_success() {
            Disposition::Success
        } else {
            Disposition::Failure(self.status)
        }
    }
}

/// Status-code classification of a completed exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// 3xx: follow the Location header with a fresh task
    Redirect,
    /// 2xx: hand the response to the extractor
    Success,
    /// Anything else: the error/retry path
    Failure(StatusCode),
}

/// Forensic record written to the error log when a task fails
#[derive(Debug, Clone, Serialize)]
pub struct Postmortem {
    /// Status code of the last response, if one was received
    pub response: Option<u16>,
    pub metadata: Metadata,
    pub resets: u32,
    pub exception: String,
}

/// One unit of crawl work
pub struct ScrapeTask {
    metadata: Metadata,
    client: Client,
    prepared: PreparedRequest,
    response: Option<FetchedResponse>,
    extractor: Arc<dyn Extractor>,
    resets: u32,
}

impl ScrapeTask {
    /// Creates a task for the given exchange
    ///
    /// The metadata bag is guaranteed to carry `url` and `method` afterwards;
    /// missing entries are filled in from the exchange itself.
    pub fn new(
        client: Client,
        method: Method,
        url: Url,
        mut metadata: Metadata,
        extractor: Arc<dyn Extractor>,
    ) -> Self {
        metadata.set_if_absent("url", url.as_str());
        metadata.set_if_absent("method", method.as_str());
        Self {
            metadata,
            client,
            prepared: PreparedRequest { method, url },
            response: None,
            extractor,
            resets: 0,
        }
    }

    /// Executes the underlying HTTP exchange and stores the response
    ///
    /// Calling this again re-issues a fresh request against the current
    /// prepared exchange. Network-level failures (DNS, connection, TLS,
    /// timeout) map to `CrawlError::Transport`.
    pub async fn send(&mut self) -> Result<&FetchedResponse> {
        let method = self.prepared.method.clone();
        let url = self.prepared.url.clone();

        let response = self
            .client
            .request(method.clone(), url.clone())
            .send()
            .await
            .map_err(|e| CrawlError::Transport {
                url: url.to_string(),
                source: e,
            })?;

        let status = response.status();
        let headers = response.headers().clone();
        let request_url = response.url().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| CrawlError::Transport {
                url: url.to_string(),
                source: e,
            })?
            .to_vec();

        Ok(self.response.insert(FetchedResponse {
            status,
            headers,
            request_method: method,
            request_url,
            body,
        }))
    }

    /// Discards the current exchange and rebuilds a fresh one
    ///
    /// The method and URL come from the last response's originating request,
    /// or from the metadata bag if nothing has been sent yet. Increments and
    /// returns the reset counter; the caller decides whether to requeue
    /// against its retry budget.
    pub fn reset(&mut self, client: &Client) -> u32 {
        self.prepared = match &self.response {
            Some(r) => PreparedRequest {
                method: r.request_method.clone(),
                url: r.request_url.clone(),
            },
            None => PreparedRequest {
                method: Method::from_bytes(self.metadata.method().as_bytes())
                    .unwrap_or_else(|_| self.prepared.method.clone()),
                url: Url::parse(self.metadata.url())
                    .unwrap_or_else(|_| self.prepared.url.clone()),
            },
        };
        self.client = client.clone();
        self.resets += 1;
        self.resets
    }

    /// Produces a loggable failure record
    ///
    /// Never fails; falls back to partial information when no response was
    /// received.
    pub fn postmortem(&self, exception: &dyn fmt::Display) -> Postmortem {
        Postmortem {
            response: self.response.as_ref().map(|r| r.status.as_u16()),
            metadata: self.metadata.clone(),
            resets: self.resets,
            exception: exception.to_string(),
        }
    }

    /// Best-effort URL of this task
    ///
    /// Prefers the last response's request URL (which reflects any redirect
    /// chain), falling back to the metadata bag.
    pub fn url(&self) -> String {
        match &self.response {
            Some(r) => r.request_url.to_string(),
            None => self.metadata.url().to_string(),
        }
    }

    /// URL of the prepared exchange, used for politeness keying
    pub fn target_url(&self) -> &Url {
        &self.prepared.url
    }

    /// Runs this task's extractor against its completed response
    pub fn extract(&self, client: &Client) -> anyhow::Result<crate::pipeline::ScrapeOutcome> {
        self.extractor.extract(self, client)
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn response(&self) -> Option<&FetchedResponse> {
        self.response.as_ref()
    }

    /// Attaches a completed response, as `send` would
    ///
    /// Intended for exercising extractors against canned responses.
    pub fn attach_response(&mut self, response: FetchedResponse) {
        self.response = Some(response);
    }

    pub fn extractor(&self) -> Arc<dyn Extractor> {
        Arc::clone(&self.extractor)
    }

    pub fn resets(&self) -> u32 {
        self.resets
    }
}

impl fmt::Debug for ScrapeTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScrapeTask")
            .field("url", &self.url())
            .field("method", &self.prepared.method)
            .field("resets", &self.resets)
            .field("sent", &self.response.is_some())
            .finish()
    }
}
