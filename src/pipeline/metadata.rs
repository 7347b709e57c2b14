//! Metadata bag carried by every task and outcome
//!
//! An open, string-keyed map of ancillary fields (target URL, HTTP method,
//! document-type tag, firm identity, redirect bookkeeping). The required
//! subset (`url`, `method`) is validated at construction time so failures
//! surface where the bag is built, not deep inside a worker.

use crate::MetadataError;
use serde::Serialize;
use serde_json::{Map, Value};

/// Open metadata map attached to tasks and outcomes
///
/// Cloning produces a deep copy; a bag handed to a new task never aliases
/// its predecessor's fields.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct Metadata {
    fields: Map<String, Value>,
}

impl Metadata {
    /// Creates a metadata bag with the required `method` and `url` fields
    pub fn new(method: &str, url: &str) -> Self {
        let mut fields = Map::new();
        fields.insert("method".to_string(), Value::String(method.to_string()));
        fields.insert("url".to_string(), Value::String(url.to_string()));
        Self { fields }
    }

    /// Builds a metadata bag from raw fields, validating the required subset
    ///
    /// # Errors
    ///
    /// Returns `MetadataError` if `url` or `method` is absent, empty, or not
    /// a string.
    pub fn from_fields(fields: Map<String, Value>) -> Result<Self, MetadataError> {
        let bag = Self { fields };
        for key in ["url", "method"] {
            match bag.fields.get(key) {
                Some(Value::String(s)) if !s.is_empty() => {}
                Some(Value::String(_)) | None => return Err(MetadataError::MissingKey(key)),
                Some(_) => return Err(MetadataError::NotAString { key }),
            }
        }
        Ok(bag)
    }

    /// Gets a raw field value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Gets a field as a string slice
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// Sets a field, replacing any existing value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Sets a field only if it is not already present
    pub fn set_if_absent(&mut self, key: &str, value: impl Into<Value>) {
        if !self.fields.contains_key(key) {
            self.fields.insert(key.to_string(), value.into());
        }
    }

    /// The canonical target URL
    pub fn url(&self) -> &str {
        self.get_str("url").unwrap_or_default()
    }

    /// The HTTP method
    pub fn method(&self) -> &str {
        self.get_str("method").unwrap_or_default()
    }

    /// Suffix appended to the target URL when a redirect is followed
    pub fn url_append(&self) -> Option<&str> {
        self.get_str("url_append")
    }

    /// Free-form document-type tag
    pub fn document_type(&self) -> Option<&str> {
        self.get_str("document_type")
    }

    /// Reporting year, if tagged
    pub fn year(&self) -> Option<&Value> {
        self.fields.get("year")
    }

    /// Reads a field of the nested `share` object (firm identity)
    pub fn share_field(&self, name: &str) -> Option<&str> {
        self.fields
            .get("share")
            .and_then(|share| share.get(name))
            .and_then(Value::as_str)
    }

    /// Sets the nested `share` object with the firm's title and ticker
    pub fn set_share(&mut self, title: &str, ticker: &str) {
        let mut share = Map::new();
        share.insert("title".to_string(), Value::String(title.to_string()));
        share.insert("ticker".to_string(), Value::String(ticker.to_string()));
        self.fields.insert("share".to_string(), Value::Object(share));
    }
}
