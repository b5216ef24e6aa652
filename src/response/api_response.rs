//! Captured HTTP response with path-based extraction

use serde_json::Value;
use tracing::trace;

use super::path_extractor::{extract_by_path, extract_first_string, extract_list, value_to_string};
use super::validation::ValidatableResponse;
use crate::api::http::{truncate, RawResponse};

/// Immutable capture of one HTTP exchange.
///
/// The body is parsed once; bodies that are empty or not JSON parse to
/// `Value::Null` and stay available as text through [`ApiResponse::text`].
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    raw: RawResponse,
    body: Value,
}

impl ApiResponse {
    pub fn new(raw: RawResponse) -> Self {
        let body = if raw.body.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&raw.body).unwrap_or_else(|e| {
                trace!(
                    "Response body is not JSON ({}): {}",
                    e,
                    truncate(&raw.body, 200)
                );
                Value::Null
            })
        };

        Self { raw, body }
    }

    pub fn status_code(&self) -> u16 {
        self.raw.status
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    /// Body as received, before JSON parsing
    pub fn text(&self) -> &str {
        &self.raw.body
    }

    pub fn raw(&self) -> &RawResponse {
        &self.raw
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.raw.header(name)
    }
}

/// Read-only path queries shared by every response wrapper
pub trait PathQuery {
    fn response(&self) -> &ApiResponse;

    fn status_code(&self) -> u16 {
        self.response().status_code()
    }

    fn body(&self) -> &Value {
        self.response().body()
    }

    /// First leaf value at `path` as a string
    fn extract(&self, path: &str) -> Option<String> {
        extract_first_string(self.body(), path)
    }

    /// Raw value at `path`; multi-valued paths yield an array
    fn extract_value(&self, path: &str) -> Value {
        extract_by_path(self.body(), path)
    }

    /// Every value at `path`, empty when nothing matches
    fn extract_list(&self, path: &str) -> Vec<Value> {
        extract_list(self.body(), path)
    }

    fn extract_strings(&self, path: &str) -> Vec<String> {
        self.extract_list(path)
            .iter()
            .filter_map(value_to_string)
            .collect()
    }

    /// Identifier of a freshly created object.
    ///
    /// Import summaries nest it under `response.uid`; plain object payloads
    /// carry `uid` or `id` at the top level.
    fn extract_uid(&self) -> Option<String> {
        ["response.uid", "uid", "id"]
            .iter()
            .find_map(|path| self.extract(path))
    }

    fn validate(&self) -> ValidatableResponse<'_> {
        ValidatableResponse::new(self.response())
    }
}

impl PathQuery for ApiResponse {
    fn response(&self) -> &ApiResponse {
        self
    }
}
