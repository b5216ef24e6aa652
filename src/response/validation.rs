//! Fluent assertions over a captured response
//!
//! Every check returns `Result<Self, AssertionError>` so chains read
//! `response.validate().status_code(200)?.body_eq("status", "OK")?`.

use serde_json::Value;
use thiserror::Error;

use super::api_response::ApiResponse;
use super::path_extractor::{select, Selection};
use crate::api::http::truncate;

/// Marker used as the path of status-code assertions
pub const STATUS_CODE_PATH: &str = "<status code>";

/// A failed expectation, with enough of the response to diagnose it
#[derive(Debug, Clone, Error, PartialEq)]
#[error("Expected {expected} at '{path}' but was {actual} (status {status}, body: {body})")]
pub struct AssertionError {
    pub path: String,
    pub expected: String,
    pub actual: String,
    pub status: u16,
    /// First 500 characters of the response body
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct ValidatableResponse<'a> {
    response: &'a ApiResponse,
    root: String,
}

fn join_path(root: &str, path: &str) -> String {
    if root.is_empty() {
        path.to_string()
    } else if path.is_empty() {
        root.to_string()
    } else if path.starts_with('[') {
        format!("{}{}", root, path)
    } else {
        format!("{}.{}", root, path)
    }
}

/// Equality that treats 1 and 1.0 as the same number
fn json_eq(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| json_eq(x, y))
        }
        _ => actual == expected,
    }
}

impl<'a> ValidatableResponse<'a> {
    pub fn new(response: &'a ApiResponse) -> Self {
        Self {
            response,
            root: String::new(),
        }
    }

    /// Path prefix applied to every subsequent body check
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Narrow subsequent body checks to the subtree at `path` (absolute)
    pub fn root_path(mut self, path: &str) -> Self {
        self.root = path.to_string();
        self
    }

    /// Value at a path relative to the current root
    pub fn value(&self, path: &str) -> Value {
        select(self.response.body(), &join_path(&self.root, path)).to_value()
    }

    fn failure(&self, path: &str, expected: String, actual: String) -> AssertionError {
        AssertionError {
            path: path.to_string(),
            expected,
            actual,
            status: self.response.status_code(),
            body: truncate(self.response.text(), 500).to_string(),
        }
    }

    fn check_selection(
        self,
        path: &str,
        expected: impl FnOnce() -> String,
        predicate: impl FnOnce(&Selection<'_>, &Value) -> bool,
    ) -> Result<Self, AssertionError> {
        let full = join_path(&self.root, path);
        let selection = select(self.response.body(), &full);
        let actual = selection.to_value();

        if predicate(&selection, &actual) {
            Ok(self)
        } else {
            Err(self.failure(&full, expected(), actual.to_string()))
        }
    }

    fn check_body(
        self,
        path: &str,
        expected: impl FnOnce() -> String,
        predicate: impl FnOnce(&Value) -> bool,
    ) -> Result<Self, AssertionError> {
        self.check_selection(path, expected, |_, actual| predicate(actual))
    }

    pub fn status_code(self, expected: u16) -> Result<Self, AssertionError> {
        self.status_code_in(&[expected])
    }

    pub fn status_code_in(self, expected: &[u16]) -> Result<Self, AssertionError> {
        let status = self.response.status_code();
        if expected.contains(&status) {
            return Ok(self);
        }

        let expected = if expected.len() == 1 {
            format!("status {}", expected[0])
        } else {
            format!("status one of {:?}", expected)
        };
        Err(self.failure(STATUS_CODE_PATH, expected, status.to_string()))
    }

    pub fn body_eq(self, path: &str, expected: impl Into<Value>) -> Result<Self, AssertionError> {
        let expected = expected.into();
        let description = expected.to_string();
        self.check_body(path, || description, |actual| json_eq(actual, &expected))
    }

    /// Passes when the path resolves to something other than null, including
    /// an empty array. A multi-valued path must match at least one value.
    pub fn body_not_null(self, path: &str) -> Result<Self, AssertionError> {
        self.check_selection(
            path,
            || "a non-null value".to_string(),
            |selection, actual| {
                if selection.multi {
                    !selection.is_empty()
                } else {
                    !actual.is_null()
                }
            },
        )
    }

    pub fn body_null(self, path: &str) -> Result<Self, AssertionError> {
        self.check_body(path, || "null".to_string(), Value::is_null)
    }

    pub fn body_gte(self, path: &str, min: f64) -> Result<Self, AssertionError> {
        self.check_body(
            path,
            || format!("a number >= {}", min),
            |actual| actual.as_f64().is_some_and(|n| n >= min),
        )
    }

    pub fn body_lte(self, path: &str, max: f64) -> Result<Self, AssertionError> {
        self.check_body(
            path,
            || format!("a number <= {}", max),
            |actual| actual.as_f64().is_some_and(|n| n <= max),
        )
    }

    pub fn body_has_size(self, path: &str, size: usize) -> Result<Self, AssertionError> {
        self.check_body(
            path,
            || format!("a collection of size {}", size),
            |actual| match actual {
                Value::Array(items) => items.len() == size,
                Value::Object(map) => map.len() == size,
                _ => false,
            },
        )
    }

    /// Passes when the value at `path`, or any element of it, equals `expected`
    pub fn body_contains(
        self,
        path: &str,
        expected: impl Into<Value>,
    ) -> Result<Self, AssertionError> {
        let expected = expected.into();
        let description = format!("a collection containing {}", expected);
        self.check_body(
            path,
            || description,
            |actual| match actual {
                Value::Array(items) => items.iter().any(|item| json_eq(item, &expected)),
                other => json_eq(other, &expected),
            },
        )
    }
}
