//! Blocking HTTP transport
//!
//! Every client sends its requests through the [`Transport`] trait. The
//! production implementation wraps a `reqwest` blocking client; tests plug in
//! a scripted transport instead.

use anyhow::{Context, Result};
use reqwest::blocking::{multipart, Client};
use reqwest::Method;
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Request body variants understood by the transport
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(Value),
    /// File uploaded as a multipart form with a single `file` part
    File(PathBuf),
}

/// A fully resolved request: absolute URL including the query string
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub content_type: Option<String>,
    pub body: RequestBody,
}

impl ApiRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            content_type: None,
            body: RequestBody::Empty,
        }
    }

    pub fn with_json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.body = RequestBody::File(path.into());
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// What the transport captured from the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Sends one request and blocks until the full response is read.
///
/// Only transport-level failures are errors; any HTTP status, including
/// 4xx/5xx, is a successful `RawResponse`.
pub trait Transport: Send + Sync {
    fn send(&self, request: &ApiRequest) -> Result<RawResponse>;
}

/// Cut a body down for logging and diagnostics without splitting a char
pub(crate) fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// `reqwest` blocking transport
pub struct HttpTransport {
    http_client: Client,
}

impl HttpTransport {
    /// Create a transport whose requests time out after `timeout`
    pub fn new(timeout: Duration) -> Result<Self> {
        debug!("Creating HTTP transport with timeout {:?}", timeout);
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { http_client })
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &ApiRequest) -> Result<RawResponse> {
        let mut builder = self
            .http_client
            .request(request.method.clone(), &request.url);

        match &request.body {
            RequestBody::Empty => {
                if let Some(content_type) = &request.content_type {
                    builder = builder.header("Content-Type", content_type);
                }
            }
            RequestBody::Json(body) => {
                trace!("Request body: {}", truncate(&body.to_string(), 2000));
                let content_type = request
                    .content_type
                    .as_deref()
                    .unwrap_or("application/json");
                builder = builder
                    .header("Content-Type", content_type)
                    .body(serde_json::to_vec(body)?);
            }
            RequestBody::File(path) => {
                // reqwest sets the multipart boundary header itself
                let form = multipart::Form::new()
                    .file("file", path)
                    .with_context(|| format!("Failed to read upload file {}", path.display()))?;
                builder = builder.multipart(form);
            }
        }

        trace!("Sending {} request to {}", request.method, request.url);
        let response = builder
            .send()
            .with_context(|| format!("{} {} failed", request.method, request.url))?;

        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let text = response.text()?;

        debug!("Response status: {}", status);
        trace!("Response body (first 2000 chars): {}", truncate(&text, 2000));

        if status.is_server_error() {
            warn!(
                "Request failed: status={}, body={}",
                status,
                truncate(&text, 500)
            );
        }

        Ok(RawResponse {
            status: status.as_u16(),
            headers,
            body: text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;
    use std::io::Write;

    fn transport() -> HttpTransport {
        HttpTransport::new(Duration::from_secs(5)).expect("http transport")
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé");
        assert_eq!(truncate("abc", 10), "abc");
        assert_eq!(truncate("", 3), "");
    }

    #[test]
    fn raw_response_header_lookup_is_case_insensitive() {
        let mut raw = RawResponse::new(200, "{}");
        raw.headers
            .push(("Content-Type".to_string(), "application/json".to_string()));

        assert_eq!(raw.header("content-type"), Some("application/json"));
        assert_eq!(raw.header("location"), None);
    }

    #[test]
    fn sends_json_body_and_captures_response() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/api/tracker")
            .match_query(Matcher::UrlEncoded("async".into(), "false".into()))
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(json!({"trackedEntities": []})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status":"OK"}"#)
            .create();

        let request = ApiRequest::new(
            Method::POST,
            format!("{}/api/tracker?async=false", server.url()),
        )
        .with_json(json!({"trackedEntities": []}));

        let raw = transport().send(&request).expect("response");

        mock.assert();
        assert_eq!(raw.status, 200);
        assert_eq!(raw.body, r#"{"status":"OK"}"#);
        assert_eq!(raw.header("Content-Type"), Some("application/json"));
    }

    #[test]
    fn error_status_is_not_a_transport_error() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/api/tracker/jobs/missing")
            .with_status(404)
            .with_body(r#"{"httpStatusCode":404}"#)
            .create();

        let request = ApiRequest::new(
            Method::GET,
            format!("{}/api/tracker/jobs/missing", server.url()),
        );
        let raw = transport().send(&request).expect("404 is still a response");

        mock.assert();
        assert_eq!(raw.status, 404);
    }

    #[test]
    fn uploads_file_as_multipart() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, r#"{{"events": []}}"#).expect("write payload");

        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/api/tracker")
            .match_header(
                "content-type",
                Matcher::Regex("^multipart/form-data".to_string()),
            )
            .match_body(Matcher::Regex(r#"\{"events": \[\]\}"#.to_string()))
            .with_status(200)
            .with_body("{}")
            .create();

        let request = ApiRequest::new(Method::POST, format!("{}/api/tracker", server.url()))
            .with_file(file.path());
        let raw = transport().send(&request).expect("response");

        mock.assert();
        assert_eq!(raw.status, 200);
    }

    #[test]
    fn missing_upload_file_is_an_error() {
        let request = ApiRequest::new(Method::POST, "http://127.0.0.1:9/api/tracker")
            .with_file("/definitely/not/here.json");

        let err = transport().send(&request).expect_err("missing file");
        assert!(err.to_string().contains("Failed to read upload file"));
    }
}
