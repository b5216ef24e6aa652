//! Generic resource client
//!
//! Issues one blocking request per call against `{base_uri}{endpoint}` and
//! wraps whatever comes back in an [`ApiResponse`]. HTTP error statuses are
//! not errors here; only transport failures are.

use anyhow::{anyhow, Context, Result};
use reqwest::Method;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use super::http::{ApiRequest, Transport};
use super::query_params::QueryParams;
use crate::config::ClientConfig;
use crate::response::{ApiResponse, PathQuery};

pub const CONTENT_TYPE_JSON: &str = "application/json";

#[derive(Clone)]
pub struct RestApiActions {
    transport: Arc<dyn Transport>,
    base_uri: String,
    endpoint: String,
}

impl std::fmt::Debug for RestApiActions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestApiActions")
            .field("base_uri", &self.base_uri)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl RestApiActions {
    /// Client for `endpoint` (e.g. "/tracker") under the configured base URI
    pub fn new(transport: Arc<dyn Transport>, config: &ClientConfig, endpoint: &str) -> Self {
        Self {
            transport,
            base_uri: config.base_uri.trim_end_matches('/').to_string(),
            endpoint: endpoint.to_string(),
        }
    }

    /// Point this instance at another server without touching the config
    pub fn with_base_uri(mut self, base_uri: &str) -> Self {
        debug!("Overriding base URI for {}: {}", self.endpoint, base_uri);
        self.base_uri = base_uri.trim_end_matches('/').to_string();
        self
    }

    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Absolute URL for a resource below the endpoint.
    ///
    /// Resources without a leading '/' or '?' are joined with '/'. A resource
    /// that already carries a query string gets the params appended with '&'.
    pub fn url(&self, resource: &str, params: Option<&QueryParams>) -> String {
        let mut url = format!("{}{}", self.base_uri, self.endpoint);

        if !resource.is_empty() {
            if !resource.starts_with('/') && !resource.starts_with('?') {
                url.push('/');
            }
            url.push_str(resource);
        }

        if let Some(params) = params.filter(|p| !p.is_empty()) {
            let query = params.build();
            if url.contains('?') {
                url.push('&');
                url.push_str(&query[1..]);
            } else {
                url.push_str(&query);
            }
        }

        url
    }

    fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        debug!("{} {}", request.method, request.url);
        let raw = self.transport.send(&request)?;
        debug!("{} {} -> {}", request.method, request.url, raw.status);
        Ok(ApiResponse::new(raw))
    }

    pub fn get(&self, resource: &str, params: Option<&QueryParams>) -> Result<ApiResponse> {
        self.send(ApiRequest::new(Method::GET, self.url(resource, params)))
    }

    pub fn delete(&self, resource: &str) -> Result<ApiResponse> {
        self.send(ApiRequest::new(Method::DELETE, self.url(resource, None)))
    }

    /// PUT `body` to a resource; JSON unless another content type is given
    pub fn update<B>(
        &self,
        resource: &str,
        body: &B,
        content_type: Option<&str>,
    ) -> Result<ApiResponse>
    where
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_value(body).context("Failed to serialize request body")?;
        let request = ApiRequest::new(Method::PUT, self.url(resource, None))
            .with_json(body)
            .with_content_type(content_type.unwrap_or(CONTENT_TYPE_JSON));
        self.send(request)
    }

    /// POST a JSON body
    pub fn post<B>(
        &self,
        resource: &str,
        body: &B,
        params: Option<&QueryParams>,
    ) -> Result<ApiResponse>
    where
        B: Serialize + ?Sized,
    {
        self.post_with_content_type(resource, CONTENT_TYPE_JSON, body, params)
    }

    pub fn post_with_content_type<B>(
        &self,
        resource: &str,
        content_type: &str,
        body: &B,
        params: Option<&QueryParams>,
    ) -> Result<ApiResponse>
    where
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_value(body).context("Failed to serialize request body")?;
        let request = ApiRequest::new(Method::POST, self.url(resource, params))
            .with_json(body)
            .with_content_type(content_type);
        self.send(request)
    }

    /// POST a file to the endpoint itself as a multipart upload
    pub fn post_file(&self, file: &Path, params: Option<&QueryParams>) -> Result<ApiResponse> {
        self.send(ApiRequest::new(Method::POST, self.url("", params)).with_file(file))
    }

    /// POST `body` to the endpoint, require 200 or 201 and return the new uid
    pub fn create<B>(&self, body: &B) -> Result<String>
    where
        B: Serialize + ?Sized,
    {
        let response = self.post("", body, None)?;
        response.validate().status_code_in(&[200, 201])?;

        response.extract_uid().ok_or_else(|| {
            anyhow!(
                "Created entity at {} but the response carries no uid",
                self.url("", None)
            )
        })
    }
}
