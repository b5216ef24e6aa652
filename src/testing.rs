//! Test doubles shared by the unit tests

use anyhow::{anyhow, Result};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

use crate::api::http::{ApiRequest, RawResponse, Transport};

/// Install a test-writer subscriber once; later calls are no-ops
pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Transport that replays queued responses in order and records every request.
///
/// Once the queue is empty the `always` response is repeated; without one,
/// further requests fail like a refused connection.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    queue: Mutex<VecDeque<RawResponse>>,
    fallback: Option<RawResponse>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(self, status: u16, body: Value) -> Self {
        self.queue
            .lock()
            .expect("queue lock")
            .push_back(RawResponse::new(status, body.to_string()));
        self
    }

    pub(crate) fn always(mut self, status: u16, body: Value) -> Self {
        self.fallback = Some(RawResponse::new(status, body.to_string()));
        self
    }

    pub(crate) fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().expect("requests lock").clone()
    }

    pub(crate) fn request_count(&self) -> usize {
        self.requests.lock().expect("requests lock").len()
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, request: &ApiRequest) -> Result<RawResponse> {
        self.requests
            .lock()
            .expect("requests lock")
            .push(request.clone());

        let next = self.queue.lock().expect("queue lock").pop_front();
        next.or_else(|| self.fallback.clone())
            .ok_or_else(|| anyhow!("connection refused: {} {}", request.method, request.url))
    }
}
