//! Tracker import client
//!
//! Drives an import payload through to its report:
//! 1. Submit the payload to `/tracker` (synchronous mode by default)
//! 2. If the server answered with a job envelope, poll `/tracker/jobs/{id}`
//! 3. Fetch `/tracker/jobs/{id}/report` and wrap it for validation

use anyhow::{anyhow, Result};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use tracing::{debug, info, warn};

use super::client::RestApiActions;
use super::http::Transport;
use super::query_params::QueryParams;
use crate::config::{ClientConfig, PollConfig};
use crate::response::{ApiResponse, PathQuery, TrackerApiResponse};

pub const TRACKER_ENDPOINT: &str = "/tracker";
/// Query parameter selecting inline ("false") or job-based ("true") processing
pub const ASYNC_PARAM: &str = "async";
const JOB_ID_PATH: &str = "response.id";

/// What to submit to the import endpoint
#[derive(Debug, Clone, PartialEq)]
pub enum ImportPayload {
    Json(Value),
    /// Uploaded as a multipart file
    File(PathBuf),
}

impl From<Value> for ImportPayload {
    fn from(value: Value) -> Self {
        ImportPayload::Json(value)
    }
}

impl From<PathBuf> for ImportPayload {
    fn from(path: PathBuf) -> Self {
        ImportPayload::File(path)
    }
}

impl From<&Path> for ImportPayload {
    fn from(path: &Path) -> Self {
        ImportPayload::File(path.to_path_buf())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportMode {
    #[default]
    Full,
    Errors,
    Warnings,
}

impl ReportMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportMode::Full => "FULL",
            ReportMode::Errors => "ERRORS",
            ReportMode::Warnings => "WARNINGS",
        }
    }
}

impl fmt::Display for ReportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Last observed state of a server-side job
#[derive(Debug, Clone, PartialEq)]
pub struct JobStatus {
    pub id: String,
    pub completed: bool,
    pub message: Option<String>,
    /// Number of status fetches performed
    pub attempts: u32,
    /// The last status response
    pub response: ApiResponse,
}

/// A job counts as completed when `completed` is true, either on the status
/// object itself or on any notification in a list of them.
fn is_completed(status: &ApiResponse) -> bool {
    status
        .extract_list("completed")
        .iter()
        .any(|flag| flag.as_bool() == Some(true))
}

/// Whether a submission response defers the import to a job instead of
/// carrying the report inline
fn is_job_envelope(response: &ApiResponse) -> bool {
    let body = response.body();
    response.extract(JOB_ID_PATH).is_some()
        && body.get("stats").is_none()
        && body.get("bundleReport").is_none()
}

pub struct TrackerActions {
    rest: RestApiActions,
    poll: PollConfig,
}

impl TrackerActions {
    pub fn new(transport: Arc<dyn Transport>, config: &ClientConfig) -> Self {
        Self {
            rest: RestApiActions::new(transport, config, TRACKER_ENDPOINT),
            poll: config.poll.clone(),
        }
    }

    pub fn with_base_uri(mut self, base_uri: &str) -> Self {
        self.rest = self.rest.with_base_uri(base_uri);
        self
    }

    /// Generic access to the tracker endpoint (exports, deletes, ...)
    pub fn rest(&self) -> &RestApiActions {
        &self.rest
    }

    pub fn poll_config(&self) -> &PollConfig {
        &self.poll
    }

    /// GET the job status as-is
    pub fn fetch_job_status(&self, job_id: &str) -> Result<ApiResponse> {
        self.rest.get(&format!("/jobs/{}", job_id), None)
    }

    /// Poll the job until it reports completion or the attempt budget runs out.
    ///
    /// A non-200 status response aborts immediately with an assertion error.
    /// Running out of attempts is not an error: the last status is returned
    /// with `completed == false` and a warning is logged.
    pub fn await_job_completion(&self, job_id: &str) -> Result<JobStatus> {
        info!("Waiting until tracker job {} is completed", job_id);
        let max_attempts = self.poll.max_attempts.max(1);
        let interval = self.poll.interval();
        let mut attempts = 0;

        loop {
            let response = self.fetch_job_status(job_id)?;
            response.validate().status_code(200)?;
            attempts += 1;

            let completed = is_completed(&response);
            if completed || attempts >= max_attempts {
                let status = JobStatus {
                    id: job_id.to_string(),
                    completed,
                    message: response.extract("message"),
                    attempts,
                    response,
                };

                if completed {
                    info!(
                        "Tracker job {} completed after {} attempt(s). Message: {}",
                        job_id,
                        attempts,
                        status.message.as_deref().unwrap_or("-")
                    );
                } else {
                    warn!(
                        "Tracker job {} didn't complete in {} attempts. Message: {}",
                        job_id,
                        attempts,
                        status.message.as_deref().unwrap_or("-")
                    );
                }
                return Ok(status);
            }

            debug!("Tracker job {} still running (attempt {})", job_id, attempts);
            if !interval.is_zero() {
                thread::sleep(interval);
            }
        }
    }

    pub fn fetch_report(&self, job_id: &str, mode: ReportMode) -> Result<TrackerApiResponse> {
        let params = QueryParams::new().add("reportMode", mode.as_str());
        let response = self
            .rest
            .get(&format!("/jobs/{}/report", job_id), Some(&params))?;
        Ok(response.into())
    }

    /// Wait for the job, then fetch its full report
    pub fn await_report(&self, job_id: &str) -> Result<TrackerApiResponse> {
        self.await_job_completion(job_id)?;
        self.fetch_report(job_id, ReportMode::Full)
    }

    /// Submit in synchronous mode and return the import report
    pub fn submit_and_await_report(&self, payload: &ImportPayload) -> Result<TrackerApiResponse> {
        self.submit_with_params(payload, QueryParams::new())
    }

    /// Submit a JSON body with extra params; `async=false` always wins over
    /// any caller-supplied value
    pub fn submit_json_and_await_report<B>(
        &self,
        body: &B,
        params: QueryParams,
    ) -> Result<TrackerApiResponse>
    where
        B: Serialize + ?Sized,
    {
        let payload = ImportPayload::Json(serde_json::to_value(body)?);
        self.submit_with_params(&payload, params)
    }

    /// Upload a file with extra params; `async=false` always wins over any
    /// caller-supplied value
    pub fn submit_file_and_await_report(
        &self,
        file: &Path,
        params: QueryParams,
    ) -> Result<TrackerApiResponse> {
        self.submit_with_params(&ImportPayload::from(file), params)
    }

    /// Submit as a background job and return the job id without waiting
    pub fn submit_async(&self, payload: &ImportPayload, params: QueryParams) -> Result<String> {
        let params = params.add_or_update(ASYNC_PARAM, "true");
        let response = self.post_payload(payload, &params)?;

        response
            .validate()
            .status_code(200)?
            .body_not_null(JOB_ID_PATH)?;

        let job_id = response
            .extract(JOB_ID_PATH)
            .ok_or_else(|| anyhow!("Job envelope has no {}", JOB_ID_PATH))?;
        info!("Tracker import queued as job {}", job_id);
        Ok(job_id)
    }

    fn submit_with_params(
        &self,
        payload: &ImportPayload,
        params: QueryParams,
    ) -> Result<TrackerApiResponse> {
        let params = params.add_or_update(ASYNC_PARAM, "false");
        let response = self.post_payload(payload, &params)?;
        self.resolve_report(response)
    }

    fn post_payload(&self, payload: &ImportPayload, params: &QueryParams) -> Result<ApiResponse> {
        match payload {
            ImportPayload::Json(body) => self.rest.post("", body, Some(params)),
            ImportPayload::File(path) => self.rest.post_file(path, Some(params)),
        }
    }

    /// Inline reports are returned directly; a job envelope is followed
    /// through polling to the full report
    fn resolve_report(&self, response: ApiResponse) -> Result<TrackerApiResponse> {
        if !is_job_envelope(&response) {
            return Ok(response.into());
        }

        response.validate().status_code(200)?;
        let job_id = response
            .extract(JOB_ID_PATH)
            .ok_or_else(|| anyhow!("Job envelope has no {}", JOB_ID_PATH))?;
        debug!("Import deferred to job {}", job_id);
        self.await_report(&job_id)
    }
}
