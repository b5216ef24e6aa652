//! Blocking test client for a tracker bulk-import API
//!
//! Submits import payloads, follows deferred imports through job polling and
//! exposes the resulting reports through path queries and fluent assertions.
//!
//! ```no_run
//! use std::sync::Arc;
//! use serde_json::json;
//! use tracker_testkit::{ClientConfig, HttpTransport, ImportPayload, TrackerActions, TrackerType};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = ClientConfig::from_env()?;
//! let transport = Arc::new(HttpTransport::new(config.timeout())?);
//! let tracker = TrackerActions::new(transport, &config);
//!
//! let report = tracker.submit_and_await_report(&ImportPayload::Json(json!({
//!     "trackedEntities": [{"trackedEntityType": "nEenWmSyUEp", "orgUnit": "DiszpKrYNg8"}]
//! })))?;
//! report.assert_successful_import()?;
//! let uids = report.extract_imported_identifiers(TrackerType::TrackedEntity);
//! # let _ = uids;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod response;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{
    HttpTransport, IdGenerator, ImportPayload, JobStatus, QueryParams, ReportMode, RestApiActions,
    TrackerActions, Transport,
};
pub use config::{ClientConfig, PollConfig};
pub use response::{
    ApiResponse, AssertionError, ImportReport, PathQuery, TrackerApiResponse, TrackerType,
    ValidatableResponse,
};
