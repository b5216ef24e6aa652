//! HTTP clients for the tracker API and its collaborators

pub mod client;
pub mod http;
pub mod id_generator;
pub mod query_params;
pub mod tracker;

pub use client::RestApiActions;
pub use http::{ApiRequest, HttpTransport, RawResponse, RequestBody, Transport};
pub use id_generator::IdGenerator;
pub use query_params::QueryParams;
pub use tracker::{ImportPayload, JobStatus, ReportMode, TrackerActions};
