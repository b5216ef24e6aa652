//! Response wrappers, path queries and assertions

pub mod api_response;
pub mod path_extractor;
pub mod report;
pub mod tracker_report;
pub mod validation;

pub use api_response::{ApiResponse, PathQuery};
pub use report::{ImportReport, ImportStatus, Stats, TrackerType};
pub use tracker_report::TrackerApiResponse;
pub use validation::{AssertionError, ValidatableResponse};
