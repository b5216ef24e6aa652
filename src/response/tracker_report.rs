//! Import report wrapper
//!
//! Adds tracker-specific extraction and shape checks on top of the generic
//! path queries.

use anyhow::{Context, Result};

use super::api_response::{ApiResponse, PathQuery};
use super::report::{ImportReport, TrackerType};
use super::validation::{AssertionError, ValidatableResponse};

const TYPE_REPORT_MAP: &str = "bundleReport.typeReportMap";
const ERROR_REPORTS: &str = "validationReport.errorReports";
const WARNING_REPORTS: &str = "validationReport.warningReports";

#[derive(Debug, Clone, PartialEq)]
pub struct TrackerApiResponse {
    response: ApiResponse,
}

impl From<ApiResponse> for TrackerApiResponse {
    fn from(response: ApiResponse) -> Self {
        Self { response }
    }
}

impl PathQuery for TrackerApiResponse {
    fn response(&self) -> &ApiResponse {
        &self.response
    }
}

fn type_report_path(tracker_type: TrackerType) -> String {
    format!("{}.{}", TYPE_REPORT_MAP, tracker_type)
}

impl TrackerApiResponse {
    pub fn into_inner(self) -> ApiResponse {
        self.response
    }

    /// Deserialize the body into a typed report
    pub fn report(&self) -> Result<ImportReport> {
        serde_json::from_value(self.body().clone()).with_context(|| {
            format!(
                "Response with status {} is not an import report",
                self.status_code()
            )
        })
    }

    /// Generated uids of imported objects of one type, in document order.
    /// Empty when the report has no section for that type.
    pub fn extract_imported_identifiers(&self, tracker_type: TrackerType) -> Vec<String> {
        self.extract_strings(&format!(
            "{}.objectReports.uid",
            type_report_path(tracker_type)
        ))
    }

    pub fn extract_imported_tracked_entities(&self) -> Vec<String> {
        self.extract_imported_identifiers(TrackerType::TrackedEntity)
    }

    pub fn extract_imported_enrollments(&self) -> Vec<String> {
        self.extract_imported_identifiers(TrackerType::Enrollment)
    }

    pub fn extract_imported_events(&self) -> Vec<String> {
        self.extract_imported_identifiers(TrackerType::Event)
    }

    pub fn extract_imported_relationships(&self) -> Vec<String> {
        self.extract_imported_identifiers(TrackerType::Relationship)
    }

    /// Status 200, outcome OK, at least one object created, nothing ignored
    pub fn assert_successful_import(&self) -> Result<&Self, AssertionError> {
        self.validate()
            .status_code(200)?
            .body_eq("status", "OK")?
            .body_gte("stats.created", 1.0)?
            .body_eq("stats.ignored", 0)?
            .body_gte("stats.total", 1.0)?
            .body_not_null(TYPE_REPORT_MAP)?;

        Ok(self)
    }

    /// Status 200 with ignored objects and error entries; the returned
    /// validator is rooted at the error list
    pub fn assert_error_report(&self) -> Result<ValidatableResponse<'_>, AssertionError> {
        Ok(self
            .validate()
            .status_code(200)?
            .body_gte("stats.ignored", 1.0)?
            .body_not_null(ERROR_REPORTS)?
            .root_path(ERROR_REPORTS))
    }

    /// Status 200 with warning entries; the returned validator is rooted at
    /// the warning list
    pub fn assert_warning_report(&self) -> Result<ValidatableResponse<'_>, AssertionError> {
        Ok(self
            .validate()
            .status_code(200)?
            .body_not_null(WARNING_REPORTS)?
            .root_path(WARNING_REPORTS))
    }

    pub fn assert_type_report_present(
        &self,
        tracker_type: TrackerType,
    ) -> Result<ValidatableResponse<'_>, AssertionError> {
        let path = type_report_path(tracker_type);
        Ok(self.validate().body_not_null(&path)?.root_path(&path))
    }

    pub fn assert_tracked_entity_report(&self) -> Result<ValidatableResponse<'_>, AssertionError> {
        self.assert_type_report_present(TrackerType::TrackedEntity)
    }

    pub fn assert_enrollment_report(&self) -> Result<ValidatableResponse<'_>, AssertionError> {
        self.assert_type_report_present(TrackerType::Enrollment)
    }

    pub fn assert_event_report(&self) -> Result<ValidatableResponse<'_>, AssertionError> {
        self.assert_type_report_present(TrackerType::Event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::http::RawResponse;
    use serde_json::{json, Value};

    fn tracker_response(status: u16, body: Value) -> TrackerApiResponse {
        ApiResponse::new(RawResponse::new(status, body.to_string())).into()
    }

    fn successful_body() -> Value {
        json!({
            "status": "OK",
            "stats": {"created": 1, "updated": 0, "deleted": 0, "ignored": 0, "total": 1},
            "bundleReport": {
                "typeReportMap": {
                    "TRACKED_ENTITY": {
                        "objectReports": [{"trackerType": "TRACKED_ENTITY", "uid": "teiUid00001"}]
                    }
                }
            }
        })
    }

    #[test]
    fn successful_import_passes() {
        let response = tracker_response(200, successful_body());
        response.assert_successful_import().expect("successful import");
    }

    #[test]
    fn ignored_object_fails_successful_import() {
        let mut body = successful_body();
        body["stats"]["ignored"] = json!(1);
        let response = tracker_response(200, body);

        let err = response
            .assert_successful_import()
            .expect_err("ignored objects are not a success");
        assert_eq!(err.path, "stats.ignored");
    }

    #[test]
    fn missing_type_report_map_fails_successful_import() {
        let mut body = successful_body();
        body.as_object_mut()
            .expect("object body")
            .remove("bundleReport");
        let response = tracker_response(200, body);

        let err = response.assert_successful_import().expect_err("no map");
        assert_eq!(err.path, TYPE_REPORT_MAP);
    }

    #[test]
    fn non_200_fails_successful_import() {
        let response = tracker_response(409, successful_body());
        assert!(response.assert_successful_import().is_err());
    }

    #[test]
    fn extracts_events_in_document_order() {
        let response = tracker_response(
            200,
            json!({
                "bundleReport": {
                    "typeReportMap": {
                        "EVENT": {
                            "objectReports": [{"uid": "eventUid001"}, {"uid": "eventUid002"}]
                        }
                    }
                }
            }),
        );

        assert_eq!(
            response.extract_imported_identifiers(TrackerType::Event),
            vec!["eventUid001", "eventUid002"]
        );
        assert_eq!(response.extract_imported_events(), vec!["eventUid001", "eventUid002"]);
    }

    #[test]
    fn missing_type_section_yields_no_identifiers() {
        let response = tracker_response(200, successful_body());

        assert!(response.extract_imported_events().is_empty());
        assert!(response.extract_imported_enrollments().is_empty());
        assert!(response.extract_imported_relationships().is_empty());
        assert_eq!(response.extract_imported_tracked_entities(), vec!["teiUid00001"]);
    }

    #[test]
    fn error_report_narrows_to_error_list() {
        let response = tracker_response(
            200,
            json!({
                "status": "ERROR",
                "stats": {"created": 0, "ignored": 1, "total": 1},
                "validationReport": {
                    "errorReports": [{"errorCode": "E1000", "trackerType": "EVENT", "uid": "bad"}]
                }
            }),
        );

        let errors = response.assert_error_report().expect("error report");
        errors
            .body_contains("errorCode", "E1000")
            .and_then(|v| v.body_has_size("", 1))
            .expect("narrowed checks");
    }

    #[test]
    fn error_report_requires_ignored_objects() {
        let response = tracker_response(
            200,
            json!({
                "stats": {"ignored": 0},
                "validationReport": {"errorReports": []}
            }),
        );
        let err = response.assert_error_report().expect_err("nothing ignored");
        assert_eq!(err.path, "stats.ignored");
    }

    #[test]
    fn warning_report_narrows_to_warning_list() {
        let response = tracker_response(
            200,
            json!({
                "status": "WARNING",
                "validationReport": {"warningReports": [{"warningCode": "E1017"}]}
            }),
        );

        let warnings = response.assert_warning_report().expect("warning report");
        assert_eq!(warnings.value("warningCode"), json!(["E1017"]));

        let no_warnings = tracker_response(200, successful_body());
        assert!(no_warnings.assert_warning_report().is_err());
    }

    #[test]
    fn type_report_presence() {
        let response = tracker_response(200, successful_body());

        let teis = response.assert_tracked_entity_report().expect("tei report");
        assert_eq!(teis.value("objectReports.uid"), json!(["teiUid00001"]));

        assert!(response.assert_event_report().is_err());
        assert!(response.assert_enrollment_report().is_err());
    }

    #[test]
    fn typed_report_matches_path_queries() {
        let response = tracker_response(200, successful_body());
        let report = response.report().expect("typed report");

        assert_eq!(
            report.imported_uids(TrackerType::TrackedEntity),
            response.extract_imported_tracked_entities()
        );
        assert!(report.stats.is_consistent());
    }

    #[test]
    fn non_report_body_fails_typed_parse() {
        let response = tracker_response(500, json!({"httpStatus": "Internal Server Error"}));
        assert!(response.report().is_err());
    }

    #[test]
    fn empty_warning_list_still_counts_as_present() {
        let response = tracker_response(
            200,
            json!({
                "status": "OK",
                "stats": {"created": 1, "ignored": 0, "total": 1},
                "validationReport": {"errorReports": [], "warningReports": []}
            }),
        );

        let warnings = response
            .assert_warning_report()
            .expect("warning list present");
        assert_eq!(warnings.root(), WARNING_REPORTS);
        assert!(warnings.body_has_size("", 0).is_ok());
    }

    #[test]
    fn empty_error_list_passes_presence_check() {
        let response = tracker_response(
            200,
            json!({
                "status": "ERROR",
                "stats": {"created": 0, "ignored": 1, "total": 1},
                "validationReport": {"errorReports": [], "warningReports": []}
            }),
        );

        let errors = response
            .assert_error_report()
            .expect("error list present");
        assert_eq!(errors.root(), ERROR_REPORTS);
    }
}
