//! Typed view of a tracker import report
//!
//! Only the fields the toolkit reasons about are modelled; unknown fields are
//! ignored so newer server versions still deserialize.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Object type keys of `bundleReport.typeReportMap`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrackerType {
    TrackedEntity,
    Enrollment,
    Event,
    Relationship,
}

impl TrackerType {
    pub const ALL: [TrackerType; 4] = [
        TrackerType::TrackedEntity,
        TrackerType::Enrollment,
        TrackerType::Event,
        TrackerType::Relationship,
    ];

    /// Wire name, e.g. "TRACKED_ENTITY"
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackerType::TrackedEntity => "TRACKED_ENTITY",
            TrackerType::Enrollment => "ENROLLMENT",
            TrackerType::Event => "EVENT",
            TrackerType::Relationship => "RELATIONSHIP",
        }
    }
}

impl fmt::Display for TrackerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ImportStatus {
    Ok,
    Warning,
    Error,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Stats {
    pub created: u64,
    pub updated: u64,
    pub deleted: u64,
    pub ignored: u64,
    pub total: u64,
}

impl Stats {
    /// Whether `total` equals the sum of the individual counters. The server
    /// is expected to keep this, the client never enforces it. A sum that
    /// overflows is inconsistent.
    pub fn is_consistent(&self) -> bool {
        [self.updated, self.deleted, self.ignored]
            .iter()
            .try_fold(self.created, |sum, count| sum.checked_add(*count))
            == Some(self.total)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ObjectReport {
    pub uid: String,
    pub tracker_type: Option<TrackerType>,
    pub index: Option<u64>,
    pub error_reports: Vec<ReportEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TypeReport {
    pub tracker_type: Option<TrackerType>,
    pub stats: Stats,
    pub object_reports: Vec<ObjectReport>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BundleReport {
    pub status: Option<ImportStatus>,
    pub stats: Stats,
    /// Keyed by wire name; unknown object types are kept rather than rejected
    pub type_report_map: BTreeMap<String, TypeReport>,
}

impl BundleReport {
    pub fn type_report(&self, tracker_type: TrackerType) -> Option<&TypeReport> {
        self.type_report_map.get(tracker_type.as_str())
    }
}

/// One entry of `validationReport.errorReports` / `warningReports`
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportEntry {
    pub message: Option<String>,
    pub error_code: Option<String>,
    pub warning_code: Option<String>,
    pub tracker_type: Option<TrackerType>,
    pub uid: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidationReport {
    pub error_reports: Vec<ReportEntry>,
    pub warning_reports: Vec<ReportEntry>,
}

/// Terminal result of an import
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub status: ImportStatus,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub stats: Stats,
    #[serde(default)]
    pub bundle_report: Option<BundleReport>,
    #[serde(default)]
    pub validation_report: Option<ValidationReport>,
}

impl ImportReport {
    /// Uids of imported objects of one type, in report order
    pub fn imported_uids(&self, tracker_type: TrackerType) -> Vec<&str> {
        self.bundle_report
            .as_ref()
            .and_then(|bundle| bundle.type_report(tracker_type))
            .map(|report| {
                report
                    .object_reports
                    .iter()
                    .map(|object| object.uid.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn errors(&self) -> &[ReportEntry] {
        self.validation_report
            .as_ref()
            .map(|report| report.error_reports.as_slice())
            .unwrap_or_default()
    }

    pub fn warnings(&self) -> &[ReportEntry] {
        self.validation_report
            .as_ref()
            .map(|report| report.warning_reports.as_slice())
            .unwrap_or_default()
    }
}
