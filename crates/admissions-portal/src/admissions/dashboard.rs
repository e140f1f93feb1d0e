use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{ApplicantRecord, ApplicationStatus};

/// Read-only projection backing the student dashboard. Display-only; the
/// wizard and admin console own the actual lifecycle rules.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub status: ApplicationStatus,
    pub status_label: &'static str,
    pub completion_percentage: u8,
    pub has_personal_info: bool,
    pub has_academic_info: bool,
    pub has_documents: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
}

impl DashboardView {
    pub fn from_record(record: &ApplicantRecord) -> Self {
        Self {
            status: record.status,
            status_label: record.status.label(),
            completion_percentage: completion_percentage(record),
            has_personal_info: record.personal.is_some(),
            has_academic_info: record.academic.is_some(),
            has_documents: record.documents.is_some(),
            submitted_at: record.submitted_at,
        }
    }
}

/// 0-100 completion indicator. Fixed values once submitted; while incomplete,
/// +20 per saved info block and +10 for documents (so the incomplete branch
/// tops out at 50, which happens to equal the submitted floor).
pub fn completion_percentage(record: &ApplicantRecord) -> u8 {
    match record.status {
        ApplicationStatus::Approved | ApplicationStatus::Rejected => 100,
        ApplicationStatus::UnderReview => 75,
        ApplicationStatus::Submitted => 50,
        ApplicationStatus::Incomplete => {
            let mut progress = 0;
            if record.personal.is_some() {
                progress += 20;
            }
            if record.academic.is_some() {
                progress += 20;
            }
            if record.documents.is_some() {
                progress += 10;
            }
            progress
        }
    }
}
