use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    AcademicInfo, ApplicantId, ApplicantRecord, ApplicationStatus, DocumentSet, PersonalInfo,
};
use super::validation::UploadFile;

/// Partial, field-path style update. Absent fields are left untouched so two
/// writers never clobber each other's blocks wholesale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicantUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub personal: Option<PersonalInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub academic: Option<AcademicInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documents: Option<DocumentSet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ApplicationStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
}

impl ApplicantUpdate {
    pub fn status(status: ApplicationStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Merge into an existing record. `submitted_at` is write-once: a value
    /// already present on the record is never replaced. `role` is not part
    /// of the update surface at all.
    pub fn apply_to(self, record: &mut ApplicantRecord) {
        if let Some(display_name) = self.display_name {
            record.display_name = display_name;
        }
        if let Some(personal) = self.personal {
            record.personal = Some(personal);
        }
        if let Some(academic) = self.academic {
            record.academic = Some(academic);
        }
        if let Some(documents) = self.documents {
            record.documents = Some(documents);
        }
        if let Some(status) = self.status {
            record.status = status;
        }
        if record.submitted_at.is_none() {
            if let Some(submitted_at) = self.submitted_at {
                record.submitted_at = Some(submitted_at);
            }
        }
    }
}

/// Storage abstraction over the hosted document store so the services can be
/// exercised in isolation.
pub trait ApplicantRepository: Send + Sync {
    fn create(&self, record: ApplicantRecord) -> Result<ApplicantRecord, RepositoryError>;
    fn fetch(&self, uid: &ApplicantId) -> Result<Option<ApplicantRecord>, RepositoryError>;
    fn update(
        &self,
        uid: &ApplicantId,
        update: ApplicantUpdate,
    ) -> Result<ApplicantRecord, RepositoryError>;
    /// Bulk read of every non-incomplete record, ordered by status label then
    /// submission time descending.
    fn submitted_applications(&self) -> Result<Vec<ApplicantRecord>, RepositoryError>;
}

/// Shared ordering for the review queue so every adapter agrees with the
/// console's expectations.
pub fn order_for_review(records: &mut [ApplicantRecord]) {
    records.sort_by(|a, b| {
        a.status
            .label()
            .cmp(b.status.label())
            .then_with(|| b.submitted_at.cmp(&a.submitted_at))
    });
}

/// Decode a stored document at the read boundary. Malformed documents are
/// rejected rather than silently defaulted.
pub fn decode_record(value: serde_json::Value) -> Result<ApplicantRecord, RepositoryError> {
    serde_json::from_value(value).map_err(|err| RepositoryError::Malformed(err.to_string()))
}

/// Error enumeration for document-store failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("stored record is malformed: {0}")]
    Malformed(String),
    #[error("document store unavailable: {0}")]
    Unavailable(String),
}

/// Blob storage returning a durable URL per uploaded object.
pub trait BlobStore: Send + Sync {
    fn upload(&self, key: &str, file: &UploadFile) -> Result<String, BlobError>;
}

/// Blob transfer failure, reported after client-side policy checks pass.
#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    #[error("blob store unavailable: {0}")]
    Transport(String),
}
