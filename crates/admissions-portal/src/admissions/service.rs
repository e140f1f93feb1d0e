use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::domain::{ApplicantId, ApplicantRecord, DocumentKind};
use super::repository::{
    ApplicantRepository, ApplicantUpdate, BlobError, BlobStore, RepositoryError,
};
use super::validation::{FieldError, UploadPolicy};
use super::wizard::{WizardError, WizardState};
use crate::config::UploadConfig;

/// Orchestrates the admission form wizard against the document and blob
/// stores: entry guard, pre-fill, uploads, and the single submission write.
pub struct AdmissionService<R, B> {
    repository: Arc<R>,
    blobs: Arc<B>,
    policy: UploadPolicy,
}

impl<R, B> AdmissionService<R, B>
where
    R: ApplicantRepository + 'static,
    B: BlobStore + 'static,
{
    pub fn new(repository: Arc<R>, blobs: Arc<B>, uploads: &UploadConfig) -> Self {
        Self {
            repository,
            blobs,
            policy: UploadPolicy::new(uploads.max_upload_bytes),
        }
    }

    /// Enter the wizard: fetch the record, enforce the incomplete-only
    /// guard, and pre-fill from whatever was saved previously.
    pub fn start(&self, uid: &ApplicantId) -> Result<WizardState, AdmissionError> {
        let record = self
            .repository
            .fetch(uid)?
            .ok_or(RepositoryError::NotFound)?;
        let state = WizardState::for_record(&record, self.policy.clone())?;
        Ok(state)
    }

    /// Submit from the review step.
    ///
    /// Sequence: upload any staged files (skipping slots whose upload
    /// already completed), verify all four URLs, then write both info
    /// blocks, the document set, `status = submitted`, and `submitted_at`
    /// as one update. There is no rollback between the uploads and the
    /// record write; a failed write leaves the uploaded URLs in `state` so
    /// a retry proceeds without re-transferring.
    pub fn submit(
        &self,
        uid: &ApplicantId,
        state: &mut WizardState,
        now: DateTime<Utc>,
    ) -> Result<ApplicantRecord, AdmissionError> {
        let personal = state
            .validated_personal()
            .map_err(AdmissionError::Validation)?;
        let academic = state
            .validated_academic()
            .map_err(AdmissionError::Validation)?;

        if !state.acknowledged() {
            return Err(AdmissionError::DeclarationRequired);
        }

        for kind in DocumentKind::ALL {
            let Some(file) = state.slot(kind).pending().cloned() else {
                continue;
            };
            let key = format!(
                "{}/{}_{}_{}",
                kind.storage_dir(),
                uid.0,
                now.timestamp_millis(),
                file.file_name
            );
            let url = self.blobs.upload(&key, &file)?;
            debug!(slot = kind.label(), %key, "document uploaded");
            state.mark_uploaded(kind, url);
        }

        let Some(documents) = state.document_set() else {
            return Err(AdmissionError::MissingDocuments(state.missing_documents()));
        };

        let stored = self.repository.update(
            uid,
            ApplicantUpdate {
                display_name: None,
                personal: Some(personal),
                academic: Some(academic),
                documents: Some(documents),
                status: Some(super::domain::ApplicationStatus::Submitted),
                submitted_at: Some(now),
            },
        )?;

        info!(uid = %uid.0, "admission application submitted");
        Ok(stored)
    }
}

/// Error raised by the admission service. Every variant is recoverable by
/// retrying the step; nothing here tears down the session.
#[derive(Debug, thiserror::Error)]
pub enum AdmissionError {
    #[error(transparent)]
    Wizard(#[from] WizardError),
    #[error("step validation failed")]
    Validation(Vec<FieldError>),
    #[error("the declaration must be accepted before submitting")]
    DeclarationRequired,
    #[error("please upload all required documents")]
    MissingDocuments(Vec<DocumentKind>),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Blob(#[from] BlobError),
}
