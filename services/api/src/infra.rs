use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use admissions_portal::admissions::{
    decode_record, order_for_review, ApplicantId, ApplicantRecord, ApplicantRepository,
    ApplicantRole, ApplicantUpdate, ApplicationStatus, BlobError, BlobStore, FederatedClaims,
    Identity, IdentityError, IdentityProvider, RepositoryError, UploadFile,
};
use chrono::Utc;
use metrics_exporter_prometheus::PrometheusHandle;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Process-local applicant store. Stands in for the hosted document
/// database during demos and single-node deployments, keeping the same
/// shape: untyped JSON documents decoded at the read boundary.
#[derive(Default)]
pub(crate) struct InMemoryApplicantRepository {
    documents: Mutex<HashMap<ApplicantId, serde_json::Value>>,
}

fn encode_record(record: &ApplicantRecord) -> Result<serde_json::Value, RepositoryError> {
    serde_json::to_value(record).map_err(|err| RepositoryError::Malformed(err.to_string()))
}

impl ApplicantRepository for InMemoryApplicantRepository {
    fn create(&self, record: ApplicantRecord) -> Result<ApplicantRecord, RepositoryError> {
        let document = encode_record(&record)?;
        let mut guard = self.documents.lock().map_err(poisoned)?;
        if guard.contains_key(&record.uid) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.uid.clone(), document);
        Ok(record)
    }

    fn fetch(&self, uid: &ApplicantId) -> Result<Option<ApplicantRecord>, RepositoryError> {
        let guard = self.documents.lock().map_err(poisoned)?;
        guard.get(uid).cloned().map(decode_record).transpose()
    }

    fn update(
        &self,
        uid: &ApplicantId,
        update: ApplicantUpdate,
    ) -> Result<ApplicantRecord, RepositoryError> {
        let mut guard = self.documents.lock().map_err(poisoned)?;
        let document = guard.get(uid).cloned().ok_or(RepositoryError::NotFound)?;
        let mut record = decode_record(document)?;
        update.apply_to(&mut record);
        guard.insert(uid.clone(), encode_record(&record)?);
        Ok(record)
    }

    fn submitted_applications(&self) -> Result<Vec<ApplicantRecord>, RepositoryError> {
        let guard = self.documents.lock().map_err(poisoned)?;
        let mut records = guard
            .values()
            .cloned()
            .map(decode_record)
            .collect::<Result<Vec<_>, _>>()?;
        records.retain(|record| record.status != ApplicationStatus::Incomplete);
        order_for_review(&mut records);
        Ok(records)
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> RepositoryError {
    RepositoryError::Unavailable("repository mutex poisoned".to_string())
}

/// Seed an administrator record so the review console is reachable on a
/// fresh store. Returns the admin uid.
pub(crate) fn seed_admin(
    repository: &InMemoryApplicantRepository,
    email: &str,
) -> Result<ApplicantId, RepositoryError> {
    let uid = ApplicantId(format!("admin-{}", email.split('@').next().unwrap_or("1")));
    let mut record = ApplicantRecord::new(
        uid.clone(),
        "Admissions Office".to_string(),
        email.to_string(),
        Utc::now(),
    );
    record.role = ApplicantRole::Admin;
    match repository.create(record) {
        Ok(_) | Err(RepositoryError::Conflict) => {
            info!(uid = %uid.0, "administrator account available");
            Ok(uid)
        }
        Err(other) => Err(other),
    }
}

/// Blob store keeping uploads in memory and handing back `memory://` URLs.
#[derive(Default)]
pub(crate) struct InMemoryBlobStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl InMemoryBlobStore {
    pub(crate) fn object_count(&self) -> usize {
        self.objects.lock().map(|guard| guard.len()).unwrap_or(0)
    }
}

impl BlobStore for InMemoryBlobStore {
    fn upload(&self, key: &str, file: &UploadFile) -> Result<String, BlobError> {
        let mut guard = self
            .objects
            .lock()
            .map_err(|_| BlobError::Transport("blob mutex poisoned".to_string()))?;
        guard.insert(key.to_string(), file.bytes.clone());
        Ok(format!("memory://{key}"))
    }
}

/// Identity provider backed by an in-process account table.
#[derive(Default)]
pub(crate) struct InMemoryIdentityProvider {
    accounts: Mutex<HashMap<String, (String, Identity)>>,
    federated: Mutex<HashMap<String, Identity>>,
    sequence: AtomicUsize,
}

impl IdentityProvider for InMemoryIdentityProvider {
    fn register(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<Identity, IdentityError> {
        let mut guard = self
            .accounts
            .lock()
            .map_err(|_| IdentityError::Unavailable("identity mutex poisoned".to_string()))?;
        if guard.contains_key(email) {
            return Err(IdentityError::EmailTaken);
        }
        let id = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let identity = Identity {
            uid: ApplicantId(format!("uid-{id:06}")),
            email: email.to_string(),
            display_name: display_name.to_string(),
        };
        guard.insert(email.to_string(), (password.to_string(), identity.clone()));
        Ok(identity)
    }

    fn authenticate(&self, email: &str, password: &str) -> Result<Identity, IdentityError> {
        let guard = self
            .accounts
            .lock()
            .map_err(|_| IdentityError::Unavailable("identity mutex poisoned".to_string()))?;
        match guard.get(email) {
            Some((stored, identity)) if stored == password => Ok(identity.clone()),
            _ => Err(IdentityError::InvalidCredentials),
        }
    }

    fn authenticate_federated(&self, claims: &FederatedClaims) -> Result<Identity, IdentityError> {
        let mut guard = self
            .federated
            .lock()
            .map_err(|_| IdentityError::Unavailable("identity mutex poisoned".to_string()))?;
        if let Some(identity) = guard.get(&claims.subject) {
            return Ok(identity.clone());
        }
        let id = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let identity = Identity {
            uid: ApplicantId(format!("uid-{id:06}")),
            email: claims.email.clone(),
            display_name: claims.display_name.clone(),
        };
        guard.insert(claims.subject.clone(), identity.clone());
        Ok(identity)
    }

    fn sign_out(&self, _uid: &ApplicantId) -> Result<(), IdentityError> {
        Ok(())
    }

    fn send_password_reset(&self, email: &str) -> Result<(), IdentityError> {
        let guard = self
            .accounts
            .lock()
            .map_err(|_| IdentityError::Unavailable("identity mutex poisoned".to_string()))?;
        if guard.contains_key(email) {
            Ok(())
        } else {
            Err(IdentityError::InvalidCredentials)
        }
    }
}

/// Build an upload from raw bytes, guessing the MIME type from the file
/// name the way a browser file input reports it.
pub(crate) fn upload_from_bytes(file_name: &str, bytes: Vec<u8>) -> UploadFile {
    let content_type = mime_guess::from_path(file_name).first_or_octet_stream();
    UploadFile {
        file_name: file_name.to_string(),
        content_type,
        bytes,
    }
}
