use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};

use crate::admissions::domain::{
    AcademicInfo, ApplicantId, ApplicantRecord, ApplicationStatus, Branch, DocumentKind,
    DocumentSet, EntranceExam, Gender, PersonalInfo,
};
use crate::admissions::repository::{
    order_for_review, ApplicantRepository, ApplicantUpdate, BlobError, BlobStore, RepositoryError,
};
use crate::admissions::service::AdmissionService;
use crate::admissions::session::{FederatedClaims, Identity, IdentityError, IdentityProvider};
use crate::admissions::validation::{AcademicDraft, PersonalDraft, UploadFile};
use crate::config::UploadConfig;

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 7, 14, 10, 30, 0).unwrap()
}

pub(super) fn student_record(uid: &str) -> ApplicantRecord {
    ApplicantRecord::new(
        ApplicantId(uid.to_string()),
        "Asha Verma".to_string(),
        "asha.verma@example.com".to_string(),
        now(),
    )
}

pub(super) fn personal_draft() -> PersonalDraft {
    PersonalDraft {
        first_name: "Asha".to_string(),
        last_name: "Verma".to_string(),
        date_of_birth: "2006-04-18".to_string(),
        gender: Some(Gender::Female),
        email: "asha.verma@example.com".to_string(),
        phone: "9876543210".to_string(),
        address: "14 Lakeview Road".to_string(),
        city: "Lucknow".to_string(),
        state: "Uttar Pradesh".to_string(),
        zip_code: "226001".to_string(),
    }
}

pub(super) fn academic_draft() -> AcademicDraft {
    AcademicDraft {
        high_school_name: "City Montessori School".to_string(),
        high_school_percentage: 88.4,
        intermediate_school_name: "City Montessori Intermediate".to_string(),
        intermediate_percentage: 91.2,
        entrance_exam: Some(EntranceExam::JeeMain),
        entrance_exam_rank: 1520,
        preferred_branch: Some(Branch::ComputerScience),
    }
}

pub(super) fn personal_info() -> PersonalInfo {
    crate::admissions::validation::validate_personal(&personal_draft()).expect("fixture is valid")
}

pub(super) fn academic_info() -> AcademicInfo {
    crate::admissions::validation::validate_academic(&academic_draft()).expect("fixture is valid")
}

pub(super) fn document_set() -> DocumentSet {
    DocumentSet {
        photo_url: "blob://photos/asha.png".to_string(),
        high_school_certificate_url: "blob://high_school_certificates/asha.pdf".to_string(),
        intermediate_certificate_url: "blob://intermediate_certificates/asha.pdf".to_string(),
        entrance_exam_result_url: "blob://entrance_exam_results/asha.pdf".to_string(),
    }
}

pub(super) fn upload_file(name: &str, content_type: mime::Mime) -> UploadFile {
    UploadFile {
        file_name: name.to_string(),
        content_type,
        bytes: vec![0u8; 2048],
    }
}

/// Record with everything saved and four uploaded documents, still
/// incomplete so the wizard will accept it.
pub(super) fn resumable_record(uid: &str) -> ApplicantRecord {
    let mut record = student_record(uid);
    record.personal = Some(personal_info());
    record.academic = Some(academic_info());
    record.documents = Some(document_set());
    record
}

pub(super) fn submitted_record(uid: &str, status: ApplicationStatus) -> ApplicantRecord {
    let mut record = resumable_record(uid);
    record.status = status;
    record.submitted_at = Some(now());
    record
}

#[derive(Default)]
pub(super) struct MemoryRepository {
    records: Mutex<HashMap<ApplicantId, ApplicantRecord>>,
    pub(super) fail_next_update: AtomicBool,
}

impl MemoryRepository {
    pub(super) fn seeded(records: impl IntoIterator<Item = ApplicantRecord>) -> Arc<Self> {
        let repository = Self::default();
        {
            let mut guard = repository.records.lock().expect("repository mutex poisoned");
            for record in records {
                guard.insert(record.uid.clone(), record);
            }
        }
        Arc::new(repository)
    }

    pub(super) fn stored(&self, uid: &str) -> Option<ApplicantRecord> {
        self.records
            .lock()
            .expect("repository mutex poisoned")
            .get(&ApplicantId(uid.to_string()))
            .cloned()
    }
}

impl ApplicantRepository for MemoryRepository {
    fn create(&self, record: ApplicantRecord) -> Result<ApplicantRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.uid) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.uid.clone(), record.clone());
        Ok(record)
    }

    fn fetch(&self, uid: &ApplicantId) -> Result<Option<ApplicantRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(uid).cloned())
    }

    fn update(
        &self,
        uid: &ApplicantId,
        update: ApplicantUpdate,
    ) -> Result<ApplicantRecord, RepositoryError> {
        if self.fail_next_update.swap(false, Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable("simulated outage".to_string()));
        }
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let record = guard.get_mut(uid).ok_or(RepositoryError::NotFound)?;
        update.apply_to(record);
        Ok(record.clone())
    }

    fn submitted_applications(&self) -> Result<Vec<ApplicantRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        let mut records: Vec<_> = guard
            .values()
            .filter(|record| record.status != ApplicationStatus::Incomplete)
            .cloned()
            .collect();
        order_for_review(&mut records);
        Ok(records)
    }
}

#[derive(Default)]
pub(super) struct MemoryBlobStore {
    pub(super) transfers: AtomicUsize,
}

impl BlobStore for MemoryBlobStore {
    fn upload(&self, key: &str, _file: &UploadFile) -> Result<String, BlobError> {
        self.transfers.fetch_add(1, Ordering::SeqCst);
        Ok(format!("blob://{key}"))
    }
}

impl MemoryBlobStore {
    pub(super) fn transfer_count(&self) -> usize {
        self.transfers.load(Ordering::SeqCst)
    }
}

pub(super) struct UnavailableBlobStore;

impl BlobStore for UnavailableBlobStore {
    fn upload(&self, _key: &str, _file: &UploadFile) -> Result<String, BlobError> {
        Err(BlobError::Transport("network down".to_string()))
    }
}

#[derive(Default)]
pub(super) struct MemoryIdentityProvider {
    accounts: Mutex<HashMap<String, (String, Identity)>>,
    federated: Mutex<HashMap<String, Identity>>,
    sequence: AtomicUsize,
}

impl IdentityProvider for MemoryIdentityProvider {
    fn register(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<Identity, IdentityError> {
        let mut guard = self.accounts.lock().expect("identity mutex poisoned");
        if guard.contains_key(email) {
            return Err(IdentityError::EmailTaken);
        }
        let id = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let identity = Identity {
            uid: ApplicantId(format!("uid-{id:04}")),
            email: email.to_string(),
            display_name: display_name.to_string(),
        };
        guard.insert(email.to_string(), (password.to_string(), identity.clone()));
        Ok(identity)
    }

    fn authenticate(&self, email: &str, password: &str) -> Result<Identity, IdentityError> {
        let guard = self.accounts.lock().expect("identity mutex poisoned");
        match guard.get(email) {
            Some((stored, identity)) if stored == password => Ok(identity.clone()),
            _ => Err(IdentityError::InvalidCredentials),
        }
    }

    fn authenticate_federated(&self, claims: &FederatedClaims) -> Result<Identity, IdentityError> {
        let mut guard = self.federated.lock().expect("identity mutex poisoned");
        if let Some(identity) = guard.get(&claims.subject) {
            return Ok(identity.clone());
        }
        let id = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let identity = Identity {
            uid: ApplicantId(format!("uid-{id:04}")),
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
        let guard = self.accounts.lock().expect("identity mutex poisoned");
        if guard.contains_key(email) {
            Ok(())
        } else {
            Err(IdentityError::InvalidCredentials)
        }
    }
}

pub(super) fn build_service(
    repository: Arc<MemoryRepository>,
    blobs: Arc<MemoryBlobStore>,
) -> AdmissionService<MemoryRepository, MemoryBlobStore> {
    AdmissionService::new(repository, blobs, &UploadConfig::default())
}
