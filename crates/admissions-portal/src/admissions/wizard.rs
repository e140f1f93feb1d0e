use serde::Serialize;

use super::domain::{
    AcademicInfo, ApplicantRecord, ApplicationStatus, DocumentKind, DocumentSet, PersonalInfo,
};
use super::validation::{
    validate_academic, validate_personal, AcademicDraft, FieldError, PersonalDraft, UploadFile,
    UploadPolicy, UploadPolicyError,
};

/// The four named wizard states, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Personal,
    Academic,
    Documents,
    Review,
}

impl WizardStep {
    pub const fn label(self) -> &'static str {
        match self {
            WizardStep::Personal => "Personal Info",
            WizardStep::Academic => "Academic Info",
            WizardStep::Documents => "Documents",
            WizardStep::Review => "Review",
        }
    }

    const fn next(self) -> Option<Self> {
        match self {
            WizardStep::Personal => Some(WizardStep::Academic),
            WizardStep::Academic => Some(WizardStep::Documents),
            WizardStep::Documents => Some(WizardStep::Review),
            WizardStep::Review => None,
        }
    }

    const fn previous(self) -> Option<Self> {
        match self {
            WizardStep::Personal => None,
            WizardStep::Academic => Some(WizardStep::Personal),
            WizardStep::Documents => Some(WizardStep::Academic),
            WizardStep::Review => Some(WizardStep::Documents),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    #[error("application already submitted (status: {})", .status.label())]
    AlreadySubmitted { status: ApplicationStatus },
    #[error("step validation failed: {0:?}")]
    Step(Vec<FieldError>),
    #[error(transparent)]
    Upload(#[from] UploadPolicyError),
}

/// One of the four independent upload slots.
///
/// Selecting a new file clears the previously stored URL until the new
/// upload completes; a slot with an uploaded, unreplaced file needs no
/// further transfer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentSlot {
    url: Option<String>,
    pending: Option<UploadFile>,
}

impl DocumentSlot {
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn pending(&self) -> Option<&UploadFile> {
        self.pending.as_ref()
    }

    pub fn needs_upload(&self) -> bool {
        self.pending.is_some()
    }

    /// Present either as an uploaded URL or a staged file.
    pub fn is_satisfied(&self) -> bool {
        self.url.is_some() || self.pending.is_some()
    }

    fn select(&mut self, file: UploadFile) {
        self.pending = Some(file);
        self.url = None;
    }

    fn mark_uploaded(&mut self, url: String) {
        self.url = Some(url);
        self.pending = None;
    }
}

/// In-memory form value object for one wizard session. All four steps live
/// here, so back-navigation never loses data.
#[derive(Debug, Clone, PartialEq)]
pub struct WizardState {
    step: WizardStep,
    session_email: String,
    pub personal: PersonalDraft,
    pub academic: AcademicDraft,
    slots: [DocumentSlot; 4],
    acknowledged: bool,
    policy: UploadPolicy,
}

impl WizardState {
    /// Build a session for a record, enforcing the entry guard and
    /// pre-filling whatever the applicant saved previously.
    pub fn for_record(record: &ApplicantRecord, policy: UploadPolicy) -> Result<Self, WizardError> {
        if record.status != ApplicationStatus::Incomplete {
            return Err(WizardError::AlreadySubmitted {
                status: record.status,
            });
        }

        let mut state = Self {
            step: WizardStep::Personal,
            session_email: record.email.clone(),
            personal: PersonalDraft {
                email: record.email.clone(),
                ..PersonalDraft::default()
            },
            academic: AcademicDraft::default(),
            slots: Default::default(),
            acknowledged: false,
            policy,
        };

        if let Some(personal) = &record.personal {
            state.personal = draft_from_personal(personal);
        }
        if let Some(academic) = &record.academic {
            state.academic = draft_from_academic(academic);
        }
        if let Some(documents) = &record.documents {
            for kind in DocumentKind::ALL {
                let url = documents.url(kind);
                if !url.is_empty() {
                    state.slot_mut(kind).mark_uploaded(url.to_string());
                }
            }
        }

        // The email field is owned by the session, not the form.
        state.personal.email = state.session_email.clone();
        Ok(state)
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn acknowledged(&self) -> bool {
        self.acknowledged
    }

    pub fn set_acknowledged(&mut self, acknowledged: bool) {
        self.acknowledged = acknowledged;
    }

    fn slot_index(kind: DocumentKind) -> usize {
        match kind {
            DocumentKind::Photo => 0,
            DocumentKind::HighSchoolCertificate => 1,
            DocumentKind::IntermediateCertificate => 2,
            DocumentKind::EntranceExamResult => 3,
        }
    }

    pub fn slot(&self, kind: DocumentKind) -> &DocumentSlot {
        &self.slots[Self::slot_index(kind)]
    }

    pub(crate) fn slot_mut(&mut self, kind: DocumentKind) -> &mut DocumentSlot {
        &mut self.slots[Self::slot_index(kind)]
    }

    /// Validate step 1 with the session email forced over whatever the
    /// caller placed in the draft.
    pub fn validated_personal(&mut self) -> Result<PersonalInfo, Vec<FieldError>> {
        self.personal.email = self.session_email.clone();
        validate_personal(&self.personal)
    }

    pub fn validated_academic(&self) -> Result<AcademicInfo, Vec<FieldError>> {
        validate_academic(&self.academic)
    }

    /// Move forward one step. Leaving a form step validates it; the
    /// documents step imposes nothing here (submission gating handles it).
    /// Advancing from Review stays put.
    pub fn advance(&mut self) -> Result<WizardStep, WizardError> {
        match self.step {
            WizardStep::Personal => {
                self.validated_personal().map_err(WizardError::Step)?;
            }
            WizardStep::Academic => {
                self.validated_academic().map_err(WizardError::Step)?;
            }
            WizardStep::Documents | WizardStep::Review => {}
        }
        if let Some(next) = self.step.next() {
            self.step = next;
        }
        Ok(self.step)
    }

    /// Move back one step. Never validates, never discards entered data.
    pub fn back(&mut self) -> WizardStep {
        if let Some(previous) = self.step.previous() {
            self.step = previous;
        }
        self.step
    }

    /// Stage a file for a slot after the size/type policy passes. Clears the
    /// slot's stored URL until the replacement upload completes.
    pub fn select_file(&mut self, kind: DocumentKind, file: UploadFile) -> Result<(), WizardError> {
        self.policy.check(&file)?;
        self.slot_mut(kind).select(file);
        Ok(())
    }

    pub fn mark_uploaded(&mut self, kind: DocumentKind, url: String) {
        self.slot_mut(kind).mark_uploaded(url);
    }

    /// Slots with neither an uploaded URL nor a staged file.
    pub fn missing_documents(&self) -> Vec<DocumentKind> {
        DocumentKind::ALL
            .into_iter()
            .filter(|kind| !self.slot(*kind).is_satisfied())
            .collect()
    }

    /// Mirror of the submit control: enabled only on Review, with the
    /// declaration checked and every slot satisfied.
    pub fn ready_to_submit(&self) -> bool {
        self.step == WizardStep::Review && self.acknowledged && self.missing_documents().is_empty()
    }

    /// Assemble the document set once every slot carries a URL.
    pub fn document_set(&self) -> Option<DocumentSet> {
        let url = |kind: DocumentKind| self.slot(kind).url().map(str::to_string);
        Some(DocumentSet {
            photo_url: url(DocumentKind::Photo)?,
            high_school_certificate_url: url(DocumentKind::HighSchoolCertificate)?,
            intermediate_certificate_url: url(DocumentKind::IntermediateCertificate)?,
            entrance_exam_result_url: url(DocumentKind::EntranceExamResult)?,
        })
    }
}

fn draft_from_personal(info: &PersonalInfo) -> PersonalDraft {
    PersonalDraft {
        first_name: info.first_name.clone(),
        last_name: info.last_name.clone(),
        date_of_birth: info.date_of_birth.format("%Y-%m-%d").to_string(),
        gender: Some(info.gender),
        email: info.email.clone(),
        phone: info.phone.clone(),
        address: info.address.clone(),
        city: info.city.clone(),
        state: info.state.clone(),
        zip_code: info.zip_code.clone(),
    }
}

fn draft_from_academic(info: &AcademicInfo) -> AcademicDraft {
    AcademicDraft {
        high_school_name: info.high_school_name.clone(),
        high_school_percentage: info.high_school_percentage,
        intermediate_school_name: info.intermediate_school_name.clone(),
        intermediate_percentage: info.intermediate_percentage,
        entrance_exam: Some(info.entrance_exam),
        entrance_exam_rank: info.entrance_exam_rank,
        preferred_branch: Some(info.preferred_branch),
    }
}
