//! Admission application lifecycle: the four-step form wizard, submission
//! orchestration, the administrator review console, the dashboard and
//! profile projections, plus the storage and identity seams they sit on.

pub mod admin;
pub mod dashboard;
pub mod domain;
pub mod profile;
pub mod repository;
pub mod router;
pub mod service;
pub mod session;
pub mod validation;
pub mod wizard;

#[cfg(test)]
mod tests;

pub use admin::{AdminConsole, AdminError, ApplicationRow, FilterSpec, SortDirection, SortKey};
pub use dashboard::{completion_percentage, DashboardView};
pub use domain::{
    AcademicInfo, ApplicantId, ApplicantRecord, ApplicantRole, ApplicationStatus, Branch,
    DocumentKind, DocumentSet, EntranceExam, Gender, PersonalInfo,
};
pub use profile::{ProfileError, ProfileService, ProfileUpdate, ProfileView};
pub use repository::{
    decode_record, order_for_review, ApplicantRepository, ApplicantUpdate, BlobError, BlobStore,
    RepositoryError,
};
pub use router::{portal_router, PortalState};
pub use service::{AdmissionError, AdmissionService};
pub use session::{
    FederatedClaims, Identity, IdentityError, IdentityProvider, Session, SessionError,
    SessionManager,
};
pub use validation::{
    validate_academic, validate_personal, AcademicDraft, FieldError, PersonalDraft, UploadFile,
    UploadPolicy, UploadPolicyError,
};
pub use wizard::{DocumentSlot, WizardError, WizardState, WizardStep};
