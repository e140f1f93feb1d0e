use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Identifier assigned by the identity provider. Opaque and stable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicantId(pub String);

/// Role stored on the applicant record. Applicant-facing code paths never
/// write this field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicantRole {
    Student,
    Admin,
}

/// Lifecycle of one admission application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Incomplete,
    Submitted,
    UnderReview,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Incomplete => "incomplete",
            ApplicationStatus::Submitted => "submitted",
            ApplicationStatus::UnderReview => "under_review",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    /// Target states an administrator may move an application into.
    pub const fn admin_assignable(self) -> bool {
        !matches!(self, ApplicationStatus::Incomplete)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub const fn label(self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
        }
    }
}

/// Entrance examinations accepted by the program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntranceExam {
    JeeMain,
    JeeAdvanced,
    Upsee,
    Other,
}

impl EntranceExam {
    pub const fn label(self) -> &'static str {
        match self {
            EntranceExam::JeeMain => "JEE Main",
            EntranceExam::JeeAdvanced => "JEE Advanced",
            EntranceExam::Upsee => "UPSEE",
            EntranceExam::Other => "Other",
        }
    }
}

/// Engineering branches offered for admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Branch {
    ComputerScience,
    ElectronicsAndCommunication,
    Electrical,
    Mechanical,
    Civil,
    Chemical,
    InformationTechnology,
}

impl Branch {
    pub const fn label(self) -> &'static str {
        match self {
            Branch::ComputerScience => "Computer Science and Engineering",
            Branch::ElectronicsAndCommunication => "Electronics and Communication Engineering",
            Branch::Electrical => "Electrical Engineering",
            Branch::Mechanical => "Mechanical Engineering",
            Branch::Civil => "Civil Engineering",
            Branch::Chemical => "Chemical Engineering",
            Branch::InformationTechnology => "Information Technology",
        }
    }

    pub const ALL: [Branch; 7] = [
        Branch::ComputerScience,
        Branch::ElectronicsAndCommunication,
        Branch::Electrical,
        Branch::Mechanical,
        Branch::Civil,
        Branch::Chemical,
        Branch::InformationTechnology,
    ];
}

/// Step-1 block, present only once the wizard has validated and stored it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalInfo {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
}

impl PersonalInfo {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Step-2 block: schooling history and entrance exam results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcademicInfo {
    pub high_school_name: String,
    pub high_school_percentage: f32,
    pub intermediate_school_name: String,
    pub intermediate_percentage: f32,
    pub entrance_exam: EntranceExam,
    pub entrance_exam_rank: u32,
    pub preferred_branch: Branch,
}

/// The four required document slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Photo,
    HighSchoolCertificate,
    IntermediateCertificate,
    EntranceExamResult,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 4] = [
        DocumentKind::Photo,
        DocumentKind::HighSchoolCertificate,
        DocumentKind::IntermediateCertificate,
        DocumentKind::EntranceExamResult,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            DocumentKind::Photo => "Passport Size Photo",
            DocumentKind::HighSchoolCertificate => "High School Certificate",
            DocumentKind::IntermediateCertificate => "Intermediate Certificate",
            DocumentKind::EntranceExamResult => "Entrance Exam Result",
        }
    }

    /// Blob-store directory for uploads of this kind.
    pub const fn storage_dir(self) -> &'static str {
        match self {
            DocumentKind::Photo => "photos",
            DocumentKind::HighSchoolCertificate => "high_school_certificates",
            DocumentKind::IntermediateCertificate => "intermediate_certificates",
            DocumentKind::EntranceExamResult => "entrance_exam_results",
        }
    }
}

/// Durable URLs for the four uploaded documents. A new upload overwrites the
/// slot; superseded blobs are abandoned in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSet {
    pub photo_url: String,
    pub high_school_certificate_url: String,
    pub intermediate_certificate_url: String,
    pub entrance_exam_result_url: String,
}

impl DocumentSet {
    pub fn url(&self, kind: DocumentKind) -> &str {
        match kind {
            DocumentKind::Photo => &self.photo_url,
            DocumentKind::HighSchoolCertificate => &self.high_school_certificate_url,
            DocumentKind::IntermediateCertificate => &self.intermediate_certificate_url,
            DocumentKind::EntranceExamResult => &self.entrance_exam_result_url,
        }
    }

    pub fn is_complete(&self) -> bool {
        DocumentKind::ALL.iter().all(|kind| !self.url(*kind).is_empty())
    }
}

/// One backend record per authenticated identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicantRecord {
    pub uid: ApplicantId,
    pub display_name: String,
    pub email: String,
    pub role: ApplicantRole,
    pub status: ApplicationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub personal: Option<PersonalInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub academic: Option<AcademicInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documents: Option<DocumentSet>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
}

impl ApplicantRecord {
    /// Fresh record written at first successful authentication.
    pub fn new(uid: ApplicantId, display_name: String, email: String, now: DateTime<Utc>) -> Self {
        Self {
            uid,
            display_name,
            email,
            role: ApplicantRole::Student,
            status: ApplicationStatus::Incomplete,
            personal: None,
            academic: None,
            documents: None,
            created_at: now,
            submitted_at: None,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == ApplicantRole::Admin
    }
}
