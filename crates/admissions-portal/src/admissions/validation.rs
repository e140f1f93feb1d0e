use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{AcademicInfo, Branch, EntranceExam, Gender, PersonalInfo};

/// One field-level violation. The wizard reports every violation on a step,
/// not just the first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{field}: {message}")]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub(crate) fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }

    pub(crate) fn required(field: &'static str) -> Self {
        Self::new(field, "this field is required")
    }
}

/// Raw step-1 input as entered. Everything is optional or stringly typed
/// until validation promotes it into a `PersonalInfo` block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonalDraft {
    pub first_name: String,
    pub last_name: String,
    /// ISO date as typed into the date field.
    pub date_of_birth: String,
    pub gender: Option<Gender>,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
}

/// Raw step-2 input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AcademicDraft {
    pub high_school_name: String,
    pub high_school_percentage: f32,
    pub intermediate_school_name: String,
    pub intermediate_percentage: f32,
    pub entrance_exam: Option<EntranceExam>,
    pub entrance_exam_rank: u32,
    pub preferred_branch: Option<Branch>,
}

pub(crate) fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn plausible_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !value.contains(char::is_whitespace)
}

pub(crate) fn exactly_digits(value: &str, count: usize) -> bool {
    value.len() == count && value.bytes().all(|b| b.is_ascii_digit())
}

fn percentage_in_range(value: f32) -> bool {
    value.is_finite() && (0.0..=100.0).contains(&value)
}

/// Validate step 1, returning the typed block or every violation found.
pub fn validate_personal(draft: &PersonalDraft) -> Result<PersonalInfo, Vec<FieldError>> {
    let mut errors = Vec::new();

    if is_blank(&draft.first_name) {
        errors.push(FieldError::required("first_name"));
    }
    if is_blank(&draft.last_name) {
        errors.push(FieldError::required("last_name"));
    }

    let date_of_birth = match NaiveDate::parse_from_str(draft.date_of_birth.trim(), "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            errors.push(FieldError::new(
                "date_of_birth",
                "date of birth must be a valid YYYY-MM-DD date",
            ));
            None
        }
    };

    if draft.gender.is_none() {
        errors.push(FieldError::required("gender"));
    }

    if is_blank(&draft.email) {
        errors.push(FieldError::required("email"));
    } else if !plausible_email(&draft.email) {
        errors.push(FieldError::new("email", "invalid email address"));
    }

    if !exactly_digits(&draft.phone, 10) {
        errors.push(FieldError::new("phone", "phone number must be 10 digits"));
    }

    if is_blank(&draft.address) {
        errors.push(FieldError::required("address"));
    }
    if is_blank(&draft.city) {
        errors.push(FieldError::required("city"));
    }
    if is_blank(&draft.state) {
        errors.push(FieldError::required("state"));
    }
    if !exactly_digits(&draft.zip_code, 6) {
        errors.push(FieldError::new("zip_code", "zip code must be 6 digits"));
    }

    match (date_of_birth, draft.gender) {
        (Some(date_of_birth), Some(gender)) if errors.is_empty() => Ok(PersonalInfo {
            first_name: draft.first_name.trim().to_string(),
            last_name: draft.last_name.trim().to_string(),
            date_of_birth,
            gender,
            email: draft.email.trim().to_string(),
            phone: draft.phone.clone(),
            address: draft.address.trim().to_string(),
            city: draft.city.trim().to_string(),
            state: draft.state.trim().to_string(),
            zip_code: draft.zip_code.clone(),
        }),
        _ => Err(errors),
    }
}

/// Validate step 2, returning the typed block or every violation found.
pub fn validate_academic(draft: &AcademicDraft) -> Result<AcademicInfo, Vec<FieldError>> {
    let mut errors = Vec::new();

    if is_blank(&draft.high_school_name) {
        errors.push(FieldError::required("high_school_name"));
    }
    if !percentage_in_range(draft.high_school_percentage) {
        errors.push(FieldError::new(
            "high_school_percentage",
            "percentage must be between 0 and 100",
        ));
    }
    if is_blank(&draft.intermediate_school_name) {
        errors.push(FieldError::required("intermediate_school_name"));
    }
    if !percentage_in_range(draft.intermediate_percentage) {
        errors.push(FieldError::new(
            "intermediate_percentage",
            "percentage must be between 0 and 100",
        ));
    }
    if draft.entrance_exam.is_none() {
        errors.push(FieldError::required("entrance_exam"));
    }
    if draft.entrance_exam_rank == 0 {
        errors.push(FieldError::new(
            "entrance_exam_rank",
            "rank must be positive",
        ));
    }
    if draft.preferred_branch.is_none() {
        errors.push(FieldError::required("preferred_branch"));
    }

    match (draft.entrance_exam, draft.preferred_branch) {
        (Some(entrance_exam), Some(preferred_branch)) if errors.is_empty() => Ok(AcademicInfo {
            high_school_name: draft.high_school_name.trim().to_string(),
            high_school_percentage: draft.high_school_percentage,
            intermediate_school_name: draft.intermediate_school_name.trim().to_string(),
            intermediate_percentage: draft.intermediate_percentage,
            entrance_exam,
            entrance_exam_rank: draft.entrance_exam_rank,
            preferred_branch,
        }),
        _ => Err(errors),
    }
}

/// File contents staged for upload to the blob store.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: mime::Mime,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Rejections raised before any bytes are transferred.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadPolicyError {
    #[error("file size should be less than {max_bytes} bytes (got {found})")]
    TooLarge { max_bytes: u64, found: u64 },
    #[error("only JPG, PNG, and PDF files are allowed (got {0})")]
    UnsupportedType(String),
}

/// Size and content-type policy applied client-side of the blob store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicy {
    max_bytes: u64,
}

impl UploadPolicy {
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    pub fn check(&self, file: &UploadFile) -> Result<(), UploadPolicyError> {
        if file.size() > self.max_bytes {
            return Err(UploadPolicyError::TooLarge {
                max_bytes: self.max_bytes,
                found: file.size(),
            });
        }

        let allowed = file.content_type == mime::IMAGE_JPEG
            || file.content_type == mime::IMAGE_PNG
            || file.content_type == mime::APPLICATION_PDF;
        if !allowed {
            return Err(UploadPolicyError::UnsupportedType(
                file.content_type.to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self::new(crate::config::UploadConfig::DEFAULT_MAX_BYTES)
    }
}
