//! Account profile: the name and contact details an applicant can edit
//! outside the wizard, without touching their application.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::domain::{ApplicantId, ApplicantRecord};
use super::repository::{ApplicantRepository, ApplicantUpdate, RepositoryError};
use super::validation::{exactly_digits, is_blank, FieldError};

/// Read projection of the editable profile surface. Contact fields come
/// from the personal block and are absent until that step is saved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileView {
    pub display_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
}

impl ProfileView {
    pub fn from_record(record: &ApplicantRecord) -> Self {
        let personal = record.personal.as_ref();
        Self {
            display_name: record.display_name.clone(),
            email: record.email.clone(),
            phone: personal.map(|p| p.phone.clone()),
            address: personal.map(|p| p.address.clone()),
            city: personal.map(|p| p.city.clone()),
            state: personal.map(|p| p.state.clone()),
            zip_code: personal.map(|p| p.zip_code.clone()),
        }
    }
}

/// Partial edit; absent fields are left as stored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
}

impl ProfileUpdate {
    fn touches_contact(&self) -> bool {
        self.phone.is_some()
            || self.address.is_some()
            || self.city.is_some()
            || self.state.is_some()
            || self.zip_code.is_some()
    }

    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();

        if let Some(name) = &self.display_name {
            let trimmed = name.trim();
            if trimmed.is_empty() {
                errors.push(FieldError::required("display_name"));
            } else if trimmed.chars().count() < 2 {
                errors.push(FieldError::new("display_name", "name is too short"));
            } else if trimmed.chars().count() > 50 {
                errors.push(FieldError::new("display_name", "name is too long"));
            }
        }
        if let Some(phone) = &self.phone {
            if !exactly_digits(phone, 10) {
                errors.push(FieldError::new("phone", "phone number must be 10 digits"));
            }
        }
        if let Some(address) = &self.address {
            if is_blank(address) {
                errors.push(FieldError::required("address"));
            } else if address.chars().count() > 200 {
                errors.push(FieldError::new("address", "address is too long"));
            }
        }
        if let Some(city) = &self.city {
            if is_blank(city) {
                errors.push(FieldError::required("city"));
            } else if city.chars().count() > 50 {
                errors.push(FieldError::new("city", "city name is too long"));
            }
        }
        if let Some(state) = &self.state {
            if is_blank(state) {
                errors.push(FieldError::required("state"));
            } else if state.chars().count() > 50 {
                errors.push(FieldError::new("state", "state name is too long"));
            }
        }
        if let Some(zip_code) = &self.zip_code {
            if !exactly_digits(zip_code, 6) {
                errors.push(FieldError::new("zip_code", "zip code must be 6 digits"));
            }
        }

        errors
    }
}

/// Reads and edits the profile surface of an applicant record. The email
/// stays provider-owned and the application blocks stay wizard-owned.
pub struct ProfileService<R> {
    repository: Arc<R>,
}

impl<R> ProfileService<R>
where
    R: ApplicantRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    pub fn view(&self, uid: &ApplicantId) -> Result<ProfileView, ProfileError> {
        let record = self
            .repository
            .fetch(uid)?
            .ok_or(ProfileError::NotFound)?;
        Ok(ProfileView::from_record(&record))
    }

    /// Apply a partial edit. Contact fields live on the personal block, so
    /// editing them requires that step to have been saved at least once.
    pub fn update(
        &self,
        uid: &ApplicantId,
        update: ProfileUpdate,
    ) -> Result<ProfileView, ProfileError> {
        let errors = update.validate();
        if !errors.is_empty() {
            return Err(ProfileError::Fields(errors));
        }

        let record = self
            .repository
            .fetch(uid)?
            .ok_or(ProfileError::NotFound)?;

        let mut applied = ApplicantUpdate {
            display_name: update
                .display_name
                .as_deref()
                .map(|name| name.trim().to_string()),
            ..ApplicantUpdate::default()
        };

        if update.touches_contact() {
            let mut personal = record
                .personal
                .clone()
                .ok_or(ProfileError::PersonalIncomplete)?;
            if let Some(phone) = update.phone {
                personal.phone = phone;
            }
            if let Some(address) = update.address {
                personal.address = address.trim().to_string();
            }
            if let Some(city) = update.city {
                personal.city = city.trim().to_string();
            }
            if let Some(state) = update.state {
                personal.state = state.trim().to_string();
            }
            if let Some(zip_code) = update.zip_code {
                personal.zip_code = zip_code;
            }
            applied.personal = Some(personal);
        }

        let stored = self.repository.update(uid, applied)?;
        info!(uid = %uid.0, "profile updated");
        Ok(ProfileView::from_record(&stored))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("applicant record not found")]
    NotFound,
    #[error("profile validation failed")]
    Fields(Vec<FieldError>),
    #[error("save the personal details step before editing contact fields")]
    PersonalIncomplete,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
