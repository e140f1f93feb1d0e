use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::domain::{ApplicantId, ApplicantRecord, ApplicationStatus, Branch};
use super::repository::{ApplicantRepository, ApplicantUpdate, RepositoryError};

/// One row of the review console list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplicationRow {
    pub uid: ApplicantId,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub preferred_branch: Branch,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
    pub status: ApplicationStatus,
}

impl ApplicationRow {
    /// Project a stored record into a list row. Records missing either info
    /// block are not listable and yield `None`.
    pub fn from_record(record: &ApplicantRecord) -> Option<Self> {
        let personal = record.personal.as_ref()?;
        let academic = record.academic.as_ref()?;
        Some(Self {
            uid: record.uid.clone(),
            full_name: personal.full_name(),
            email: personal.email.clone(),
            phone: personal.phone.clone(),
            preferred_branch: academic.preferred_branch,
            submitted_at: record.submitted_at,
            status: record.status,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Date,
    Name,
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

/// Client-side search, filter, and sort controls for the console list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterSpec {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub status: Option<ApplicationStatus>,
    #[serde(default)]
    pub branch: Option<Branch>,
    #[serde(default, rename = "sort")]
    pub sort_by: SortKey,
    #[serde(default, rename = "dir")]
    pub direction: SortDirection,
}

impl FilterSpec {
    fn matches(&self, row: &ApplicationRow) -> bool {
        if let Some(term) = &self.search {
            let needle = term.to_lowercase();
            let hit = row.full_name.to_lowercase().contains(&needle)
                || row.email.to_lowercase().contains(&needle)
                || row.phone.contains(term.as_str());
            if !hit {
                return false;
            }
        }
        if let Some(status) = self.status {
            if row.status != status {
                return false;
            }
        }
        if let Some(branch) = self.branch {
            if row.preferred_branch != branch {
                return false;
            }
        }
        true
    }

    fn sort(&self, rows: &mut [ApplicationRow]) {
        rows.sort_by(|a, b| {
            let ordering = match self.sort_by {
                SortKey::Date => a.submitted_at.cmp(&b.submitted_at),
                SortKey::Name => a.full_name.cmp(&b.full_name),
                SortKey::Status => a.status.label().cmp(b.status.label()),
            };
            match self.direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        });
    }
}

/// Administrator review console over the applicant store.
pub struct AdminConsole<R> {
    repository: Arc<R>,
}

impl<R> AdminConsole<R>
where
    R: ApplicantRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// One bulk read of every non-incomplete record, projected to rows.
    pub fn list(&self) -> Result<Vec<ApplicationRow>, AdminError> {
        let records = self.repository.submitted_applications()?;
        Ok(records.iter().filter_map(ApplicationRow::from_record).collect())
    }

    /// List with search/filter/sort applied.
    pub fn filtered(&self, spec: &FilterSpec) -> Result<Vec<ApplicationRow>, AdminError> {
        let mut rows: Vec<_> = self
            .list()?
            .into_iter()
            .filter(|row| spec.matches(row))
            .collect();
        spec.sort(&mut rows);
        Ok(rows)
    }

    /// Move an application to a new status. Transitioning into the current
    /// status is a no-op and rejected; `incomplete` is never a valid target.
    /// The returned row is the caller's optimistic list update.
    pub fn transition(
        &self,
        uid: &ApplicantId,
        target: ApplicationStatus,
    ) -> Result<ApplicationRow, AdminError> {
        if !target.admin_assignable() {
            return Err(AdminError::InvalidTarget(target));
        }

        let current = self
            .repository
            .fetch(uid)?
            .ok_or(RepositoryError::NotFound)?;
        if current.status == target {
            return Err(AdminError::NoOpTransition(target));
        }

        let updated = self.repository.update(uid, ApplicantUpdate::status(target))?;
        info!(uid = %uid.0, status = target.label(), "application status updated");

        ApplicationRow::from_record(&updated).ok_or(AdminError::MissingProfile)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error("'{}' is not a valid review status", .0.label())]
    InvalidTarget(ApplicationStatus),
    #[error("application is already {}", .0.label())]
    NoOpTransition(ApplicationStatus),
    #[error("record is missing its application profile")]
    MissingProfile,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
