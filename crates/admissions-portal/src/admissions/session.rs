use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use super::domain::{ApplicantId, ApplicantRecord};
use super::repository::{ApplicantRepository, RepositoryError};

/// Opaque identity returned by the provider after registration or sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub uid: ApplicantId,
    pub email: String,
    pub display_name: String,
}

/// Claims handed over after the edge has verified a federated provider's
/// ID token. The subject is the provider's stable account identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FederatedClaims {
    pub subject: String,
    pub email: String,
    pub display_name: String,
}

/// Wraps the hosted identity provider. Adapters implement whichever backend
/// the deployment uses; tests run an in-memory one.
pub trait IdentityProvider: Send + Sync {
    fn register(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<Identity, IdentityError>;
    fn authenticate(&self, email: &str, password: &str) -> Result<Identity, IdentityError>;
    /// Resolve verified federated claims to an identity, minting one on the
    /// subject's first appearance.
    fn authenticate_federated(&self, claims: &FederatedClaims) -> Result<Identity, IdentityError>;
    fn sign_out(&self, uid: &ApplicantId) -> Result<(), IdentityError>;
    fn send_password_reset(&self, email: &str) -> Result<(), IdentityError>;
}

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("an account with this email already exists")]
    EmailTaken,
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

/// Explicitly passed session context: initialized at sign-in, torn down at
/// sign-out, handed to views instead of living as ambient global state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub uid: ApplicantId,
    pub email: String,
    pub display_name: String,
    /// Derived from the stored record's role, never from client input.
    pub is_admin: bool,
}

/// Composes the identity provider with the record store so every successful
/// authentication is backed by an applicant record.
pub struct SessionManager<I, R> {
    identity: Arc<I>,
    repository: Arc<R>,
}

impl<I, R> SessionManager<I, R>
where
    I: IdentityProvider + 'static,
    R: ApplicantRepository + 'static,
{
    pub fn new(identity: Arc<I>, repository: Arc<R>) -> Self {
        Self {
            identity,
            repository,
        }
    }

    /// Register a new account and create its applicant record.
    pub fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
        now: DateTime<Utc>,
    ) -> Result<Session, SessionError> {
        let identity = self.identity.register(email, password, display_name)?;
        let record = self.ensure_record(&identity, now)?;
        info!(uid = %record.uid.0, "applicant account created");
        Ok(session_for(&identity, &record))
    }

    /// Authenticate an existing account. A missing record (e.g. first
    /// federated sign-in) is created on the spot with student defaults.
    pub fn sign_in(
        &self,
        email: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<Session, SessionError> {
        let identity = self.identity.authenticate(email, password)?;
        let record = self.ensure_record(&identity, now)?;
        Ok(session_for(&identity, &record))
    }

    /// Authenticate through a federated provider's popup flow. The provider
    /// owns the credential exchange; we only see the verified claims. First
    /// appearances get an applicant record with student defaults, same as
    /// password sign-in.
    pub fn sign_in_federated(
        &self,
        claims: &FederatedClaims,
        now: DateTime<Utc>,
    ) -> Result<Session, SessionError> {
        let identity = self.identity.authenticate_federated(claims)?;
        let record = self.ensure_record(&identity, now)?;
        Ok(session_for(&identity, &record))
    }

    pub fn sign_out(&self, session: Session) -> Result<(), SessionError> {
        self.identity.sign_out(&session.uid)?;
        Ok(())
    }

    pub fn send_password_reset(&self, email: &str) -> Result<(), SessionError> {
        self.identity.send_password_reset(email)?;
        Ok(())
    }

    fn ensure_record(
        &self,
        identity: &Identity,
        now: DateTime<Utc>,
    ) -> Result<ApplicantRecord, SessionError> {
        if let Some(existing) = self.repository.fetch(&identity.uid)? {
            return Ok(existing);
        }

        let fresh = ApplicantRecord::new(
            identity.uid.clone(),
            identity.display_name.clone(),
            identity.email.clone(),
            now,
        );
        match self.repository.create(fresh) {
            Ok(created) => Ok(created),
            // Another tab won the race; the stored record is authoritative.
            Err(RepositoryError::Conflict) => self
                .repository
                .fetch(&identity.uid)?
                .ok_or(SessionError::Repository(RepositoryError::NotFound)),
            Err(other) => Err(other.into()),
        }
    }
}

fn session_for(identity: &Identity, record: &ApplicantRecord) -> Session {
    Session {
        uid: identity.uid.clone(),
        email: identity.email.clone(),
        display_name: identity.display_name.clone(),
        is_admin: record.is_admin(),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Identity(#[from] IdentityError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
