use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::admin::{AdminConsole, AdminError, FilterSpec};
use super::dashboard::DashboardView;
use super::domain::{ApplicantId, ApplicationStatus, DocumentKind};
use super::profile::{ProfileError, ProfileService, ProfileUpdate};
use super::repository::{ApplicantRepository, BlobStore, RepositoryError};
use super::service::{AdmissionError, AdmissionService};
use super::validation::{AcademicDraft, PersonalDraft, UploadFile};
use super::wizard::{WizardError, WizardState, WizardStep};

/// Four 5 MiB documents inflate to roughly 27 MiB of base64 inside the
/// JSON envelope, so the submit route needs more room than the default
/// request-body limit allows.
const SUBMIT_BODY_LIMIT_BYTES: usize = 28 * 1024 * 1024;

/// Shared router state bundling the portal services.
pub struct PortalState<R, B> {
    pub admissions: Arc<AdmissionService<R, B>>,
    pub console: Arc<AdminConsole<R>>,
    pub profile: Arc<ProfileService<R>>,
    pub repository: Arc<R>,
}

impl<R, B> Clone for PortalState<R, B> {
    fn clone(&self) -> Self {
        Self {
            admissions: Arc::clone(&self.admissions),
            console: Arc::clone(&self.console),
            profile: Arc::clone(&self.profile),
            repository: Arc::clone(&self.repository),
        }
    }
}

/// Router exposing the wizard, dashboard, and review console endpoints.
///
/// Authentication is delegated to the identity provider at the edge; the
/// authenticated uid arrives in the `x-uid` header.
pub fn portal_router<R, B>(state: PortalState<R, B>) -> Router
where
    R: ApplicantRepository + 'static,
    B: BlobStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/admissions/application",
            get(application_handler::<R, B>),
        )
        .route(
            "/api/v1/admissions/application/submit",
            post(submit_handler::<R, B>)
                .layer(DefaultBodyLimit::max(SUBMIT_BODY_LIMIT_BYTES)),
        )
        .route(
            "/api/v1/admissions/dashboard",
            get(dashboard_handler::<R, B>),
        )
        .route(
            "/api/v1/admissions/profile",
            get(profile_handler::<R, B>).patch(update_profile_handler::<R, B>),
        )
        .route("/api/v1/admin/applications", get(admin_list_handler::<R, B>))
        .route(
            "/api/v1/admin/applications/:uid/status",
            post(admin_status_handler::<R, B>),
        )
        .with_state(state)
}

/// Wizard session summary returned to the form on entry.
#[derive(Debug, Serialize)]
pub(crate) struct WizardView {
    pub(crate) step: WizardStep,
    pub(crate) personal: PersonalDraft,
    pub(crate) academic: AcademicDraft,
    pub(crate) documents: Vec<SlotView>,
    pub(crate) missing_documents: Vec<DocumentKind>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SlotView {
    pub(crate) kind: DocumentKind,
    pub(crate) label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) url: Option<String>,
}

impl WizardView {
    fn from_state(state: &WizardState) -> Self {
        Self {
            step: state.step(),
            personal: state.personal.clone(),
            academic: state.academic.clone(),
            documents: DocumentKind::ALL
                .into_iter()
                .map(|kind| SlotView {
                    kind,
                    label: kind.label(),
                    url: state.slot(kind).url().map(str::to_string),
                })
                .collect(),
            missing_documents: state.missing_documents(),
        }
    }
}

/// Full form value object posted from the review step.
#[derive(Debug, Deserialize)]
pub(crate) struct SubmitRequest {
    pub(crate) personal: PersonalDraft,
    pub(crate) academic: AcademicDraft,
    #[serde(default)]
    pub(crate) acknowledged: bool,
    #[serde(default)]
    pub(crate) files: Vec<FilePayload>,
}

/// A file staged for one slot, carried inline as base64.
#[derive(Debug, Deserialize)]
pub(crate) struct FilePayload {
    pub(crate) kind: DocumentKind,
    pub(crate) file_name: String,
    pub(crate) content_type: String,
    pub(crate) content_base64: String,
}

impl FilePayload {
    fn decode(&self) -> Result<UploadFile, Response> {
        let content_type = self
            .content_type
            .parse::<mime::Mime>()
            .map_err(|_| error_response(StatusCode::UNPROCESSABLE_ENTITY, "invalid content type"))?;
        let bytes = BASE64.decode(&self.content_base64).map_err(|_| {
            error_response(StatusCode::UNPROCESSABLE_ENTITY, "file payload is not valid base64")
        })?;
        Ok(UploadFile {
            file_name: self.file_name.clone(),
            content_type,
            bytes,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusRequest {
    pub(crate) status: ApplicationStatus,
}

fn error_response(status: StatusCode, message: impl std::fmt::Display) -> Response {
    (status, axum::Json(json!({ "error": message.to_string() }))).into_response()
}

fn uid_from_headers(headers: &HeaderMap) -> Result<ApplicantId, Response> {
    headers
        .get("x-uid")
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(|value| ApplicantId(value.to_string()))
        .ok_or_else(|| error_response(StatusCode::UNAUTHORIZED, "missing x-uid header"))
}

fn admission_error_response(error: AdmissionError) -> Response {
    match error {
        AdmissionError::Wizard(WizardError::AlreadySubmitted { status }) => error_response(
            StatusCode::CONFLICT,
            format!("application already submitted (status: {})", status.label()),
        ),
        AdmissionError::Validation(fields) | AdmissionError::Wizard(WizardError::Step(fields)) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            axum::Json(json!({
                "error": "step validation failed",
                "fields": fields,
            })),
        )
            .into_response(),
        AdmissionError::Wizard(WizardError::Upload(policy)) => {
            error_response(StatusCode::UNPROCESSABLE_ENTITY, policy)
        }
        AdmissionError::DeclarationRequired | AdmissionError::MissingDocuments(_) => {
            error_response(StatusCode::UNPROCESSABLE_ENTITY, error)
        }
        AdmissionError::Repository(RepositoryError::NotFound) => {
            error_response(StatusCode::NOT_FOUND, "applicant record not found")
        }
        other => error_response(StatusCode::INTERNAL_SERVER_ERROR, other),
    }
}

pub(crate) async fn application_handler<R, B>(
    State(state): State<PortalState<R, B>>,
    headers: HeaderMap,
) -> Response
where
    R: ApplicantRepository + 'static,
    B: BlobStore + 'static,
{
    let uid = match uid_from_headers(&headers) {
        Ok(uid) => uid,
        Err(response) => return response,
    };

    match state.admissions.start(&uid) {
        Ok(wizard) => (StatusCode::OK, axum::Json(WizardView::from_state(&wizard))).into_response(),
        Err(error) => admission_error_response(error),
    }
}

pub(crate) async fn submit_handler<R, B>(
    State(state): State<PortalState<R, B>>,
    headers: HeaderMap,
    axum::Json(request): axum::Json<SubmitRequest>,
) -> Response
where
    R: ApplicantRepository + 'static,
    B: BlobStore + 'static,
{
    let uid = match uid_from_headers(&headers) {
        Ok(uid) => uid,
        Err(response) => return response,
    };

    let mut wizard = match state.admissions.start(&uid) {
        Ok(wizard) => wizard,
        Err(error) => return admission_error_response(error),
    };

    wizard.personal = request.personal;
    wizard.academic = request.academic;
    wizard.set_acknowledged(request.acknowledged);

    for payload in &request.files {
        let file = match payload.decode() {
            Ok(file) => file,
            Err(response) => return response,
        };
        if let Err(error) = wizard.select_file(payload.kind, file) {
            return admission_error_response(error.into());
        }
    }

    match state.admissions.submit(&uid, &mut wizard, chrono::Utc::now()) {
        Ok(record) => (
            StatusCode::OK,
            axum::Json(json!({
                "status": record.status.label(),
                "submitted_at": record.submitted_at,
            })),
        )
            .into_response(),
        Err(error) => admission_error_response(error),
    }
}

pub(crate) async fn dashboard_handler<R, B>(
    State(state): State<PortalState<R, B>>,
    headers: HeaderMap,
) -> Response
where
    R: ApplicantRepository + 'static,
    B: BlobStore + 'static,
{
    let uid = match uid_from_headers(&headers) {
        Ok(uid) => uid,
        Err(response) => return response,
    };

    match state.repository.fetch(&uid) {
        Ok(Some(record)) => (
            StatusCode::OK,
            axum::Json(DashboardView::from_record(&record)),
        )
            .into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "applicant record not found"),
        Err(error) => error_response(StatusCode::INTERNAL_SERVER_ERROR, error),
    }
}

fn profile_error_response(error: ProfileError) -> Response {
    match error {
        ProfileError::NotFound => {
            error_response(StatusCode::NOT_FOUND, "applicant record not found")
        }
        ProfileError::Fields(fields) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            axum::Json(json!({
                "error": "profile validation failed",
                "fields": fields,
            })),
        )
            .into_response(),
        ProfileError::PersonalIncomplete => {
            error_response(StatusCode::UNPROCESSABLE_ENTITY, error)
        }
        ProfileError::Repository(repository) => {
            error_response(StatusCode::INTERNAL_SERVER_ERROR, repository)
        }
    }
}

pub(crate) async fn profile_handler<R, B>(
    State(state): State<PortalState<R, B>>,
    headers: HeaderMap,
) -> Response
where
    R: ApplicantRepository + 'static,
    B: BlobStore + 'static,
{
    let uid = match uid_from_headers(&headers) {
        Ok(uid) => uid,
        Err(response) => return response,
    };

    match state.profile.view(&uid) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => profile_error_response(error),
    }
}

pub(crate) async fn update_profile_handler<R, B>(
    State(state): State<PortalState<R, B>>,
    headers: HeaderMap,
    axum::Json(update): axum::Json<ProfileUpdate>,
) -> Response
where
    R: ApplicantRepository + 'static,
    B: BlobStore + 'static,
{
    let uid = match uid_from_headers(&headers) {
        Ok(uid) => uid,
        Err(response) => return response,
    };

    match state.profile.update(&uid, update) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => profile_error_response(error),
    }
}

/// Resolve the caller and require the admin role on their stored record.
fn require_admin<R: ApplicantRepository>(
    repository: &R,
    headers: &HeaderMap,
) -> Result<(), Response> {
    let uid = uid_from_headers(headers)?;
    match repository.fetch(&uid) {
        Ok(Some(record)) if record.is_admin() => Ok(()),
        Ok(_) => Err(error_response(
            StatusCode::FORBIDDEN,
            "administrator access required",
        )),
        Err(error) => Err(error_response(StatusCode::INTERNAL_SERVER_ERROR, error)),
    }
}

pub(crate) async fn admin_list_handler<R, B>(
    State(state): State<PortalState<R, B>>,
    headers: HeaderMap,
    Query(spec): Query<FilterSpec>,
) -> Response
where
    R: ApplicantRepository + 'static,
    B: BlobStore + 'static,
{
    if let Err(response) = require_admin(state.repository.as_ref(), &headers) {
        return response;
    }

    match state.console.filtered(&spec) {
        Ok(rows) => (StatusCode::OK, axum::Json(rows)).into_response(),
        Err(error) => error_response(StatusCode::INTERNAL_SERVER_ERROR, error),
    }
}

pub(crate) async fn admin_status_handler<R, B>(
    State(state): State<PortalState<R, B>>,
    headers: HeaderMap,
    Path(uid): Path<String>,
    axum::Json(request): axum::Json<StatusRequest>,
) -> Response
where
    R: ApplicantRepository + 'static,
    B: BlobStore + 'static,
{
    if let Err(response) = require_admin(state.repository.as_ref(), &headers) {
        return response;
    }

    match state.console.transition(&ApplicantId(uid), request.status) {
        Ok(row) => (StatusCode::OK, axum::Json(row)).into_response(),
        Err(AdminError::NoOpTransition(status)) => error_response(
            StatusCode::CONFLICT,
            format!("application is already {}", status.label()),
        ),
        Err(AdminError::InvalidTarget(status)) => error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("'{}' is not a valid review status", status.label()),
        ),
        Err(AdminError::Repository(RepositoryError::NotFound)) => {
            error_response(StatusCode::NOT_FOUND, "application not found")
        }
        Err(other) => error_response(StatusCode::INTERNAL_SERVER_ERROR, other),
    }
}
