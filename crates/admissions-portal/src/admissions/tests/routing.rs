use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::Response;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;
use crate::admissions::admin::AdminConsole;
use crate::admissions::domain::{ApplicantRole, ApplicationStatus};
use crate::admissions::profile::ProfileService;
use crate::admissions::router::{portal_router, PortalState};

fn test_router(repository: Arc<MemoryRepository>) -> axum::Router {
    let blobs = Arc::new(MemoryBlobStore::default());
    let state = PortalState {
        admissions: Arc::new(build_service(repository.clone(), blobs)),
        console: Arc::new(AdminConsole::new(repository.clone())),
        profile: Arc::new(ProfileService::new(repository.clone())),
        repository,
    };
    portal_router(state)
}

async fn read_json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body reads");
    serde_json::from_slice(&bytes).expect("body is JSON")
}

fn get(path: &str, uid: Option<&str>) -> axum::http::Request<axum::body::Body> {
    let mut builder = axum::http::Request::get(path);
    if let Some(uid) = uid {
        builder = builder.header("x-uid", uid);
    }
    builder.body(axum::body::Body::empty()).expect("request builds")
}

fn post_json(
    path: &str,
    uid: Option<&str>,
    body: &Value,
) -> axum::http::Request<axum::body::Body> {
    let mut builder = axum::http::Request::post(path)
        .header(axum::http::header::CONTENT_TYPE, "application/json");
    if let Some(uid) = uid {
        builder = builder.header("x-uid", uid);
    }
    builder
        .body(axum::body::Body::from(
            serde_json::to_vec(body).expect("body serializes"),
        ))
        .expect("request builds")
}

fn patch_json(
    path: &str,
    uid: Option<&str>,
    body: &Value,
) -> axum::http::Request<axum::body::Body> {
    let mut builder = axum::http::Request::patch(path)
        .header(axum::http::header::CONTENT_TYPE, "application/json");
    if let Some(uid) = uid {
        builder = builder.header("x-uid", uid);
    }
    builder
        .body(axum::body::Body::from(
            serde_json::to_vec(body).expect("body serializes"),
        ))
        .expect("request builds")
}

fn file_payload(kind: &str, name: &str, content_type: &str) -> Value {
    json!({
        "kind": kind,
        "file_name": name,
        "content_type": content_type,
        "content_base64": BASE64.encode([0u8; 64]),
    })
}

fn submit_body() -> Value {
    json!({
        "personal": serde_json::to_value(personal_draft()).expect("draft serializes"),
        "academic": serde_json::to_value(academic_draft()).expect("draft serializes"),
        "acknowledged": true,
        "files": [
            file_payload("photo", "photo.png", "image/png"),
            file_payload("high_school_certificate", "hs.pdf", "application/pdf"),
            file_payload("intermediate_certificate", "inter.pdf", "application/pdf"),
            file_payload("entrance_exam_result", "exam.pdf", "application/pdf"),
        ],
    })
}

#[tokio::test]
async fn application_requires_the_uid_header() {
    let router = test_router(MemoryRepository::seeded([student_record("uid-1")]));
    let response = router
        .oneshot(get("/api/v1/admissions/application", None))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn application_returns_the_hydrated_wizard() {
    let router = test_router(MemoryRepository::seeded([resumable_record("uid-1")]));
    let response = router
        .oneshot(get("/api/v1/admissions/application", Some("uid-1")))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["personal"]["first_name"], "Asha");
    assert_eq!(body["missing_documents"].as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn application_conflicts_once_submitted() {
    let router = test_router(MemoryRepository::seeded([submitted_record(
        "uid-1",
        ApplicationStatus::Submitted,
    )]));
    let response = router
        .oneshot(get("/api/v1/admissions/application", Some("uid-1")))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn submit_route_runs_the_whole_sequence() {
    let repository = MemoryRepository::seeded([student_record("uid-1")]);
    let router = test_router(repository.clone());

    let response = router
        .oneshot(post_json(
            "/api/v1/admissions/application/submit",
            Some("uid-1"),
            &submit_body(),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["status"], "submitted");

    let stored = repository.stored("uid-1").expect("record present");
    assert_eq!(stored.status, ApplicationStatus::Submitted);
    assert!(stored.submitted_at.is_some());
}

#[tokio::test]
async fn submit_accepts_documents_near_the_size_limit() {
    let repository = MemoryRepository::seeded([student_record("uid-1")]);
    let router = test_router(repository.clone());

    // A 3 MiB photo is within the per-slot policy but its base64 form
    // alone is well past the stock request-body limit.
    let mut body = submit_body();
    body["files"][0] = json!({
        "kind": "photo",
        "file_name": "photo.png",
        "content_type": "image/png",
        "content_base64": BASE64.encode(vec![0u8; 3 * 1024 * 1024]),
    });
    let response = router
        .oneshot(post_json(
            "/api/v1/admissions/application/submit",
            Some("uid-1"),
            &body,
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let stored = repository.stored("uid-1").expect("record present");
    assert_eq!(stored.status, ApplicationStatus::Submitted);
}

#[tokio::test]
async fn submit_rejects_invalid_steps_with_field_errors() {
    let router = test_router(MemoryRepository::seeded([student_record("uid-1")]));

    let mut body = submit_body();
    body["personal"]["phone"] = json!("12345");
    let response = router
        .oneshot(post_json(
            "/api/v1/admissions/application/submit",
            Some("uid-1"),
            &body,
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = read_json_body(response).await;
    let fields = body["fields"].as_array().expect("field errors listed");
    assert!(fields.iter().any(|f| f["field"] == "phone"));
}

#[tokio::test]
async fn submit_rejects_disallowed_file_types() {
    let router = test_router(MemoryRepository::seeded([student_record("uid-1")]));

    let mut body = submit_body();
    body["files"][0] = file_payload("photo", "photo.gif", "image/gif");
    let response = router
        .oneshot(post_json(
            "/api/v1/admissions/application/submit",
            Some("uid-1"),
            &body,
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn dashboard_reports_completion() {
    let router = test_router(MemoryRepository::seeded([resumable_record("uid-1")]));
    let response = router
        .oneshot(get("/api/v1/admissions/dashboard", Some("uid-1")))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["completion_percentage"], 50);
    assert_eq!(body["status"], "incomplete");
}

#[tokio::test]
async fn profile_returns_the_stored_contact_details() {
    let router = test_router(MemoryRepository::seeded([resumable_record("uid-1")]));
    let response = router
        .oneshot(get("/api/v1/admissions/profile", Some("uid-1")))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["display_name"], "Asha Verma");
    assert_eq!(body["phone"], "9876543210");
}

#[tokio::test]
async fn profile_patch_updates_name_and_phone() {
    let repository = MemoryRepository::seeded([resumable_record("uid-1")]);
    let router = test_router(repository.clone());

    let response = router
        .oneshot(patch_json(
            "/api/v1/admissions/profile",
            Some("uid-1"),
            &json!({ "display_name": "Asha V.", "phone": "9123456789" }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let stored = repository.stored("uid-1").expect("record present");
    assert_eq!(stored.display_name, "Asha V.");
    assert_eq!(
        stored.personal.as_ref().map(|p| p.phone.as_str()),
        Some("9123456789")
    );
}

#[tokio::test]
async fn profile_patch_rejects_a_bad_phone() {
    let router = test_router(MemoryRepository::seeded([resumable_record("uid-1")]));
    let response = router
        .oneshot(patch_json(
            "/api/v1/admissions/profile",
            Some("uid-1"),
            &json!({ "phone": "12345" }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = read_json_body(response).await;
    let fields = body["fields"].as_array().expect("field errors listed");
    assert!(fields.iter().any(|f| f["field"] == "phone"));
}

#[tokio::test]
async fn admin_routes_require_the_admin_role() {
    let router = test_router(MemoryRepository::seeded([student_record("uid-1")]));
    let response = router
        .oneshot(get("/api/v1/admin/applications", Some("uid-1")))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

fn admin_record(uid: &str) -> crate::admissions::domain::ApplicantRecord {
    let mut record = student_record(uid);
    record.role = ApplicantRole::Admin;
    record
}

#[tokio::test]
async fn admin_list_applies_query_filters() {
    let repository = MemoryRepository::seeded([
        admin_record("admin-1"),
        submitted_record("uid-1", ApplicationStatus::Submitted),
        submitted_record("uid-2", ApplicationStatus::Approved),
    ]);
    let router = test_router(repository);

    let response = router
        .oneshot(get(
            "/api/v1/admin/applications?status=approved&branch=computer_science",
            Some("admin-1"),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    let rows = body.as_array().expect("rows listed");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["status"], "approved");
}

#[tokio::test]
async fn admin_status_transition_conflicts_on_noop() {
    let repository = MemoryRepository::seeded([
        admin_record("admin-1"),
        submitted_record("uid-1", ApplicationStatus::Approved),
    ]);
    let router = test_router(repository);

    let response = router
        .oneshot(post_json(
            "/api/v1/admin/applications/uid-1/status",
            Some("admin-1"),
            &json!({ "status": "approved" }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn admin_status_transition_returns_the_updated_row() {
    let repository = MemoryRepository::seeded([
        admin_record("admin-1"),
        submitted_record("uid-1", ApplicationStatus::Submitted),
    ]);
    let router = test_router(repository.clone());

    let response = router
        .oneshot(post_json(
            "/api/v1/admin/applications/uid-1/status",
            Some("admin-1"),
            &json!({ "status": "under_review" }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["status"], "under_review");

    let stored = repository.stored("uid-1").expect("record present");
    assert_eq!(stored.status, ApplicationStatus::UnderReview);
}
