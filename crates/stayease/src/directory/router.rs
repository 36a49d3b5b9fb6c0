use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{NewStaff, NewStudent};
use super::repository::DirectoryRepository;
use super::service::{DirectoryError, DirectoryService};
use crate::actor::{resolve_from_headers, MemberId};
use crate::complaints::repository::ComplaintRepository;
use crate::notify::NotificationQueue;
use crate::store::RepositoryError;

type Api<D, C, N> = Arc<DirectoryService<D, C, N>>;

/// Router for student registration and the admin roster endpoints.
pub fn directory_router<D, C, N>(service: Api<D, C, N>) -> Router
where
    D: DirectoryRepository + 'static,
    C: ComplaintRepository + 'static,
    N: NotificationQueue + 'static,
{
    Router::new()
        .route("/api/v1/students/signup", post(signup_handler::<D, C, N>))
        .route(
            "/api/v1/students/check-email",
            post(check_email_handler::<D, C, N>),
        )
        .route(
            "/api/v1/admin/staff",
            get(staff_roster_handler::<D, C, N>).post(create_staff_handler::<D, C, N>),
        )
        .route(
            "/api/v1/admin/staff/available",
            get(available_staff_handler::<D, C, N>),
        )
        .route(
            "/api/v1/admin/staff/performance",
            get(performance_handler::<D, C, N>),
        )
        .route(
            "/api/v1/admin/staff/:id",
            delete(deactivate_staff_handler::<D, C, N>),
        )
        .route("/api/v1/admin/students", get(students_handler::<D, C, N>))
        .route(
            "/api/v1/admin/students/:id",
            get(student_detail_handler::<D, C, N>).delete(remove_student_handler::<D, C, N>),
        )
        .route(
            "/api/v1/admin/students/:id/status",
            patch(toggle_student_handler::<D, C, N>),
        )
        .with_state(service)
}

fn error_response(err: DirectoryError) -> Response {
    let status = match &err {
        DirectoryError::Validation(_) | DirectoryError::EmailTaken => StatusCode::BAD_REQUEST,
        DirectoryError::Permission(_) => StatusCode::FORBIDDEN,
        DirectoryError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        DirectoryError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let body = Json(json!({ "error": err.to_string() }));
    (status, body).into_response()
}

#[derive(Debug, Deserialize)]
struct CheckEmailRequest {
    email: String,
}

async fn signup_handler<D, C, N>(
    State(service): State<Api<D, C, N>>,
    Json(payload): Json<NewStudent>,
) -> Response
where
    D: DirectoryRepository + 'static,
    C: ComplaintRepository + 'static,
    N: NotificationQueue + 'static,
{
    match service.signup_student(payload) {
        Ok(member) => (
            StatusCode::CREATED,
            Json(json!({
                "message": "Student registered successfully",
                "id": member.id,
            })),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

async fn check_email_handler<D, C, N>(
    State(service): State<Api<D, C, N>>,
    Json(payload): Json<CheckEmailRequest>,
) -> Response
where
    D: DirectoryRepository + 'static,
    C: ComplaintRepository + 'static,
    N: NotificationQueue + 'static,
{
    match service.email_exists(&payload.email) {
        Ok(exists) => (StatusCode::OK, Json(json!({ "exists": exists }))).into_response(),
        Err(err) => error_response(err),
    }
}

async fn create_staff_handler<D, C, N>(
    State(service): State<Api<D, C, N>>,
    headers: HeaderMap,
    Json(payload): Json<NewStaff>,
) -> Response
where
    D: DirectoryRepository + 'static,
    C: ComplaintRepository + 'static,
    N: NotificationQueue + 'static,
{
    let actor = match resolve_from_headers(service.as_ref(), &headers) {
        Ok(actor) => actor,
        Err(rejection) => return rejection,
    };
    match service.create_staff(&actor, payload) {
        Ok(created) => (
            StatusCode::CREATED,
            Json(json!({
                "message": "Staff created successfully",
                "email_sent": created.notified,
                "staff": {
                    "id": created.member.id,
                    "name": created.member.full_name,
                    "email": created.member.email,
                },
            })),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

async fn staff_roster_handler<D, C, N>(
    State(service): State<Api<D, C, N>>,
    headers: HeaderMap,
) -> Response
where
    D: DirectoryRepository + 'static,
    C: ComplaintRepository + 'static,
    N: NotificationQueue + 'static,
{
    let actor = match resolve_from_headers(service.as_ref(), &headers) {
        Ok(actor) => actor,
        Err(rejection) => return rejection,
    };
    match service.staff_roster(&actor) {
        Ok(roster) => (StatusCode::OK, Json(roster)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn available_staff_handler<D, C, N>(
    State(service): State<Api<D, C, N>>,
    headers: HeaderMap,
) -> Response
where
    D: DirectoryRepository + 'static,
    C: ComplaintRepository + 'static,
    N: NotificationQueue + 'static,
{
    let actor = match resolve_from_headers(service.as_ref(), &headers) {
        Ok(actor) => actor,
        Err(rejection) => return rejection,
    };
    match service.available_staff(&actor) {
        Ok(available) => (StatusCode::OK, Json(available)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn performance_handler<D, C, N>(
    State(service): State<Api<D, C, N>>,
    headers: HeaderMap,
) -> Response
where
    D: DirectoryRepository + 'static,
    C: ComplaintRepository + 'static,
    N: NotificationQueue + 'static,
{
    let actor = match resolve_from_headers(service.as_ref(), &headers) {
        Ok(actor) => actor,
        Err(rejection) => return rejection,
    };
    match service.staff_performance(&actor) {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn deactivate_staff_handler<D, C, N>(
    State(service): State<Api<D, C, N>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    D: DirectoryRepository + 'static,
    C: ComplaintRepository + 'static,
    N: NotificationQueue + 'static,
{
    let actor = match resolve_from_headers(service.as_ref(), &headers) {
        Ok(actor) => actor,
        Err(rejection) => return rejection,
    };
    match service.deactivate_staff(&actor, &MemberId(id)) {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "message": "Staff deleted successfully" })),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

async fn students_handler<D, C, N>(
    State(service): State<Api<D, C, N>>,
    headers: HeaderMap,
) -> Response
where
    D: DirectoryRepository + 'static,
    C: ComplaintRepository + 'static,
    N: NotificationQueue + 'static,
{
    let actor = match resolve_from_headers(service.as_ref(), &headers) {
        Ok(actor) => actor,
        Err(rejection) => return rejection,
    };
    match service.students(&actor) {
        Ok(students) => (StatusCode::OK, Json(students)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn student_detail_handler<D, C, N>(
    State(service): State<Api<D, C, N>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    D: DirectoryRepository + 'static,
    C: ComplaintRepository + 'static,
    N: NotificationQueue + 'static,
{
    let actor = match resolve_from_headers(service.as_ref(), &headers) {
        Ok(actor) => actor,
        Err(rejection) => return rejection,
    };
    match service.student_detail(&actor, &MemberId(id)) {
        Ok((student, statistics, complaints)) => (
            StatusCode::OK,
            Json(json!({
                "student": student,
                "statistics": statistics,
                "complaints": complaints,
            })),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

async fn toggle_student_handler<D, C, N>(
    State(service): State<Api<D, C, N>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    D: DirectoryRepository + 'static,
    C: ComplaintRepository + 'static,
    N: NotificationQueue + 'static,
{
    let actor = match resolve_from_headers(service.as_ref(), &headers) {
        Ok(actor) => actor,
        Err(rejection) => return rejection,
    };
    match service.toggle_student(&actor, &MemberId(id)) {
        Ok(student) => (
            StatusCode::OK,
            Json(json!({
                "message": "Student status updated",
                "is_active": student.active,
            })),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

async fn remove_student_handler<D, C, N>(
    State(service): State<Api<D, C, N>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    D: DirectoryRepository + 'static,
    C: ComplaintRepository + 'static,
    N: NotificationQueue + 'static,
{
    let actor = match resolve_from_headers(service.as_ref(), &headers) {
        Ok(actor) => actor,
        Err(rejection) => return rejection,
    };
    match service.remove_student(&actor, &MemberId(id)) {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "message": "Student record permanently removed" })),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}
