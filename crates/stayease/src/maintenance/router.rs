use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{CompletionStatus, MaintenanceLogId, NewTask, TaskId};
use super::repository::MaintenanceRepository;
use super::service::{MaintenanceError, MaintenanceService, ReviewOutcome};
use crate::actor::{resolve_from_headers, ActorResolver, MemberId};
use crate::store::RepositoryError;

/// Shared state for the maintenance endpoints. The directory resolves both
/// the caller and task assignees.
pub struct MaintenanceApi<R, D> {
    pub service: Arc<MaintenanceService<R>>,
    pub directory: Arc<D>,
}

impl<R, D> Clone for MaintenanceApi<R, D> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            directory: Arc::clone(&self.directory),
        }
    }
}

pub fn maintenance_router<R, D>(api: MaintenanceApi<R, D>) -> Router
where
    R: MaintenanceRepository + 'static,
    D: ActorResolver + 'static,
{
    Router::new()
        .route(
            "/api/v1/maintenance/tasks",
            get(tasks_handler::<R, D>).post(create_task_handler::<R, D>),
        )
        .route(
            "/api/v1/maintenance/tasks/:id/complete",
            post(complete_handler::<R, D>),
        )
        .route(
            "/api/v1/maintenance/tasks/:id/deactivate",
            post(deactivate_handler::<R, D>),
        )
        .route("/api/v1/maintenance/logs", get(history_handler::<R, D>))
        .route(
            "/api/v1/maintenance/logs/:id/approve",
            post(approve_handler::<R, D>),
        )
        .route(
            "/api/v1/maintenance/logs/:id/reject",
            post(reject_handler::<R, D>),
        )
        .with_state(api)
}

fn error_response(err: MaintenanceError) -> Response {
    let status = match &err {
        MaintenanceError::Validation(_) => StatusCode::BAD_REQUEST,
        MaintenanceError::Permission(_) => StatusCode::FORBIDDEN,
        MaintenanceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        MaintenanceError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let body = Json(json!({ "error": err.to_string() }));
    (status, body).into_response()
}

fn already_decided(status: CompletionStatus) -> Response {
    let label = match status {
        CompletionStatus::Approved => "Already approved",
        CompletionStatus::Rejected => "Already rejected",
        CompletionStatus::Pending => "Pending",
    };
    (StatusCode::OK, Json(json!({ "status": label }))).into_response()
}

#[derive(Debug, Deserialize)]
struct CompleteRequest {
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    proof_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RejectRequest {
    #[serde(default)]
    admin_comment: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HistoryFilter {
    #[serde(default)]
    task_id: Option<String>,
}

async fn create_task_handler<R, D>(
    State(api): State<MaintenanceApi<R, D>>,
    headers: HeaderMap,
    Json(payload): Json<NewTask>,
) -> Response
where
    R: MaintenanceRepository + 'static,
    D: ActorResolver + 'static,
{
    let actor = match resolve_from_headers(api.directory.as_ref(), &headers) {
        Ok(actor) => actor,
        Err(rejection) => return rejection,
    };

    let assignee = match &payload.assigned_to {
        Some(raw) => match api.directory.resolve(&MemberId(raw.clone())) {
            Ok(member) if member.as_staff().is_some() => Some(member.member().clone()),
            Ok(_) => {
                return error_response(MaintenanceError::Validation(
                    "only staff can be assigned maintenance tasks".to_string(),
                ))
            }
            Err(err) => {
                let body = Json(json!({ "error": err.to_string() }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
        },
        None => None,
    };

    match api.service.create_task(&actor, payload, assignee) {
        Ok(task) => (StatusCode::CREATED, Json(task)).into_response(),
        Err(err) => error_response(err),
    }
}

/// Admins see every task; staff see their filtered worklist.
async fn tasks_handler<R, D>(
    State(api): State<MaintenanceApi<R, D>>,
    headers: HeaderMap,
) -> Response
where
    R: MaintenanceRepository + 'static,
    D: ActorResolver + 'static,
{
    let actor = match resolve_from_headers(api.directory.as_ref(), &headers) {
        Ok(actor) => actor,
        Err(rejection) => return rejection,
    };
    let result = if actor.as_admin().is_some() {
        api.service.all_tasks(&actor)
    } else {
        api.service.staff_tasks(&actor)
    };
    match result {
        Ok(tasks) => (StatusCode::OK, Json(tasks)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn complete_handler<R, D>(
    State(api): State<MaintenanceApi<R, D>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<CompleteRequest>,
) -> Response
where
    R: MaintenanceRepository + 'static,
    D: ActorResolver + 'static,
{
    let actor = match resolve_from_headers(api.directory.as_ref(), &headers) {
        Ok(actor) => actor,
        Err(rejection) => return rejection,
    };
    match api
        .service
        .complete(&actor, &TaskId(id), payload.notes, payload.proof_key)
    {
        Ok(log) => (
            StatusCode::CREATED,
            Json(json!({
                "status": "Task Completion Submitted for Approval",
                "log_id": log.id,
            })),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

async fn deactivate_handler<R, D>(
    State(api): State<MaintenanceApi<R, D>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    R: MaintenanceRepository + 'static,
    D: ActorResolver + 'static,
{
    let actor = match resolve_from_headers(api.directory.as_ref(), &headers) {
        Ok(actor) => actor,
        Err(rejection) => return rejection,
    };
    match api.service.deactivate_task(&actor, &TaskId(id)) {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "message": "Task deactivated" })),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

async fn history_handler<R, D>(
    State(api): State<MaintenanceApi<R, D>>,
    Query(filter): Query<HistoryFilter>,
    headers: HeaderMap,
) -> Response
where
    R: MaintenanceRepository + 'static,
    D: ActorResolver + 'static,
{
    let actor = match resolve_from_headers(api.directory.as_ref(), &headers) {
        Ok(actor) => actor,
        Err(rejection) => return rejection,
    };
    let task = filter.task_id.map(TaskId);
    match api.service.history(&actor, task.as_ref()) {
        Ok(logs) => (StatusCode::OK, Json(logs)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn approve_handler<R, D>(
    State(api): State<MaintenanceApi<R, D>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    R: MaintenanceRepository + 'static,
    D: ActorResolver + 'static,
{
    let actor = match resolve_from_headers(api.directory.as_ref(), &headers) {
        Ok(actor) => actor,
        Err(rejection) => return rejection,
    };
    match api.service.approve(&actor, &MaintenanceLogId(id)) {
        Ok(ReviewOutcome::Applied { next_due_date }) => (
            StatusCode::OK,
            Json(json!({
                "status": "Log Approved and Task Rescheduled",
                "next_due_date": next_due_date,
            })),
        )
            .into_response(),
        Ok(ReviewOutcome::AlreadyDecided(status)) => already_decided(status),
        Err(err) => error_response(err),
    }
}

async fn reject_handler<R, D>(
    State(api): State<MaintenanceApi<R, D>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<RejectRequest>,
) -> Response
where
    R: MaintenanceRepository + 'static,
    D: ActorResolver + 'static,
{
    let actor = match resolve_from_headers(api.directory.as_ref(), &headers) {
        Ok(actor) => actor,
        Err(rejection) => return rejection,
    };
    match api
        .service
        .reject(&actor, &MaintenanceLogId(id), payload.admin_comment)
    {
        Ok(ReviewOutcome::Applied { .. }) => {
            (StatusCode::OK, Json(json!({ "status": "Log Rejected" }))).into_response()
        }
        Ok(ReviewOutcome::AlreadyDecided(status)) => already_decided(status),
        Err(err) => error_response(err),
    }
}
