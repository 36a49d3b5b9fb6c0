use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{NewTicket, TicketId, TicketStatus};
use super::repository::SupportRepository;
use super::service::{SupportError, SupportService};
use crate::actor::{resolve_from_headers, ActorResolver};
use crate::store::RepositoryError;

/// Shared state for the support endpoints.
pub struct SupportApi<R, D> {
    pub service: Arc<SupportService<R>>,
    pub directory: Arc<D>,
}

impl<R, D> Clone for SupportApi<R, D> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            directory: Arc::clone(&self.directory),
        }
    }
}

pub fn support_router<R, D>(api: SupportApi<R, D>) -> Router
where
    R: SupportRepository + 'static,
    D: ActorResolver + 'static,
{
    Router::new()
        .route(
            "/api/v1/support/tickets",
            post(create_handler::<R, D>).get(student_list_handler::<R, D>),
        )
        .route(
            "/api/v1/support/tickets/:id/reply",
            post(student_reply_handler::<R, D>),
        )
        .route(
            "/api/v1/admin/support/tickets",
            get(admin_list_handler::<R, D>),
        )
        .route(
            "/api/v1/admin/support/tickets/:id",
            get(admin_detail_handler::<R, D>),
        )
        .route(
            "/api/v1/admin/support/tickets/:id/reply",
            post(admin_reply_handler::<R, D>),
        )
        .route(
            "/api/v1/admin/support/tickets/:id/status",
            patch(status_handler::<R, D>),
        )
        .with_state(api)
}

fn error_response(err: SupportError) -> Response {
    let status = match &err {
        SupportError::Validation(_) => StatusCode::BAD_REQUEST,
        SupportError::Permission(_) => StatusCode::FORBIDDEN,
        SupportError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        SupportError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let body = Json(json!({ "error": err.to_string() }));
    (status, body).into_response()
}

#[derive(Debug, Deserialize)]
struct MessageRequest {
    message: String,
}

#[derive(Debug, Deserialize)]
struct StatusRequest {
    status: TicketStatus,
}

async fn create_handler<R, D>(
    State(api): State<SupportApi<R, D>>,
    headers: HeaderMap,
    Json(payload): Json<NewTicket>,
) -> Response
where
    R: SupportRepository + 'static,
    D: ActorResolver + 'static,
{
    let actor = match resolve_from_headers(api.directory.as_ref(), &headers) {
        Ok(actor) => actor,
        Err(rejection) => return rejection,
    };
    match api.service.create(&actor, payload) {
        Ok(ticket) => (StatusCode::CREATED, Json(ticket)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn student_list_handler<R, D>(
    State(api): State<SupportApi<R, D>>,
    headers: HeaderMap,
) -> Response
where
    R: SupportRepository + 'static,
    D: ActorResolver + 'static,
{
    let actor = match resolve_from_headers(api.directory.as_ref(), &headers) {
        Ok(actor) => actor,
        Err(rejection) => return rejection,
    };
    match api.service.student_tickets(&actor) {
        Ok(tickets) => (StatusCode::OK, Json(tickets)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn student_reply_handler<R, D>(
    State(api): State<SupportApi<R, D>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<MessageRequest>,
) -> Response
where
    R: SupportRepository + 'static,
    D: ActorResolver + 'static,
{
    let actor = match resolve_from_headers(api.directory.as_ref(), &headers) {
        Ok(actor) => actor,
        Err(rejection) => return rejection,
    };
    match api
        .service
        .student_reply(&actor, &TicketId(id), &payload.message)
    {
        Ok(()) => (StatusCode::OK, Json(json!({ "success": true }))).into_response(),
        Err(err) => error_response(err),
    }
}

async fn admin_list_handler<R, D>(
    State(api): State<SupportApi<R, D>>,
    headers: HeaderMap,
) -> Response
where
    R: SupportRepository + 'static,
    D: ActorResolver + 'static,
{
    let actor = match resolve_from_headers(api.directory.as_ref(), &headers) {
        Ok(actor) => actor,
        Err(rejection) => return rejection,
    };
    match api.service.admin_tickets(&actor) {
        Ok(tickets) => (StatusCode::OK, Json(tickets)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn admin_detail_handler<R, D>(
    State(api): State<SupportApi<R, D>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    R: SupportRepository + 'static,
    D: ActorResolver + 'static,
{
    let actor = match resolve_from_headers(api.directory.as_ref(), &headers) {
        Ok(actor) => actor,
        Err(rejection) => return rejection,
    };
    match api.service.admin_detail(&actor, &TicketId(id)) {
        Ok(thread) => (StatusCode::OK, Json(thread)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn admin_reply_handler<R, D>(
    State(api): State<SupportApi<R, D>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<MessageRequest>,
) -> Response
where
    R: SupportRepository + 'static,
    D: ActorResolver + 'static,
{
    let actor = match resolve_from_headers(api.directory.as_ref(), &headers) {
        Ok(actor) => actor,
        Err(rejection) => return rejection,
    };
    match api
        .service
        .admin_reply(&actor, &TicketId(id), &payload.message)
    {
        Ok(_) => (StatusCode::OK, Json(json!({ "message": "Reply sent" }))).into_response(),
        Err(err) => error_response(err),
    }
}

async fn status_handler<R, D>(
    State(api): State<SupportApi<R, D>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<StatusRequest>,
) -> Response
where
    R: SupportRepository + 'static,
    D: ActorResolver + 'static,
{
    let actor = match resolve_from_headers(api.directory.as_ref(), &headers) {
        Ok(actor) => actor,
        Err(rejection) => return rejection,
    };
    match api.service.set_status(&actor, &TicketId(id), payload.status) {
        Ok(_) => (StatusCode::OK, Json(json!({ "message": "Status updated" }))).into_response(),
        Err(err) => error_response(err),
    }
}
