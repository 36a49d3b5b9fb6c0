use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{ComplaintId, ComplaintStatus, NewComplaint, Priority};
use super::reports::ComplaintFilter;
use super::repository::ComplaintRepository;
use super::service::{ComplaintError, ComplaintService, SnapshotSource};
use crate::actor::{resolve_from_headers, ActorResolver, MemberId};
use crate::store::RepositoryError;

/// Shared state for the complaint endpoints: the lifecycle service plus the
/// directory seam used to resolve callers and assignment targets.
pub struct ComplaintApi<R, D> {
    pub service: Arc<ComplaintService<R>>,
    pub directory: Arc<D>,
}

impl<R, D> Clone for ComplaintApi<R, D> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            directory: Arc::clone(&self.directory),
        }
    }
}

/// Router builder exposing the student, staff, and admin complaint endpoints.
pub fn complaint_router<R, D>(api: ComplaintApi<R, D>) -> Router
where
    R: ComplaintRepository + 'static,
    D: ActorResolver + SnapshotSource + 'static,
{
    Router::new()
        .route(
            "/api/v1/complaints",
            post(file_handler::<R, D>).get(student_list_handler::<R, D>),
        )
        .route("/api/v1/complaints/:id/rating", post(rate_handler::<R, D>))
        .route("/api/v1/staff/dashboard", get(staff_dashboard_handler::<R, D>))
        .route("/api/v1/staff/complaints", get(staff_active_handler::<R, D>))
        .route(
            "/api/v1/staff/complaints/escalated",
            get(escalated_handler::<R, D>),
        )
        .route(
            "/api/v1/staff/complaints/bulk-resolve",
            post(bulk_resolve_handler::<R, D>),
        )
        .route(
            "/api/v1/staff/complaints/:id/status",
            patch(update_status_handler::<R, D>),
        )
        .route(
            "/api/v1/staff/complaints/:id/escalate",
            post(escalate_handler::<R, D>),
        )
        .route(
            "/api/v1/staff/complaints/:id/escalation-reply",
            post(staff_reply_handler::<R, D>),
        )
        .route(
            "/api/v1/staff/complaints/:id/timeline",
            get(timeline_handler::<R, D>),
        )
        .route(
            "/api/v1/staff/resolutions",
            get(resolution_history_handler::<R, D>),
        )
        .route(
            "/api/v1/staff/resolutions/:id/clear",
            patch(clear_resolved_handler::<R, D>),
        )
        .route("/api/v1/staff/ratings", get(staff_ratings_handler::<R, D>))
        .route("/api/v1/admin/dashboard", get(admin_dashboard_handler::<R, D>))
        .route("/api/v1/admin/complaints", get(admin_list_handler::<R, D>))
        .route(
            "/api/v1/admin/complaints/bulk-assign",
            post(bulk_assign_handler::<R, D>),
        )
        .route(
            "/api/v1/admin/complaints/bulk-status",
            post(bulk_status_handler::<R, D>),
        )
        .route(
            "/api/v1/admin/complaints/clear",
            post(clear_many_handler::<R, D>),
        )
        .route("/api/v1/admin/complaints/:id", get(admin_detail_handler::<R, D>))
        .route(
            "/api/v1/admin/complaints/:id/priority",
            patch(set_priority_handler::<R, D>),
        )
        .route(
            "/api/v1/admin/complaints/:id/assign",
            patch(assign_handler::<R, D>),
        )
        .route(
            "/api/v1/admin/complaints/:id/close",
            patch(close_handler::<R, D>),
        )
        .route(
            "/api/v1/admin/complaints/:id/reply",
            post(admin_reply_handler::<R, D>),
        )
        .route("/api/v1/admin/updates", get(staff_updates_handler::<R, D>))
        .route(
            "/api/v1/admin/updates/clear",
            post(clear_updates_handler::<R, D>),
        )
        .with_state(api)
}

fn error_response(err: ComplaintError) -> Response {
    let status = match &err {
        ComplaintError::Validation(_)
        | ComplaintError::InvalidTransition { .. }
        | ComplaintError::NotEligible
        | ComplaintError::MissingFeedback
        | ComplaintError::PriorityLocked => StatusCode::BAD_REQUEST,
        ComplaintError::Permission(_) => StatusCode::FORBIDDEN,
        ComplaintError::AlreadyRated | ComplaintError::StaffBusy => StatusCode::CONFLICT,
        ComplaintError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        ComplaintError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let body = Json(json!({ "error": err.to_string() }));
    (status, body).into_response()
}

macro_rules! actor_or_reject {
    ($api:expr, $headers:expr) => {
        match resolve_from_headers($api.directory.as_ref(), &$headers) {
            Ok(actor) => actor,
            Err(rejection) => return rejection,
        }
    };
}

#[derive(Debug, Deserialize)]
struct RateRequest {
    rating: u8,
    #[serde(default)]
    feedback: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusUpdateRequest {
    status: ComplaintStatus,
    #[serde(default)]
    resolution_notes: Option<String>,
    #[serde(default)]
    proof: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EscalateRequest {
    note: String,
}

#[derive(Debug, Deserialize)]
struct MessageRequest {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ReplyRequest {
    reply: String,
}

#[derive(Debug, Deserialize)]
struct PriorityRequest {
    priority: Priority,
}

#[derive(Debug, Deserialize)]
struct AssignRequest {
    staff_id: String,
}

#[derive(Debug, Deserialize)]
struct BulkResolveRequest {
    ids: Vec<String>,
    resolution_notes: String,
}

#[derive(Debug, Deserialize)]
struct BulkAssignRequest {
    ids: Vec<String>,
    staff_id: String,
}

#[derive(Debug, Deserialize)]
struct BulkStatusRequest {
    ids: Vec<String>,
    status: ComplaintStatus,
}

#[derive(Debug, Deserialize)]
struct ClearRequest {
    #[serde(default)]
    ids: Vec<String>,
}

fn complaint_ids(raw: &[String]) -> Vec<ComplaintId> {
    raw.iter().map(|id| ComplaintId(id.clone())).collect()
}

async fn file_handler<R, D>(
    State(api): State<ComplaintApi<R, D>>,
    headers: HeaderMap,
    Json(payload): Json<NewComplaint>,
) -> Response
where
    R: ComplaintRepository + 'static,
    D: ActorResolver + SnapshotSource + 'static,
{
    let actor = actor_or_reject!(api, headers);
    match api.service.file(&actor, payload, api.directory.as_ref()) {
        Ok(complaint) => (StatusCode::CREATED, Json(complaint)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn student_list_handler<R, D>(
    State(api): State<ComplaintApi<R, D>>,
    headers: HeaderMap,
) -> Response
where
    R: ComplaintRepository + 'static,
    D: ActorResolver + SnapshotSource + 'static,
{
    let actor = actor_or_reject!(api, headers);
    match api.service.student_complaints(&actor) {
        Ok(complaints) => (StatusCode::OK, Json(complaints)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn rate_handler<R, D>(
    State(api): State<ComplaintApi<R, D>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<RateRequest>,
) -> Response
where
    R: ComplaintRepository + 'static,
    D: ActorResolver + SnapshotSource + 'static,
{
    let actor = actor_or_reject!(api, headers);
    let id = ComplaintId(id);
    match api
        .service
        .rate(&actor, &id, payload.rating, payload.feedback)
    {
        Ok(_) => (
            StatusCode::CREATED,
            Json(json!({ "message": "Thank you for your feedback! Complaint closed." })),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

async fn staff_dashboard_handler<R, D>(
    State(api): State<ComplaintApi<R, D>>,
    headers: HeaderMap,
) -> Response
where
    R: ComplaintRepository + 'static,
    D: ActorResolver + SnapshotSource + 'static,
{
    let actor = actor_or_reject!(api, headers);
    match api.service.staff_dashboard(&actor) {
        Ok(dashboard) => (StatusCode::OK, Json(dashboard)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn staff_active_handler<R, D>(
    State(api): State<ComplaintApi<R, D>>,
    headers: HeaderMap,
) -> Response
where
    R: ComplaintRepository + 'static,
    D: ActorResolver + SnapshotSource + 'static,
{
    let actor = actor_or_reject!(api, headers);
    match api.service.staff_active(&actor) {
        Ok(complaints) => (StatusCode::OK, Json(complaints)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn escalated_handler<R, D>(
    State(api): State<ComplaintApi<R, D>>,
    headers: HeaderMap,
) -> Response
where
    R: ComplaintRepository + 'static,
    D: ActorResolver + SnapshotSource + 'static,
{
    let actor = actor_or_reject!(api, headers);
    if actor.as_staff().is_none() && actor.as_admin().is_none() {
        return error_response(ComplaintError::Permission(
            "only staff and admins can list escalations".to_string(),
        ));
    }
    match api.service.escalated_complaints() {
        Ok(complaints) => (StatusCode::OK, Json(complaints)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn update_status_handler<R, D>(
    State(api): State<ComplaintApi<R, D>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<StatusUpdateRequest>,
) -> Response
where
    R: ComplaintRepository + 'static,
    D: ActorResolver + SnapshotSource + 'static,
{
    let actor = actor_or_reject!(api, headers);
    let id = ComplaintId(id);
    match api.service.update_status(
        &actor,
        &id,
        payload.status,
        payload.resolution_notes,
        payload.proof,
    ) {
        Ok(complaint) => (
            StatusCode::OK,
            Json(json!({
                "message": "Complaint updated successfully",
                "status": complaint.status,
            })),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

async fn escalate_handler<R, D>(
    State(api): State<ComplaintApi<R, D>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<EscalateRequest>,
) -> Response
where
    R: ComplaintRepository + 'static,
    D: ActorResolver + SnapshotSource + 'static,
{
    let actor = actor_or_reject!(api, headers);
    let id = ComplaintId(id);
    match api.service.escalate(&actor, &id, &payload.note) {
        Ok(complaint) => (StatusCode::OK, Json(complaint)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn staff_reply_handler<R, D>(
    State(api): State<ComplaintApi<R, D>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<MessageRequest>,
) -> Response
where
    R: ComplaintRepository + 'static,
    D: ActorResolver + SnapshotSource + 'static,
{
    let actor = actor_or_reject!(api, headers);
    let id = ComplaintId(id);
    match api.service.staff_escalation_reply(&actor, &id, &payload.message) {
        Ok(complaint) => (StatusCode::OK, Json(complaint)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn timeline_handler<R, D>(
    State(api): State<ComplaintApi<R, D>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    R: ComplaintRepository + 'static,
    D: ActorResolver + SnapshotSource + 'static,
{
    let actor = actor_or_reject!(api, headers);
    if actor.as_staff().is_none() && actor.as_admin().is_none() {
        return error_response(ComplaintError::Permission(
            "only staff and admins can view complaint timelines".to_string(),
        ));
    }
    let id = ComplaintId(id);
    match api.service.timeline(&id) {
        Ok(logs) => (StatusCode::OK, Json(logs)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn resolution_history_handler<R, D>(
    State(api): State<ComplaintApi<R, D>>,
    headers: HeaderMap,
) -> Response
where
    R: ComplaintRepository + 'static,
    D: ActorResolver + SnapshotSource + 'static,
{
    let actor = actor_or_reject!(api, headers);
    match api.service.staff_resolution_history(&actor) {
        Ok(history) => (StatusCode::OK, Json(history)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn clear_resolved_handler<R, D>(
    State(api): State<ComplaintApi<R, D>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    R: ComplaintRepository + 'static,
    D: ActorResolver + SnapshotSource + 'static,
{
    let actor = actor_or_reject!(api, headers);
    let id = ComplaintId(id);
    match api.service.clear_resolved(&actor, &id) {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "message": "Complaint cleared from history" })),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

async fn staff_ratings_handler<R, D>(
    State(api): State<ComplaintApi<R, D>>,
    headers: HeaderMap,
) -> Response
where
    R: ComplaintRepository + 'static,
    D: ActorResolver + SnapshotSource + 'static,
{
    let actor = actor_or_reject!(api, headers);
    match api.service.staff_ratings(&actor) {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn bulk_resolve_handler<R, D>(
    State(api): State<ComplaintApi<R, D>>,
    headers: HeaderMap,
    Json(payload): Json<BulkResolveRequest>,
) -> Response
where
    R: ComplaintRepository + 'static,
    D: ActorResolver + SnapshotSource + 'static,
{
    let actor = actor_or_reject!(api, headers);
    let ids = complaint_ids(&payload.ids);
    match api
        .service
        .bulk_resolve(&actor, &ids, &payload.resolution_notes)
    {
        Ok(count) => (
            StatusCode::OK,
            Json(json!({
                "message": format!("{count} complaints resolved successfully"),
                "count": count,
            })),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

async fn admin_dashboard_handler<R, D>(
    State(api): State<ComplaintApi<R, D>>,
    headers: HeaderMap,
) -> Response
where
    R: ComplaintRepository + 'static,
    D: ActorResolver + SnapshotSource + 'static,
{
    let actor = actor_or_reject!(api, headers);
    match api.service.admin_dashboard(&actor) {
        Ok(dashboard) => (StatusCode::OK, Json(dashboard)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn admin_list_handler<R, D>(
    State(api): State<ComplaintApi<R, D>>,
    Query(filter): Query<ComplaintFilter>,
    headers: HeaderMap,
) -> Response
where
    R: ComplaintRepository + 'static,
    D: ActorResolver + SnapshotSource + 'static,
{
    let actor = actor_or_reject!(api, headers);
    match api.service.admin_list(&actor, &filter) {
        Ok(complaints) => (StatusCode::OK, Json(complaints)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn admin_detail_handler<R, D>(
    State(api): State<ComplaintApi<R, D>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    R: ComplaintRepository + 'static,
    D: ActorResolver + SnapshotSource + 'static,
{
    let actor = actor_or_reject!(api, headers);
    let id = ComplaintId(id);
    match api.service.admin_detail(&actor, &id) {
        Ok(detail) => (StatusCode::OK, Json(detail)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn set_priority_handler<R, D>(
    State(api): State<ComplaintApi<R, D>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<PriorityRequest>,
) -> Response
where
    R: ComplaintRepository + 'static,
    D: ActorResolver + SnapshotSource + 'static,
{
    let actor = actor_or_reject!(api, headers);
    let id = ComplaintId(id);
    match api.service.set_priority(&actor, &id, payload.priority) {
        Ok(complaint) => (StatusCode::OK, Json(complaint)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn assign_handler<R, D>(
    State(api): State<ComplaintApi<R, D>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<AssignRequest>,
) -> Response
where
    R: ComplaintRepository + 'static,
    D: ActorResolver + SnapshotSource + 'static,
{
    let actor = actor_or_reject!(api, headers);
    let staff = match api.directory.resolve(&MemberId(payload.staff_id)) {
        Ok(staff) => staff,
        Err(err) => {
            let body = Json(json!({ "error": err.to_string() }));
            return (StatusCode::BAD_REQUEST, body).into_response();
        }
    };

    let id = ComplaintId(id);
    match api.service.assign(&actor, &id, &staff) {
        Ok(complaint) => (
            StatusCode::OK,
            Json(json!({
                "message": "Staff assigned successfully",
                "complaint_id": complaint.id,
                "assigned_to": complaint.assigned_to,
            })),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

async fn close_handler<R, D>(
    State(api): State<ComplaintApi<R, D>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    R: ComplaintRepository + 'static,
    D: ActorResolver + SnapshotSource + 'static,
{
    let actor = actor_or_reject!(api, headers);
    let id = ComplaintId(id);
    match api.service.close_by_admin(&actor, &id) {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({ "message": "Complaint closed successfully" })),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

async fn admin_reply_handler<R, D>(
    State(api): State<ComplaintApi<R, D>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<ReplyRequest>,
) -> Response
where
    R: ComplaintRepository + 'static,
    D: ActorResolver + SnapshotSource + 'static,
{
    let actor = actor_or_reject!(api, headers);
    let id = ComplaintId(id);
    match api.service.admin_reply(&actor, &id, &payload.reply) {
        Ok(complaint) => (StatusCode::OK, Json(complaint)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn bulk_assign_handler<R, D>(
    State(api): State<ComplaintApi<R, D>>,
    headers: HeaderMap,
    Json(payload): Json<BulkAssignRequest>,
) -> Response
where
    R: ComplaintRepository + 'static,
    D: ActorResolver + SnapshotSource + 'static,
{
    let actor = actor_or_reject!(api, headers);
    let staff = match api.directory.resolve(&MemberId(payload.staff_id)) {
        Ok(staff) => staff,
        Err(err) => {
            let body = Json(json!({ "error": err.to_string() }));
            return (StatusCode::BAD_REQUEST, body).into_response();
        }
    };

    let ids = complaint_ids(&payload.ids);
    match api.service.bulk_assign(&actor, &ids, &staff) {
        Ok(count) => (
            StatusCode::OK,
            Json(json!({
                "message": format!("{count} complaints assigned successfully"),
                "count": count,
            })),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

async fn bulk_status_handler<R, D>(
    State(api): State<ComplaintApi<R, D>>,
    headers: HeaderMap,
    Json(payload): Json<BulkStatusRequest>,
) -> Response
where
    R: ComplaintRepository + 'static,
    D: ActorResolver + SnapshotSource + 'static,
{
    let actor = actor_or_reject!(api, headers);
    let ids = complaint_ids(&payload.ids);
    match api.service.bulk_update_status(&actor, &ids, payload.status) {
        Ok(count) => (
            StatusCode::OK,
            Json(json!({
                "message": format!("{count} complaints updated successfully"),
                "count": count,
            })),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

async fn clear_many_handler<R, D>(
    State(api): State<ComplaintApi<R, D>>,
    headers: HeaderMap,
    Json(payload): Json<ClearRequest>,
) -> Response
where
    R: ComplaintRepository + 'static,
    D: ActorResolver + SnapshotSource + 'static,
{
    let actor = actor_or_reject!(api, headers);
    if payload.ids.is_empty() {
        return error_response(ComplaintError::Validation("no ids provided".to_string()));
    }
    let ids = complaint_ids(&payload.ids);
    match api.service.clear_many(&actor, &ids) {
        Ok(count) => (
            StatusCode::OK,
            Json(json!({ "message": format!("{count} complaints cleared successfully") })),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

async fn staff_updates_handler<R, D>(
    State(api): State<ComplaintApi<R, D>>,
    headers: HeaderMap,
) -> Response
where
    R: ComplaintRepository + 'static,
    D: ActorResolver + SnapshotSource + 'static,
{
    let actor = actor_or_reject!(api, headers);
    match api.service.staff_updates(&actor) {
        Ok(updates) => (StatusCode::OK, Json(updates)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn clear_updates_handler<R, D>(
    State(api): State<ComplaintApi<R, D>>,
    headers: HeaderMap,
    Json(payload): Json<ClearRequest>,
) -> Response
where
    R: ComplaintRepository + 'static,
    D: ActorResolver + SnapshotSource + 'static,
{
    let actor = actor_or_reject!(api, headers);
    match api.service.clear_updates(&actor, &payload.ids) {
        Ok(count) => (
            StatusCode::OK,
            Json(json!({ "message": format!("{count} updates cleared successfully") })),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}
