use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use super::domain::{BroadcastId, NewBroadcast};
use super::repository::BroadcastRepository;
use super::service::{BroadcastError, BroadcastService};
use crate::actor::{resolve_from_headers, ActorResolver};
use crate::store::RepositoryError;

/// Shared state for the announcement endpoints.
pub struct BroadcastApi<R, D> {
    pub service: Arc<BroadcastService<R>>,
    pub directory: Arc<D>,
}

impl<R, D> Clone for BroadcastApi<R, D> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            directory: Arc::clone(&self.directory),
        }
    }
}

pub fn broadcast_router<R, D>(api: BroadcastApi<R, D>) -> Router
where
    R: BroadcastRepository + 'static,
    D: ActorResolver + 'static,
{
    Router::new()
        .route(
            "/api/v1/broadcasts",
            get(all_handler::<R, D>).post(create_handler::<R, D>),
        )
        .route("/api/v1/broadcasts/active", get(active_handler::<R, D>))
        .route(
            "/api/v1/broadcasts/:id/deactivate",
            post(deactivate_handler::<R, D>),
        )
        .with_state(api)
}

fn error_response(err: BroadcastError) -> Response {
    let status = match &err {
        BroadcastError::Validation(_) => StatusCode::BAD_REQUEST,
        BroadcastError::Permission(_) => StatusCode::FORBIDDEN,
        BroadcastError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        BroadcastError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let body = Json(json!({ "error": err.to_string() }));
    (status, body).into_response()
}

async fn create_handler<R, D>(
    State(api): State<BroadcastApi<R, D>>,
    headers: HeaderMap,
    Json(payload): Json<NewBroadcast>,
) -> Response
where
    R: BroadcastRepository + 'static,
    D: ActorResolver + 'static,
{
    let actor = match resolve_from_headers(api.directory.as_ref(), &headers) {
        Ok(actor) => actor,
        Err(rejection) => return rejection,
    };
    match api.service.create(&actor, payload) {
        Ok(broadcast) => (StatusCode::CREATED, Json(broadcast)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn all_handler<R, D>(State(api): State<BroadcastApi<R, D>>, headers: HeaderMap) -> Response
where
    R: BroadcastRepository + 'static,
    D: ActorResolver + 'static,
{
    if let Err(rejection) = resolve_from_headers(api.directory.as_ref(), &headers) {
        return rejection;
    }
    match api.service.all() {
        Ok(broadcasts) => (StatusCode::OK, Json(broadcasts)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn active_handler<R, D>(State(api): State<BroadcastApi<R, D>>, headers: HeaderMap) -> Response
where
    R: BroadcastRepository + 'static,
    D: ActorResolver + 'static,
{
    if let Err(rejection) = resolve_from_headers(api.directory.as_ref(), &headers) {
        return rejection;
    }
    match api.service.active() {
        Ok(broadcasts) => (StatusCode::OK, Json(broadcasts)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn deactivate_handler<R, D>(
    State(api): State<BroadcastApi<R, D>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    R: BroadcastRepository + 'static,
    D: ActorResolver + 'static,
{
    let actor = match resolve_from_headers(api.directory.as_ref(), &headers) {
        Ok(actor) => actor,
        Err(rejection) => return rejection,
    };
    match api.service.deactivate(&actor, &BroadcastId(id)) {
        Ok(broadcast) => (
            StatusCode::OK,
            Json(json!({
                "status": "Broadcast deactivated",
                "id": broadcast.id,
            })),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}
