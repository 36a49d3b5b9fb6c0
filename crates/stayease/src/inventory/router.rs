use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{ItemId, NewItem};
use super::repository::InventoryRepository;
use super::service::{InventoryError, InventoryService};
use crate::actor::{resolve_from_headers, ActorResolver};
use crate::complaints::domain::ComplaintId;
use crate::store::RepositoryError;

/// Shared state for the inventory endpoints.
pub struct InventoryApi<R, D> {
    pub service: Arc<InventoryService<R>>,
    pub directory: Arc<D>,
}

impl<R, D> Clone for InventoryApi<R, D> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            directory: Arc::clone(&self.directory),
        }
    }
}

pub fn inventory_router<R, D>(api: InventoryApi<R, D>) -> Router
where
    R: InventoryRepository + 'static,
    D: ActorResolver + 'static,
{
    Router::new()
        .route(
            "/api/v1/inventory/items",
            get(items_handler::<R, D>).post(create_handler::<R, D>),
        )
        .route(
            "/api/v1/inventory/items/:id/use",
            post(use_handler::<R, D>),
        )
        .route(
            "/api/v1/inventory/items/:id/add",
            post(add_handler::<R, D>),
        )
        .route(
            "/api/v1/inventory/items/:id/remove",
            post(remove_handler::<R, D>),
        )
        .route(
            "/api/v1/inventory/items/:id/logs",
            get(movements_handler::<R, D>),
        )
        .with_state(api)
}

fn error_response(err: InventoryError) -> Response {
    let status = match &err {
        InventoryError::Validation(_) | InventoryError::InsufficientStock => {
            StatusCode::BAD_REQUEST
        }
        InventoryError::Permission(_) => StatusCode::FORBIDDEN,
        InventoryError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        InventoryError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let body = Json(json!({ "error": err.to_string() }));
    (status, body).into_response()
}

#[derive(Debug, Deserialize)]
struct QuantityRequest {
    quantity: u32,
    #[serde(default)]
    complaint_id: Option<String>,
}

async fn create_handler<R, D>(
    State(api): State<InventoryApi<R, D>>,
    headers: HeaderMap,
    Json(payload): Json<NewItem>,
) -> Response
where
    R: InventoryRepository + 'static,
    D: ActorResolver + 'static,
{
    let actor = match resolve_from_headers(api.directory.as_ref(), &headers) {
        Ok(actor) => actor,
        Err(rejection) => return rejection,
    };
    match api.service.create_item(&actor, payload) {
        Ok(item) => (StatusCode::CREATED, Json(item)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn items_handler<R, D>(
    State(api): State<InventoryApi<R, D>>,
    headers: HeaderMap,
) -> Response
where
    R: InventoryRepository + 'static,
    D: ActorResolver + 'static,
{
    let actor = match resolve_from_headers(api.directory.as_ref(), &headers) {
        Ok(actor) => actor,
        Err(rejection) => return rejection,
    };
    match api.service.items(&actor) {
        Ok(items) => (StatusCode::OK, Json(items)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn use_handler<R, D>(
    State(api): State<InventoryApi<R, D>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<QuantityRequest>,
) -> Response
where
    R: InventoryRepository + 'static,
    D: ActorResolver + 'static,
{
    let actor = match resolve_from_headers(api.directory.as_ref(), &headers) {
        Ok(actor) => actor,
        Err(rejection) => return rejection,
    };
    let complaint = payload.complaint_id.map(ComplaintId);
    match api
        .service
        .use_stock(&actor, &ItemId(id), payload.quantity, complaint)
    {
        Ok(item) => (
            StatusCode::OK,
            Json(json!({
                "status": "Stock updated",
                "remaining": item.available_quantity,
            })),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

async fn add_handler<R, D>(
    State(api): State<InventoryApi<R, D>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<QuantityRequest>,
) -> Response
where
    R: InventoryRepository + 'static,
    D: ActorResolver + 'static,
{
    let actor = match resolve_from_headers(api.directory.as_ref(), &headers) {
        Ok(actor) => actor,
        Err(rejection) => return rejection,
    };
    match api.service.add_stock(&actor, &ItemId(id), payload.quantity) {
        Ok(item) => (
            StatusCode::OK,
            Json(json!({
                "status": "Stock added",
                "total": item.total_quantity,
            })),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

async fn remove_handler<R, D>(
    State(api): State<InventoryApi<R, D>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<QuantityRequest>,
) -> Response
where
    R: InventoryRepository + 'static,
    D: ActorResolver + 'static,
{
    let actor = match resolve_from_headers(api.directory.as_ref(), &headers) {
        Ok(actor) => actor,
        Err(rejection) => return rejection,
    };
    match api
        .service
        .remove_stock(&actor, &ItemId(id), payload.quantity)
    {
        Ok(item) => (
            StatusCode::OK,
            Json(json!({
                "status": "Stock removed",
                "remaining": item.available_quantity,
            })),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

async fn movements_handler<R, D>(
    State(api): State<InventoryApi<R, D>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    R: InventoryRepository + 'static,
    D: ActorResolver + 'static,
{
    let actor = match resolve_from_headers(api.directory.as_ref(), &headers) {
        Ok(actor) => actor,
        Err(rejection) => return rejection,
    };
    match api.service.movements(&actor, &ItemId(id)) {
        Ok(logs) => (StatusCode::OK, Json(logs)).into_response(),
        Err(err) => error_response(err),
    }
}
