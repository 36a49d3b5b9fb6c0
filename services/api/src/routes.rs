use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use serde_json::json;
use std::sync::Arc;

use stayease::broadcasts::{broadcast_router, BroadcastApi, BroadcastRepository, BroadcastService};
use stayease::complaints::{complaint_router, ComplaintApi, ComplaintRepository, ComplaintService};
use stayease::directory::{directory_router, DirectoryRepository, DirectoryService};
use stayease::inventory::{inventory_router, InventoryApi, InventoryRepository, InventoryService};
use stayease::maintenance::{
    maintenance_router, MaintenanceApi, MaintenanceRepository, MaintenanceService,
};
use stayease::notify::NotificationQueue;
use stayease::support::{support_router, SupportApi, SupportRepository, SupportService};

/// Every domain router shares the directory service as its caller resolver,
/// so one `x-actor-id` lookup path covers the whole surface.
pub(crate) fn app_router<CR, DR, SR, MR, IR, BR, N>(
    complaints: Arc<ComplaintService<CR>>,
    directory: Arc<DirectoryService<DR, CR, N>>,
    support: Arc<SupportService<SR>>,
    maintenance: Arc<MaintenanceService<MR>>,
    inventory: Arc<InventoryService<IR>>,
    broadcasts: Arc<BroadcastService<BR>>,
) -> axum::Router
where
    CR: ComplaintRepository + 'static,
    DR: DirectoryRepository + 'static,
    SR: SupportRepository + 'static,
    MR: MaintenanceRepository + 'static,
    IR: InventoryRepository + 'static,
    BR: BroadcastRepository + 'static,
    N: NotificationQueue + 'static,
{
    complaint_router(ComplaintApi {
        service: complaints,
        directory: Arc::clone(&directory),
    })
    .merge(support_router(SupportApi {
        service: support,
        directory: Arc::clone(&directory),
    }))
    .merge(maintenance_router(MaintenanceApi {
        service: maintenance,
        directory: Arc::clone(&directory),
    }))
    .merge(inventory_router(InventoryApi {
        service: inventory,
        directory: Arc::clone(&directory),
    }))
    .merge(broadcast_router(BroadcastApi {
        service: broadcasts,
        directory: Arc::clone(&directory),
    }))
    .merge(directory_router(directory))
    .route("/health", axum::routing::get(healthcheck))
    .route("/ready", axum::routing::get(readiness_endpoint))
    .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
