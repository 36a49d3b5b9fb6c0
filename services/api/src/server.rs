use crate::cli::ServeArgs;
use crate::infra::{
    AppState, InMemoryBroadcastRepository, InMemoryComplaintRepository,
    InMemoryDirectoryRepository, InMemoryInventoryRepository, InMemoryMaintenanceRepository,
    InMemorySupportRepository, LoggingNotificationQueue,
};
use crate::routes::app_router;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use chrono::Utc;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use stayease::actor::{MemberId, Role};
use stayease::broadcasts::BroadcastService;
use stayease::complaints::ComplaintService;
use stayease::config::AppConfig;
use stayease::directory::{DirectoryRepository, DirectoryService, Member};
use stayease::error::AppError;
use stayease::inventory::InventoryService;
use stayease::maintenance::MaintenanceService;
use stayease::support::SupportService;
use stayease::telemetry;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let complaint_repository = Arc::new(InMemoryComplaintRepository::default());
    let directory_repository = Arc::new(InMemoryDirectoryRepository::default());
    seed_admin(directory_repository.as_ref());

    let complaint_service = Arc::new(ComplaintService::new(Arc::clone(&complaint_repository)));
    let directory_service = Arc::new(DirectoryService::new(
        directory_repository,
        complaint_repository,
        Arc::new(LoggingNotificationQueue),
    ));
    let support_service = Arc::new(SupportService::new(Arc::new(
        InMemorySupportRepository::default(),
    )));
    let maintenance_service = Arc::new(MaintenanceService::new(Arc::new(
        InMemoryMaintenanceRepository::default(),
    )));
    let inventory_service = Arc::new(InventoryService::new(Arc::new(
        InMemoryInventoryRepository::default(),
    )));
    let broadcast_service = Arc::new(BroadcastService::new(Arc::new(
        InMemoryBroadcastRepository::default(),
    )));

    let app = app_router(
        complaint_service,
        directory_service,
        support_service,
        maintenance_service,
        inventory_service,
        broadcast_service,
    )
    .layer(Extension(app_state))
    .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "stayease api ready");

    axum::serve(listener, app).await?;
    Ok(())
}

/// The in-memory directory starts empty, so a default warden account is
/// seeded at boot. Admin accounts cannot be created through the API.
fn seed_admin(directory: &InMemoryDirectoryRepository) {
    let admin = Member {
        id: MemberId("adm-000001".to_string()),
        full_name: "Warden".to_string(),
        email: "warden@stayease.local".to_string(),
        mobile_number: "0000000000".to_string(),
        role: Role::Admin,
        active: true,
        profile: None,
        created_at: Utc::now(),
    };
    match directory.insert(admin) {
        Ok(member) => info!(admin = %member.id, "seeded default admin account"),
        Err(err) => tracing::warn!(error = %err, "default admin account was not seeded"),
    }
}
