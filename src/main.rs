// Main entry point - Dependency injection and server setup
mod domain;
mod application;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

use crate::application::chart_binding::ChartBinding;
use crate::application::dashboard_service::DashboardService;
use crate::application::editor::{DashboardDraft, DashboardEditor};
use crate::application::monitoring_repository::MonitoringRepository;
use crate::application::station_service::StationService;
use crate::application::target_resolver::TargetResolver;
use crate::infrastructure::backend_client::BackendClient;
use crate::infrastructure::config::load_dashboard_config;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    add_panel, apply_layout_change, delete_panel, get_dashboard, health_check, list_stations,
    panel_data, refresh_panel, request_export, resolve_targets, save_dashboard,
    station_parameters, stream_panel_data, toggle_mode, upsert_panel,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load configuration
    let config = load_dashboard_config()?;

    // Create repository (infrastructure layer)
    let repository: Arc<dyn MonitoringRepository> = Arc::new(BackendClient::new(
        config.backend.base_url.clone(),
        config.backend.token.clone(),
    ));

    // Shared dashboard draft and services (application layer)
    let draft = Arc::new(RwLock::new(DashboardDraft::new()));
    let station_service = StationService::new(repository.clone());
    let target_resolver = TargetResolver::new(repository.clone());
    let chart_binding = ChartBinding::new(repository.clone());
    let dashboard_service = DashboardService::new(repository.clone(), draft.clone());
    let editor = DashboardEditor::new(draft);

    // Create application state
    let state = Arc::new(AppState {
        station_service,
        target_resolver,
        chart_binding,
        dashboard_service,
        editor,
        default_owner: config.backend.default_owner,
    });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/stations", get(list_stations))
        .route("/stations/:id/parameters", get(station_parameters))
        .route("/targets/resolve", post(resolve_targets))
        .route("/panel_data", post(panel_data))
        .route("/panel_stream", post(stream_panel_data))
        .route("/dashboards/:uid", get(get_dashboard))
        .route("/dashboards", post(save_dashboard))
        .route("/editor/panels", post(add_panel).put(upsert_panel))
        .route("/editor/panels/:id", delete(delete_panel))
        .route("/editor/panels/:id/refresh", post(refresh_panel))
        .route("/editor/mode", post(toggle_mode))
        .route("/editor/layout", put(apply_layout_change))
        .route("/editor/export", post(request_export))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = config.server.listen_addr.parse()?;
    tracing::info!("starting waterquality-dashboard service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
