// HTTP request handlers
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;

use crate::application::chart_binding::PanelRender;
use crate::application::dashboard_service::DraftSnapshot;
use crate::application::editor::EditorMode;
use crate::application::target_resolver::TargetResolver;
use crate::domain::grid::GridPos;
use crate::domain::layout::{DashboardOptions, Panel, PersistedPanel, Target, TimeWindow};
use crate::domain::station::{Parameter, Station};
use crate::presentation::app_state::AppState;

/// Remote and internal failures rendered as a JSON error body. The remote
/// message travels through unchanged; user-facing wording is the client's
/// job.
pub struct ApiError(anyhow::Error);

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        tracing::error!("request failed: {:#}", self.0);
        (
            StatusCode::BAD_GATEWAY,
            Json(json!({ "error": format!("{:#}", self.0) })),
        )
            .into_response()
    }
}

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[derive(Deserialize)]
pub struct OwnerQuery {
    pub created_by: Option<i64>,
}

#[derive(Deserialize)]
pub struct ResolveTargetsRequest {
    pub stations: Vec<Station>,
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub colors: HashMap<String, String>,
}

#[derive(Deserialize)]
pub struct PanelDataRequest {
    pub panel: PersistedPanel,
    pub time: TimeWindow,
    #[serde(default)]
    pub options: DashboardOptions,
}

#[derive(Deserialize)]
pub struct PanelStreamRequest {
    pub panel: PersistedPanel,
    pub time: TimeWindow,
    #[serde(default)]
    pub refresh_seconds: u32,
    #[serde(default)]
    pub options: DashboardOptions,
}

#[derive(Deserialize)]
pub struct SaveDashboardRequest {
    pub uid: Option<String>,
    pub title: String,
    pub interval_seconds: u32,
    pub time: TimeWindow,
    pub created_by: Option<i64>,
}

#[derive(Deserialize)]
pub struct LayoutChangeRequest {
    pub id: String,
    #[serde(rename = "gridPos")]
    pub grid_pos: GridPos,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// List all monitoring stations
pub async fn list_stations(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Station>>, ApiError> {
    Ok(Json(state.station_service.list_stations().await?))
}

/// Parameters available for one station
pub async fn station_parameters(
    Path(station_id): Path<i64>,
    State(state): State<Arc<AppState>>,
) -> Json<Vec<Parameter>> {
    Json(
        state
            .target_resolver
            .available_parameters(&[station_id])
            .await,
    )
}

/// Build series descriptors for a station/parameter selection
pub async fn resolve_targets(Json(request): Json<ResolveTargetsRequest>) -> Json<Vec<Target>> {
    Json(TargetResolver::build_targets(
        &request.stations,
        &request.parameters,
        &request.colors,
    ))
}

/// One-shot fetch and bind for a panel
pub async fn panel_data(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PanelDataRequest>,
) -> Result<Json<PanelRender>, ApiError> {
    let panel = Panel::from_persisted(request.panel, 0, &request.time);
    let render = state
        .chart_binding
        .render(&panel, &request.time, &request.options)
        .await?;
    Ok(Json(render))
}

/// Stream dataset updates for a panel as NDJSON. The binding re-fetches
/// on the requested interval; dropping the connection drops the
/// subscription and with it the refresh timer.
pub async fn stream_panel_data(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PanelStreamRequest>,
) -> impl IntoResponse {
    let panel = Panel::from_persisted(request.panel, request.refresh_seconds, &request.time);
    let subscription = state.chart_binding.subscribe(
        panel,
        request.time,
        request.refresh_seconds,
        request.options,
    );

    let stream = futures::stream::unfold(subscription, |mut subscription| async move {
        let datasets = subscription.updates.recv().await?;
        let mut line = serde_json::to_vec(&datasets).ok()?;
        line.push(b'\n');
        Some((Ok::<_, Infallible>(line), subscription))
    });

    (
        [(header::CONTENT_TYPE, "application/x-ndjson")],
        Body::from_stream(stream),
    )
}

/// Load a dashboard into the draft and return it
pub async fn get_dashboard(
    Path(uid): Path<String>,
    Query(query): Query<OwnerQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<DraftSnapshot>, ApiError> {
    let owner = query.created_by.unwrap_or(state.default_owner);
    Ok(Json(state.dashboard_service.load(&uid, owner).await?))
}

/// Persist the current draft
pub async fn save_dashboard(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SaveDashboardRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let owner = request.created_by.unwrap_or(state.default_owner);
    state
        .dashboard_service
        .save(
            request.uid.as_deref(),
            &request.title,
            request.interval_seconds,
            request.time,
            owner,
        )
        .await?;
    Ok(Json(json!({ "status": "ok" })))
}

/// Add an empty panel at the next free grid slot
pub async fn add_panel(State(state): State<Arc<AppState>>) -> Json<PersistedPanel> {
    let panel = state.editor.add_panel().await;
    Json(panel.to_persisted(0))
}

/// Save a panel from the configuration dialog (append or replace by id)
pub async fn upsert_panel(
    State(state): State<Arc<AppState>>,
    Json(stored): Json<PersistedPanel>,
) -> StatusCode {
    let snapshot = state.dashboard_service.snapshot().await;
    let panel = Panel::from_persisted(stored, snapshot.refresh_secs, &snapshot.layout.time);
    state.editor.upsert_panel(panel).await;
    StatusCode::NO_CONTENT
}

/// Delete a panel
pub async fn delete_panel(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> StatusCode {
    if state.editor.remove_panel(&id).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

/// Toggle between edit and view mode
pub async fn toggle_mode(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let mode = match state.editor.toggle_mode().await {
        EditorMode::Edit => "edit",
        EditorMode::View => "view",
    };
    Json(json!({ "mode": mode }))
}

/// Apply a drag/resize event to a panel
pub async fn apply_layout_change(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LayoutChangeRequest>,
) -> Json<serde_json::Value> {
    let applied = state
        .editor
        .apply_layout_change(&request.id, request.grid_pos)
        .await;
    Json(json!({ "applied": applied }))
}

/// Manual "reload now" for one panel
pub async fn refresh_panel(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    match state.editor.refresh_panel(&id).await {
        Some(token) => Ok(Json(json!({ "refreshToken": token }))),
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// Trigger a PDF export of the current dashboard
pub async fn request_export(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({ "exportTick": state.editor.request_export() }))
}
