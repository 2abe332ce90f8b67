// Repository trait for the remote monitoring backend
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::layout::PersistedLayout;
use crate::domain::station::{Parameter, Station};

/// Time window of a metric-series request, RFC 3339 on the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesTimeRange {
    pub from: String,
    pub to: String,
}

/// One requested series: correlated with the response through `ref_id`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesQuery {
    pub ref_id: String,
    pub target_type: i32,
    pub target_id: i64,
    pub metric_id: i64,
}

/// Anomaly detection options as the backend expects them: the threshold is
/// a fraction in [0, 1], not the percentage held in the configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalySpec {
    pub enabled: bool,
    pub local_error_threshold: f64,
}

/// Body of `POST /metric_series`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSeriesRequest {
    pub chart_type: String,
    pub time_range: SeriesTimeRange,
    pub step_seconds: u32,
    pub forecast: bool,
    pub anomaly: AnomalySpec,
    pub series: Vec<SeriesQuery>,
}

/// One raw point from the metric-series response.
#[derive(Debug, Clone, Deserialize)]
pub struct SeriesPoint {
    pub datetime: String,
    pub value: f64,
    #[serde(rename = "trendAnomaly", default)]
    pub trend_anomaly: bool,
    #[serde(rename = "pointAnomaly", default)]
    pub point_anomaly: bool,
}

/// One response entry; `ref_id` matches the request series it answers.
#[derive(Debug, Clone, Deserialize)]
pub struct SeriesResult {
    #[serde(rename = "refId")]
    pub ref_id: String,
    #[serde(default)]
    pub series: Vec<SeriesPoint>,
    #[serde(default)]
    pub forecast: Vec<SeriesPoint>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricSeriesResponse {
    #[serde(default)]
    pub results: Vec<SeriesResult>,
}

/// Stored dashboard as returned by `GET /dashboards/{uid}`.
#[derive(Debug, Clone)]
pub struct StoredDashboard {
    pub name: String,
    pub layout: PersistedLayout,
    pub version: u32,
}

/// Body of `POST|PUT /dashboards[/{uid}]` (wrapped in a `dashboard` key by
/// the client).
#[derive(Debug, Clone, Serialize)]
pub struct DashboardPayload {
    pub name: String,
    pub description: String,
    pub layout_configuration: PersistedLayout,
    pub created_by: i64,
    pub version: u32,
    pub status: String,
}

/// Access to the remote water-quality backend. One concrete HTTP
/// implementation lives in the infrastructure layer; tests inject mocks.
#[async_trait]
pub trait MonitoringRepository: Send + Sync {
    /// List all monitoring stations.
    async fn list_stations(&self) -> anyhow::Result<Vec<Station>>;

    /// Parameters available for one station.
    async fn parameters_by_target(&self, target_id: i64) -> anyhow::Result<Vec<Parameter>>;

    /// Fetch time-series data for a panel's targets.
    async fn fetch_metric_series(
        &self,
        request: &MetricSeriesRequest,
    ) -> anyhow::Result<MetricSeriesResponse>;

    /// Load one dashboard, scoped by owner.
    async fn get_dashboard(&self, uid: &str, created_by: i64) -> anyhow::Result<StoredDashboard>;

    /// Create a new dashboard.
    async fn create_dashboard(&self, payload: &DashboardPayload) -> anyhow::Result<()>;

    /// Overwrite an existing dashboard.
    async fn update_dashboard(&self, uid: &str, payload: &DashboardPayload)
        -> anyhow::Result<()>;
}
