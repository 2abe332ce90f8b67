// HTTP client for the remote water-quality backend
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::monitoring_repository::{
    DashboardPayload, MetricSeriesRequest, MetricSeriesResponse, MonitoringRepository,
    StoredDashboard,
};
use crate::domain::layout::PersistedLayout;
use crate::domain::station::{Parameter, Station};

#[derive(Debug, Error)]
pub enum BackendError {
    /// Non-2xx response; `message` is the remote body, passed through
    /// verbatim so callers can show it to the user.
    #[error("backend request failed with status {status}: {message}")]
    Http { status: u16, message: String },
    #[error("failed to reach backend: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, Clone)]
pub struct BackendClient {
    base_url: String,
    token: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct StationsEnvelope {
    #[serde(default)]
    stations: Vec<Station>,
}

#[derive(Debug, Serialize)]
struct ParametersByTargetBody<'a> {
    target_type: &'a str,
    target_id: i64,
}

#[derive(Debug, Deserialize)]
struct ParametersEnvelope {
    data: ParametersData,
}

#[derive(Debug, Deserialize)]
struct ParametersData {
    #[serde(default)]
    parameters: Vec<Parameter>,
}

#[derive(Debug, Deserialize)]
struct DashboardEnvelope {
    data: DashboardData,
}

#[derive(Debug, Deserialize)]
struct DashboardData {
    name: String,
    #[serde(rename = "layoutConfiguration")]
    layout_configuration: PersistedLayout,
    version: u32,
}

#[derive(Debug, Serialize)]
struct DashboardBody<'a> {
    dashboard: &'a DashboardPayload,
}

impl BackendClient {
    pub fn new(base_url: String, token: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get(&self, path: &str) -> Result<reqwest::Response, BackendError> {
        let response = self
            .client
            .get(self.url(path))
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/json")
            .send()
            .await?;
        Self::check(response).await
    }

    async fn send_json<B: Serialize>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response, BackendError> {
        let response = self
            .client
            .request(method, self.url(path))
            .header("Authorization", format!("Bearer {}", self.token))
            .json(body)
            .send()
            .await?;
        Self::check(response).await
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(BackendError::Http {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl MonitoringRepository for BackendClient {
    async fn list_stations(&self) -> anyhow::Result<Vec<Station>> {
        let envelope: StationsEnvelope = self
            .get("/stations")
            .await?
            .json()
            .await
            .map_err(BackendError::Transport)?;
        Ok(envelope.stations)
    }

    async fn parameters_by_target(&self, target_id: i64) -> anyhow::Result<Vec<Parameter>> {
        let body = ParametersByTargetBody {
            target_type: "STATION",
            target_id,
        };
        let envelope: ParametersEnvelope = self
            .send_json(reqwest::Method::POST, "/station_parameters/by_target", &body)
            .await?
            .json()
            .await
            .map_err(BackendError::Transport)?;
        Ok(envelope.data.parameters)
    }

    async fn fetch_metric_series(
        &self,
        request: &MetricSeriesRequest,
    ) -> anyhow::Result<MetricSeriesResponse> {
        tracing::debug!(
            chart_type = %request.chart_type,
            series = request.series.len(),
            "requesting metric series"
        );
        let response: MetricSeriesResponse = self
            .send_json(reqwest::Method::POST, "/metric_series", request)
            .await?
            .json()
            .await
            .map_err(BackendError::Transport)?;
        Ok(response)
    }

    async fn get_dashboard(&self, uid: &str, created_by: i64) -> anyhow::Result<StoredDashboard> {
        let path = format!(
            "/dashboards/{}?created_by={}",
            urlencoding::encode(uid),
            created_by
        );
        let envelope: DashboardEnvelope = self
            .get(&path)
            .await?
            .json()
            .await
            .map_err(BackendError::Transport)?;
        Ok(StoredDashboard {
            name: envelope.data.name,
            layout: envelope.data.layout_configuration,
            version: envelope.data.version,
        })
    }

    async fn create_dashboard(&self, payload: &DashboardPayload) -> anyhow::Result<()> {
        let body = DashboardBody { dashboard: payload };
        self.send_json(reqwest::Method::POST, "/dashboards", &body)
            .await?;
        Ok(())
    }

    async fn update_dashboard(
        &self,
        uid: &str,
        payload: &DashboardPayload,
    ) -> anyhow::Result<()> {
        let body = DashboardBody { dashboard: payload };
        let path = format!("/dashboards/{}", urlencoding::encode(uid));
        self.send_json(reqwest::Method::PUT, &path, &body).await?;
        Ok(())
    }
}
