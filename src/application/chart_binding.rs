// Chart data binding - panel targets to time-series datasets
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::application::monitoring_repository::{
    AnomalySpec, MetricSeriesRequest, MetricSeriesResponse, MonitoringRepository, SeriesPoint,
    SeriesQuery, SeriesTimeRange,
};
use crate::domain::layout::{DashboardOptions, Panel, Target, TimeWindow};
use crate::domain::series::{ChartPoint, Dataset};
use crate::domain::timerange::resolve_window_at;
use crate::infrastructure::scheduler::RefreshScheduler;

/// Wire value of `target_type` for station-scoped series.
const STATION_TARGET_TYPE_CODE: i32 = 1;

/// What a panel renders: datasets for supported chart kinds, an explicit
/// fallback message otherwise. Unsupported kinds must never fail.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PanelRender {
    Datasets { datasets: Vec<Dataset> },
    Unsupported { message: String },
}

/// One live panel binding: the receiver yields a fresh dataset list per
/// fetch, the scheduler re-fetches while the refresh interval is nonzero.
/// Dropping the subscription tears the timer down.
pub struct PanelSubscription {
    pub updates: mpsc::Receiver<Vec<Dataset>>,
    scheduler: RefreshScheduler,
}

impl PanelSubscription {
    pub fn stop(&mut self) {
        self.scheduler.stop();
    }

    pub fn is_polling(&self) -> bool {
        self.scheduler.is_running()
    }
}

#[derive(Clone)]
pub struct ChartBinding {
    repository: Arc<dyn MonitoringRepository>,
}

impl ChartBinding {
    pub fn new(repository: Arc<dyn MonitoringRepository>) -> Self {
        Self { repository }
    }

    /// Build the metric-series request for a panel, or `None` when the
    /// window is missing an edge. A missing window aborts the fetch; it
    /// never throws and never clears datasets a caller already holds.
    ///
    /// Relative expressions are resolved against the wall clock here, at
    /// fetch time, so a trailing window shifts between consecutive
    /// fetches.
    pub fn build_request(
        panel: &Panel,
        window: &TimeWindow,
        options: &DashboardOptions,
    ) -> Option<MetricSeriesRequest> {
        Self::build_request_at(panel, window, options, Utc::now())
    }

    pub fn build_request_at(
        panel: &Panel,
        window: &TimeWindow,
        options: &DashboardOptions,
        now: DateTime<Utc>,
    ) -> Option<MetricSeriesRequest> {
        if window.from.is_empty() || window.to.is_empty() {
            tracing::warn!(panel = %panel.id, "missing time range, skipping fetch");
            return None;
        }

        let (from, to) = resolve_window_at(window, now);
        let step_seconds = if options.forecast.enabled {
            options.forecast.time_step
        } else {
            0
        };

        Some(MetricSeriesRequest {
            chart_type: panel.panel_type.as_str().to_string(),
            time_range: SeriesTimeRange {
                from: from.to_rfc3339_opts(SecondsFormat::Secs, true),
                to: to.to_rfc3339_opts(SecondsFormat::Secs, true),
            },
            step_seconds,
            forecast: options.forecast.enabled,
            anomaly: AnomalySpec {
                enabled: options.anomaly.enabled,
                // Configured as a percentage, sent as a fraction.
                local_error_threshold: options.anomaly.local_error_threshold / 100.0,
            },
            series: panel
                .targets
                .iter()
                .map(|t| SeriesQuery {
                    ref_id: t.ref_id.clone(),
                    target_type: STATION_TARGET_TYPE_CODE,
                    target_id: t.target_id,
                    metric_id: t.metric_id,
                })
                .collect(),
        })
    }

    /// Bind a response to the panel's targets. A target without a matching
    /// `refId` in the response yields empty point arrays rather than an
    /// error.
    pub fn bind_response(panel: &Panel, response: &MetricSeriesResponse) -> Vec<Dataset> {
        panel
            .targets
            .iter()
            .map(|target| {
                let result = response.results.iter().find(|r| r.ref_id == target.ref_id);
                let actual = result
                    .map(|r| map_points(&r.series, target, false))
                    .unwrap_or_default();
                let forecast = result
                    .map(|r| map_points(&r.forecast, target, true))
                    .unwrap_or_default();
                Dataset {
                    label: target.display_name.clone(),
                    color: target.color.clone(),
                    actual,
                    forecast,
                }
            })
            .collect()
    }

    /// One-shot fetch and bind. Returns the unsupported fallback without
    /// touching the backend when the panel's chart kind has no renderer.
    pub async fn render(
        &self,
        panel: &Panel,
        window: &TimeWindow,
        options: &DashboardOptions,
    ) -> anyhow::Result<PanelRender> {
        if !panel.panel_type.is_renderable() {
            return Ok(PanelRender::Unsupported {
                message: format!("{} panels are not supported yet", panel.panel_type.as_str()),
            });
        }
        let datasets = self.bind(panel, window, options).await?;
        Ok(PanelRender::Datasets { datasets })
    }

    /// Fetch the panel's series once and bind them. A missing window
    /// yields an empty dataset list after a logged warning.
    pub async fn bind(
        &self,
        panel: &Panel,
        window: &TimeWindow,
        options: &DashboardOptions,
    ) -> anyhow::Result<Vec<Dataset>> {
        let Some(request) = Self::build_request(panel, window, options) else {
            return Ok(Vec::new());
        };
        let response = self.repository.fetch_metric_series(&request).await?;
        Ok(Self::bind_response(panel, &response))
    }

    /// Subscribe a panel to its data: one immediate fetch, then a re-fetch
    /// every `refresh_secs` while it is positive. Changing any input means
    /// dropping this subscription and creating a new one; the scheduler's
    /// stop-then-start contract guarantees a single live timer.
    ///
    /// In-flight fetches are not de-duplicated: a subscription replaced
    /// while a request is outstanding can race it against the successor's
    /// first fetch, and the last response to resolve wins.
    pub fn subscribe(
        &self,
        panel: Panel,
        window: TimeWindow,
        refresh_secs: u32,
        options: DashboardOptions,
    ) -> PanelSubscription {
        let (tx, rx) = mpsc::channel(16);

        {
            let repository = self.repository.clone();
            let tx = tx.clone();
            let panel = panel.clone();
            let window = window.clone();
            let options = options.clone();
            tokio::spawn(async move {
                fetch_and_publish(repository, &tx, &panel, &window, &options).await;
            });
        }

        let mut scheduler = RefreshScheduler::new();
        if refresh_secs > 0 {
            let repository = self.repository.clone();
            scheduler.start(Duration::from_secs(u64::from(refresh_secs)), move || {
                let repository = repository.clone();
                let tx = tx.clone();
                let panel = panel.clone();
                let window = window.clone();
                let options = options.clone();
                async move {
                    fetch_and_publish(repository, &tx, &panel, &window, &options).await;
                }
            });
        }

        PanelSubscription {
            updates: rx,
            scheduler,
        }
    }
}

async fn fetch_and_publish(
    repository: Arc<dyn MonitoringRepository>,
    tx: &mpsc::Sender<Vec<Dataset>>,
    panel: &Panel,
    window: &TimeWindow,
    options: &DashboardOptions,
) {
    let Some(request) = ChartBinding::build_request(panel, window, options) else {
        return;
    };
    match repository.fetch_metric_series(&request).await {
        Ok(response) => {
            let _ = tx.send(ChartBinding::bind_response(panel, &response)).await;
        }
        Err(e) => {
            tracing::error!(panel = %panel.id, "metric series fetch failed: {:#}", e);
        }
    }
}

fn map_points(points: &[SeriesPoint], target: &Target, forecast: bool) -> Vec<ChartPoint> {
    points
        .iter()
        .filter_map(|p| {
            let timestamp = match DateTime::parse_from_rfc3339(&p.datetime) {
                Ok(t) => t.with_timezone(&Utc),
                Err(_) => {
                    tracing::debug!("dropping point with unparseable datetime {:?}", p.datetime);
                    return None;
                }
            };
            Some(ChartPoint {
                timestamp,
                value: p.value,
                anomaly: p.trend_anomaly || p.point_anomaly,
                forecast,
                label: target.display_name.clone(),
                color: target.color.clone(),
            })
        })
        .collect()
}
