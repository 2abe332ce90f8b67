// In-memory repository mock shared by application-layer tests
use anyhow::bail;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::application::monitoring_repository::{
    DashboardPayload, MetricSeriesRequest, MetricSeriesResponse, MonitoringRepository,
    StoredDashboard,
};
use crate::domain::station::{Parameter, Station};

#[derive(Debug, Clone)]
pub struct SavedDashboard {
    pub uid: Option<String>,
    pub payload: DashboardPayload,
}

pub struct MockRepository {
    stations: Vec<Station>,
    parameters: HashMap<i64, Vec<Parameter>>,
    failing_parameters: HashMap<i64, String>,
    series_response: MetricSeriesResponse,
    stored: Option<StoredDashboard>,
    save_failure: Option<String>,
    fetches: AtomicUsize,
    requests: Mutex<Vec<MetricSeriesRequest>>,
    saves: Mutex<Vec<SavedDashboard>>,
}

impl MockRepository {
    pub fn new() -> Self {
        Self {
            stations: Vec::new(),
            parameters: HashMap::new(),
            failing_parameters: HashMap::new(),
            series_response: MetricSeriesResponse::default(),
            stored: None,
            save_failure: None,
            fetches: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            saves: Mutex::new(Vec::new()),
        }
    }

    pub fn set_stations(&mut self, stations: Vec<Station>) {
        self.stations = stations;
    }

    pub fn set_parameters(&mut self, station_id: i64, parameters: Vec<Parameter>) {
        self.parameters.insert(station_id, parameters);
    }

    pub fn fail_parameters_for(&mut self, station_id: i64, message: &str) {
        self.failing_parameters
            .insert(station_id, message.to_string());
    }

    pub fn set_series_response(&mut self, response: MetricSeriesResponse) {
        self.series_response = response;
    }

    pub fn set_stored(&mut self, stored: StoredDashboard) {
        self.stored = Some(stored);
    }

    pub fn fail_saves(&mut self, message: &str) {
        self.save_failure = Some(message.to_string());
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn captured_requests(&self) -> Vec<MetricSeriesRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn saved(&self) -> Vec<SavedDashboard> {
        self.saves.lock().unwrap().clone()
    }
}

#[async_trait]
impl MonitoringRepository for MockRepository {
    async fn list_stations(&self) -> anyhow::Result<Vec<Station>> {
        Ok(self.stations.clone())
    }

    async fn parameters_by_target(&self, target_id: i64) -> anyhow::Result<Vec<Parameter>> {
        if let Some(message) = self.failing_parameters.get(&target_id) {
            bail!("{}", message);
        }
        Ok(self.parameters.get(&target_id).cloned().unwrap_or_default())
    }

    async fn fetch_metric_series(
        &self,
        request: &MetricSeriesRequest,
    ) -> anyhow::Result<MetricSeriesResponse> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        Ok(self.series_response.clone())
    }

    async fn get_dashboard(&self, uid: &str, _created_by: i64) -> anyhow::Result<StoredDashboard> {
        match &self.stored {
            Some(stored) => Ok(stored.clone()),
            None => bail!("dashboard {} not found", uid),
        }
    }

    async fn create_dashboard(&self, payload: &DashboardPayload) -> anyhow::Result<()> {
        if let Some(message) = &self.save_failure {
            bail!("{}", message);
        }
        self.saves.lock().unwrap().push(SavedDashboard {
            uid: None,
            payload: payload.clone(),
        });
        Ok(())
    }

    async fn update_dashboard(
        &self,
        uid: &str,
        payload: &DashboardPayload,
    ) -> anyhow::Result<()> {
        if let Some(message) = &self.save_failure {
            bail!("{}", message);
        }
        self.saves.lock().unwrap().push(SavedDashboard {
            uid: Some(uid.to_string()),
            payload: payload.clone(),
        });
        Ok(())
    }
}
