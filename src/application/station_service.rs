// Station service - Use case for listing monitoring stations
use std::sync::Arc;

use crate::application::monitoring_repository::MonitoringRepository;
use crate::domain::station::Station;

#[derive(Clone)]
pub struct StationService {
    repository: Arc<dyn MonitoringRepository>,
}

impl StationService {
    pub fn new(repository: Arc<dyn MonitoringRepository>) -> Self {
        Self { repository }
    }

    pub async fn list_stations(&self) -> anyhow::Result<Vec<Station>> {
        self.repository.list_stations().await
    }
}
