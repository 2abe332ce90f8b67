// Panel target resolution - available parameters and series descriptors
use futures::future::join_all;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::application::monitoring_repository::MonitoringRepository;
use crate::domain::layout::Target;
use crate::domain::series::pick_color;
use crate::domain::station::{Parameter, Station};

pub const STATION_TARGET_TYPE: &str = "station";

#[derive(Clone)]
pub struct TargetResolver {
    repository: Arc<dyn MonitoringRepository>,
}

impl TargetResolver {
    pub fn new(repository: Arc<dyn MonitoringRepository>) -> Self {
        Self { repository }
    }

    /// Fetch the parameters available for the selected stations and merge
    /// them, keyed by parameter id so a parameter shared by several
    /// stations appears once. A station whose fetch fails is logged and
    /// skipped; the remaining stations still contribute.
    pub async fn available_parameters(&self, station_ids: &[i64]) -> Vec<Parameter> {
        let fetches = station_ids
            .iter()
            .map(|id| self.repository.parameters_by_target(*id));
        let results = join_all(fetches).await;

        let mut by_id: BTreeMap<i64, Parameter> = BTreeMap::new();
        for (station_id, result) in station_ids.iter().zip(results) {
            match result {
                Ok(parameters) => {
                    for parameter in parameters {
                        by_id.entry(parameter.id).or_insert(parameter);
                    }
                }
                Err(e) => {
                    tracing::warn!("failed to fetch parameters for station {}: {:#}", station_id, e);
                }
            }
        }
        by_id.into_values().collect()
    }

    /// Build the cross product of selected stations and parameters as
    /// color-assigned series descriptors.
    ///
    /// Membership is not re-checked here: only the selectable parameter
    /// list upstream restricts the pairing, so a stale selection can pair a
    /// station with a parameter it no longer reports. Such a target simply
    /// binds to an empty series.
    pub fn build_targets(
        stations: &[Station],
        parameters: &[Parameter],
        color_overrides: &HashMap<String, String>,
    ) -> Vec<Target> {
        let mut targets = Vec::new();
        for (station_idx, station) in stations.iter().enumerate() {
            for (param_idx, parameter) in parameters.iter().enumerate() {
                targets.push(Target {
                    ref_id: Target::composite_ref_id(station.id, parameter.id),
                    target_type: STATION_TARGET_TYPE.to_string(),
                    target_id: station.id,
                    metric_id: parameter.id,
                    display_name: parameter.display_name(&station.name),
                    color: pick_color(
                        station_idx,
                        param_idx,
                        station.id,
                        parameter.id,
                        color_overrides,
                    ),
                });
            }
        }
        targets
    }
}
