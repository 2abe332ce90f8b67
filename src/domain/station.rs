// Station and parameter models from the monitoring backend
use serde::{Deserialize, Serialize};

/// One monitoring station as the backend reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Station {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub long: Option<f64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(rename = "stationType", default)]
    pub station_type: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

/// One measurable parameter available at a station.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(rename = "parameterGroup", default)]
    pub parameter_group: Option<String>,
}

impl Parameter {
    /// Series label shown in legends: "pH - Station 7".
    pub fn display_name(&self, station_name: &str) -> String {
        format!("{} - {}", self.name, station_name)
    }
}
