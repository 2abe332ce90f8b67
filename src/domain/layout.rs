// Dashboard layout configuration model
use serde::{Deserialize, Serialize};

use crate::domain::grid::GridPos;

/// Refresh interval applied when a stored refresh string cannot be parsed.
pub const DEFAULT_REFRESH_SECS: u32 = 300;

/// Render a refresh interval the way the backend stores it, e.g. `"300s"`.
pub fn format_refresh(secs: u32) -> String {
    format!("{}s", secs)
}

/// Parse a stored refresh string back to seconds. Strips the trailing `s`;
/// a missing suffix or non-numeric remainder yields the default of 300.
pub fn parse_refresh(raw: &str) -> u32 {
    raw.strip_suffix('s')
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_REFRESH_SECS)
}

/// From/to edges of the dashboard time window. Either absolute RFC 3339
/// timestamps or relative expressions such as `"now-1h"`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimeWindow {
    pub from: String,
    pub to: String,
}

/// In-memory time selection: the resolvable window plus the label shown in
/// the range picker. The label is presentation state and is not persisted.
#[derive(Debug, Clone, Default)]
pub struct TimeSelection {
    pub range: TimeWindow,
    pub label: Option<String>,
}

impl TimeSelection {
    pub fn last_hour() -> Self {
        Self {
            range: TimeWindow {
                from: "now-1h".to_string(),
                to: "now".to_string(),
            },
            label: Some("Last 1 hour".to_string()),
        }
    }
}

/// Forecast rendering options. Unknown keys are rejected at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ForecastOptions {
    pub enabled: bool,
    /// Sampling step of forecast points, in seconds.
    pub time_step: u32,
    /// Number of forecast steps past the end of the window.
    pub horizon: u32,
}

impl Default for ForecastOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            time_step: 3600,
            horizon: 24,
        }
    }
}

/// Anomaly highlighting options. The threshold is kept as a percentage
/// (0-100) in memory and in the persisted form; it is normalized to a
/// fraction only when a metric-series request is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnomalyOptions {
    pub enabled: bool,
    pub local_error_threshold: f64,
}

impl Default for AnomalyOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            local_error_threshold: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardOptions {
    pub forecast: ForecastOptions,
    pub anomaly: AnomalyOptions,
}

/// Chart widget kind. Only line charts have a working renderer; the other
/// kinds must degrade to an explicit unsupported fallback instead of
/// failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelType {
    LineChart,
    BoxPlot,
    BarChart,
}

impl PanelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PanelType::LineChart => "line_chart",
            PanelType::BoxPlot => "box_plot",
            PanelType::BarChart => "bar_chart",
        }
    }

    pub fn is_renderable(&self) -> bool {
        matches!(self, PanelType::LineChart)
    }
}

/// One series within a panel: a station x metric pair plus display
/// attributes. `ref_id` correlates a request series with its response
/// entry and must be unique within the panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    #[serde(rename = "refId")]
    pub ref_id: String,
    pub target_type: String,
    pub target_id: i64,
    pub metric_id: i64,
    pub display_name: String,
    pub color: String,
}

impl Target {
    pub fn composite_ref_id(station_id: i64, metric_id: i64) -> String {
        format!("R{}_{}", station_id, metric_id)
    }
}

/// Sequential ref ids: "A", "B", ... "Z", "AA", "AB", ...
pub fn ref_id_for_index(index: usize) -> String {
    let mut n = index;
    let mut out = Vec::new();
    loop {
        out.push(b'A' + (n % 26) as u8);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_else(|_| "A".to_string())
}

/// One chart widget as held in memory by the editor. `interval` and `time`
/// are copied down from the dashboard level on load; the persisted form
/// does not store a per-panel schedule. `refresh_token` is bumped to force
/// a re-fetch with otherwise unchanged inputs.
#[derive(Debug, Clone)]
pub struct Panel {
    pub id: String,
    pub title: String,
    pub panel_type: PanelType,
    pub grid_pos: GridPos,
    pub targets: Vec<Target>,
    pub options: DashboardOptions,
    pub interval: u32,
    pub time: TimeWindow,
    pub refresh_token: u64,
}

impl Panel {
    pub const PLACEHOLDER_TITLE: &'static str = "New panel";

    pub fn new(id: String, grid_pos: GridPos, interval: u32, time: TimeWindow) -> Self {
        Self {
            id,
            title: Self::PLACEHOLDER_TITLE.to_string(),
            panel_type: PanelType::LineChart,
            grid_pos,
            targets: Vec::new(),
            options: DashboardOptions::default(),
            interval,
            time,
            refresh_token: 0,
        }
    }

    /// Replace the whole target list in one step, as the configuration
    /// dialog does on save.
    pub fn replace_targets(&mut self, targets: Vec<Target>) {
        self.targets = targets;
    }

    pub fn to_persisted(&self, synthetic_id: i64) -> PersistedPanel {
        let id = if self.id.is_empty() {
            PanelId::Number(synthetic_id)
        } else {
            PanelId::Text(self.id.clone())
        };
        PersistedPanel {
            id,
            title: self.title.clone(),
            panel_type: self.panel_type,
            grid_pos: self.grid_pos.clone(),
            targets: self.targets.clone(),
            options: self.options.clone(),
        }
    }

    /// Hydrate a widget from its stored form, copying the dashboard-level
    /// refresh interval and time window down onto the panel.
    pub fn from_persisted(stored: PersistedPanel, interval: u32, time: &TimeWindow) -> Self {
        Self {
            id: stored.id.into_string(),
            title: stored.title,
            panel_type: stored.panel_type,
            grid_pos: stored.grid_pos,
            targets: stored.targets,
            options: stored.options,
            interval,
            time: time.clone(),
            refresh_token: 0,
        }
    }
}

/// Stored panel ids may be numbers (synthetic) or strings (client-created).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PanelId {
    Number(i64),
    Text(String),
}

impl PanelId {
    pub fn into_string(self) -> String {
        match self {
            PanelId::Number(n) => n.to_string(),
            PanelId::Text(s) => s,
        }
    }
}

/// Plain serializable shape of one panel inside the persisted layout blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedPanel {
    pub id: PanelId,
    pub title: String,
    #[serde(rename = "type")]
    pub panel_type: PanelType,
    #[serde(rename = "gridPos")]
    pub grid_pos: GridPos,
    #[serde(default)]
    pub targets: Vec<Target>,
    #[serde(default)]
    pub options: DashboardOptions,
}

/// The `layout_configuration` JSON blob exchanged with the dashboard CRUD
/// endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedLayout {
    pub time: TimeWindow,
    pub refresh: String,
    #[serde(default)]
    pub panels: Vec<PersistedPanel>,
}

/// The in-memory root of one dashboard: ordered panels, global refresh and
/// time window, render options, and the monotonically increasing save
/// version.
#[derive(Debug, Clone)]
pub struct LayoutConfiguration {
    pub panels: Vec<Panel>,
    pub refresh: u32,
    pub time: TimeSelection,
    pub options: DashboardOptions,
    pub version: u32,
}

impl LayoutConfiguration {
    pub fn new() -> Self {
        Self {
            panels: Vec::new(),
            refresh: DEFAULT_REFRESH_SECS,
            time: TimeSelection::last_hour(),
            options: DashboardOptions::default(),
            version: 0,
        }
    }

    pub fn to_persisted(&self) -> PersistedLayout {
        let panels = self
            .panels
            .iter()
            .enumerate()
            .map(|(i, p)| p.to_persisted(i as i64 + 1))
            .collect();
        PersistedLayout {
            time: self.time.range.clone(),
            refresh: format_refresh(self.refresh),
            panels,
        }
    }
}

impl Default for LayoutConfiguration {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_round_trip() {
        assert_eq!(format_refresh(300), "300s");
        assert_eq!(parse_refresh("300s"), 300);
        assert_eq!(parse_refresh("45s"), 45);
        assert_eq!(parse_refresh(&format_refresh(0)), 0);
    }

    #[test]
    fn test_refresh_malformed_defaults() {
        assert_eq!(parse_refresh("abc"), 300);
        assert_eq!(parse_refresh(""), 300);
        assert_eq!(parse_refresh("300"), 300); // missing suffix
        assert_eq!(parse_refresh("s"), 300);
    }

    #[test]
    fn test_ref_id_sequence() {
        assert_eq!(ref_id_for_index(0), "A");
        assert_eq!(ref_id_for_index(1), "B");
        assert_eq!(ref_id_for_index(25), "Z");
        assert_eq!(ref_id_for_index(26), "AA");
        assert_eq!(ref_id_for_index(27), "AB");
    }

    #[test]
    fn test_persisted_layout_field_names() {
        let mut layout = LayoutConfiguration::new();
        let mut panel = Panel::new(
            "1718000000000".to_string(),
            GridPos { x: 0, y: 0, w: 6, h: 4 },
            layout.refresh,
            layout.time.range.clone(),
        );
        panel.replace_targets(vec![Target {
            ref_id: "A".to_string(),
            target_type: "station".to_string(),
            target_id: 7,
            metric_id: 3,
            display_name: "pH - Station 7".to_string(),
            color: "#ff5733".to_string(),
        }]);
        layout.panels.push(panel);

        let value = serde_json::to_value(layout.to_persisted()).unwrap();
        assert_eq!(value["refresh"], "300s");
        assert_eq!(value["time"]["from"], "now-1h");
        let panel = &value["panels"][0];
        assert_eq!(panel["type"], "line_chart");
        assert_eq!(panel["gridPos"]["w"], 6);
        assert_eq!(panel["targets"][0]["refId"], "A");
        assert_eq!(panel["targets"][0]["display_name"], "pH - Station 7");
    }

    #[test]
    fn test_synthetic_numeric_id_for_unidentified_panel() {
        let mut layout = LayoutConfiguration::new();
        layout.panels.push(Panel::new(
            String::new(),
            GridPos { x: 0, y: 0, w: 6, h: 4 },
            300,
            TimeWindow::default(),
        ));
        let persisted = layout.to_persisted();
        assert_eq!(persisted.panels[0].id, PanelId::Number(1));
    }

    #[test]
    fn test_panel_id_accepts_number_or_string() {
        let numeric: PanelId = serde_json::from_str("42").unwrap();
        assert_eq!(numeric.into_string(), "42");
        let text: PanelId = serde_json::from_str("\"1718000000000\"").unwrap();
        assert_eq!(text.into_string(), "1718000000000");
    }

    #[test]
    fn test_options_reject_unknown_keys() {
        let raw = r#"{"forecast":{"enabled":true,"time_step":600,"horizon":12,"mode":"auto"}}"#;
        assert!(serde_json::from_str::<DashboardOptions>(raw).is_err());

        let raw = r#"{"anomaly":{"enabled":true,"local_error_threshold":5.0}}"#;
        let options: DashboardOptions = serde_json::from_str(raw).unwrap();
        assert!(options.anomaly.enabled);
        assert!(!options.forecast.enabled);
    }

    #[test]
    fn test_copy_down_on_hydration() {
        let stored = PersistedPanel {
            id: PanelId::Number(2),
            title: "Nitrate".to_string(),
            panel_type: PanelType::BarChart,
            grid_pos: GridPos { x: 0, y: 0, w: 6, h: 4 },
            targets: Vec::new(),
            options: DashboardOptions::default(),
        };
        let window = TimeWindow {
            from: "now-7d".to_string(),
            to: "now".to_string(),
        };
        let panel = Panel::from_persisted(stored, 60, &window);
        assert_eq!(panel.id, "2");
        assert_eq!(panel.interval, 60);
        assert_eq!(panel.time, window);
        assert_eq!(panel.refresh_token, 0);
    }
}
