// Chart-ready series data and color assignment
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

/// Fixed palette cycled through when assigning series colors.
pub const DEFAULT_COLORS: [&str; 8] = [
    "#2563eb", "#dc2626", "#16a34a", "#ca8a04", "#9333ea", "#0891b2", "#be185d", "#ea580c",
];

/// Key of the per-target color override map: `"{stationId}-{paramId}"`.
pub fn color_key(station_id: i64, metric_id: i64) -> String {
    format!("{}-{}", station_id, metric_id)
}

/// Deterministic palette color for a station/parameter pair. An existing
/// override always wins over the computed default.
pub fn pick_color(
    station_idx: usize,
    param_idx: usize,
    station_id: i64,
    metric_id: i64,
    overrides: &HashMap<String, String>,
) -> String {
    if let Some(color) = overrides.get(&color_key(station_id, metric_id)) {
        return color.clone();
    }
    DEFAULT_COLORS[(station_idx + param_idx) % DEFAULT_COLORS.len()].to_string()
}

/// One chart point. Rebuilt on every fetch and never cached across render
/// cycles.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
    pub anomaly: bool,
    pub forecast: bool,
    pub label: String,
    pub color: String,
}

/// Per-target dataset: observed points plus forecast points.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    pub label: String,
    pub color: String,
    pub actual: Vec<ChartPoint>,
    pub forecast: Vec<ChartPoint>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_assignment_stable() {
        let overrides = HashMap::new();
        let first = pick_color(1, 2, 7, 3, &overrides);
        let second = pick_color(1, 2, 7, 3, &overrides);
        assert_eq!(first, second);
        assert_eq!(first, DEFAULT_COLORS[3]);
    }

    #[test]
    fn test_color_wraps_around_palette() {
        let overrides = HashMap::new();
        assert_eq!(
            pick_color(5, 3, 1, 1, &overrides),
            pick_color(0, 0, 2, 2, &overrides)
        );
    }

    #[test]
    fn test_override_beats_computed_default() {
        let mut overrides = HashMap::new();
        overrides.insert(color_key(7, 3), "#ff5733".to_string());
        assert_eq!(pick_color(0, 0, 7, 3, &overrides), "#ff5733");
        // Other pairs are unaffected.
        assert_eq!(pick_color(0, 0, 7, 4, &overrides), DEFAULT_COLORS[0]);
    }
}
