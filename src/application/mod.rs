// Application layer - Use cases over the monitoring repository
pub mod chart_binding;
pub mod dashboard_service;
pub mod editor;
pub mod monitoring_repository;
pub mod station_service;
pub mod target_resolver;

#[cfg(test)]
pub mod test_support;
