// Application state for HTTP handlers
use crate::application::chart_binding::ChartBinding;
use crate::application::dashboard_service::DashboardService;
use crate::application::editor::DashboardEditor;
use crate::application::station_service::StationService;
use crate::application::target_resolver::TargetResolver;

pub struct AppState {
    pub station_service: StationService,
    pub target_resolver: TargetResolver,
    pub chart_binding: ChartBinding,
    pub dashboard_service: DashboardService,
    pub editor: DashboardEditor,
    pub default_owner: i64,
}
