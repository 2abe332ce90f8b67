// Editor orchestration - dashboard draft state and edit/view mode
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{watch, RwLock};

use crate::domain::grid::{self, GridPos, DEFAULT_PANEL_H, DEFAULT_PANEL_W, GRID_COLS};
use crate::domain::layout::{LayoutConfiguration, Panel};

/// The dashboard being edited. Explicitly constructed and injected where
/// needed; `reset` returns it to the pristine state a fresh session gets.
#[derive(Debug)]
pub struct DashboardDraft {
    pub uid: Option<String>,
    pub title: String,
    pub description: String,
    pub layout: LayoutConfiguration,
}

impl DashboardDraft {
    pub fn new() -> Self {
        Self {
            uid: None,
            title: String::new(),
            description: String::new(),
            layout: LayoutConfiguration::new(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for DashboardDraft {
    fn default() -> Self {
        Self::new()
    }
}

/// Editing mode. Layout-change events only apply in `Edit`; the render
/// layer disables dragging in `View`, but some layout engines still emit
/// spurious events, so the guard exists here independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorMode {
    Edit,
    View,
}

pub struct DashboardEditor {
    draft: Arc<RwLock<DashboardDraft>>,
    mode: RwLock<EditorMode>,
    export_ticks: watch::Sender<u64>,
}

impl DashboardEditor {
    pub fn new(draft: Arc<RwLock<DashboardDraft>>) -> Self {
        let (export_ticks, _) = watch::channel(0);
        Self {
            draft,
            mode: RwLock::new(EditorMode::Edit),
            export_ticks,
        }
    }

    pub async fn mode(&self) -> EditorMode {
        *self.mode.read().await
    }

    pub async fn toggle_mode(&self) -> EditorMode {
        let mut mode = self.mode.write().await;
        *mode = match *mode {
            EditorMode::Edit => EditorMode::View,
            EditorMode::View => EditorMode::Edit,
        };
        *mode
    }

    /// Add an empty panel at the first free grid slot. The id is derived
    /// from the wall clock and never reused after deletion.
    pub async fn add_panel(&self) -> Panel {
        let mut draft = self.draft.write().await;
        let existing: Vec<GridPos> = draft
            .layout
            .panels
            .iter()
            .map(|p| p.grid_pos.clone())
            .collect();
        let grid_pos = grid::allocate(&existing, GRID_COLS, DEFAULT_PANEL_W, DEFAULT_PANEL_H);

        let mut id_ms = Utc::now().timestamp_millis();
        while draft
            .layout
            .panels
            .iter()
            .any(|p| p.id == id_ms.to_string())
        {
            id_ms += 1;
        }

        let panel = Panel::new(
            id_ms.to_string(),
            grid_pos,
            draft.layout.refresh,
            draft.layout.time.range.clone(),
        );
        draft.layout.panels.push(panel.clone());
        panel
    }

    /// Single save path of the configuration dialog: replace in place when
    /// the id exists, append otherwise.
    pub async fn upsert_panel(&self, panel: Panel) {
        let mut draft = self.draft.write().await;
        match draft
            .layout
            .panels
            .iter_mut()
            .find(|p| p.id == panel.id)
        {
            Some(existing) => *existing = panel,
            None => draft.layout.panels.push(panel),
        }
    }

    /// Hard delete. Returns whether a panel with that id existed.
    pub async fn remove_panel(&self, id: &str) -> bool {
        let mut draft = self.draft.write().await;
        let before = draft.layout.panels.len();
        draft.layout.panels.retain(|p| p.id != id);
        draft.layout.panels.len() != before
    }

    /// Apply a drag/resize event. Ignored outside edit mode.
    pub async fn apply_layout_change(&self, id: &str, grid_pos: GridPos) -> bool {
        if self.mode().await != EditorMode::Edit {
            tracing::debug!(panel = %id, "ignoring layout change in view mode");
            return false;
        }
        let mut draft = self.draft.write().await;
        match draft.layout.panels.iter_mut().find(|p| p.id == id) {
            Some(panel) => {
                panel.grid_pos = grid_pos;
                true
            }
            None => false,
        }
    }

    /// Manual "reload now": bump the panel's refresh token so its binding
    /// re-fetches with otherwise unchanged inputs.
    pub async fn refresh_panel(&self, id: &str) -> Option<u64> {
        let mut draft = self.draft.write().await;
        let panel = draft.layout.panels.iter_mut().find(|p| p.id == id)?;
        panel.refresh_token += 1;
        Some(panel.refresh_token)
    }

    /// Signal the export pipeline. Rendering the PDF itself is owned by
    /// the presentation side observing `export_events`.
    pub fn request_export(&self) -> u64 {
        self.export_ticks.send_modify(|tick| *tick += 1);
        *self.export_ticks.borrow()
    }

    pub fn export_events(&self) -> watch::Receiver<u64> {
        self.export_ticks.subscribe()
    }
}
