//! Defines the central, mutable state of the application.

use anyhow::Result;

use super::hover::{HoverController, UiMode};
use crate::config::AppConfig;
use crate::store::{Category, Project, ProjectStore, Selection, StoreError};

/// The active project together with its loaded selections and categories.
pub struct ActiveProject {
    pub project: Project,
    pub selections: Vec<Selection>,
    pub categories: Vec<Category>,
}

/// Holds the complete, mutable state of the application.
///
/// Wrapped in an `Arc<Mutex<...>>` and shared between the event loop and
/// the IPC handlers. The store is the source of truth; `active` is a
/// loaded snapshot refreshed after every mutation.
pub struct AppState {
    pub config: AppConfig,
    pub store: ProjectStore,
    pub active: Option<ActiveProject>,
    /// Restricts the next export to selections carrying this category.
    pub export_category: Option<i64>,
    pub hover: HoverController,
    pub status_message: String,
}

const UI_MODE_KEY: &str = "last_ui_mode";

impl AppState {
    /// Builds the state at startup, restoring the active project and the
    /// persisted UI mode.
    pub fn new(config: AppConfig, store: ProjectStore) -> Result<Self> {
        let mode = store
            .setting(UI_MODE_KEY)?
            .map(|v| UiMode::parse(&v))
            .unwrap_or(UiMode::Full);

        let mut state = Self {
            config,
            store,
            active: None,
            export_category: None,
            hover: HoverController::new(mode),
            status_message: "Ready.".to_string(),
        };

        if let Some(project) = state.store.active_project()? {
            state.load_active(project.id)?;
        }
        Ok(state)
    }

    /// Loads a project (and its selections and categories) as the active one.
    pub fn load_active(&mut self, project_id: i64) -> Result<(), StoreError> {
        match self.store.project(project_id)? {
            Some(project) => {
                let selections = self.store.selections(project.id, None)?;
                let categories = self.store.categories(project.id)?;
                self.store.set_active_project(Some(project.id))?;
                self.active = Some(ActiveProject {
                    project,
                    selections,
                    categories,
                });
                self.export_category = None;
            }
            None => {
                self.store.set_active_project(None)?;
                self.active = None;
                self.export_category = None;
            }
        }
        Ok(())
    }

    /// Re-reads the active project's data from the store after a mutation.
    pub fn refresh_active(&mut self) -> Result<(), StoreError> {
        if let Some(active) = &self.active {
            let project_id = active.project.id;
            match self.store.project(project_id)? {
                Some(project) => {
                    let selections = self.store.selections(project_id, None)?;
                    let categories = self.store.categories(project_id)?;
                    // Drop a stale export filter if its category is gone.
                    if let Some(cat) = self.export_category {
                        if !categories.iter().any(|c| c.id == cat) {
                            self.export_category = None;
                        }
                    }
                    self.active = Some(ActiveProject {
                        project,
                        selections,
                        categories,
                    });
                }
                None => {
                    self.active = None;
                    self.export_category = None;
                }
            }
        }
        Ok(())
    }

    /// Persists the current UI mode so the next launch restores it.
    pub fn persist_ui_mode(&self) {
        let mode = self.hover.mode();
        if let Err(e) = self.store.set_setting(UI_MODE_KEY, mode.as_str()) {
            tracing::warn!("Failed to persist UI mode: {}", e);
        }
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
    }
}
