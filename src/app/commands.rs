//! Command handlers callable from the frontend via IPC.
//!
//! Each function corresponds to an `IpcMessage::command`. Handlers mutate
//! the `AppState`, push a fresh `UiState`, and surface failures as
//! `Notice`/`ShowError` events instead of returning errors.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use serde::Deserialize;

use super::events::UserEvent;
use super::file_dialog::DialogService;
use super::helpers::with_state_and_notify;
use super::hover::{HoverEffect, HoverTrigger, UiMode};
use super::proxy::EventProxy;
use super::state::AppState;
use super::view_model;
use crate::core::{assemble, export, preview, ClipboardService, TreeWalker};
use crate::store::{SelectionKind, StoreError, DEFAULT_PROMPT_GUIDE};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateProjectPayload {
    name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectIdPayload {
    project_id: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptGuidePayload {
    prompt_guide: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PathPayload {
    path: PathBuf,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddSelectionPayload {
    path: PathBuf,
    #[serde(default)]
    filters: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateFiltersPayload {
    path: PathBuf,
    filters: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddCategoryPayload {
    name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CategoryIdPayload {
    category_id: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SelectionCategoriesPayload {
    selection_id: i64,
    category_ids: Vec<i64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExportCategoryPayload {
    category_id: Option<i64>,
}

fn parse<T: serde::de::DeserializeOwned, P: EventProxy>(
    payload: serde_json::Value,
    proxy: &P,
) -> Option<T> {
    match serde_json::from_value(payload) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("Malformed IPC payload: {}", e);
            proxy.send_event(UserEvent::ShowError(format!("Malformed request: {e}")));
            None
        }
    }
}

/// Pushes the initial state to a freshly loaded frontend.
pub fn initialize<P: EventProxy>(proxy: P, state: Arc<Mutex<AppState>>) {
    with_state_and_notify(&state, &proxy, |s| {
        tracing::info!("Frontend initialized");
        let mode = s.hover.mode();
        proxy.send_event(UserEvent::UiModeChanged(mode));
    });
}

/// Creates a new project: asks for a root directory, stores the project
/// with the default prompt guide, and makes it active.
pub fn create_project<P: EventProxy, D: DialogService + ?Sized>(
    payload: serde_json::Value,
    dialog: &D,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) {
    let Some(payload) = parse::<CreateProjectPayload, _>(payload, &proxy) else {
        return;
    };
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        proxy.send_event(UserEvent::Notice("Project name cannot be empty.".into()));
        return;
    }

    let Some(root) = dialog.pick_project_root() else {
        tracing::info!("User cancelled project root selection");
        return;
    };

    with_state_and_notify(&state, &proxy, |s| {
        match s.store.add_project(&name, &root, DEFAULT_PROMPT_GUIDE) {
            Ok(id) => {
                if let Err(e) = s.load_active(id) {
                    proxy.send_event(UserEvent::ShowError(e.to_string()));
                    return;
                }
                s.set_status(format!("Created project '{name}'."));
            }
            Err(e @ StoreError::ProjectNameTaken(_)) => {
                proxy.send_event(UserEvent::Notice(e.to_string()));
            }
            Err(e) => proxy.send_event(UserEvent::ShowError(e.to_string())),
        }
    });
}

/// Deletes a project and everything attached to it.
pub fn delete_project<P: EventProxy>(
    payload: serde_json::Value,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) {
    let Some(payload) = parse::<ProjectIdPayload, _>(payload, &proxy) else {
        return;
    };
    with_state_and_notify(&state, &proxy, |s| {
        if let Err(e) = s.store.delete_project(payload.project_id) {
            proxy.send_event(UserEvent::ShowError(e.to_string()));
            return;
        }
        if s.active.as_ref().map(|a| a.project.id) == Some(payload.project_id) {
            s.active = None;
            s.export_category = None;
        }
        s.set_status("Project deleted.");
    });
}

/// Switches the active project.
pub fn switch_project<P: EventProxy>(
    payload: serde_json::Value,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) {
    let Some(payload) = parse::<ProjectIdPayload, _>(payload, &proxy) else {
        return;
    };
    with_state_and_notify(&state, &proxy, |s| {
        if let Err(e) = s.load_active(payload.project_id) {
            proxy.send_event(UserEvent::ShowError(e.to_string()));
            return;
        }
        if let Some(active) = &s.active {
            let name = active.project.name.clone();
            s.set_status(format!("Switched to project '{name}'."));
        }
    });
}

/// Persists an edited prompt guide for the active project.
pub fn update_prompt_guide<P: EventProxy>(
    payload: serde_json::Value,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) {
    let Some(payload) = parse::<PromptGuidePayload, _>(payload, &proxy) else {
        return;
    };
    with_state_and_notify(&state, &proxy, |s| {
        let Some(active) = &s.active else {
            proxy.send_event(UserEvent::Notice("No active project.".into()));
            return;
        };
        let id = active.project.id;
        if let Err(e) = s.store.update_prompt_guide(id, &payload.prompt_guide) {
            proxy.send_event(UserEvent::ShowError(e.to_string()));
            return;
        }
        if let Err(e) = s.refresh_active() {
            proxy.send_event(UserEvent::ShowError(e.to_string()));
        }
    });
}

/// Adds a file or directory selection to the active project.
///
/// The path must exist and lie under the project root; anything else is a
/// notice, not an error.
pub fn add_selection<P: EventProxy>(
    payload: serde_json::Value,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) {
    let Some(payload) = parse::<AddSelectionPayload, _>(payload, &proxy) else {
        return;
    };
    with_state_and_notify(&state, &proxy, |s| {
        let Some(active) = &s.active else {
            proxy.send_event(UserEvent::Notice("No active project.".into()));
            return;
        };
        let root = active.project.root_path.clone();
        let project_id = active.project.id;
        let path = &payload.path;

        if !path.exists() {
            proxy.send_event(UserEvent::Notice(format!(
                "Path does not exist: {}",
                path.display()
            )));
            return;
        }
        if !path.starts_with(&root) {
            proxy.send_event(UserEvent::Notice(
                "Selection must be inside the project root.".into(),
            ));
            return;
        }

        let kind = if path.is_dir() {
            SelectionKind::Directory
        } else {
            SelectionKind::File
        };
        if let Err(e) = s
            .store
            .upsert_selection(project_id, path, kind, &payload.filters)
        {
            proxy.send_event(UserEvent::ShowError(e.to_string()));
            return;
        }
        if let Err(e) = s.refresh_active() {
            proxy.send_event(UserEvent::ShowError(e.to_string()));
            return;
        }
        s.set_status("Selection added.");
    });
}

/// Replaces the filter set of an existing directory selection.
pub fn update_selection_filters<P: EventProxy>(
    payload: serde_json::Value,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) {
    let Some(payload) = parse::<UpdateFiltersPayload, _>(payload, &proxy) else {
        return;
    };
    with_state_and_notify(&state, &proxy, |s| {
        let Some(active) = &s.active else {
            proxy.send_event(UserEvent::Notice("No active project.".into()));
            return;
        };
        let project_id = active.project.id;
        match s.store.selection_by_path(project_id, &payload.path) {
            Ok(Some(selection)) => {
                if let Err(e) = s.store.upsert_selection(
                    project_id,
                    &payload.path,
                    selection.kind,
                    &payload.filters,
                ) {
                    proxy.send_event(UserEvent::ShowError(e.to_string()));
                    return;
                }
            }
            Ok(None) => {
                proxy.send_event(UserEvent::Notice("Selection no longer exists.".into()));
                return;
            }
            Err(e) => {
                proxy.send_event(UserEvent::ShowError(e.to_string()));
                return;
            }
        }
        if let Err(e) = s.refresh_active() {
            proxy.send_event(UserEvent::ShowError(e.to_string()));
        }
    });
}

/// Removes a selection from the active project.
pub fn remove_selection<P: EventProxy>(
    payload: serde_json::Value,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) {
    let Some(payload) = parse::<PathPayload, _>(payload, &proxy) else {
        return;
    };
    with_state_and_notify(&state, &proxy, |s| {
        let Some(active) = &s.active else {
            return;
        };
        let project_id = active.project.id;
        if let Err(e) = s.store.remove_selection(project_id, &payload.path) {
            proxy.send_event(UserEvent::ShowError(e.to_string()));
            return;
        }
        if let Err(e) = s.refresh_active() {
            proxy.send_event(UserEvent::ShowError(e.to_string()));
            return;
        }
        s.set_status("Selection removed.");
    });
}

/// Adds a category to the active project.
pub fn add_category<P: EventProxy>(
    payload: serde_json::Value,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) {
    let Some(payload) = parse::<AddCategoryPayload, _>(payload, &proxy) else {
        return;
    };
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        proxy.send_event(UserEvent::Notice("Category name cannot be empty.".into()));
        return;
    }
    with_state_and_notify(&state, &proxy, |s| {
        let Some(active) = &s.active else {
            proxy.send_event(UserEvent::Notice("No active project.".into()));
            return;
        };
        let project_id = active.project.id;
        match s.store.add_category(project_id, &name) {
            Ok(_) => {
                if let Err(e) = s.refresh_active() {
                    proxy.send_event(UserEvent::ShowError(e.to_string()));
                }
            }
            Err(e @ StoreError::CategoryNameTaken(_)) => {
                proxy.send_event(UserEvent::Notice(e.to_string()));
            }
            Err(e) => proxy.send_event(UserEvent::ShowError(e.to_string())),
        }
    });
}

/// Removes a category; its selections stay, uncategorized.
pub fn remove_category<P: EventProxy>(
    payload: serde_json::Value,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) {
    let Some(payload) = parse::<CategoryIdPayload, _>(payload, &proxy) else {
        return;
    };
    with_state_and_notify(&state, &proxy, |s| {
        if let Err(e) = s.store.remove_category(payload.category_id) {
            proxy.send_event(UserEvent::ShowError(e.to_string()));
            return;
        }
        if let Err(e) = s.refresh_active() {
            proxy.send_event(UserEvent::ShowError(e.to_string()));
        }
    });
}

/// Replaces a selection's category assignments.
pub fn set_selection_categories<P: EventProxy>(
    payload: serde_json::Value,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) {
    let Some(payload) = parse::<SelectionCategoriesPayload, _>(payload, &proxy) else {
        return;
    };
    with_state_and_notify(&state, &proxy, |s| {
        if let Err(e) = s
            .store
            .set_selection_categories(payload.selection_id, &payload.category_ids)
        {
            proxy.send_event(UserEvent::ShowError(e.to_string()));
            return;
        }
        if let Err(e) = s.refresh_active() {
            proxy.send_event(UserEvent::ShowError(e.to_string()));
        }
    });
}

/// Sets (or clears) the category filter applied to the next export.
pub fn set_export_category<P: EventProxy>(
    payload: serde_json::Value,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) {
    let Some(payload) = parse::<ExportCategoryPayload, _>(payload, &proxy) else {
        return;
    };
    with_state_and_notify(&state, &proxy, |s| {
        s.export_category = payload.category_id;
    });
}

/// Loads a file's content for the preview pane.
pub fn load_file_preview<P: EventProxy>(
    payload: serde_json::Value,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) {
    let Some(payload) = parse::<PathPayload, _>(payload, &proxy) else {
        return;
    };
    let max_bytes = {
        let state_guard = state
            .lock()
            .expect("Mutex was poisoned. This should not happen.");
        state_guard.config.max_preview_bytes()
    };
    match preview::load_preview(&payload.path, max_bytes) {
        Ok(preview) => proxy.send_event(UserEvent::ShowFilePreview {
            path: payload.path,
            content: preview.content,
        }),
        Err(e) => proxy.send_event(UserEvent::ShowError(e.to_string())),
    }
}

/// Lists a directory's children for the lazy file browser.
pub fn list_directory<P: EventProxy>(payload: serde_json::Value, proxy: P) {
    let Some(payload) = parse::<PathPayload, _>(payload, &proxy) else {
        return;
    };
    match view_model::list_directory(&payload.path) {
        Ok(entries) => proxy.send_event(UserEvent::DirectoryListing {
            path: payload.path,
            entries,
        }),
        Err(e) => proxy.send_event(UserEvent::ShowError(format!(
            "Failed to list {}: {e}",
            payload.path.display()
        ))),
    }
}

/// Runs the full export pipeline for the active project.
///
/// Resolves selections (restricted to the export category, if set),
/// assembles the context artifact, writes it to the project root, and
/// copies the prompt guide to the clipboard.
pub fn drop_context<P: EventProxy>(
    proxy: P,
    state: Arc<Mutex<AppState>>,
    clipboard: &dyn ClipboardService,
) {
    with_state_and_notify(&state, &proxy, |s| {
        let Some(active) = &s.active else {
            proxy.send_event(UserEvent::Notice("No active project.".into()));
            return;
        };
        let project_id = active.project.id;
        let root = active.project.root_path.clone();
        let prompt_guide = active.project.prompt_guide.clone();

        if !root.is_dir() {
            proxy.send_event(UserEvent::Notice(format!(
                "Project root does not exist: {}",
                root.display()
            )));
            return;
        }

        let selections = match s.store.selections(project_id, s.export_category) {
            Ok(selections) => selections,
            Err(e) => {
                proxy.send_event(UserEvent::ShowError(e.to_string()));
                return;
            }
        };

        tracing::info!(
            project = %active.project.name,
            selections = selections.len(),
            category = ?s.export_category,
            "starting context export"
        );

        let walker = TreeWalker::new(&s.config.prune_directories, &s.config.context_filename);
        let outcome = walker.resolve(&root, &selections);
        let assembled = assemble(&root, &outcome);
        let report = export(
            &root,
            &s.config.context_filename,
            &prompt_guide,
            &assembled,
            clipboard,
        );

        if report.succeeded() {
            s.set_status(format!(
                "Dropped {} file(s) to {}.",
                report.files_exported,
                report.output_path.display()
            ));
        } else {
            s.set_status("Export finished with problems.");
        }
        proxy.send_event(UserEvent::ExportComplete(report));
    });
}

/// Collapses the main window into the hover icon.
pub fn collapse_to_hover<P: EventProxy>(proxy: P, state: Arc<Mutex<AppState>>) {
    apply_hover_trigger(HoverTrigger::Minimize, proxy, state);
}

/// Restores the main window from the hover icon.
pub fn expand_from_hover<P: EventProxy>(proxy: P, state: Arc<Mutex<AppState>>) {
    apply_hover_trigger(HoverTrigger::Expand, proxy, state);
}

fn apply_hover_trigger<P: EventProxy>(
    trigger: HoverTrigger,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) {
    with_state_and_notify(&state, &proxy, |s| {
        match s.hover.trigger(trigger) {
            Some(HoverEffect::EnterHover) => {
                s.persist_ui_mode();
                proxy.send_event(UserEvent::UiModeChanged(UiMode::Hover));
            }
            Some(HoverEffect::EnterFull) => {
                s.persist_ui_mode();
                proxy.send_event(UserEvent::UiModeChanged(UiMode::Full));
            }
            Some(HoverEffect::TriggerExport) | None => {}
        };
    });
}
