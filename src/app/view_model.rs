//! Transforms the `AppState` into the serializable view model the
//! frontend renders.

use serde::Serialize;
use std::path::Path;

use super::state::AppState;
use crate::core::walker::display_rel;

/// A serializable representation of the application state for the UI.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UiState {
    pub projects: Vec<ProjectView>,
    pub active_project: Option<ActiveProjectView>,
    pub ui_mode: String,
    pub status_message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectView {
    pub id: i64,
    pub name: String,
    pub root_path: String,
    pub is_active: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveProjectView {
    pub id: i64,
    pub name: String,
    pub root_path: String,
    /// True when the project root no longer exists on disk. Export is
    /// disabled in the UI, nothing else breaks.
    pub root_missing: bool,
    pub prompt_guide: String,
    pub categories: Vec<CategoryView>,
    pub selections: Vec<SelectionView>,
    pub export_category: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryView {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionView {
    pub id: i64,
    pub path: String,
    /// Path relative to the project root, for display.
    pub display_path: String,
    pub is_directory: bool,
    /// True when the selected path no longer exists.
    pub missing: bool,
    pub extension_filters: Vec<String>,
    pub categories: Vec<i64>,
}

/// One entry of a lazily browsed directory listing.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirEntryView {
    pub name: String,
    pub path: String,
    pub is_directory: bool,
}

/// Builds the full UI state from the current `AppState`.
pub fn generate_ui_state(state: &AppState) -> UiState {
    let active_id = state.active.as_ref().map(|a| a.project.id);

    let projects = match state.store.projects() {
        Ok(projects) => projects
            .into_iter()
            .map(|p| ProjectView {
                is_active: Some(p.id) == active_id,
                id: p.id,
                name: p.name,
                root_path: p.root_path.to_string_lossy().into_owned(),
            })
            .collect(),
        Err(e) => {
            tracing::warn!("Failed to list projects for UI state: {}", e);
            Vec::new()
        }
    };

    let active_project = state.active.as_ref().map(|active| {
        let root = active.project.root_path.as_path();
        ActiveProjectView {
            id: active.project.id,
            name: active.project.name.clone(),
            root_path: root.to_string_lossy().into_owned(),
            root_missing: !root.is_dir(),
            prompt_guide: active.project.prompt_guide.clone(),
            categories: active
                .categories
                .iter()
                .map(|c| CategoryView {
                    id: c.id,
                    name: c.name.clone(),
                })
                .collect(),
            selections: active
                .selections
                .iter()
                .map(|s| SelectionView {
                    id: s.id,
                    path: s.path.to_string_lossy().into_owned(),
                    display_path: display_rel(root, &s.path),
                    is_directory: matches!(s.kind, crate::store::SelectionKind::Directory),
                    missing: !s.path.exists(),
                    extension_filters: s.extension_filters.clone(),
                    categories: s.categories.clone(),
                })
                .collect(),
            export_category: state.export_category,
        }
    });

    UiState {
        projects,
        active_project,
        ui_mode: state.hover.mode().as_str().to_string(),
        status_message: state.status_message.clone(),
    }
}

/// Lists the immediate children of a directory for the file browser,
/// directories first, alphabetically, hidden entries skipped.
pub fn list_directory(path: &Path) -> std::io::Result<Vec<DirEntryView>> {
    let mut entries: Vec<DirEntryView> = std::fs::read_dir(path)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| !entry.file_name().to_string_lossy().starts_with('.'))
        .map(|entry| {
            let is_directory = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            DirEntryView {
                name: entry.file_name().to_string_lossy().into_owned(),
                path: entry.path().to_string_lossy().into_owned(),
                is_directory,
            }
        })
        .collect();
    entries.sort_by(|a, b| {
        b.is_directory
            .cmp(&a.is_directory)
            .then_with(|| a.name.cmp(&b.name))
    });
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::store::{ProjectStore, SelectionKind};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn ui_state_reflects_active_project() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().to_path_buf();
        fs::write(root.join("main.py"), "x").unwrap();

        let store = ProjectStore::in_memory().unwrap();
        let id = store.add_project("demo", &root, "guide").unwrap();
        store
            .upsert_selection(id, &root.join("main.py"), SelectionKind::File, &[])
            .unwrap();
        let mut state = crate::app::state::AppState::new(AppConfig::default(), store).unwrap();
        state.load_active(id).unwrap();

        let ui = generate_ui_state(&state);
        assert_eq!(ui.projects.len(), 1);
        assert!(ui.projects[0].is_active);
        let active = ui.active_project.unwrap();
        assert!(!active.root_missing);
        assert_eq!(active.selections.len(), 1);
        assert_eq!(active.selections[0].display_path, "main.py");
        assert!(!active.selections[0].missing);
    }

    #[test]
    fn missing_root_and_selection_are_flagged_not_fatal() {
        let store = ProjectStore::in_memory().unwrap();
        let id = store
            .add_project("demo", Path::new("/nonexistent/root"), "")
            .unwrap();
        store
            .upsert_selection(
                id,
                Path::new("/nonexistent/root/a.py"),
                SelectionKind::File,
                &[],
            )
            .unwrap();
        let mut state = crate::app::state::AppState::new(AppConfig::default(), store).unwrap();
        state.load_active(id).unwrap();

        let ui = generate_ui_state(&state);
        let active = ui.active_project.unwrap();
        assert!(active.root_missing);
        assert!(active.selections[0].missing);
    }

    #[test]
    fn list_directory_sorts_dirs_first_and_skips_hidden() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("sub")).unwrap();
        fs::write(tmp.path().join("a.txt"), "x").unwrap();
        fs::write(tmp.path().join(".hidden"), "x").unwrap();

        let entries = list_directory(tmp.path()).unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["sub", "a.txt"]);
        assert!(entries[0].is_directory);
    }
}
