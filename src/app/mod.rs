//! The application layer: IPC dispatch, state, and event plumbing.

pub mod commands;
pub mod events;
pub mod file_dialog;
pub mod helpers;
pub mod hover;
pub mod proxy;
pub mod state;
pub mod view_model;

use std::sync::{Arc, Mutex};

use serde::Serialize;
use wry::WebView;

use events::{IpcMessage, UserEvent};
use file_dialog::DialogService;
use proxy::EventProxy;
use state::AppState;

use crate::core::ClipboardService;

/// Parses a raw IPC string from the webview and dispatches it to the
/// matching command handler. Unknown commands are logged and dropped.
pub fn handle_ipc_message<P: EventProxy>(
    message: String,
    dialog: Arc<dyn DialogService>,
    clipboard: Arc<dyn ClipboardService>,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) {
    let message: IpcMessage = match serde_json::from_str(&message) {
        Ok(message) => message,
        Err(e) => {
            tracing::warn!("Failed to parse IPC message: {}", e);
            return;
        }
    };
    tracing::debug!(command = %message.command, "IPC message received");

    match message.command.as_str() {
        "initialize" => commands::initialize(proxy, state),
        "createProject" => commands::create_project(message.payload, &*dialog, proxy, state),
        "deleteProject" => commands::delete_project(message.payload, proxy, state),
        "switchProject" => commands::switch_project(message.payload, proxy, state),
        "updatePromptGuide" => commands::update_prompt_guide(message.payload, proxy, state),
        "addSelection" => commands::add_selection(message.payload, proxy, state),
        "updateSelectionFilters" => {
            commands::update_selection_filters(message.payload, proxy, state)
        }
        "removeSelection" => commands::remove_selection(message.payload, proxy, state),
        "addCategory" => commands::add_category(message.payload, proxy, state),
        "removeCategory" => commands::remove_category(message.payload, proxy, state),
        "setSelectionCategories" => {
            commands::set_selection_categories(message.payload, proxy, state)
        }
        "setExportCategory" => commands::set_export_category(message.payload, proxy, state),
        "loadFilePreview" => commands::load_file_preview(message.payload, proxy, state),
        "listDirectory" => commands::list_directory(message.payload, proxy),
        "dropContext" => commands::drop_context(proxy, state, &*clipboard),
        "collapseToHover" => commands::collapse_to_hover(proxy, state),
        "expandFromHover" => commands::expand_from_hover(proxy, state),
        other => tracing::warn!("Unknown IPC command: {}", other),
    }
}

fn call_js<T: Serialize>(webview: &WebView, function: &str, payload: &T) {
    match serde_json::to_string(payload) {
        Ok(json) => {
            if let Err(e) = webview.evaluate_script(&format!("window.{function}({json})")) {
                tracing::warn!("Failed to evaluate script for {}: {}", function, e);
            }
        }
        Err(e) => tracing::warn!("Failed to serialize payload for {}: {}", function, e),
    }
}

/// Applies a backend event to the main webview by calling the matching
/// `window.*` function. Window show/hide on mode changes is the event
/// loop's job; here only the frontend is informed.
pub fn handle_user_event(event: UserEvent, webview: &WebView) {
    match event {
        UserEvent::StateUpdate(ui_state) => call_js(webview, "updateUiState", &ui_state),
        UserEvent::ShowFilePreview { path, content } => call_js(
            webview,
            "showFilePreview",
            &serde_json::json!({ "path": path, "content": content }),
        ),
        UserEvent::ExportComplete(report) => call_js(webview, "exportComplete", &report),
        UserEvent::DirectoryListing { path, entries } => call_js(
            webview,
            "showDirectoryListing",
            &serde_json::json!({ "path": path, "entries": entries }),
        ),
        UserEvent::Notice(text) => call_js(webview, "showNotice", &text),
        UserEvent::ShowError(text) => call_js(webview, "showError", &text),
        UserEvent::UiModeChanged(mode) => call_js(webview, "setUiMode", &mode.as_str()),
    }
}
