//! Event and message structures for backend/frontend communication.

use serde::Deserialize;
use std::path::PathBuf;

use super::hover::UiMode;
use super::view_model::UiState;
use crate::core::ExportReport;

/// Events sent from the Rust backend to the webview.
///
/// Each variant maps to a `window.*` function the frontend defines.
#[derive(Debug)]
pub enum UserEvent {
    /// A complete state update to re-render the UI.
    StateUpdate(Box<UiState>),
    /// Content for the file preview panel.
    ShowFilePreview { path: PathBuf, content: String },
    /// The result of a context export.
    ExportComplete(ExportReport),
    /// A directory listing for the lazy file browser.
    DirectoryListing {
        path: PathBuf,
        entries: Vec<super::view_model::DirEntryView>,
    },
    /// A transient, non-fatal notice.
    Notice(String),
    /// An error message to be displayed to the user.
    ShowError(String),
    /// The UI switched between the full window and the hover icon.
    UiModeChanged(UiMode),
}

/// A message received from the webview via the IPC channel.
#[derive(Deserialize, Debug)]
pub struct IpcMessage {
    /// The name of the command to execute.
    pub command: String,
    /// The payload associated with the command, as a JSON value.
    pub payload: serde_json::Value,
}
