//! Writes the context artifact to disk and the prompt to the clipboard.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{error, info};

use crate::core::assembler::AssembledContext;

/// Abstraction over the system clipboard so the export pipeline can be
/// exercised in headless tests.
pub trait ClipboardService: Send + Sync {
    fn set_text(&self, text: &str) -> anyhow::Result<()>;
}

/// The real clipboard, via `arboard`. A fresh handle per call; the app
/// exports rarely enough that holding one open buys nothing.
pub struct SystemClipboard;

impl ClipboardService for SystemClipboard {
    fn set_text(&self, text: &str) -> anyhow::Result<()> {
        let mut clipboard = arboard::Clipboard::new()?;
        clipboard.set_text(text.to_string())?;
        Ok(())
    }
}

/// Outcome of one export, sent to the frontend as-is.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportReport {
    pub output_path: PathBuf,
    pub files_exported: usize,
    pub file_written: bool,
    pub clipboard_copied: bool,
    pub warnings: Vec<String>,
    pub file_error: Option<String>,
    pub clipboard_error: Option<String>,
}

impl ExportReport {
    pub fn succeeded(&self) -> bool {
        self.file_written && self.clipboard_copied
    }
}

/// Writes `assembled` to `<root>/<context_filename>` (overwriting) and
/// copies `prompt_guide` to the clipboard.
///
/// The two halves are independent: a failed write never blocks the
/// clipboard copy and vice versa. Failures land in the report, they are
/// not returned as errors.
pub fn export(
    root: &Path,
    context_filename: &str,
    prompt_guide: &str,
    assembled: &AssembledContext,
    clipboard: &dyn ClipboardService,
) -> ExportReport {
    let output_path = root.join(context_filename);

    let file_error = match fs::write(&output_path, &assembled.text) {
        Ok(()) => {
            info!(
                path = %output_path.display(),
                files = assembled.file_count,
                "context file written"
            );
            None
        }
        Err(e) => {
            error!(path = %output_path.display(), error = %e, "failed to write context file");
            Some(e.to_string())
        }
    };

    let clipboard_error = match clipboard.set_text(prompt_guide) {
        Ok(()) => None,
        Err(e) => {
            error!(error = %e, "failed to copy prompt guide to clipboard");
            Some(e.to_string())
        }
    };

    ExportReport {
        output_path,
        files_exported: assembled.file_count,
        file_written: file_error.is_none(),
        clipboard_copied: clipboard_error.is_none(),
        warnings: assembled.warnings.clone(),
        file_error,
        clipboard_error,
    }
}
