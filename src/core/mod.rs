pub mod assembler;
pub mod error;
pub mod exporter;
pub mod preview;
pub mod walker;

use std::path::PathBuf;

/// A single concrete file produced by resolving the selection model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFile {
    /// Absolute path of the file on disk.
    pub path: PathBuf,
    /// The selection that pulled this file into the export.
    pub selection_id: i64,
}

/// The result of resolving a project's selections against the file system.
///
/// Warnings are non-fatal: a missing selection path is recorded here and
/// surfaced in the export artifact, it never aborts the pipeline.
#[derive(Debug, Clone, Default)]
pub struct WalkOutcome {
    pub files: Vec<ResolvedFile>,
    pub warnings: Vec<String>,
}

pub use assembler::{assemble, AssembledContext};
pub use exporter::{export, ClipboardService, ExportReport, SystemClipboard};
pub use walker::TreeWalker;
