//! An abstraction layer for native file dialogs to enable testing.

use std::path::PathBuf;

/// Common interface for the pickers the app needs. A mock implementation
/// stands in during tests so no OS dialog ever opens.
pub trait DialogService: Send + Sync {
    /// Picks the root directory of a new project.
    fn pick_project_root(&self) -> Option<PathBuf>;

    /// Picks one or more files to add as selections.
    fn pick_selection_files(&self) -> Option<Vec<PathBuf>>;

    /// Picks a directory to add as a selection.
    fn pick_selection_directory(&self) -> Option<PathBuf>;
}

/// The production implementation, backed by `rfd` native dialogs.
pub struct NativeDialogService;

impl DialogService for NativeDialogService {
    fn pick_project_root(&self) -> Option<PathBuf> {
        rfd::FileDialog::new().pick_folder()
    }

    fn pick_selection_files(&self) -> Option<Vec<PathBuf>> {
        rfd::FileDialog::new().pick_files()
    }

    fn pick_selection_directory(&self) -> Option<PathBuf> {
        rfd::FileDialog::new().pick_folder()
    }
}
