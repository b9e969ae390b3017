pub mod settings;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::core::walker::DEFAULT_PRUNE_NAMES;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    pub window_size: (f64, f64),
    pub window_position: (f64, f64),
    /// Last position of the hover window, if the user has moved it.
    pub hover_position: Option<(f64, f64)>,
    /// Overrides the platform data dir location of the SQLite database.
    pub database_path: Option<PathBuf>,
    pub context_filename: String,
    /// Directory names skipped when walking directory selections.
    pub prune_directories: Vec<String>,
    pub max_preview_size_mb: u64,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        settings::load_config(None)
    }

    pub fn max_preview_bytes(&self) -> u64 {
        self.max_preview_size_mb * 1024 * 1024
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            window_size: (1200.0, 800.0),
            window_position: (100.0, 100.0),
            hover_position: None,
            database_path: None,
            context_filename: "context.txt".to_string(),
            prune_directories: DEFAULT_PRUNE_NAMES.iter().map(|s| s.to_string()).collect(),
            max_preview_size_mb: 1,
        }
    }
}
