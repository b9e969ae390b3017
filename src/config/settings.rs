use anyhow::Result;
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

use super::AppConfig;

const APP_NAME: &str = "ContextDropper";
const CONFIG_FILE: &str = "config.json";

/// Returns the platform-specific configuration directory for the application.
pub fn get_config_directory() -> Option<PathBuf> {
    ProjectDirs::from("io", "contextdropper", APP_NAME)
        .map(|proj_dirs| proj_dirs.config_dir().to_path_buf())
}

/// Returns the platform-specific data directory (holds the SQLite database).
pub fn get_data_directory() -> Option<PathBuf> {
    ProjectDirs::from("io", "contextdropper", APP_NAME)
        .map(|proj_dirs| proj_dirs.data_dir().to_path_buf())
}

/// Returns the full path to the configuration file.
pub fn get_config_file_path() -> Option<PathBuf> {
    get_config_directory().map(|dir| dir.join(CONFIG_FILE))
}

/// Loads the application configuration, creating a default file on first
/// run. A corrupted file logs a warning and falls back to the defaults
/// instead of crashing the app. `override_path` replaces the platform
/// location (used by tests).
pub fn load_config(override_path: Option<&Path>) -> Result<AppConfig> {
    let config_path = match override_path {
        Some(path) => path.to_path_buf(),
        None => get_config_file_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?,
    };

    if !config_path.exists() {
        tracing::info!(
            "Config file not found, creating default config at {:?}",
            config_path
        );
        let default_config = AppConfig::default();
        save_config(&default_config, Some(&config_path))?;
        return Ok(default_config);
    }

    let config_content = fs::read_to_string(&config_path)?;
    match serde_json::from_str::<AppConfig>(&config_content) {
        Ok(config) => {
            tracing::info!("Loaded config from {:?}", config_path);
            Ok(config)
        }
        Err(e) => {
            tracing::warn!(
                "Failed to parse config file at {:?}: {}. Falling back to default config.",
                config_path,
                e
            );
            Ok(AppConfig::default())
        }
    }
}

/// Saves the provided configuration. `override_path` replaces the platform
/// location (used by tests).
pub fn save_config(config: &AppConfig, override_path: Option<&Path>) -> Result<()> {
    let config_path = match override_path {
        Some(path) => path.to_path_buf(),
        None => get_config_file_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?,
    };

    if let Some(dir) = config_path.parent() {
        if !dir.exists() {
            fs::create_dir_all(dir)?;
            tracing::info!("Created config directory: {:?}", dir);
        }
    }

    let config_json = serde_json::to_string_pretty(config)?;
    fs::write(&config_path, config_json)?;
    tracing::info!("Saved config to {:?}", config_path);

    Ok(())
}

/// Resolves where the SQLite database lives: the config override if set,
/// otherwise `context_dropper.db` in the platform data dir.
pub fn database_path(config: &AppConfig) -> Result<PathBuf> {
    if let Some(path) = &config.database_path {
        return Ok(path.clone());
    }
    let dir = get_data_directory()
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
    Ok(dir.join("context_dropper.db"))
}
