use std::collections::HashMap;
use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ConfigFile {
    pub version: u32,
    pub profile: Option<String>,
    pub profiles: HashMap<String, Profile>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize)]
pub struct Profile {
    pub vault_root: String,
    /// Optional override for the settings file
    /// (defaults to `{{vault_root}}/.scorevault/settings.json`).
    pub settings_file: Option<String>,
    /// Optional renderers installed next to the vault, e.g. `osmd-musicxml`.
    #[serde(default)]
    pub capabilities: Vec<String>,
    /// Folders to skip when scanning for MuseScore files (relative to vault_root).
    #[serde(default)]
    pub excluded_folders: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub file_level: Option<String>,
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level(), file_level: None, file: None }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub active_profile: String,
    pub vault_root: PathBuf,
    pub settings_file: PathBuf,
    pub capabilities: Vec<String>,
    /// Folders excluded from scans, relative to the vault root.
    pub excluded_folders: Vec<PathBuf>,
    pub logging: LoggingConfig,
}
