use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::types::{SettingKey, Settings, SettingsError};

/// Where settings are loaded from and saved to.
pub trait SettingsStore {
    /// Load the persisted record, `None` if nothing was saved yet.
    fn load(&self) -> Result<Option<Settings>, SettingsError>;

    fn save(&self, settings: &Settings) -> Result<(), SettingsError>;
}

/// Settings stored as a pretty-printed JSON file.
#[derive(Debug, Clone)]
pub struct JsonSettingsStore {
    path: PathBuf,
}

impl JsonSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for JsonSettingsStore {
    fn load(&self) -> Result<Option<Settings>, SettingsError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let s = fs::read_to_string(&self.path)
            .map_err(|e| SettingsError::ReadError(self.path.display().to_string(), e))?;

        if s.trim().is_empty() {
            return Ok(None);
        }

        let settings = serde_json::from_str(&s)
            .map_err(|e| SettingsError::ParseError(self.path.display().to_string(), e))?;
        Ok(Some(settings))
    }

    fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .map_err(|e| SettingsError::WriteError(parent.display().to_string(), e))?;
        }

        let json = serde_json::to_string_pretty(settings)?;
        fs::write(&self.path, json + "\n")
            .map_err(|e| SettingsError::WriteError(self.path.display().to_string(), e))?;

        debug!(path = %self.path.display(), "saved settings");
        Ok(())
    }
}

/// Startup sequence: load, merge over defaults, and save the full record back.
pub fn load_settings(store: &dyn SettingsStore) -> Result<Settings, SettingsError> {
    let settings = store.load()?.unwrap_or_default().with_platform_defaults();
    store.save(&settings)?;
    Ok(settings)
}

/// Change one setting and persist the result.
pub fn update_setting(
    store: &dyn SettingsStore,
    settings: &mut Settings,
    key: SettingKey,
    value: &str,
) -> Result<(), SettingsError> {
    settings.set(key, value)?;
    store.save(settings)
}
