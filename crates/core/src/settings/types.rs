use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::formats::{ExportFormat, UnknownFormat};

pub const DEFAULT_FOLDER_PATH: &str = "MuseScore exports";
pub const MACOS_EXECUTABLE_PATH: &str = "/Applications/MuseScore 4.app/Contents/MacOS/mscore";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file {0}: {1}")]
    ReadError(String, #[source] std::io::Error),

    #[error("failed to write settings file {0}: {1}")]
    WriteError(String, #[source] std::io::Error),

    #[error("failed to parse settings in {0}: {1}")]
    ParseError(String, #[source] serde_json::Error),

    #[error("failed to serialize settings: {0}")]
    SerializeError(#[from] serde_json::Error),

    #[error("unknown setting '{0}' (expected folder-path, executable-path, embed-as or embed-subpath-as)")]
    UnknownKey(String),

    #[error(transparent)]
    InvalidFormat(#[from] UnknownFormat),
}

/// User-facing settings, persisted as a flat camelCase JSON object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Export root, relative to the vault root.
    pub folder_path: String,
    /// MuseScore executable. Empty disables exporting.
    pub executable_path: String,
    /// Format used to embed links without a subpath.
    pub embed_as: ExportFormat,
    /// Format used to embed links with a subpath.
    pub embed_subpath_as: ExportFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            folder_path: DEFAULT_FOLDER_PATH.to_string(),
            executable_path: String::new(),
            embed_as: ExportFormat::Pdf,
            embed_subpath_as: ExportFormat::Mxl,
        }
    }
}

impl Settings {
    /// Fill in the MuseScore location on platforms where it is well known.
    pub fn with_platform_defaults(mut self) -> Self {
        if cfg!(target_os = "macos") && self.executable_path.is_empty() {
            self.executable_path = MACOS_EXECUTABLE_PATH.to_string();
        }
        self
    }

    /// The configured converter, if any.
    pub fn executable(&self) -> Option<PathBuf> {
        let trimmed = self.executable_path.trim();
        (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
    }

    /// Preferred embed format for a link with or without a subpath.
    pub fn embed_format(&self, has_subpath: bool) -> ExportFormat {
        if has_subpath { self.embed_subpath_as } else { self.embed_as }
    }

    pub fn get(&self, key: SettingKey) -> String {
        match key {
            SettingKey::FolderPath => self.folder_path.clone(),
            SettingKey::ExecutablePath => self.executable_path.clone(),
            SettingKey::EmbedAs => self.embed_as.to_string(),
            SettingKey::EmbedSubpathAs => self.embed_subpath_as.to_string(),
        }
    }

    pub fn set(&mut self, key: SettingKey, value: &str) -> Result<(), SettingsError> {
        match key {
            SettingKey::FolderPath => self.folder_path = value.to_string(),
            SettingKey::ExecutablePath => self.executable_path = value.to_string(),
            SettingKey::EmbedAs => self.embed_as = value.parse()?,
            SettingKey::EmbedSubpathAs => self.embed_subpath_as = value.parse()?,
        }
        Ok(())
    }
}

/// Names of the individual settings, as accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKey {
    FolderPath,
    ExecutablePath,
    EmbedAs,
    EmbedSubpathAs,
}

impl SettingKey {
    pub const ALL: [SettingKey; 4] = [
        SettingKey::ExecutablePath,
        SettingKey::FolderPath,
        SettingKey::EmbedAs,
        SettingKey::EmbedSubpathAs,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SettingKey::FolderPath => "folder-path",
            SettingKey::ExecutablePath => "executable-path",
            SettingKey::EmbedAs => "embed-as",
            SettingKey::EmbedSubpathAs => "embed-subpath-as",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            SettingKey::FolderPath => "Folder (relative to the vault root) receiving exports",
            SettingKey::ExecutablePath => "Path to the MuseScore executable",
            SettingKey::EmbedAs => "Embed .mscz/.mscx links as",
            SettingKey::EmbedSubpathAs => "Embed .mscz/.mscx links with a subpath as",
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingKey {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "folder-path" | "folderPath" => Ok(SettingKey::FolderPath),
            "executable-path" | "executablePath" => Ok(SettingKey::ExecutablePath),
            "embed-as" | "embedAs" => Ok(SettingKey::EmbedAs),
            "embed-subpath-as" | "embedSubpathAs" => Ok(SettingKey::EmbedSubpathAs),
            _ => Err(SettingsError::UnknownKey(s.to_string())),
        }
    }
}
