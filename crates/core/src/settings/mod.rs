//! Persisted user settings.
//!
//! Settings are a flat record loaded once at startup, merged over defaults,
//! and written back after every change through an injected [`SettingsStore`].

mod store;
mod types;

pub use store::{JsonSettingsStore, SettingsStore, load_settings, update_setting};
pub use types::{
    DEFAULT_FOLDER_PATH, MACOS_EXECUTABLE_PATH, SettingKey, Settings, SettingsError,
};
