use scorevault_core::config::loader::{ConfigLoader, default_config_path};
use scorevault_core::settings::{JsonSettingsStore, SettingsStore};
use std::path::Path;

use crate::logging;

pub fn run(config: Option<&Path>, profile: Option<&str>) {
    let rc = match ConfigLoader::load(config, profile) {
        Ok(rc) => rc,
        Err(e) => {
            println!("FAIL scorevault doctor");
            println!("{e}");
            if config.is_none() {
                println!("looked for: {}", default_config_path().display());
            }
            std::process::exit(1);
        }
    };
    logging::init(&rc);

    let store = JsonSettingsStore::new(&rc.settings_file);
    let settings = match store.load() {
        Ok(loaded) => loaded.unwrap_or_default().with_platform_defaults(),
        Err(e) => {
            println!("FAIL scorevault doctor");
            println!("{e}");
            std::process::exit(1);
        }
    };

    println!("OK   scorevault doctor");
    println!(
        "path: {}",
        config.map_or_else(
            || default_config_path().display().to_string(),
            |p| p.display().to_string()
        )
    );
    println!("profile: {}", rc.active_profile);
    println!("vault_root: {}", rc.vault_root.display());
    if !rc.vault_root.is_dir() {
        println!("  warning: vault_root does not exist");
    }
    println!("settings_file: {}", rc.settings_file.display());
    println!("export folder: {}", settings.folder_path);
    match settings.executable() {
        Some(exe) if exe.exists() => println!("executable: {}", exe.display()),
        Some(exe) => println!("executable: {} (not found)", exe.display()),
        None => println!("executable: (not set, exporting disabled)"),
    }
    println!("embed as: {}", settings.embed_as);
    println!("embed with subpath as: {}", settings.embed_subpath_as);
    if !rc.capabilities.is_empty() {
        println!("capabilities: {}", rc.capabilities.join(", "));
    }
    for folder in &rc.excluded_folders {
        println!("excluded: {}", folder.display());
    }
}
