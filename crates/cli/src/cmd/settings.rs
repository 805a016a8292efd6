use std::path::Path;

use scorevault_core::settings::{JsonSettingsStore, SettingKey, load_settings, update_setting};
use tabled::{Table, Tabled, settings::Style};

use super::load_config;

#[derive(Tabled)]
struct SettingRow {
    #[tabled(rename = "Key")]
    key: &'static str,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Description")]
    description: &'static str,
}

pub fn show(config: Option<&Path>, profile: Option<&str>) {
    let rc = load_config(config, profile);
    let store = JsonSettingsStore::new(&rc.settings_file);

    let settings = match load_settings(&store) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error loading settings: {e}");
            std::process::exit(1);
        }
    };

    let rows: Vec<SettingRow> = SettingKey::ALL
        .iter()
        .map(|&key| SettingRow {
            key: key.as_str(),
            value: settings.get(key),
            description: key.description(),
        })
        .collect();

    println!("{}", Table::new(&rows).with(Style::rounded()));
    println!("\nstored in: {}", store.path().display());
}

pub fn set(config: Option<&Path>, profile: Option<&str>, key: &str, value: &str) {
    let key: SettingKey = match key.parse() {
        Ok(key) => key,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(2);
        }
    };

    let rc = load_config(config, profile);
    let store = JsonSettingsStore::new(&rc.settings_file);

    let result = load_settings(&store).and_then(|mut settings| {
        update_setting(&store, &mut settings, key, value).map(|()| settings)
    });

    match result {
        Ok(settings) => println!("{key} = {}", settings.get(key)),
        Err(e) => {
            eprintln!("Error updating settings: {e}");
            std::process::exit(1);
        }
    }
}
