pub mod doctor;
pub mod export;
pub mod resolve;
pub mod settings;
pub mod status;
pub mod sync;
pub mod watch;

use std::path::Path;

use scorevault_core::config::loader::ConfigLoader;
use scorevault_core::config::types::ResolvedConfig;
use scorevault_core::export::{ExportChanges, ExportOutcome, FormatResult, MuseScoreCli};
use scorevault_core::service::ScoreVault;
use scorevault_core::settings::JsonSettingsStore;
use scorevault_core::vault::FsVault;

use crate::logging;

pub type Service = ScoreVault<FsVault, MuseScoreCli>;

/// Load the config and start logging, or exit.
pub fn load_config(config: Option<&Path>, profile: Option<&str>) -> ResolvedConfig {
    let rc = match ConfigLoader::load(config, profile) {
        Ok(rc) => rc,
        Err(e) => {
            eprintln!("Error loading config: {e}");
            std::process::exit(1);
        }
    };
    logging::init(&rc);
    rc
}

/// Load settings and open the vault, or exit.
pub fn open(rc: &ResolvedConfig) -> Service {
    let store = JsonSettingsStore::new(&rc.settings_file);
    match ScoreVault::open(&rc.vault_root, &store) {
        Ok(service) => service,
        Err(e) => {
            eprintln!("Error opening vault: {e}");
            std::process::exit(1);
        }
    }
}

pub fn runtime() -> tokio::runtime::Runtime {
    match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error starting runtime: {e}");
            std::process::exit(1);
        }
    }
}

/// Print one line per format; returns the number of failures.
pub fn print_results(source: &str, results: &[FormatResult]) -> usize {
    let mut failures = 0;
    for (format, result) in results {
        match result {
            Ok(ExportOutcome::Exported { path }) => println!("exported  {source} -> {path}"),
            Ok(ExportOutcome::UpToDate { path }) => println!("fresh     {source} -> {path}"),
            Ok(ExportOutcome::Disabled) => {
                println!("skipped   {source} ({format}): no MuseScore executable configured")
            }
            Ok(ExportOutcome::Unavailable) => {
                println!("skipped   {source} ({format}): vault is not on a local filesystem")
            }
            Err(e) => {
                failures += 1;
                eprintln!("FAILED    {e}");
            }
        }
    }
    failures
}

/// Print the exports a sync deleted because their source is gone; returns
/// the number of failures.
pub fn print_orphans(orphans: &ExportChanges<String>) -> usize {
    for path in &orphans.changed {
        println!("removed   {path}");
    }
    for (_, e) in &orphans.failed {
        eprintln!("FAILED    {e}");
    }
    orphans.failed.len()
}
