use std::path::Path;

use super::{load_config, open, print_orphans, print_results, runtime};

pub fn run(config: Option<&Path>, profile: Option<&str>) {
    let rc = load_config(config, profile);
    let service = open(&rc);

    if !service.orchestrator().is_enabled() {
        println!("No MuseScore executable configured; exports are skipped. Set one with:");
        println!("  scorevault settings set executable-path <path>");
    }

    let report = match runtime().block_on(service.sync(&rc.excluded_folders)) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error scanning vault: {e}");
            std::process::exit(1);
        }
    };

    let mut failures = 0;
    for (source, results) in &report.sources {
        failures += print_results(&source.path, results);
    }
    failures += print_orphans(&report.orphans);

    println!("-- {} MuseScore files --", report.sources.len());
    if failures > 0 {
        eprintln!("{failures} export operations failed");
        std::process::exit(1);
    }
}
