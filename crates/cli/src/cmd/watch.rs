use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use super::{load_config, open, print_orphans, print_results, runtime};

pub fn run(config: Option<&Path>, profile: Option<&str>, sync_first: bool) {
    let rc = load_config(config, profile);
    let service = Arc::new(open(&rc));

    if !service.orchestrator().is_enabled() {
        warn!("no MuseScore executable configured; renames and deletions are still followed");
    }

    runtime().block_on(async move {
        if sync_first {
            match service.sync(&rc.excluded_folders).await {
                Ok(report) => {
                    for (source, results) in &report.sources {
                        print_results(&source.path, results);
                    }
                    print_orphans(&report.orphans);
                }
                Err(e) => {
                    eprintln!("Error scanning vault: {e}");
                    std::process::exit(1);
                }
            }
        }

        let (watcher, events) = match service.watch() {
            Ok(subscription) => subscription,
            Err(e) => {
                eprintln!("Error watching vault: {e}");
                std::process::exit(1);
            }
        };
        println!("Watching {} (Ctrl-C to stop)", watcher.root().display());

        tokio::select! {
            () = Arc::clone(&service).run(events) => {}
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    eprintln!("Error waiting for Ctrl-C: {e}");
                }
            }
        }

        drop(watcher);
        info!("stopped watching");
    });
}
