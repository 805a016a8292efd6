use std::path::Path;
use std::time::SystemTime;

use chrono::{DateTime, Local};
use scorevault_core::export::{ExportState, SourceFile};
use scorevault_core::formats::ExportFormat;
use tabled::{Table, Tabled, settings::Style};

use super::{Service, load_config, open};

#[derive(Tabled)]
struct StatusRow {
    #[tabled(rename = "Source")]
    source: String,
    #[tabled(rename = "Modified")]
    modified: String,
    #[tabled(rename = "PDF")]
    pdf: String,
    #[tabled(rename = "MusicXML")]
    mxl: String,
}

pub fn run(config: Option<&Path>, profile: Option<&str>) {
    let rc = load_config(config, profile);
    let service = open(&rc);

    let sources = match service.sources(&rc.excluded_folders) {
        Ok(sources) => sources,
        Err(e) => {
            eprintln!("Error scanning vault: {e}");
            std::process::exit(1);
        }
    };

    if sources.is_empty() {
        println!("(no MuseScore files found)");
        return;
    }

    let rows: Vec<StatusRow> = sources
        .iter()
        .map(|source| StatusRow {
            source: source.path.clone(),
            modified: format_time(source.mtime),
            pdf: describe(&service, source, ExportFormat::Pdf),
            mxl: describe(&service, source, ExportFormat::Mxl),
        })
        .collect();

    let stale = sources
        .iter()
        .filter(|source| {
            ExportFormat::ALL.iter().any(|&format| {
                !matches!(service.orchestrator().state(source, format), ExportState::Fresh(_))
            })
        })
        .count();

    let table = Table::new(&rows).with(Style::rounded()).to_string();
    println!("{table}");
    println!("\nTotal: {} MuseScore files, {} need exporting", rows.len(), stale);
}

fn describe(service: &Service, source: &SourceFile, format: ExportFormat) -> String {
    match service.orchestrator().state(source, format) {
        ExportState::Missing => "missing".to_string(),
        ExportState::Stale(stat) => format!("stale ({})", format_time(stat.mtime)),
        ExportState::Fresh(_) => "up to date".to_string(),
    }
}

fn format_time(time: SystemTime) -> String {
    DateTime::<Local>::from(time).format("%Y-%m-%d %H:%M").to_string()
}
