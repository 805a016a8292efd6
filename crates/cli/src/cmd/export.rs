use std::path::Path;

use scorevault_core::export::SourceFile;
use scorevault_core::formats::ExportFormat;
use scorevault_core::paths::normalize_path;

use super::{load_config, open, print_results, runtime};

pub fn run(config: Option<&Path>, profile: Option<&str>, path: &str, format: Option<&str>) {
    let formats: Vec<ExportFormat> = match format.map(str::parse::<ExportFormat>) {
        None => ExportFormat::ALL.to_vec(),
        Some(Ok(format)) => vec![format],
        Some(Err(e)) => {
            eprintln!("{e}");
            std::process::exit(2);
        }
    };

    let rc = load_config(config, profile);
    let service = open(&rc);

    let path = normalize_path(path);
    let Some(source) = SourceFile::stat(service.vault().as_ref(), &path) else {
        eprintln!("Not a MuseScore file in the vault: {path}");
        std::process::exit(1);
    };

    let results = runtime().block_on(service.orchestrator().export_formats(&source, &formats));
    if print_results(&source.path, &results) > 0 {
        std::process::exit(1);
    }
}
