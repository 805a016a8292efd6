//! Vault path handling and the source-to-export path mapping.
//!
//! Vault paths are `/`-separated strings relative to the vault root. The
//! root itself is written `/`.

use std::path::{Component, Path};

use crate::formats::{ExportFormat, is_source_path};

/// Location of an export file inside the vault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportInfo {
    /// Full vault path of the export file.
    pub path: String,
    /// File name, e.g. `Song.mscz.pdf`.
    pub name: String,
    /// Containing folder, `/` for the vault root.
    pub folder: String,
}

/// Normalize a vault path: one separator style, no empty or `.` segments,
/// no leading or trailing slash. `..` drops the previous segment and never
/// climbs above the vault root.
pub fn normalize_path(path: &str) -> String {
    let cleaned = path.replace('\\', "/").replace('\u{00A0}', " ");
    let mut segments: Vec<&str> = Vec::new();

    for segment in cleaned.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    if segments.is_empty() { "/".to_string() } else { segments.join("/") }
}

/// Split a vault path into its folder and file name.
pub fn split_path(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(idx) => (&path[..idx], &path[idx + 1..]),
        None => ("/", path),
    }
}

/// Map a source file to its export file for `format`, mirroring the source's
/// folder structure under `export_root`.
pub fn export_info(export_root: &str, source_path: &str, format: ExportFormat) -> ExportInfo {
    let (folder, name) = split_path(source_path);
    let export_folder = format!("{export_root}/{folder}");
    let export_name = format!("{name}.{}", format.extension());

    ExportInfo {
        path: normalize_path(&format!("{export_folder}/{export_name}")),
        name: export_name,
        folder: normalize_path(&export_folder),
    }
}

/// The source file and format an export file was mapped from, if `export_path`
/// is shaped like an export under `export_root`.
pub fn source_of_export(export_root: &str, export_path: &str) -> Option<(String, ExportFormat)> {
    let root = normalize_path(export_root);
    let path = normalize_path(export_path);

    let relative = if root == "/" {
        path.as_str()
    } else {
        path.strip_prefix(root.as_str())?.strip_prefix('/')?
    };

    let (source, extension) = relative.rsplit_once('.')?;
    let format = ExportFormat::ALL.into_iter().find(|f| f.extension() == extension)?;
    is_source_path(source).then(|| (source.to_string(), format))
}

/// Convert an absolute filesystem path below `root` into a vault path.
///
/// Returns `None` for paths outside the root or with non UTF-8 components.
pub fn to_vault_path(root: &Path, absolute: &Path) -> Option<String> {
    let relative = absolute.strip_prefix(root).ok()?;
    let mut segments = Vec::new();

    for component in relative.components() {
        match component {
            Component::Normal(part) => segments.push(part.to_str()?),
            Component::CurDir => {}
            _ => return None,
        }
    }

    Some(normalize_path(&segments.join("/")))
}
