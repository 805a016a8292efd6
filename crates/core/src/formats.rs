//! Recognized MuseScore source extensions and export formats.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// File extensions of MuseScore documents (compressed and uncompressed).
pub const SOURCE_EXTENSIONS: [&str; 2] = ["mscz", "mscx"];

/// Capability name of the optional MusicXML renderer.
pub const MUSICXML_CAPABILITY: &str = "osmd-musicxml";

/// Formats a MuseScore file is exported to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Baseline format, rendered natively by every host.
    Pdf,
    /// MusicXML; supports subpath selection but needs an optional renderer.
    Mxl,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 2] = [ExportFormat::Pdf, ExportFormat::Mxl];

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Mxl => "mxl",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "PDF",
            ExportFormat::Mxl => "MusicXML",
        }
    }

    /// The format every embed falls back to.
    pub fn baseline() -> Self {
        ExportFormat::Pdf
    }

    pub fn is_baseline(self) -> bool {
        self == Self::baseline()
    }

    /// Capability that must be installed before this format can be rendered.
    pub fn required_capability(self) -> Option<&'static str> {
        match self {
            ExportFormat::Pdf => None,
            ExportFormat::Mxl => Some(MUSICXML_CAPABILITY),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown export format '{0}' (expected one of: pdf, mxl)")]
pub struct UnknownFormat(pub String);

impl FromStr for ExportFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pdf" => Ok(ExportFormat::Pdf),
            "mxl" | "musicxml" => Ok(ExportFormat::Mxl),
            _ => Err(UnknownFormat(s.to_string())),
        }
    }
}

/// Extension of a vault path (text after the last `.` of the file name).
pub fn extension_of(path: &str) -> Option<&str> {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rfind('.') {
        Some(idx) if idx > 0 => Some(&name[idx + 1..]),
        _ => None,
    }
}

/// Whether the path names a MuseScore document.
pub fn is_source_path(path: &str) -> bool {
    extension_of(path).is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
}
