//! Keeping exports of MuseScore files up to date.
//!
//! The orchestrator maps each source to one export file per format, runs the
//! converter when an export is missing or older than its source, and moves or
//! deletes exports along with their sources.

mod converter;
mod orchestrator;
#[cfg(test)]
pub(crate) mod testing;

pub use converter::{ConvertError, Converter, MuseScoreCli};
pub use orchestrator::{
    ExportChanges, ExportError, ExportOrchestrator, ExportOutcome, ExportState, FormatResult,
    MovedExport, SourceFile,
};
