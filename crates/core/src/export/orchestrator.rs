use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::SystemTime;

use futures::future::join_all;
use thiserror::Error;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, warn};

use super::converter::{ConvertError, Converter};
use crate::formats::{ExportFormat, is_source_path};
use crate::paths::{ExportInfo, export_info, normalize_path, source_of_export};
use crate::vault::{FileStat, Vault, VaultError};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Vault(#[from] VaultError),

    #[error("exporting {source_path} as {format} failed: {error}")]
    Convert {
        source_path: String,
        format: ExportFormat,
        #[source]
        error: ConvertError,
    },
}

/// A MuseScore file at a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: String,
    pub mtime: SystemTime,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, mtime: SystemTime) -> Self {
        Self { path: path.into(), mtime }
    }

    /// Look up a recognized source file in the vault.
    pub fn stat<V: Vault + ?Sized>(vault: &V, path: &str) -> Option<Self> {
        if !is_source_path(path) {
            return None;
        }
        vault.file_stat(path).map(|stat| Self::new(path, stat.mtime))
    }
}

/// What happened to one export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// No converter is configured.
    Disabled,
    /// The vault has no local filesystem to hand to the converter.
    Unavailable,
    UpToDate { path: String },
    Exported { path: String },
}

/// Freshness of an export file relative to its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportState {
    Missing,
    Stale(FileStat),
    Fresh(FileStat),
}

/// An export file that followed its source to a new location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovedExport {
    pub format: ExportFormat,
    pub from: String,
    pub to: String,
}

pub type FormatResult = (ExportFormat, Result<ExportOutcome, ExportError>);

/// Exports deleted or moved along with their sources, and the formats that
/// could not be handled. A failure on one format never skips another.
#[derive(Debug)]
pub struct ExportChanges<T> {
    pub changed: Vec<T>,
    pub failed: Vec<(ExportFormat, ExportError)>,
}

impl<T> Default for ExportChanges<T> {
    fn default() -> Self {
        Self { changed: Vec::new(), failed: Vec::new() }
    }
}

impl<T> ExportChanges<T> {
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty() && self.failed.is_empty()
    }

    pub fn extend(&mut self, other: Self) {
        self.changed.extend(other.changed);
        self.failed.extend(other.failed);
    }

    fn fail(&mut self, format: ExportFormat, error: ExportError) {
        warn!(%format, "{error}");
        self.failed.push((format, error));
    }
}

/// Source mtime covered by the last conversion of a target in this process.
type TargetSlot = Arc<AsyncMutex<Option<SystemTime>>>;

/// Keeps the export files of MuseScore sources in sync.
///
/// Conversions of the same target are serialized: a second request waits for
/// the running one and then re-checks freshness, so overlapping events never
/// convert one target twice at once.
pub struct ExportOrchestrator<V, C> {
    vault: Arc<V>,
    converter: Option<C>,
    export_root: String,
    targets: Mutex<HashMap<String, TargetSlot>>,
}

impl<V: Vault, C: Converter> ExportOrchestrator<V, C> {
    /// `converter = None` disables exporting; moves and deletions still work.
    pub fn new(vault: Arc<V>, converter: Option<C>, export_root: impl Into<String>) -> Self {
        Self {
            vault,
            converter,
            export_root: export_root.into(),
            targets: Mutex::new(HashMap::new()),
        }
    }

    pub fn vault(&self) -> &Arc<V> {
        &self.vault
    }

    pub fn export_root(&self) -> &str {
        &self.export_root
    }

    pub fn is_enabled(&self) -> bool {
        self.converter.is_some()
    }

    pub fn export_info(&self, source_path: &str, format: ExportFormat) -> ExportInfo {
        export_info(&self.export_root, source_path, format)
    }

    /// The export file of `source_path` for `format`, if it exists.
    pub fn existing_export(
        &self,
        source_path: &str,
        format: ExportFormat,
    ) -> Option<(ExportInfo, FileStat)> {
        let info = self.export_info(source_path, format);
        let stat = self.vault.file_stat(&info.path)?;
        Some((info, stat))
    }

    pub fn state(&self, source: &SourceFile, format: ExportFormat) -> ExportState {
        match self.existing_export(&source.path, format) {
            None => ExportState::Missing,
            Some((_, stat)) if stat.mtime >= source.mtime => ExportState::Fresh(stat),
            Some((_, stat)) => ExportState::Stale(stat),
        }
    }

    /// Bring one export up to date, converting only if it is missing or stale.
    pub async fn export(
        &self,
        source: &SourceFile,
        format: ExportFormat,
    ) -> Result<ExportOutcome, ExportError> {
        let Some(converter) = &self.converter else {
            debug!(source = %source.path, "no converter configured, skipping export");
            return Ok(ExportOutcome::Disabled);
        };

        let info = self.export_info(&source.path, format);
        let (Some(input), Some(output)) =
            (self.vault.full_path(&source.path), self.vault.full_path(&info.path))
        else {
            debug!(source = %source.path, "vault has no local filesystem, skipping export");
            return Ok(ExportOutcome::Unavailable);
        };

        let slot = self.target_slot(&info.path);
        let mut converted = slot.lock().await;

        // A missing file is never fresh. Once it exists, a conversion finished
        // in this process decides: the file's own mtime is when it was
        // written, not which source version it came from.
        let fresh = match (self.state(source, format), *converted) {
            (ExportState::Missing, _) => false,
            (_, Some(covered)) => covered >= source.mtime,
            (state, None) => matches!(state, ExportState::Fresh(_)),
        };
        if fresh {
            debug!(path = %info.path, "export is up to date");
            return Ok(ExportOutcome::UpToDate { path: info.path });
        }

        if !self.vault.folder_exists(&info.folder) {
            self.vault.create_folder(&info.folder)?;
        }

        converter.convert(&input, &output).await.map_err(|error| ExportError::Convert {
            source_path: source.path.clone(),
            format,
            error,
        })?;

        *converted = Some(source.mtime);
        info!(source = %source.path, export = %info.path, "exported");
        Ok(ExportOutcome::Exported { path: info.path })
    }

    /// Export several formats concurrently. Each format succeeds or fails on
    /// its own; results come back in the order of `formats`.
    pub async fn export_formats(
        &self,
        source: &SourceFile,
        formats: &[ExportFormat],
    ) -> Vec<FormatResult> {
        let exports = formats
            .iter()
            .map(|&format| async move { (format, self.export(source, format).await) });
        let results = join_all(exports).await;

        for (format, result) in &results {
            if let Err(e) = result {
                warn!(source = %source.path, %format, "export failed: {e}");
            }
        }

        results
    }

    pub async fn export_all(&self, source: &SourceFile) -> Vec<FormatResult> {
        self.export_formats(source, &ExportFormat::ALL).await
    }

    /// Delete the exports of a deleted source.
    pub fn remove_exports(&self, source_path: &str) -> ExportChanges<String> {
        let mut changes = ExportChanges::default();

        for format in ExportFormat::ALL {
            let info = self.export_info(source_path, format);
            self.forget_target(&info.path);

            if self.vault.file_stat(&info.path).is_none() {
                continue;
            }
            match self.vault.delete(&info.path) {
                Ok(()) => {
                    info!(source = %source_path, export = %info.path, "removed export");
                    changes.changed.push(info.path);
                }
                Err(e) => changes.fail(format, e.into()),
            }
        }

        changes
    }

    /// Move the exports of a renamed source next to its new location.
    pub fn move_exports(&self, old_path: &str, new_path: &str) -> ExportChanges<MovedExport> {
        let mut changes = ExportChanges::default();

        for format in ExportFormat::ALL {
            match self.move_export(old_path, new_path, format) {
                Ok(Some(moved)) => changes.changed.push(moved),
                Ok(None) => {}
                Err(e) => changes.fail(format, e.into()),
            }
        }

        changes
    }

    fn move_export(
        &self,
        old_path: &str,
        new_path: &str,
        format: ExportFormat,
    ) -> Result<Option<MovedExport>, VaultError> {
        let Some((old, _)) = self.existing_export(old_path, format) else {
            return Ok(None);
        };
        let new = self.export_info(new_path, format);
        if old.path == new.path {
            return Ok(None);
        }

        if !self.vault.folder_exists(&new.folder) {
            self.vault.create_folder(&new.folder)?;
        }
        self.vault.rename(&old.path, &new.path)?;
        self.forget_target(&old.path);
        self.forget_target(&new.path);

        info!(from = %old.path, to = %new.path, "moved export");
        Ok(Some(MovedExport { format, from: old.path, to: new.path }))
    }

    /// Delete exports whose source no longer exists.
    ///
    /// Exports kept beside their sources (export root `/`) are mixed with the
    /// user's own files and are left alone.
    pub fn remove_orphans(&self) -> Result<ExportChanges<String>, ExportError> {
        let mut changes = ExportChanges::default();
        if normalize_path(&self.export_root) == "/" {
            return Ok(changes);
        }

        for path in self.vault.list_files(&self.export_root)? {
            let Some((source_path, format)) = source_of_export(&self.export_root, &path) else {
                continue;
            };
            if self.vault.file_stat(&source_path).is_some() {
                continue;
            }

            self.forget_target(&path);
            match self.vault.delete(&path) {
                Ok(()) => {
                    info!(source = %source_path, export = %path, "removed orphaned export");
                    changes.changed.push(path);
                }
                Err(e) => changes.fail(format, e.into()),
            }
        }

        Ok(changes)
    }

    fn target_slot(&self, path: &str) -> TargetSlot {
        let mut targets = self.targets.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(targets.entry(path.to_string()).or_default())
    }

    fn forget_target(&self, path: &str) {
        self.targets.lock().unwrap_or_else(PoisonError::into_inner).remove(path);
    }
}
