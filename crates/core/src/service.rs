//! The integration shim: settings, vault, exporter and embed renderer wired
//! together, reacting to vault events.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::embed::{Capabilities, EmbedHost, EmbedRegistration, EmbedResolver};
use crate::export::{
    Converter, ExportChanges, ExportError, ExportOrchestrator, FormatResult, MovedExport,
    MuseScoreCli, SourceFile,
};
use crate::formats::{SOURCE_EXTENSIONS, is_source_path};
use crate::paths::normalize_path;
use crate::settings::{Settings, SettingsError, SettingsStore, load_settings};
use crate::vault::{FsVault, Vault, VaultError, VaultWalker, VaultWalkerError};
use crate::watcher::{VaultEvent, VaultWatcher, WatchError};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Vault(#[from] VaultError),

    #[error(transparent)]
    Walk(#[from] VaultWalkerError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Watch(#[from] WatchError),
}

/// What handling one vault event did.
#[derive(Debug)]
pub enum EventOutcome {
    /// Not a MuseScore file, or the file is already gone.
    Ignored,
    Exported(Vec<FormatResult>),
    Removed(ExportChanges<String>),
    Moved(ExportChanges<MovedExport>),
}

/// Result of exporting every source in the vault.
#[derive(Debug, Default)]
pub struct SyncReport {
    pub sources: Vec<(SourceFile, Vec<FormatResult>)>,
    /// Exports whose source is gone, deleted after the sources were handled.
    pub orphans: ExportChanges<String>,
}

impl SyncReport {
    pub fn failures(&self) -> impl Iterator<Item = (&SourceFile, &ExportError)> {
        self.sources.iter().flat_map(|(source, results)| {
            results.iter().filter_map(move |(_, r)| r.as_ref().err().map(|e| (source, e)))
        })
    }

    /// Number of conversions and orphan deletions that failed.
    pub fn failure_count(&self) -> usize {
        self.failures().count() + self.orphans.failed.len()
    }
}

pub struct ScoreVault<V, C> {
    settings: Settings,
    vault: Arc<V>,
    orchestrator: ExportOrchestrator<V, C>,
}

impl ScoreVault<FsVault, MuseScoreCli> {
    /// Load settings (saving the merged record back) and open a local vault.
    pub fn open(
        vault_root: &std::path::Path,
        store: &dyn SettingsStore,
    ) -> Result<Self, ServiceError> {
        let settings = load_settings(store)?;
        let vault = Arc::new(FsVault::new(vault_root)?);
        let converter = MuseScoreCli::from_settings(&settings);
        Ok(Self::new(vault, converter, settings))
    }
}

impl<V: Vault + 'static, C: Converter + 'static> ScoreVault<V, C> {
    pub fn new(vault: Arc<V>, converter: Option<C>, settings: Settings) -> Self {
        let orchestrator =
            ExportOrchestrator::new(Arc::clone(&vault), converter, settings.folder_path.clone());
        Self { settings, vault, orchestrator }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn vault(&self) -> &Arc<V> {
        &self.vault
    }

    pub fn orchestrator(&self) -> &ExportOrchestrator<V, C> {
        &self.orchestrator
    }

    pub fn embed_resolver(&self, capabilities: Arc<dyn Capabilities>) -> EmbedResolver<V> {
        EmbedResolver::new(Arc::clone(&self.vault), capabilities, &self.settings)
    }

    /// Register the MuseScore embed renderer with `host` for as long as the
    /// returned registration lives.
    pub fn register_embed(&self, host: &Arc<EmbedHost>) -> EmbedRegistration {
        let capabilities: Arc<dyn Capabilities> = host.clone();
        host.register(&SOURCE_EXTENSIONS, Arc::new(self.embed_resolver(capabilities)))
    }

    pub async fn handle_event(&self, event: VaultEvent) -> Result<EventOutcome, ServiceError> {
        match event {
            VaultEvent::Create(path) | VaultEvent::Modify(path) => {
                let Some(source) = SourceFile::stat(self.vault.as_ref(), &path) else {
                    return Ok(EventOutcome::Ignored);
                };
                Ok(EventOutcome::Exported(self.orchestrator.export_all(&source).await))
            }
            VaultEvent::Delete(path) => {
                if !is_source_path(&path) {
                    return Ok(EventOutcome::Ignored);
                }
                Ok(EventOutcome::Removed(self.orchestrator.remove_exports(&path)))
            }
            VaultEvent::Rename { from, to } => {
                if is_source_path(&to) {
                    return Ok(EventOutcome::Moved(self.orchestrator.move_exports(&from, &to)));
                }
                if self.vault.folder_exists(&to) {
                    return Ok(EventOutcome::Moved(self.move_folder_exports(&from, &to)?));
                }
                Ok(EventOutcome::Ignored)
            }
        }
    }

    /// Follow a renamed folder: every source now below `to` takes its
    /// exports along from the matching path below `from`.
    fn move_folder_exports(
        &self,
        from: &str,
        to: &str,
    ) -> Result<ExportChanges<MovedExport>, ServiceError> {
        let from = normalize_path(from);
        let to = normalize_path(to);
        let mut changes = ExportChanges::default();

        for new_path in self.vault.list_files(&to)? {
            if !is_source_path(&new_path) {
                continue;
            }
            let Some(rest) = new_path.strip_prefix(&format!("{to}/")) else {
                continue;
            };
            let old_path = normalize_path(&format!("{from}/{rest}"));
            changes.extend(self.orchestrator.move_exports(&old_path, &new_path));
        }

        if !changes.is_empty() {
            info!(%from, %to, moved = changes.changed.len(), "followed folder rename");
        }
        Ok(changes)
    }

    /// Handle events until the channel closes. Every event runs as its own
    /// task; in-flight tasks are awaited before returning.
    pub async fn run(self: Arc<Self>, mut events: mpsc::UnboundedReceiver<VaultEvent>) {
        let mut tasks = JoinSet::new();

        while let Some(event) = events.recv().await {
            while tasks.try_join_next().is_some() {}

            let service = Arc::clone(&self);
            tasks.spawn(async move {
                debug!(?event, "handling vault event");
                if let Err(e) = service.handle_event(event).await {
                    warn!("failed to handle vault event: {e}");
                }
            });
        }

        while tasks.join_next().await.is_some() {}
        info!("vault event stream closed");
    }
}

impl<C: Converter + 'static> ScoreVault<FsVault, C> {
    /// Subscribe to changes in the vault directory.
    pub fn watch(
        &self,
    ) -> Result<(VaultWatcher, mpsc::UnboundedReceiver<VaultEvent>), ServiceError> {
        Ok(VaultWatcher::subscribe(self.vault.root())?)
    }

    /// Every MuseScore file in the vault, skipping the export folder and
    /// `excluded` folders.
    pub fn sources(&self, excluded: &[PathBuf]) -> Result<Vec<SourceFile>, ServiceError> {
        let mut excluded = excluded.to_vec();
        let export_root = normalize_path(&self.settings.folder_path);
        if export_root != "/" {
            excluded.push(PathBuf::from(export_root));
        }

        let walker = VaultWalker::with_exclusions(self.vault.root(), excluded)?;
        Ok(walker
            .walk()?
            .into_iter()
            .map(|file| SourceFile::new(file.vault_path, file.modified))
            .collect())
    }

    /// Bring the exports of every source up to date, then delete exports
    /// left behind by sources that were deleted or moved while nobody was
    /// watching. Sources are handled one after another, the formats of each
    /// source concurrently.
    pub async fn sync(&self, excluded: &[PathBuf]) -> Result<SyncReport, ServiceError> {
        let mut report = SyncReport::default();

        for source in self.sources(excluded)? {
            let results = self.orchestrator.export_all(&source).await;
            report.sources.push((source, results));
        }
        report.orphans = self.orchestrator.remove_orphans()?;

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::{EmbedContext, EMBED_MARKER_CLASS};
    use crate::export::ExportOutcome;
    use crate::export::testing::RecordingConverter;
    use crate::formats::ExportFormat;
    use filetime::{FileTime, set_file_mtime};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    type Service = ScoreVault<FsVault, Arc<RecordingConverter>>;

    fn setup() -> (TempDir, Arc<RecordingConverter>, Service) {
        let tmp = TempDir::new().unwrap();
        let vault = Arc::new(FsVault::new(tmp.path()).unwrap());
        let converter = Arc::new(RecordingConverter::default());
        let settings = Settings { folder_path: "Exports".into(), ..Settings::default() };
        let service = ScoreVault::new(vault, Some(Arc::clone(&converter)), settings);
        (tmp, converter, service)
    }

    fn write_file(root: &Path, path: &str, secs: i64) {
        let full = root.join(path);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(&full, path).unwrap();
        set_file_mtime(&full, FileTime::from_unix_time(secs, 0)).unwrap();
    }

    #[tokio::test]
    async fn test_new_song_exported_then_unchanged_event_is_noop() {
        let (_tmp, converter, service) = setup();
        let root = service.vault().root().to_path_buf();
        write_file(&root, "Song.mscz", 100);

        let outcome = service.handle_event(VaultEvent::Create("Song.mscz".into())).await.unwrap();
        match outcome {
            EventOutcome::Exported(results) => {
                let exported = |r: &Result<ExportOutcome, ExportError>| {
                    matches!(r, Ok(ExportOutcome::Exported { .. }))
                };
                assert!(results.iter().all(|(_, r)| exported(r)));
            }
            other => panic!("expected Exported, got {other:?}"),
        }
        assert_eq!(converter.outputs(), vec!["Song.mscz.mxl", "Song.mscz.pdf"]);
        assert!(root.join("Exports/Song.mscz.pdf").exists());
        assert!(root.join("Exports/Song.mscz.mxl").exists());

        service.handle_event(VaultEvent::Modify("Song.mscz".into())).await.unwrap();
        assert_eq!(converter.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_non_source_events_are_ignored() {
        let (_tmp, converter, service) = setup();
        let root = service.vault().root().to_path_buf();
        write_file(&root, "notes.md", 100);
        write_file(&root, "Exports/Song.mscz.pdf", 100);

        for event in [
            VaultEvent::Create("notes.md".into()),
            VaultEvent::Modify("Exports/Song.mscz.pdf".into()),
            VaultEvent::Delete("Exports/Song.mscz.pdf".into()),
            VaultEvent::Rename { from: "notes.md".into(), to: "ideas.md".into() },
            VaultEvent::Modify("Gone.mscz".into()),
        ] {
            let outcome = service.handle_event(event).await.unwrap();
            assert!(matches!(outcome, EventOutcome::Ignored));
        }
        assert!(converter.calls().is_empty());
        assert!(root.join("Exports/Song.mscz.pdf").exists());
    }

    #[tokio::test]
    async fn test_delete_removes_exports() {
        let (_tmp, _converter, service) = setup();
        let root = service.vault().root().to_path_buf();
        write_file(&root, "Exports/Song.mscz.pdf", 100);
        write_file(&root, "Exports/Song.mscz.mxl", 100);

        let outcome = service.handle_event(VaultEvent::Delete("Song.mscz".into())).await.unwrap();
        match outcome {
            EventOutcome::Removed(removed) => {
                assert_eq!(removed.changed.len(), 2);
                assert!(removed.failed.is_empty());
            }
            other => panic!("expected Removed, got {other:?}"),
        }
        assert!(!root.join("Exports/Song.mscz.pdf").exists());
        assert!(!root.join("Exports/Song.mscz.mxl").exists());
    }

    #[tokio::test]
    async fn test_rename_moves_exports_without_converting() {
        let (_tmp, converter, service) = setup();
        let root = service.vault().root().to_path_buf();
        write_file(&root, "Band/Song.mscz", 100);
        write_file(&root, "Exports/Song.mscz.pdf", 150);

        let outcome = service
            .handle_event(VaultEvent::Rename {
                from: "Song.mscz".into(),
                to: "Band/Song.mscz".into(),
            })
            .await
            .unwrap();

        match outcome {
            EventOutcome::Moved(moved) => {
                assert_eq!(moved.changed.len(), 1);
                assert_eq!(moved.changed[0].to, "Exports/Band/Song.mscz.pdf");
            }
            other => panic!("expected Moved, got {other:?}"),
        }
        assert!(root.join("Exports/Band/Song.mscz.pdf").exists());
        assert!(converter.calls().is_empty());
    }

    #[tokio::test]
    async fn test_folder_rename_moves_exports_of_contained_sources() {
        let (_tmp, converter, service) = setup();
        let root = service.vault().root().to_path_buf();
        write_file(&root, "Band2/Song.mscz", 100);
        write_file(&root, "Band2/Set 1/Waltz.mscx", 100);
        write_file(&root, "Band2/notes.md", 100);
        write_file(&root, "Exports/Band/Song.mscz.pdf", 150);
        write_file(&root, "Exports/Band/Song.mscz.mxl", 150);
        write_file(&root, "Exports/Band/Set 1/Waltz.mscx.pdf", 150);

        let outcome = service
            .handle_event(VaultEvent::Rename { from: "Band".into(), to: "Band2".into() })
            .await
            .unwrap();

        let moved = match outcome {
            EventOutcome::Moved(moved) => moved,
            other => panic!("expected Moved, got {other:?}"),
        };
        assert_eq!(moved.changed.len(), 3);
        assert!(moved.failed.is_empty());
        assert!(root.join("Exports/Band2/Song.mscz.pdf").exists());
        assert!(root.join("Exports/Band2/Song.mscz.mxl").exists());
        assert!(root.join("Exports/Band2/Set 1/Waltz.mscx.pdf").exists());
        assert!(!root.join("Exports/Band/Song.mscz.pdf").exists());
        assert!(converter.calls().is_empty());
    }

    #[tokio::test]
    async fn test_rename_to_missing_folder_is_ignored() {
        let (_tmp, _converter, service) = setup();
        let root = service.vault().root().to_path_buf();
        write_file(&root, "Exports/Band/Song.mscz.pdf", 150);

        let outcome = service
            .handle_event(VaultEvent::Rename { from: "Band".into(), to: "Gone".into() })
            .await
            .unwrap();

        assert!(matches!(outcome, EventOutcome::Ignored));
        assert!(root.join("Exports/Band/Song.mscz.pdf").exists());
    }

    #[tokio::test]
    async fn test_run_processes_events_until_channel_closes() {
        let (_tmp, converter, service) = setup();
        let root = service.vault().root().to_path_buf();
        write_file(&root, "A.mscz", 100);
        write_file(&root, "B.mscx", 100);

        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(VaultEvent::Create("A.mscz".into())).unwrap();
        tx.send(VaultEvent::Modify("B.mscx".into())).unwrap();
        drop(tx);

        Arc::new(service).run(rx).await;
        assert_eq!(
            converter.outputs(),
            vec!["A.mscz.mxl", "A.mscz.pdf", "B.mscx.mxl", "B.mscx.pdf"]
        );
    }

    #[tokio::test]
    async fn test_sync_skips_exports_and_excluded_folders() {
        let (_tmp, converter, service) = setup();
        let root = service.vault().root().to_path_buf();
        write_file(&root, "Song.mscz", 100);
        write_file(&root, "Scores/Etude.mscx", 100);
        write_file(&root, "Archive/Old.mscz", 100);
        write_file(&root, "Exports/Stray.mscz", 100);
        write_file(&root, "Exports/Song.mscz.pdf", 200);

        let report = service.sync(&[PathBuf::from("Archive")]).await.unwrap();

        let synced: Vec<&str> = report.sources.iter().map(|(s, _)| s.path.as_str()).collect();
        assert_eq!(synced, vec!["Scores/Etude.mscx", "Song.mscz"]);
        assert_eq!(report.failure_count(), 0);
        assert_eq!(
            converter.outputs(),
            vec!["Etude.mscx.mxl", "Etude.mscx.pdf", "Song.mscz.mxl"]
        );
    }

    #[tokio::test]
    async fn test_sync_removes_exports_of_vanished_sources() {
        let (_tmp, _converter, service) = setup();
        let root = service.vault().root().to_path_buf();
        write_file(&root, "Band2/Song.mscz", 100);
        write_file(&root, "Exports/Band/Song.mscz.pdf", 150);
        write_file(&root, "Exports/Band/Song.mscz.mxl", 150);

        let report = service.sync(&[]).await.unwrap();

        assert_eq!(
            report.orphans.changed,
            vec![
                "Exports/Band/Song.mscz.mxl".to_string(),
                "Exports/Band/Song.mscz.pdf".to_string(),
            ]
        );
        assert_eq!(report.failure_count(), 0);
        assert!(root.join("Exports/Band2/Song.mscz.pdf").exists());
        assert!(!root.join("Exports/Band/Song.mscz.pdf").exists());
    }

    #[tokio::test]
    async fn test_registered_embed_renders_exports() {
        let (_tmp, _converter, service) = setup();
        let root = service.vault().root().to_path_buf();
        write_file(&root, "Exports/Song.mscz.pdf", 100);

        let host = Arc::new(EmbedHost::new());
        let registration = service.register_embed(&host);
        assert!(host.is_extension_registered("mscz"));
        assert!(host.is_extension_registered("mscx"));

        let mut ctx = EmbedContext::new("Song.mscz#Verse", "Practice.md");
        let embed = host.render(&mut ctx, "Song.mscz", Some("#Verse")).unwrap();
        assert_eq!(embed.file, "Exports/Song.mscz.pdf");
        assert_eq!(embed.subpath, None);
        assert!(ctx.container.has_class(EMBED_MARKER_CLASS));

        drop(registration);
        assert!(!host.is_extension_registered("mscz"));
    }

    #[test]
    fn test_open_persists_merged_settings() {
        let tmp = TempDir::new().unwrap();
        let settings_file = tmp.path().join(".scorevault/settings.json");
        let store = crate::settings::JsonSettingsStore::new(settings_file);
        fs::create_dir_all(tmp.path().join(".scorevault")).unwrap();
        fs::write(store.path(), r#"{"folderPath": "Exports"}"#).unwrap();

        let service = ScoreVault::open(tmp.path(), &store).unwrap();
        assert_eq!(service.settings().folder_path, "Exports");
        assert_eq!(service.settings().embed_subpath_as, ExportFormat::Mxl);

        let saved = fs::read_to_string(store.path()).unwrap();
        assert!(saved.contains("embedSubpathAs"));
    }
}
