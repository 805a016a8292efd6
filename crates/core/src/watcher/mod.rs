//! Watching the vault for file changes.
//!
//! A [`VaultWatcher`] subscribes to filesystem notifications for the whole
//! vault and forwards them, as [`VaultEvent`]s, over a channel. Events stop
//! when the watcher is dropped.

mod events;

use std::path::{Path, PathBuf};

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{error, trace};

pub use events::VaultEvent;

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("vault root does not exist: {0}")]
    MissingRoot(String),

    #[error("failed to watch vault: {0}")]
    Notify(#[from] notify::Error),
}

#[derive(Debug)]
pub struct VaultWatcher {
    root: PathBuf,
    _watcher: RecommendedWatcher,
}

impl VaultWatcher {
    /// Start watching `root` recursively.
    pub fn subscribe(
        root: &Path,
    ) -> Result<(Self, mpsc::UnboundedReceiver<VaultEvent>), WatchError> {
        let root = root
            .canonicalize()
            .map_err(|_| WatchError::MissingRoot(root.display().to_string()))?;

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let handler_root = root.clone();

        let mut watcher = RecommendedWatcher::new(
            move |result: notify::Result<Event>| match result {
                Ok(event) => {
                    for vault_event in events::translate(&handler_root, &event) {
                        trace!(?vault_event, "vault event");
                        if events_tx.send(vault_event).is_err() {
                            trace!("event receiver closed, dropping event");
                        }
                    }
                }
                Err(e) => error!("file watcher error: {e}"),
            },
            Config::default(),
        )?;
        watcher.watch(&root, RecursiveMode::Recursive)?;

        Ok((Self { root, _watcher: watcher }, events_rx))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::time::timeout;

    #[test]
    fn test_missing_root() {
        let tmp = TempDir::new().unwrap();
        let result = VaultWatcher::subscribe(&tmp.path().join("nope"));
        assert!(matches!(result, Err(WatchError::MissingRoot(_))));
    }

    #[tokio::test]
    async fn test_reports_new_file_by_vault_path() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir(tmp.path().join("Scores")).unwrap();
        let (watcher, mut rx) = VaultWatcher::subscribe(tmp.path()).unwrap();

        std::fs::write(watcher.root().join("Scores/Song.mscz"), "zip").unwrap();

        let seen = timeout(Duration::from_secs(10), async {
            while let Some(event) = rx.recv().await {
                if event.path() == "Scores/Song.mscz" {
                    return Some(event);
                }
            }
            None
        })
        .await
        .expect("no event within timeout");

        assert!(matches!(
            seen,
            Some(VaultEvent::Create(_) | VaultEvent::Modify(_))
        ));
    }
}
