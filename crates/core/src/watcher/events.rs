//! Translation of raw notify events into vault events.

use std::path::Path;

use notify::event::{CreateKind, ModifyKind, RemoveKind, RenameMode};
use notify::{Event, EventKind};
use tracing::trace;

use crate::paths::to_vault_path;

/// A change to a file in the vault, addressed by vault path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VaultEvent {
    Create(String),
    Modify(String),
    Delete(String),
    Rename { from: String, to: String },
}

impl VaultEvent {
    /// The path the event leaves behind (the new path for renames).
    pub fn path(&self) -> &str {
        match self {
            VaultEvent::Create(path) | VaultEvent::Modify(path) | VaultEvent::Delete(path) => path,
            VaultEvent::Rename { to, .. } => to,
        }
    }
}

pub(crate) fn translate(root: &Path, event: &Event) -> Vec<VaultEvent> {
    let vault_paths = || event.paths.iter().filter_map(move |p| to_vault_path(root, p));

    match event.kind {
        EventKind::Create(CreateKind::Folder) | EventKind::Remove(RemoveKind::Folder) => Vec::new(),
        EventKind::Create(_) => vault_paths().map(VaultEvent::Create).collect(),
        EventKind::Remove(_) => vault_paths().map(VaultEvent::Delete).collect(),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            let paths: Vec<String> = vault_paths().collect();
            match paths.as_slice() {
                [from, to, ..] => vec![VaultEvent::Rename { from: from.clone(), to: to.clone() }],
                _ => Vec::new(),
            }
        }
        // Halves of a rename inside the vault; the paired `Both` event follows.
        EventKind::Modify(ModifyKind::Name(RenameMode::From | RenameMode::To)) => Vec::new(),
        // Backends that cannot pair renames report each side on its own.
        EventKind::Modify(ModifyKind::Name(_)) => event
            .paths
            .iter()
            .filter_map(|p| {
                let path = to_vault_path(root, p)?;
                Some(if p.exists() { VaultEvent::Create(path) } else { VaultEvent::Delete(path) })
            })
            .collect(),
        EventKind::Modify(ModifyKind::Metadata(_)) => Vec::new(),
        EventKind::Modify(_) => vault_paths().map(VaultEvent::Modify).collect(),
        ref other => {
            trace!(kind = ?other, "ignoring event");
            Vec::new()
        }
    }
}
