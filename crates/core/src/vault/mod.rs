//! Access to the vault's files.
//!
//! The [`Vault`] trait is the only way the exporter touches the filesystem,
//! so every create, delete and rename goes through a single layer.

mod local;
pub mod walker;

use std::path::PathBuf;
use std::time::SystemTime;

use thiserror::Error;

pub use local::FsVault;
pub use walker::{VaultWalker, VaultWalkerError, WalkedFile};

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("vault root does not exist: {0}")]
    MissingRoot(String),

    #[error("failed to create folder {path}: {source}")]
    CreateFolder {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to delete {path}: {source}")]
    Delete {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to rename {from} -> {to}: {source}")]
    Rename {
        from: String,
        to: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to list {path}: {source}")]
    List {
        path: String,
        #[source]
        source: walkdir::Error,
    },
}

/// Metadata of a file in the vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    pub mtime: SystemTime,
    pub size: u64,
}

/// File operations on a vault, addressed by vault path.
///
/// Each operation either completes or fails as a whole.
pub trait Vault: Send + Sync {
    /// Metadata of a regular file, `None` if there is no file at `path`.
    fn file_stat(&self, path: &str) -> Option<FileStat>;

    fn folder_exists(&self, path: &str) -> bool;

    /// Create a folder and any missing parents.
    fn create_folder(&self, path: &str) -> Result<(), VaultError>;

    fn delete(&self, path: &str) -> Result<(), VaultError>;

    /// Move a file. The destination folder must exist.
    fn rename(&self, from: &str, to: &str) -> Result<(), VaultError>;

    /// Vault paths of every file below `folder`, sorted. A missing folder
    /// has no files.
    fn list_files(&self, folder: &str) -> Result<Vec<String>, VaultError>;

    /// Absolute filesystem path for a vault path.
    ///
    /// `None` when the vault is not backed by a local filesystem, in which
    /// case external programs cannot be pointed at its files.
    fn full_path(&self, path: &str) -> Option<PathBuf>;
}
