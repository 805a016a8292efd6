use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::{FileStat, Vault, VaultError};
use crate::paths::{normalize_path, to_vault_path};

/// A vault stored in a local directory.
#[derive(Debug, Clone)]
pub struct FsVault {
    root: PathBuf,
}

impl FsVault {
    pub fn new(root: &Path) -> Result<Self, VaultError> {
        let root = root
            .canonicalize()
            .map_err(|_| VaultError::MissingRoot(root.display().to_string()))?;

        if !root.is_dir() {
            return Err(VaultError::MissingRoot(root.display().to_string()));
        }

        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let normalized = normalize_path(path);
        if normalized == "/" {
            return self.root.clone();
        }
        normalized.split('/').fold(self.root.clone(), |acc, part| acc.join(part))
    }
}

impl Vault for FsVault {
    fn file_stat(&self, path: &str) -> Option<FileStat> {
        let metadata = fs::metadata(self.resolve(path)).ok()?;
        if !metadata.is_file() {
            return None;
        }

        Some(FileStat {
            mtime: metadata.modified().unwrap_or(std::time::UNIX_EPOCH),
            size: metadata.len(),
        })
    }

    fn folder_exists(&self, path: &str) -> bool {
        self.resolve(path).is_dir()
    }

    fn create_folder(&self, path: &str) -> Result<(), VaultError> {
        fs::create_dir_all(self.resolve(path))
            .map_err(|e| VaultError::CreateFolder { path: path.to_string(), source: e })
    }

    fn delete(&self, path: &str) -> Result<(), VaultError> {
        fs::remove_file(self.resolve(path))
            .map_err(|e| VaultError::Delete { path: path.to_string(), source: e })
    }

    fn rename(&self, from: &str, to: &str) -> Result<(), VaultError> {
        fs::rename(self.resolve(from), self.resolve(to)).map_err(|e| VaultError::Rename {
            from: from.to_string(),
            to: to.to_string(),
            source: e,
        })
    }

    fn list_files(&self, folder: &str) -> Result<Vec<String>, VaultError> {
        let dir = self.resolve(folder);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&dir).follow_links(false) {
            let entry = entry
                .map_err(|e| VaultError::List { path: folder.to_string(), source: e })?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(path) = to_vault_path(&self.root, entry.path()) {
                files.push(path);
            }
        }

        files.sort();
        Ok(files)
    }

    fn full_path(&self, path: &str) -> Option<PathBuf> {
        Some(self.resolve(path))
    }
}
