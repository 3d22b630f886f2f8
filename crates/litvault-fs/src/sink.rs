//! The vault sink: where reconciled note operations land
//!
//! `VaultSink` is the seam between the sync engine and physical storage.
//! The engine only ever asks for the primitives below; degrade decisions
//! (create-over-existing, rename-of-missing) are made by the applier, not
//! here.

use std::fs;
use std::path::{Path, PathBuf};

use crate::{Error, Result, VaultPath};

/// File operations the sync engine needs from a vault.
pub trait VaultSink {
    /// Whether a note exists at `path`.
    fn exists(&self, path: &VaultPath) -> bool;

    /// Create a new note with the given content.
    fn create(&mut self, path: &VaultPath, content: &str) -> Result<()>;

    /// Replace the content of an existing note.
    fn modify(&mut self, path: &VaultPath, content: &str) -> Result<()>;

    /// Move a note to a new path.
    fn rename(&mut self, from: &VaultPath, to: &VaultPath) -> Result<()>;

    /// Delete a note.
    fn remove(&mut self, path: &VaultPath) -> Result<()>;

    /// Create a directory chain if absent. Idempotent.
    fn ensure_directory(&mut self, path: &VaultPath) -> Result<()>;
}

/// On-disk vault rooted at a directory.
pub struct FsVault {
    root: PathBuf,
}

impl FsVault {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &VaultPath) -> Result<PathBuf> {
        if path.escapes_root() {
            return Err(Error::OutsideRoot {
                path: path.as_str().to_string(),
            });
        }
        Ok(path.to_native(&self.root))
    }
}

impl VaultSink for FsVault {
    fn exists(&self, path: &VaultPath) -> bool {
        self.resolve(path).map(|p| p.exists()).unwrap_or(false)
    }

    fn create(&mut self, path: &VaultPath, content: &str) -> Result<()> {
        let native = self.resolve(path)?;
        if let Some(parent) = native.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        fs::write(&native, content).map_err(|e| Error::io(&native, e))
    }

    fn modify(&mut self, path: &VaultPath, content: &str) -> Result<()> {
        let native = self.resolve(path)?;
        fs::write(&native, content).map_err(|e| Error::io(&native, e))
    }

    fn rename(&mut self, from: &VaultPath, to: &VaultPath) -> Result<()> {
        let from_native = self.resolve(from)?;
        let to_native = self.resolve(to)?;
        if let Some(parent) = to_native.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        fs::rename(&from_native, &to_native).map_err(|e| Error::io(&from_native, e))
    }

    fn remove(&mut self, path: &VaultPath) -> Result<()> {
        let native = self.resolve(path)?;
        fs::remove_file(&native).map_err(|e| Error::io(&native, e))
    }

    fn ensure_directory(&mut self, path: &VaultPath) -> Result<()> {
        let native = self.resolve(path)?;
        fs::create_dir_all(&native).map_err(|e| Error::io(&native, e))
    }
}
