//! Persisted sync status
//!
//! The engine's memory of what each record last produced: one
//! `{path, hash}` entry per record key, scoped to (library, kind). The
//! on-disk form is a pair list per kind, which preserves key uniqueness
//! without relying on JSON object-key ordering.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::record::{Library, RecordKind};
use crate::{Error, Result};

/// What one record last produced: its vault path and content fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEntry {
    #[serde(rename = "filePath")]
    pub path: String,
    pub hash: String,
}

impl StatusEntry {
    pub fn new(path: impl Into<String>, hash: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            hash: hash.into(),
        }
    }
}

/// Status for one library: a key-indexed entry map per record kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LibraryStatus {
    pub collections: BTreeMap<String, StatusEntry>,
    pub items: BTreeMap<String, StatusEntry>,
}

impl LibraryStatus {
    pub fn kind(&self, kind: RecordKind) -> &BTreeMap<String, StatusEntry> {
        match kind {
            RecordKind::Collection => &self.collections,
            RecordKind::Item => &self.items,
        }
    }

    pub fn kind_mut(&mut self, kind: RecordKind) -> &mut BTreeMap<String, StatusEntry> {
        match kind {
            RecordKind::Collection => &mut self.collections,
            RecordKind::Item => &mut self.items,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty() && self.items.is_empty()
    }
}

/// On-disk pair-list form of [`LibraryStatus`].
#[derive(Serialize, Deserialize)]
struct StatusFile {
    #[serde(default)]
    collections: Vec<(String, StatusEntry)>,
    #[serde(default)]
    items: Vec<(String, StatusEntry)>,
}

impl From<&LibraryStatus> for StatusFile {
    fn from(status: &LibraryStatus) -> Self {
        let pairs = |map: &BTreeMap<String, StatusEntry>| {
            map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
        };
        Self {
            collections: pairs(&status.collections),
            items: pairs(&status.items),
        }
    }
}

impl From<StatusFile> for LibraryStatus {
    fn from(file: StatusFile) -> Self {
        Self {
            collections: file.collections.into_iter().collect(),
            items: file.items.into_iter().collect(),
        }
    }
}

/// Loads, saves, and clears per-library status files.
pub struct StatusStore {
    dir: PathBuf,
}

impl StatusStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of a library's status file: `<store>/<store_key>.status.json`.
    pub fn status_path(&self, library: &Library) -> PathBuf {
        self.dir.join(format!("{}.status.json", library.store_key()))
    }

    /// Load a library's status.
    ///
    /// A missing or structurally invalid file loads as an empty status, so
    /// a corrupt status file causes a full rebuild rather than a stuck
    /// sync. This never errors.
    pub fn load(&self, library: &Library) -> LibraryStatus {
        let path = self.status_path(library);
        load_tolerant(&path)
    }

    /// Persist a library's status atomically.
    pub fn save(&self, library: &Library, status: &LibraryStatus) -> Result<()> {
        let path = self.status_path(library);
        let file = StatusFile::from(status);
        let content = serde_json::to_vec_pretty(&file)?;
        litvault_fs::io::write_atomic(&path, &content).map_err(|source| Error::StatusWrite {
            library: library.prefix.clone(),
            source,
        })?;
        debug!(library = %library.prefix, path = %path.display(), "status saved");
        Ok(())
    }

    /// Delete a library's status file.
    ///
    /// Forces the next pass to re-derive every operation from an empty
    /// status; the cached snapshot is untouched, so no re-fetch is needed.
    /// A missing file is success.
    pub fn clear(&self, library: &Library) -> Result<()> {
        let path = self.status_path(library);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(litvault_fs::Error::io(path, e).into()),
        }
    }
}

fn load_tolerant(path: &Path) -> LibraryStatus {
    if !path.exists() {
        return LibraryStatus::default();
    }
    let content = match litvault_fs::io::read_locked(path) {
        Ok(content) => content,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "status unreadable, rebuilding from empty");
            return LibraryStatus::default();
        }
    };
    match serde_json::from_str::<StatusFile>(&content) {
        Ok(file) => file.into(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "status corrupt, rebuilding from empty");
            LibraryStatus::default()
        }
    }
}
