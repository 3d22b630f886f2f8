//! Library snapshot persistence
//!
//! The fetch collaborator hands the engine a full flat snapshot per
//! library; the engine caches it here so a status clear can force a full
//! rebuild without re-fetching. Loads are tolerant: a missing or corrupt
//! snapshot file is an empty snapshot, never an error.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::record::{Library, Record};
use crate::Result;

/// The full flat record set for one library at a point in time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub collections: Vec<Record>,
    #[serde(default)]
    pub items: Vec<Record>,
}

impl Snapshot {
    pub fn is_empty(&self) -> bool {
        self.collections.is_empty() && self.items.is_empty()
    }
}

/// Reads and writes per-library snapshot files under a store directory.
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of a library's snapshot file: `<store>/<store_key>.json`.
    pub fn snapshot_path(&self, library: &Library) -> PathBuf {
        self.dir.join(format!("{}.json", library.store_key()))
    }

    /// Load a library's cached snapshot.
    ///
    /// A missing, unreadable, or unparsable file degrades to an empty
    /// snapshot so the pass performs a full rebuild instead of halting.
    pub fn load(&self, library: &Library) -> Snapshot {
        let path = self.snapshot_path(library);
        load_tolerant(&path)
    }

    /// Persist a library's snapshot atomically.
    pub fn save(&self, library: &Library, snapshot: &Snapshot) -> Result<()> {
        let path = self.snapshot_path(library);
        let content = serde_json::to_vec_pretty(snapshot)?;
        litvault_fs::io::write_atomic(&path, &content)?;
        Ok(())
    }
}

fn load_tolerant(path: &Path) -> Snapshot {
    if !path.exists() {
        return Snapshot::default();
    }
    let content = match litvault_fs::io::read_locked(path) {
        Ok(content) => content,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "snapshot unreadable, treating as empty");
            return Snapshot::default();
        }
    };
    match serde_json::from_str(&content) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "snapshot corrupt, treating as empty");
            Snapshot::default()
        }
    }
}
