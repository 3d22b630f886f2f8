//! Reconciliation: diffing generated notes against persisted status
//!
//! Given the notes generated this pass and the status map persisted after
//! the last pass, compute the minimal ordered set of vault operations and
//! the status map to persist next. Pure: no I/O, deterministic for
//! identical inputs, and empty when status already matches generation.

use std::collections::BTreeMap;

use litvault_fs::VaultPath;
use tracing::warn;

use crate::generate::GeneratedNote;
use crate::status::StatusEntry;

/// One planned vault operation, tagged with the record key it serves.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Move a note whose generated path changed. Carries content because
    /// the moved file may hold stale bytes; the applier rewrites it.
    Rename {
        key: String,
        from: VaultPath,
        to: VaultPath,
        content: String,
    },
    /// Rewrite a note whose content fingerprint changed.
    Update {
        key: String,
        path: VaultPath,
        content: String,
    },
    /// Remove the note of a record that vanished or opted out.
    Delete { key: String, path: VaultPath },
    /// Write a note for a record with no previous status.
    Create {
        key: String,
        path: VaultPath,
        content: String,
    },
}

impl Operation {
    /// The record key this operation serves.
    pub fn key(&self) -> &str {
        match self {
            Operation::Rename { key, .. }
            | Operation::Update { key, .. }
            | Operation::Delete { key, .. }
            | Operation::Create { key, .. } => key,
        }
    }

    /// The path the operation writes to or removes.
    pub fn target(&self) -> &VaultPath {
        match self {
            Operation::Rename { to, .. } => to,
            Operation::Update { path, .. }
            | Operation::Delete { path, .. }
            | Operation::Create { path, .. } => path,
        }
    }
}

/// Two records generating the same path in one pass.
///
/// The first claimant keeps the path; the later record is skipped for this
/// pass with its previous status retained, so nothing is silently
/// overwritten.
#[derive(Debug, Clone, PartialEq)]
pub struct PathCollision {
    pub path: String,
    pub kept_key: String,
    pub skipped_key: String,
}

/// The reconciler's output: an ordered operation plan plus the status map
/// to persist once the plan has been applied.
#[derive(Debug, Default)]
pub struct Plan {
    /// Operations in apply order: renames, updates, deletes, creates.
    pub operations: Vec<Operation>,
    /// Status entries for every record that generated a non-empty path.
    pub new_status: BTreeMap<String, StatusEntry>,
    /// Path collisions detected this pass.
    pub collisions: Vec<PathCollision>,
}

impl Plan {
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

/// Diff generated notes against the previous status map.
///
/// For each note with a non-empty path: no previous entry means CREATE;
/// otherwise a changed path means RENAME and, independently, a changed hash
/// means UPDATE (both can fire for one key in one pass — a rename may carry
/// stale content that the update then corrects). Notes with an empty path
/// and previous-status keys missing from the batch both become DELETEs of
/// the last known path and drop out of the new status.
///
/// The emitted plan is ordered renames, then updates, then deletes, then
/// creates across the whole batch, so a create can claim a path a rename
/// just vacated and a rename target never collides with a doomed file.
pub fn reconcile(
    generated: &[GeneratedNote],
    previous: &BTreeMap<String, StatusEntry>,
) -> Plan {
    let mut pending = previous.clone();
    let mut renames = Vec::new();
    let mut updates = Vec::new();
    let mut deletes = Vec::new();
    let mut creates = Vec::new();
    let mut new_status = BTreeMap::new();
    let mut collisions = Vec::new();
    let mut claimed: BTreeMap<&str, &str> = BTreeMap::new();

    for note in generated {
        if note.path.is_empty() {
            // Generator opted out: drop any previous note, carry nothing.
            if let Some(prev) = pending.remove(&note.key) {
                deletes.push(Operation::Delete {
                    key: note.key.clone(),
                    path: VaultPath::new(&prev.path),
                });
            }
            continue;
        }

        if let Some(owner) = claimed.get(note.path.as_str()) {
            warn!(path = %note.path, kept = %owner, skipped = %note.key, "path collision");
            collisions.push(PathCollision {
                path: note.path.clone(),
                kept_key: owner.to_string(),
                skipped_key: note.key.clone(),
            });
            // Skip the later claimant; its previous entry survives as-is.
            if let Some(prev) = pending.remove(&note.key) {
                new_status.insert(note.key.clone(), prev);
            }
            continue;
        }
        claimed.insert(note.path.as_str(), note.key.as_str());

        match pending.remove(&note.key) {
            None => creates.push(Operation::Create {
                key: note.key.clone(),
                path: VaultPath::new(&note.path),
                content: note.content.clone(),
            }),
            Some(prev) => {
                if prev.path != note.path {
                    renames.push(Operation::Rename {
                        key: note.key.clone(),
                        from: VaultPath::new(&prev.path),
                        to: VaultPath::new(&note.path),
                        content: note.content.clone(),
                    });
                }
                if prev.hash != note.hash {
                    updates.push(Operation::Update {
                        key: note.key.clone(),
                        path: VaultPath::new(&note.path),
                        content: note.content.clone(),
                    });
                }
            }
        }

        new_status.insert(
            note.key.clone(),
            StatusEntry::new(&note.path, &note.hash),
        );
    }

    // Whatever is left vanished from the snapshot entirely.
    for (key, prev) in pending {
        deletes.push(Operation::Delete {
            key,
            path: VaultPath::new(&prev.path),
        });
    }

    let mut operations = renames;
    operations.append(&mut updates);
    operations.append(&mut deletes);
    operations.append(&mut creates);

    Plan {
        operations,
        new_status,
        collisions,
    }
}
