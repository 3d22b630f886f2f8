//! Plan application against a vault sink
//!
//! The plan is advisory relative to live vault state: notes may have been
//! moved or deleted by hand since the status was persisted. Every operation
//! therefore degrades toward the desired end state instead of failing on a
//! surprising precondition, and one operation's failure never aborts the
//! rest of the batch.

use litvault_fs::{VaultPath, VaultSink};
use tracing::{debug, warn};

use crate::reconcile::Operation;

/// One operation's I/O failure, attributed to its record key.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplyFailure {
    pub key: String,
    pub path: String,
    pub message: String,
}

/// What happened when a plan was applied.
#[derive(Debug, Default)]
pub struct ApplyReport {
    /// Operations that reached their desired end state.
    pub applied: usize,
    /// Per-operation failures, in plan order.
    pub failures: Vec<ApplyFailure>,
}

impl ApplyReport {
    /// Keys whose operation failed; their new status entries are withheld
    /// so the next pass retries them.
    pub fn failed_keys(&self) -> impl Iterator<Item = &str> {
        self.failures.iter().map(|f| f.key.as_str())
    }
}

/// Apply a plan's operations, in plan order, against a sink.
///
/// Operations for one library are strictly sequential; callers own any
/// cross-library parallelism.
pub fn apply(operations: &[Operation], sink: &mut dyn VaultSink) -> ApplyReport {
    let mut report = ApplyReport::default();

    for op in operations {
        match apply_one(op, sink) {
            Ok(()) => {
                debug!(key = op.key(), path = %op.target(), "applied");
                report.applied += 1;
            }
            Err(e) => {
                warn!(key = op.key(), path = %op.target(), error = %e, "operation failed, continuing");
                report.failures.push(ApplyFailure {
                    key: op.key().to_string(),
                    path: op.target().as_str().to_string(),
                    message: e.to_string(),
                });
            }
        }
    }

    report
}

fn ensure_parent(sink: &mut dyn VaultSink, path: &VaultPath) -> litvault_fs::Result<()> {
    if let Some(parent) = path.parent() {
        sink.ensure_directory(&parent)?;
    }
    Ok(())
}

fn apply_one(op: &Operation, sink: &mut dyn VaultSink) -> litvault_fs::Result<()> {
    match op {
        Operation::Rename { from, to, content, .. } => {
            ensure_parent(sink, to)?;
            if sink.exists(from) {
                sink.rename(from, to)?;
                // The moved file may hold stale bytes; settle the content.
                sink.modify(to, content)
            } else {
                sink.create(to, content)
            }
        }
        Operation::Update { path, content, .. } => {
            ensure_parent(sink, path)?;
            if sink.exists(path) {
                sink.modify(path, content)
            } else {
                sink.create(path, content)
            }
        }
        Operation::Create { path, content, .. } => {
            ensure_parent(sink, path)?;
            if sink.exists(path) {
                sink.modify(path, content)
            } else {
                sink.create(path, content)
            }
        }
        Operation::Delete { path, .. } => {
            if sink.exists(path) {
                sink.remove(path)
            } else {
                // Already gone: exactly the desired end state.
                Ok(())
            }
        }
    }
}
