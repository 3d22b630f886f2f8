//! Incremental reconciliation engine for litvault
//!
//! litvault keeps a derived Markdown vault in sync with flat snapshots of
//! remote reference libraries. Given a snapshot and the status persisted
//! after the previous pass, the engine computes the minimal ordered set of
//! vault operations (rename, update, delete, create), applies them with
//! per-operation failure isolation, and persists the new status.
//!
//! # Architecture
//!
//! A pass flows through the modules in order:
//!
//! ```text
//! snapshot -> hierarchy -> generate -> reconcile -> apply -> status
//!                              |                      |
//!                       NoteGenerator            VaultSink
//!                      (user-supplied)         (litvault-fs)
//! ```
//!
//! The remote client that produces snapshots, the note generator, and any
//! UI are external collaborators; the engine's only entry points are
//! [`SyncEngine::run_pass`] and [`SyncEngine::clear_status`].

pub mod apply;
pub mod config;
pub mod engine;
pub mod error;
pub mod generate;
pub mod hierarchy;
pub mod reconcile;
pub mod record;
pub mod snapshot;
pub mod status;

pub use apply::{ApplyFailure, ApplyReport};
pub use config::EngineConfig;
pub use engine::{PassOutcome, PassReport, SkipReason, SyncEngine, Trigger};
pub use error::{Error, Result};
pub use generate::{
    GenerateContext, GenerateError, GeneratedNote, NoteGenerator, inject_marker, marker_comment,
};
pub use hierarchy::{CollectionNode, ItemNode, ancestors_of, build_collection_tree, build_item_tree};
pub use reconcile::{Operation, PathCollision, Plan, reconcile};
pub use record::{Library, LibraryKind, Record, RecordKind, records_by_key};
pub use snapshot::{Snapshot, SnapshotStore};
pub use status::{LibraryStatus, StatusEntry, StatusStore};
