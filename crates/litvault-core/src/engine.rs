//! Per-library sync orchestration
//!
//! A pass is sequential end to end: load snapshot, build lookups, generate,
//! reconcile, apply, persist status. At most one pass runs per library at a
//! time; passes for distinct libraries are independent and may run
//! concurrently from separate threads.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use litvault_fs::VaultSink;

use crate::apply::{self, ApplyFailure};
use crate::config::EngineConfig;
use crate::generate::{
    GenerateContext, GenerateFailure, NoteGenerator, generate_batch,
};
use crate::hierarchy::build_item_tree;
use crate::reconcile::{PathCollision, reconcile};
use crate::record::{Library, Record, RecordKind, records_by_key};
use crate::snapshot::{Snapshot, SnapshotStore};
use crate::status::{LibraryStatus, StatusEntry, StatusStore};
use crate::Result;

/// What caused a pass to be requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// User command: bypasses the cooldown, still respects the in-flight
    /// guard.
    Manual,
    /// Periodic timer: suppressed while the cooldown window is open.
    Timer,
    /// First pass after startup.
    Startup,
}

impl Trigger {
    fn respects_cooldown(self) -> bool {
        matches!(self, Trigger::Timer)
    }
}

/// Why a requested pass did not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// A pass for this library is already in flight.
    InFlight,
    /// A timer trigger landed inside the cooldown window.
    Cooldown,
}

/// Result of requesting a pass.
#[derive(Debug)]
pub enum PassOutcome {
    Completed(PassReport),
    Skipped(SkipReason),
}

/// What one completed pass did.
#[derive(Debug)]
pub struct PassReport {
    pub library: String,
    pub trigger: Trigger,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub collections_seen: usize,
    pub items_seen: usize,
    pub operations_planned: usize,
    pub operations_applied: usize,
    pub generate_failures: Vec<GenerateFailure>,
    pub apply_failures: Vec<ApplyFailure>,
    pub collisions: Vec<PathCollision>,
    /// Set when the final status persist failed; the next pass recomputes
    /// the same plan from the old status.
    pub status_warning: Option<String>,
}

#[derive(Default)]
struct EngineState {
    in_flight: HashSet<String>,
    last_finished: HashMap<String, Instant>,
}

/// Clears the in-flight flag on every exit path, including errors.
struct InFlightGuard<'a> {
    state: &'a Mutex<EngineState>,
    key: String,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock().expect("engine state poisoned");
        state.in_flight.remove(&self.key);
        state.last_finished.insert(self.key.clone(), Instant::now());
    }
}

/// The sync engine: owns the store and runs passes per library.
pub struct SyncEngine {
    config: EngineConfig,
    snapshots: SnapshotStore,
    status: StatusStore,
    state: Mutex<EngineState>,
}

impl SyncEngine {
    /// Create an engine from a validated configuration.
    ///
    /// Configuration problems are fatal here, before any mutation.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let snapshots = SnapshotStore::new(&config.store_dir);
        let status = StatusStore::new(&config.store_dir);
        Ok(Self {
            config,
            snapshots,
            status,
            state: Mutex::new(EngineState::default()),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Cache a freshly fetched snapshot for a library.
    ///
    /// The fetch collaborator calls this before triggering a pass; the pass
    /// itself only ever reads the cached snapshot, so a fetch can never
    /// overlap reconciliation for the same pass.
    pub fn store_snapshot(&self, library: &Library, snapshot: &Snapshot) -> Result<()> {
        self.snapshots.save(library, snapshot)
    }

    /// Drop a library's persisted status.
    ///
    /// The next pass re-derives every operation as if the status were
    /// empty; the cached snapshot is kept, so nothing is re-fetched.
    pub fn clear_status(&self, library: &Library) -> Result<()> {
        info!(library = %library.prefix, "clearing status");
        self.status.clear(library)
    }

    /// Run one sync pass for a library.
    ///
    /// Returns `Skipped` when a pass is already in flight for the library
    /// or when a timer trigger lands inside the cooldown window. Errors
    /// never leave the in-flight flag set.
    pub fn run_pass(
        &self,
        library: &Library,
        generator: &dyn NoteGenerator,
        sink: &mut dyn VaultSink,
        trigger: Trigger,
    ) -> Result<PassOutcome> {
        let key = library.store_key();
        {
            let mut state = self.state.lock().expect("engine state poisoned");
            if state.in_flight.contains(&key) {
                debug!(library = %library.prefix, "pass already in flight, skipping");
                return Ok(PassOutcome::Skipped(SkipReason::InFlight));
            }
            if trigger.respects_cooldown()
                && let Some(last) = state.last_finished.get(&key)
                && last.elapsed() < self.config.cooldown()
            {
                debug!(library = %library.prefix, "inside cooldown window, skipping");
                return Ok(PassOutcome::Skipped(SkipReason::Cooldown));
            }
            state.in_flight.insert(key.clone());
        }
        let _guard = InFlightGuard {
            state: &self.state,
            key,
        };

        let report = self.pass_body(library, generator, sink, trigger)?;
        Ok(PassOutcome::Completed(report))
    }

    fn pass_body(
        &self,
        library: &Library,
        generator: &dyn NoteGenerator,
        sink: &mut dyn VaultSink,
        trigger: Trigger,
    ) -> Result<PassReport> {
        let started_at = Utc::now();
        let snapshot = self.snapshots.load(library);
        let previous = self.status.load(library);

        let collections_by_key = records_by_key(&snapshot.collections);
        let items_by_key = records_by_key(&snapshot.items);
        let ctx = GenerateContext {
            library,
            collections: &collections_by_key,
            items: &items_by_key,
        };

        // Every collection is root-addressable, even when nested.
        let collection_records: Vec<&Record> = snapshot.collections.iter().collect();
        // Attached items surface only through their parent's note.
        let item_roots = build_item_tree(&snapshot.items);
        let item_records: Vec<&Record> = item_roots.iter().map(|n| &n.record).collect();

        info!(
            library = %library.prefix,
            collections = collection_records.len(),
            items = item_records.len(),
            ?trigger,
            "sync pass started"
        );

        let mut report = PassReport {
            library: library.prefix.clone(),
            trigger,
            started_at,
            finished_at: started_at,
            collections_seen: snapshot.collections.len(),
            items_seen: snapshot.items.len(),
            operations_planned: 0,
            operations_applied: 0,
            generate_failures: Vec::new(),
            apply_failures: Vec::new(),
            collisions: Vec::new(),
            status_warning: None,
        };

        let mut new_status = LibraryStatus::default();
        for (kind, records) in [
            (RecordKind::Collection, &collection_records),
            (RecordKind::Item, &item_records),
        ] {
            let committed = self.sync_kind(
                kind,
                records,
                generator,
                &ctx,
                previous.kind(kind),
                sink,
                &mut report,
            );
            *new_status.kind_mut(kind) = committed;
        }

        if let Err(e) = self.status.save(library, &new_status) {
            warn!(library = %library.prefix, error = %e, "status persist failed");
            report.status_warning = Some(e.to_string());
        }

        report.finished_at = Utc::now();
        info!(
            library = %library.prefix,
            planned = report.operations_planned,
            applied = report.operations_applied,
            failures = report.apply_failures.len(),
            "sync pass finished"
        );
        Ok(report)
    }

    /// Generate, reconcile and apply one record kind; returns the status
    /// entries to commit for that kind.
    #[allow(clippy::too_many_arguments)]
    fn sync_kind(
        &self,
        kind: RecordKind,
        records: &[&Record],
        generator: &dyn NoteGenerator,
        ctx: &GenerateContext<'_>,
        previous: &std::collections::BTreeMap<String, StatusEntry>,
        sink: &mut dyn VaultSink,
        report: &mut PassReport,
    ) -> std::collections::BTreeMap<String, StatusEntry> {
        let outcome = generate_batch(
            generator,
            records,
            kind,
            ctx,
            self.config.generator_budget(),
        );

        // A record whose generator failed keeps its previous entry exactly
        // as it was: pulled out before the diff (so it is not treated as
        // vanished) and reinstated afterwards.
        let mut diff_previous = previous.clone();
        let mut reinstated = Vec::new();
        for failure in &outcome.failures {
            if let Some(entry) = diff_previous.remove(&failure.key) {
                reinstated.push((failure.key.clone(), entry));
            }
        }

        let mut plan = reconcile(&outcome.notes, &diff_previous);
        report.operations_planned += plan.operations.len();
        report.collisions.extend(plan.collisions.drain(..));
        report.generate_failures.extend(outcome.failures);

        let apply_report = apply::apply(&plan.operations, sink);
        report.operations_applied += apply_report.applied;

        // Withhold entries for keys whose operation failed; keep the old
        // entry instead so the next pass retries the same operation.
        let mut committed = plan.new_status;
        for key in apply_report.failed_keys() {
            committed.remove(key);
            if let Some(entry) = previous.get(key) {
                committed.insert(key.to_string(), entry.clone());
            }
        }
        report.apply_failures.extend(apply_report.failures);

        committed.extend(reinstated);
        committed
    }
}
