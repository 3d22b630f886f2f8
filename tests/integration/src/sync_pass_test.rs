//! End-to-end sync pass tests
//!
//! These exercise the complete flow against real tempdir vaults: snapshot
//! cache -> hierarchy -> generation -> reconciliation -> apply -> status.

use std::fs;

use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::TempDir;

use litvault_core::{
    EngineConfig, GenerateContext, GenerateError, Library, LibraryKind, NoteGenerator,
    PassOutcome, PassReport, Record, Snapshot, StatusStore, SyncEngine, Trigger,
};
use litvault_fs::FsVault;

/// Collections become `Collections/<name>.md`; items with a citekey become
/// `References/<citekey>.md` listing their attached children; items
/// without a citekey are skipped.
struct ReferenceGenerator;

impl NoteGenerator for ReferenceGenerator {
    fn path(
        &self,
        record: &Record,
        ctx: &GenerateContext<'_>,
    ) -> Result<String, GenerateError> {
        if ctx.collections.contains_key(&record.key) {
            let name = record.data["name"].as_str().unwrap_or(&record.key);
            return Ok(format!("Collections/{name}.md"));
        }
        match record.data["citekey"].as_str() {
            Some(citekey) => Ok(format!("References/{citekey}.md")),
            None => Ok(String::new()),
        }
    }

    fn content(
        &self,
        record: &Record,
        ctx: &GenerateContext<'_>,
    ) -> Result<String, GenerateError> {
        let title = record.data["title"]
            .as_str()
            .or_else(|| record.data["name"].as_str())
            .unwrap_or(&record.key);
        let mut out = format!("# {title}\n");
        // Attached children surface inside the parent's note.
        for child in ctx.items.values() {
            if child.parent.as_deref() == Some(record.key.as_str()) {
                let child_title = child.data["title"].as_str().unwrap_or(&child.key);
                out.push_str(&format!("- {child_title}\n"));
            }
        }
        Ok(out)
    }
}

struct Harness {
    store: TempDir,
    vault: TempDir,
    engine: SyncEngine,
    library: Library,
}

impl Harness {
    fn new() -> Self {
        let store = TempDir::new().unwrap();
        let vault = TempDir::new().unwrap();
        let engine = SyncEngine::new(EngineConfig::new(store.path(), vault.path())).unwrap();
        let library = Library::new("groups/12345", LibraryKind::Group, "Lab");
        Self {
            store,
            vault,
            engine,
            library,
        }
    }

    fn set_snapshot(&self, snapshot: &Snapshot) {
        self.engine.store_snapshot(&self.library, snapshot).unwrap();
    }

    fn run(&self) -> PassReport {
        let mut sink = FsVault::new(self.vault.path());
        match self
            .engine
            .run_pass(&self.library, &ReferenceGenerator, &mut sink, Trigger::Manual)
            .unwrap()
        {
            PassOutcome::Completed(report) => report,
            PassOutcome::Skipped(reason) => panic!("pass skipped: {reason:?}"),
        }
    }

    fn note(&self, rel: &str) -> String {
        fs::read_to_string(self.vault.path().join(rel)).unwrap()
    }

    fn note_exists(&self, rel: &str) -> bool {
        self.vault.path().join(rel).exists()
    }

    fn status_path(&self) -> std::path::PathBuf {
        StatusStore::new(self.store.path()).status_path(&self.library)
    }
}

fn item(key: &str, citekey: &str, title: &str) -> Record {
    Record::new(key).with_data(json!({ "citekey": citekey, "title": title }))
}

fn collection(key: &str, name: &str) -> Record {
    Record::new(key).with_data(json!({ "name": name }))
}

#[test]
fn full_sync_creates_notes_for_collections_and_items() {
    let harness = Harness::new();
    harness.set_snapshot(&Snapshot {
        collections: vec![collection("C1", "Methods")],
        items: vec![
            item("X1", "Doe2019", "Doe 2019"),
            Record::new("A1")
                .with_parent("X1")
                .with_data(json!({ "title": "Supplement PDF" })),
        ],
    });

    let report = harness.run();

    // Collection note, item note; the attached child has no note of its own.
    assert_eq!(report.operations_planned, 2);
    assert_eq!(report.operations_applied, 2);
    assert!(harness.note_exists("Collections/Methods.md"));
    assert!(harness.note_exists("References/Doe2019.md"));

    let note = harness.note("References/Doe2019.md");
    assert!(note.contains("# Doe 2019"));
    assert!(note.contains("- Supplement PDF"));
    assert!(note.contains("<!-- litvault:item:X1:"));
}

#[test]
fn rerun_after_successful_pass_plans_nothing() {
    let harness = Harness::new();
    harness.set_snapshot(&Snapshot {
        collections: vec![collection("C1", "Methods")],
        items: vec![item("X1", "Doe2019", "Doe 2019")],
    });

    harness.run();
    let second = harness.run();

    assert_eq!(second.operations_planned, 0);
    assert_eq!(second.operations_applied, 0);
}

#[test]
fn citekey_change_renames_the_note_in_place() {
    let harness = Harness::new();
    harness.set_snapshot(&Snapshot {
        collections: vec![],
        items: vec![item("X1", "Doe2019", "Doe 2019")],
    });
    harness.run();
    let before = harness.note("References/Doe2019.md");

    // Same content, new path: a pure rename.
    harness.set_snapshot(&Snapshot {
        collections: vec![],
        items: vec![item("X1", "Doe2020", "Doe 2019")],
    });
    let report = harness.run();

    assert_eq!(report.operations_planned, 1);
    assert!(!harness.note_exists("References/Doe2019.md"));
    assert_eq!(harness.note("References/Doe2020.md"), before);
}

#[test]
fn title_change_updates_content_without_moving() {
    let harness = Harness::new();
    harness.set_snapshot(&Snapshot {
        collections: vec![],
        items: vec![item("X1", "Doe2019", "Doe 2019")],
    });
    harness.run();

    harness.set_snapshot(&Snapshot {
        collections: vec![],
        items: vec![item("X1", "Doe2019", "Doe 2019 (revised)")],
    });
    let report = harness.run();

    assert_eq!(report.operations_planned, 1);
    assert!(harness.note("References/Doe2019.md").contains("(revised)"));
}

#[test]
fn losing_the_citekey_deletes_the_note() {
    let harness = Harness::new();
    harness.set_snapshot(&Snapshot {
        collections: vec![],
        items: vec![item("X1", "Doe2019", "Doe 2019")],
    });
    harness.run();
    assert!(harness.note_exists("References/Doe2019.md"));

    harness.set_snapshot(&Snapshot {
        collections: vec![],
        items: vec![Record::new("X1").with_data(json!({ "title": "Doe 2019" }))],
    });
    let report = harness.run();

    assert_eq!(report.operations_planned, 1);
    assert!(!harness.note_exists("References/Doe2019.md"));

    let status = StatusStore::new(harness.store.path()).load(&harness.library);
    assert!(!status.items.contains_key("X1"));
}

#[test]
fn vanished_record_is_cleaned_up() {
    let harness = Harness::new();
    harness.set_snapshot(&Snapshot {
        collections: vec![],
        items: vec![
            item("X1", "Doe2019", "Doe 2019"),
            item("X2", "Roe2021", "Roe 2021"),
        ],
    });
    harness.run();

    harness.set_snapshot(&Snapshot {
        collections: vec![],
        items: vec![item("X1", "Doe2019", "Doe 2019")],
    });
    harness.run();

    assert!(harness.note_exists("References/Doe2019.md"));
    assert!(!harness.note_exists("References/Roe2021.md"));
}

#[test]
fn corrupt_status_file_triggers_a_clean_rebuild() {
    let harness = Harness::new();
    harness.set_snapshot(&Snapshot {
        collections: vec![],
        items: vec![item("X1", "Doe2019", "Doe 2019")],
    });
    harness.run();

    fs::write(harness.status_path(), "not json at all").unwrap();

    let report = harness.run();

    // Status lost: the pass replans the create and lands on identical bytes.
    assert_eq!(report.operations_planned, 1);
    assert!(harness.note_exists("References/Doe2019.md"));

    // Status file is valid again afterwards.
    let status = StatusStore::new(harness.store.path()).load(&harness.library);
    assert!(status.items.contains_key("X1"));
}

#[test]
fn clear_status_then_pass_rebuilds_from_cached_snapshot() {
    let harness = Harness::new();
    harness.set_snapshot(&Snapshot {
        collections: vec![collection("C1", "Methods")],
        items: vec![item("X1", "Doe2019", "Doe 2019")],
    });
    harness.run();
    let before = harness.note("References/Doe2019.md");

    harness.engine.clear_status(&harness.library).unwrap();
    let report = harness.run();

    assert_eq!(report.operations_planned, 2);
    assert_eq!(harness.note("References/Doe2019.md"), before);
}

#[test]
fn unchanged_inputs_yield_unchanged_bytes_across_passes() {
    let harness = Harness::new();
    let snapshot = Snapshot {
        collections: vec![],
        items: vec![item("X1", "Doe2019", "Doe 2019")],
    };
    harness.set_snapshot(&snapshot);
    harness.run();
    let first = harness.note("References/Doe2019.md");

    harness.engine.clear_status(&harness.library).unwrap();
    harness.run();

    // Marker included: a full rebuild writes byte-identical content.
    assert_eq!(harness.note("References/Doe2019.md"), first);
}

#[test]
fn status_file_survives_on_disk_between_engines() {
    let harness = Harness::new();
    harness.set_snapshot(&Snapshot {
        collections: vec![],
        items: vec![item("X1", "Doe2019", "Doe 2019")],
    });
    harness.run();

    // A brand-new engine over the same store plans nothing.
    let engine = SyncEngine::new(EngineConfig::new(
        harness.store.path(),
        harness.vault.path(),
    ))
    .unwrap();
    let mut sink = FsVault::new(harness.vault.path());
    let outcome = engine
        .run_pass(&harness.library, &ReferenceGenerator, &mut sink, Trigger::Startup)
        .unwrap();

    match outcome {
        PassOutcome::Completed(report) => assert_eq!(report.operations_planned, 0),
        PassOutcome::Skipped(reason) => panic!("pass skipped: {reason:?}"),
    }
}

#[test]
fn independent_libraries_do_not_share_state() {
    let store = TempDir::new().unwrap();
    let vault = TempDir::new().unwrap();
    let engine = SyncEngine::new(EngineConfig::new(store.path(), vault.path())).unwrap();
    let lab = Library::new("groups/1", LibraryKind::Group, "Lab");
    let personal = Library::new("users/2", LibraryKind::User, "Personal");

    engine
        .store_snapshot(
            &lab,
            &Snapshot {
                collections: vec![],
                items: vec![item("X1", "Lab2020", "Lab paper")],
            },
        )
        .unwrap();
    engine
        .store_snapshot(
            &personal,
            &Snapshot {
                collections: vec![],
                items: vec![item("X1", "Me2021", "My paper")],
            },
        )
        .unwrap();

    let mut sink = FsVault::new(vault.path());
    for library in [&lab, &personal] {
        engine
            .run_pass(library, &ReferenceGenerator, &mut sink, Trigger::Manual)
            .unwrap();
    }

    // Same record key, different libraries, both notes present.
    assert!(vault.path().join("References/Lab2020.md").exists());
    assert!(vault.path().join("References/Me2021.md").exists());

    let status_store = StatusStore::new(store.path());
    assert!(status_store.load(&lab).items.contains_key("X1"));
    assert!(status_store.load(&personal).items.contains_key("X1"));
}

#[test]
fn store_files_are_scoped_per_library_prefix() {
    let harness = Harness::new();
    harness.set_snapshot(&Snapshot::default());
    harness.run();

    let expected = harness.store.path().join("groups%2F12345.status.json");
    assert!(expected.exists());
}
