//! The generation seam
//!
//! Note paths and content come from a user-suppliable pure function over a
//! record plus lookup maps. Everything user-supplied is treated as hostile
//! to batch health: each call is isolated (one failing record never touches
//! the rest) and timed against a per-record budget.
//!
//! Before hashing, an identifying marker is injected into the content so a
//! vault file can always be traced back to its source record. The marker is
//! deterministic per (library, kind, key), which keeps hashes stable across
//! passes with unchanged inputs.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use tracing::{debug, warn};
use uuid::Uuid;

use litvault_fs::checksum::content_checksum;

use crate::record::{Library, Record, RecordKind};

/// Failure inside a user-supplied generator, scoped to one record.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("{0}")]
    Failed(String),

    #[error("generator exceeded its {budget_ms}ms budget ({elapsed_ms}ms)")]
    BudgetExceeded { budget_ms: u64, elapsed_ms: u64 },
}

/// Lookup maps handed to generators alongside each record.
pub struct GenerateContext<'a> {
    pub library: &'a Library,
    pub collections: &'a BTreeMap<String, Record>,
    pub items: &'a BTreeMap<String, Record>,
}

/// User-suppliable note generation.
///
/// Both methods must be pure with respect to their inputs. `path` returning
/// an empty string means "skip this record": no note, no status entry.
pub trait NoteGenerator {
    fn path(
        &self,
        record: &Record,
        ctx: &GenerateContext<'_>,
    ) -> std::result::Result<String, GenerateError>;

    fn content(
        &self,
        record: &Record,
        ctx: &GenerateContext<'_>,
    ) -> std::result::Result<String, GenerateError>;
}

/// Deterministic marker token for a record.
///
/// v5 UUID over (library prefix, kind, key): identical inputs produce the
/// identical token on every pass.
pub fn marker_token(library: &Library, kind: RecordKind, key: &str) -> Uuid {
    let name = format!("litvault/{}/{}/{}", library.prefix, kind, key);
    Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes())
}

/// The marker comment embedded in generated content.
pub fn marker_comment(library: &Library, kind: RecordKind, key: &str) -> String {
    format!(
        "<!-- litvault:{}:{}:{} -->",
        kind,
        key,
        marker_token(library, kind, key)
    )
}

/// Append the record's marker to content that does not already carry it.
///
/// Hashing happens after injection, so the fingerprint always covers the
/// exact bytes written to the vault.
pub fn inject_marker(content: &str, library: &Library, kind: RecordKind, key: &str) -> String {
    let comment = marker_comment(library, kind, key);
    if content.contains(&comment) {
        return content.to_string();
    }
    let mut out = content.to_string();
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(&comment);
    out.push('\n');
    out
}

/// One record's generation result, ready for reconciliation.
///
/// An empty `path` is a generator opt-out: the record gets no note and no
/// status entry, and any previous note is deleted.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedNote {
    pub key: String,
    pub path: String,
    pub hash: String,
    pub content: String,
}

impl GeneratedNote {
    pub fn skip(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            path: String::new(),
            hash: String::new(),
            content: String::new(),
        }
    }
}

/// A generation failure attributed to one record.
#[derive(Debug)]
pub struct GenerateFailure {
    pub key: String,
    pub kind: RecordKind,
    pub error: GenerateError,
}

/// Batch generation output: successful notes plus isolated failures.
#[derive(Debug, Default)]
pub struct GenerateOutcome {
    pub notes: Vec<GeneratedNote>,
    pub failures: Vec<GenerateFailure>,
}

/// Generate notes for a batch of records of one kind.
///
/// Failures and budget overruns are collected per record; the batch always
/// runs to completion. Records whose generator failed are absent from
/// `notes` entirely, which leaves their previous status untouched upstream.
pub fn generate_batch(
    generator: &dyn NoteGenerator,
    records: &[&Record],
    kind: RecordKind,
    ctx: &GenerateContext<'_>,
    budget: Duration,
) -> GenerateOutcome {
    let mut outcome = GenerateOutcome::default();

    for record in records {
        let started = Instant::now();
        let result = generate_one(generator, record, kind, ctx);
        let elapsed = started.elapsed();

        let result = if elapsed > budget {
            Err(GenerateError::BudgetExceeded {
                budget_ms: budget.as_millis() as u64,
                elapsed_ms: elapsed.as_millis() as u64,
            })
        } else {
            result
        };

        match result {
            Ok(note) => {
                debug!(key = %note.key, path = %note.path, "generated");
                outcome.notes.push(note);
            }
            Err(error) => {
                warn!(key = %record.key, %kind, error = %error, "generation failed, record skipped");
                outcome.failures.push(GenerateFailure {
                    key: record.key.clone(),
                    kind,
                    error,
                });
            }
        }
    }

    outcome
}

fn generate_one(
    generator: &dyn NoteGenerator,
    record: &Record,
    kind: RecordKind,
    ctx: &GenerateContext<'_>,
) -> std::result::Result<GeneratedNote, GenerateError> {
    let path = generator.path(record, ctx)?;
    if path.is_empty() {
        return Ok(GeneratedNote::skip(&record.key));
    }

    let content = generator.content(record, ctx)?;
    let content = inject_marker(&content, ctx.library, kind, &record.key);
    let hash = content_checksum(&content);

    Ok(GeneratedNote {
        key: record.key.clone(),
        path,
        hash,
        content,
    })
}
