//! Records and libraries
//!
//! A record is one source entity (collection or item) from a remote library
//! snapshot. Records arrive flat; parent references are resolved into trees
//! by the hierarchy module each pass.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Which of the two record families a key is scoped to.
///
/// Keys are unique per kind per library; the two families are reconciled
/// independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Collection,
    Item,
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordKind::Collection => write!(f, "collection"),
            RecordKind::Item => write!(f, "item"),
        }
    }
}

/// One flat record from a library snapshot.
///
/// `parent` references another record of the same kind (collections nest
/// under collections, items under items). The reference is not guaranteed
/// to resolve, or even to be acyclic; the hierarchy builder degrades both
/// cases silently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Unique key within (library, kind)
    pub key: String,
    /// Key of the parent record of the same kind, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Opaque source attributes, passed through to the generator
    #[serde(default)]
    pub data: Value,
}

impl Record {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            parent: None,
            data: Value::Null,
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }
}

/// Build a key-indexed lookup over a flat record slice.
///
/// Last write wins on duplicate keys, which cannot occur in a well-formed
/// snapshot (keys are unique per kind).
pub fn records_by_key(records: &[Record]) -> BTreeMap<String, Record> {
    records
        .iter()
        .map(|r| (r.key.clone(), r.clone()))
        .collect()
}

/// Whether a remote library belongs to a user or a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LibraryKind {
    User,
    Group,
}

/// A remote library: the unit of independent synchronization.
///
/// Each library owns its own snapshot file, status file, and in-flight
/// guard; passes for distinct libraries never share state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Library {
    /// API prefix, e.g. `"users/12345"` or `"groups/67890"`
    pub prefix: String,
    #[serde(rename = "type")]
    pub kind: LibraryKind,
    pub name: String,
}

impl Library {
    pub fn new(prefix: impl Into<String>, kind: LibraryKind, name: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            kind,
            name: name.into(),
        }
    }

    /// Url-safe filename stem for this library's store files.
    ///
    /// Alphanumerics, `-`, `_` and `.` pass through; every other byte is
    /// percent-escaped, so distinct prefixes always map to distinct stems.
    pub fn store_key(&self) -> String {
        let mut out = String::with_capacity(self.prefix.len());
        for byte in self.prefix.bytes() {
            match byte {
                b'0'..=b'9' | b'a'..=b'z' | b'A'..=b'Z' | b'-' | b'_' | b'.' => {
                    out.push(byte as char);
                }
                _ => out.push_str(&format!("%{byte:02X}")),
            }
        }
        out
    }
}
