//! Hierarchy building over flat parent-referencing records
//!
//! Snapshots arrive flat; generation wants trees (nested note content) and
//! ancestor chains (folder paths). Parent references are untrusted: they
//! may dangle or form cycles, so attachment and upward walks both carry
//! visited-set guards and degrade silently instead of failing.

use std::collections::{BTreeMap, HashSet};

use crate::record::Record;

/// A collection with its child collections materialized.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionNode {
    pub record: Record,
    pub children: Vec<CollectionNode>,
}

/// An item with its child items (attachments, notes) materialized.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemNode {
    pub record: Record,
    pub children: Vec<ItemNode>,
}

fn children_index(records: &[Record]) -> BTreeMap<&str, Vec<&Record>> {
    let keys: HashSet<&str> = records.iter().map(|r| r.key.as_str()).collect();
    let mut index: BTreeMap<&str, Vec<&Record>> = BTreeMap::new();
    for record in records {
        // A dangling parent leaves the child at the root instead
        if let Some(parent) = record.parent.as_deref()
            && keys.contains(parent)
        {
            index.entry(parent).or_default().push(record);
        }
    }
    index
}

fn collection_subtree(
    record: &Record,
    index: &BTreeMap<&str, Vec<&Record>>,
    visited: &mut HashSet<String>,
) -> CollectionNode {
    let mut children = Vec::new();
    if let Some(child_records) = index.get(record.key.as_str()) {
        for child in child_records {
            if visited.insert(child.key.clone()) {
                children.push(collection_subtree(child, index, visited));
            }
        }
    }
    CollectionNode {
        record: record.clone(),
        children,
    }
}

fn item_subtree(
    record: &Record,
    index: &BTreeMap<&str, Vec<&Record>>,
    visited: &mut HashSet<String>,
) -> ItemNode {
    let mut children = Vec::new();
    if let Some(child_records) = index.get(record.key.as_str()) {
        for child in child_records {
            if visited.insert(child.key.clone()) {
                children.push(item_subtree(child, index, visited));
            }
        }
    }
    ItemNode {
        record: record.clone(),
        children,
    }
}

/// Build the collection tree.
///
/// Every collection stays root-addressable: the result holds one node per
/// input collection, each carrying its full subtree. A collection whose
/// parent is absent or unresolvable is simply a subtree root with no
/// duplicate elsewhere.
pub fn build_collection_tree(records: &[Record]) -> Vec<CollectionNode> {
    let index = children_index(records);
    records
        .iter()
        .map(|record| {
            let mut visited = HashSet::from([record.key.clone()]);
            collection_subtree(record, &index, &mut visited)
        })
        .collect()
}

/// Build the item tree.
///
/// Unlike collections, an item attached to a resolvable parent leaves the
/// root set entirely; its content is reachable only through
/// `parent.children`. Items with absent or dangling parents are roots.
pub fn build_item_tree(records: &[Record]) -> Vec<ItemNode> {
    let keys: HashSet<&str> = records.iter().map(|r| r.key.as_str()).collect();
    let index = children_index(records);
    records
        .iter()
        .filter(|record| match record.parent.as_deref() {
            Some(parent) => !keys.contains(parent),
            None => true,
        })
        .map(|record| {
            let mut visited = HashSet::from([record.key.clone()]);
            item_subtree(record, &index, &mut visited)
        })
        .collect()
}

/// Walk parent references upward from `key`, self-first.
///
/// Returns the chain `[self, parent, …, root]`. The walk tracks visited
/// keys and terminates on revisit, so cyclic parent references cannot hang
/// it; a dangling reference simply ends the chain.
pub fn ancestors_of<'a>(key: &str, records: &'a [Record]) -> Vec<&'a Record> {
    let by_key: BTreeMap<&str, &Record> =
        records.iter().map(|r| (r.key.as_str(), r)).collect();

    let mut chain = Vec::new();
    let mut visited = HashSet::new();
    let mut current = Some(key);
    while let Some(k) = current {
        if !visited.insert(k) {
            break;
        }
        match by_key.get(k) {
            Some(record) => {
                chain.push(*record);
                current = record.parent.as_deref();
            }
            None => break,
        }
    }
    chain
}
