//! Grouping of flat record listings into per-file version histories.
//!
//! The default strategy groups by `(filename, creator)` and orders each group
//! newest first. It does not look at `previous_hash` at all, so a broken or
//! forked chain still shows up as a single history. `ByVerifiedChain` walks
//! the links instead and reports what it found.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;

use crate::record::{Principal, Record, RecordId};

/// Grouping key of a history: one logical file of one creator.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct HistoryKey {
    pub filename: String,
    pub creator: Principal,
}

impl HistoryKey {
    pub fn of(record: &Record) -> Self {
        Self {
            filename: record.filename.clone(),
            creator: record.creator.clone(),
        }
    }
}

/// Outcome of following `previous_hash` links for one history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChainStatus {
    /// Links were not inspected (name/owner grouping).
    Unverified,
    /// Every link resolved and the walk ended at a root.
    Intact,
    /// A link names a record that is absent or belongs to another file.
    Broken { missing: RecordId },
    /// The walk came back to a record it had already visited.
    Cycle { at: RecordId },
}

/// Ordered versions of one logical file, current version first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct History {
    pub key: HistoryKey,
    pub versions: Vec<Record>,
    pub status: ChainStatus,
}

impl History {
    /// The current version. Only a hand-built empty history has none.
    pub fn current(&self) -> Option<&Record> {
        self.versions.first()
    }

    /// Versions superseded by the current one, newest first.
    pub fn predecessors(&self) -> &[Record] {
        self.versions.get(1..).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}

/// How a record listing is turned into histories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GroupingStrategy {
    /// Group by `(filename, creator)`, newest first, links ignored.
    #[default]
    ByOwnerAndName,
    /// One history per chain head, following verified `previous_hash` links.
    ByVerifiedChain,
}

impl GroupingStrategy {
    /// Build histories, most recently updated file first.
    pub fn histories(self, records: &[Record]) -> Vec<History> {
        match self {
            Self::ByOwnerAndName => {
                let mut histories: Vec<History> = group(records)
                    .into_iter()
                    .map(|(key, versions)| History {
                        key,
                        versions,
                        status: ChainStatus::Unverified,
                    })
                    .collect();
                histories.sort_by_key(|h| std::cmp::Reverse(h.current().map(|r| r.timestamp)));
                histories
            }
            Self::ByVerifiedChain => verified_chains(records),
        }
    }
}

/// Partition records by `(filename, creator)`.
///
/// Each bucket is ordered by timestamp descending; records with equal
/// timestamps keep their input order.
pub fn group(records: &[Record]) -> BTreeMap<HistoryKey, Vec<Record>> {
    let mut groups: BTreeMap<HistoryKey, Vec<Record>> = BTreeMap::new();
    for record in records {
        groups
            .entry(HistoryKey::of(record))
            .or_default()
            .push(record.clone());
    }
    for versions in groups.values_mut() {
        versions.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    }
    groups
}

/// Records naming `id` as their predecessor.
pub fn successors_of<'a>(records: &'a [Record], id: &RecordId) -> Vec<&'a Record> {
    records
        .iter()
        .filter(|r| r.previous_hash.as_ref() == Some(id))
        .collect()
}

fn verified_chains(records: &[Record]) -> Vec<History> {
    let mut by_id: HashMap<&RecordId, &Record> = HashMap::new();
    for record in records {
        by_id.entry(&record.id).or_insert(record);
    }

    // Only links within the same file count towards "has a successor".
    let mut referenced: HashSet<&RecordId> = HashSet::new();
    for record in records {
        if let Some(prev) = &record.previous_hash {
            if let Some(target) = by_id.get(prev).copied() {
                if target.filename == record.filename && target.creator == record.creator {
                    referenced.insert(&target.id);
                }
            }
        }
    }

    let mut heads: Vec<&Record> = records
        .iter()
        .filter(|r| !referenced.contains(&r.id))
        .collect();
    heads.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    let mut visited: HashSet<&RecordId> = HashSet::new();
    let mut histories = Vec::new();
    for head in heads {
        let (history, seen) = walk(head, &by_id);
        visited.extend(seen);
        histories.push(history);
    }

    // Whatever is left is only reachable through a cycle.
    let mut leftovers: Vec<&Record> = records
        .iter()
        .filter(|r| !visited.contains(&r.id))
        .collect();
    leftovers.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    for record in leftovers {
        if visited.contains(&record.id) {
            continue;
        }
        let (history, seen) = walk(record, &by_id);
        visited.extend(seen);
        histories.push(history);
    }

    histories
}

fn walk<'a>(
    start: &'a Record,
    by_id: &HashMap<&'a RecordId, &'a Record>,
) -> (History, HashSet<&'a RecordId>) {
    let key = HistoryKey::of(start);
    let mut versions = vec![start.clone()];
    let mut seen: HashSet<&'a RecordId> = HashSet::from([&start.id]);
    let mut current = start;

    let status = loop {
        let Some(prev) = &current.previous_hash else {
            break ChainStatus::Intact;
        };
        match by_id.get(prev).copied() {
            Some(p) if p.filename == key.filename && p.creator == key.creator => {
                if !seen.insert(&p.id) {
                    break ChainStatus::Cycle { at: p.id.clone() };
                }
                versions.push(p.clone());
                current = p;
            }
            _ => {
                break ChainStatus::Broken {
                    missing: prev.clone(),
                }
            }
        }
    };

    (
        History {
            key,
            versions,
            status,
        },
        seen,
    )
}
