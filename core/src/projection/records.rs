//! # Record Diff
//!
//! Compares the kept entries of a result set with the address and alias
//! records already held by a [`RecordStore`] and produces the minimal batch of
//! updates and inserts that brings the store in line.
//!
//! Records are never deleted. A name that disappears from the network keeps
//! its last record until someone removes it by hand. The same holds across
//! address families: a host that moves from IPv4 to IPv6 gets a new AAAA
//! record while its old A record stays, so the name resolves to both.

use std::collections::HashMap;
use std::collections::hash_map;
use std::fmt;
use std::net::IpAddr;

use chrono::{DateTime, Utc};
use hostsync_common::config::Cname;
use hostsync_common::network::entry::Entry;
use thiserror::Error;

use crate::report::{Event, Observer};

pub const DEFAULT_TTL: u32 = 3600;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    A,
    Aaaa,
    Cname,
}

impl RecordType {
    /// The address record type for `address`.
    pub fn for_address(address: IpAddr) -> Self {
        match address {
            IpAddr::V4(_) => RecordType::A,
            IpAddr::V6(_) => RecordType::Aaaa,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
            RecordType::Cname => "CNAME",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Store-assigned identifier; `None` until inserted.
    pub id: Option<i64>,
    pub name: String,
    pub kind: RecordType,
    pub content: String,
    pub ttl: u32,
}

impl Record {
    pub fn new(name: impl Into<String>, kind: RecordType, content: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            kind,
            content: content.into(),
            ttl: DEFAULT_TTL,
        }
    }
}

/// A configured `alias -> target` rule, published as a CNAME record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alias {
    pub alias: String,
    pub target: String,
}

impl Alias {
    pub fn new(alias: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            target: target.into(),
        }
    }
}

impl From<&Cname> for Alias {
    fn from(cname: &Cname) -> Self {
        Alias::new(cname.cname.trim(), cname.hostname.trim())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordBatch {
    pub updates: Vec<Record>,
    pub inserts: Vec<Record>,
}

impl RecordBatch {
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty() && self.inserts.is_empty()
    }
}

/// One host observed on the network, kept as a history alongside the records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sighting {
    pub name: String,
    pub address: IpAddr,
    pub seen_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {kind} records")]
    Read {
        kind: RecordType,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("failed to apply record batch ({updates} updates, {inserts} inserts)")]
    Apply {
        updates: usize,
        inserts: usize,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("failed to record host sightings")]
    Sightings {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Relational storage for published records.
pub trait RecordStore: Send {
    fn records_of_type(&self, kind: RecordType) -> Result<Vec<Record>, StoreError>;

    /// Applies every update and insert of `batch`, or none of them.
    fn apply(&mut self, batch: &RecordBatch) -> Result<(), StoreError>;

    /// Upserts sightings by name, keeping the first time each name was seen.
    fn record_sightings(&mut self, sightings: &[Sighting]) -> Result<(), StoreError>;
}

/// Counts reported by [`sync`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub updated: usize,
    pub inserted: usize,
    pub sighted: usize,
}

fn trim_name(name: &str) -> &str {
    name.trim().trim_end_matches('.')
}

/// Builds the published `name -> address` map from kept entries, in entry
/// order. The first address to claim a name keeps it.
pub fn name_map(entries: &[Entry], observer: &dyn Observer) -> Vec<(String, IpAddr)> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut names: Vec<(String, IpAddr)> = Vec::new();

    for entry in entries.iter().filter(|entry| entry.is_kept()) {
        for fqdn in entry.qualified_names() {
            let name: &str = trim_name(fqdn);
            if name.is_empty() {
                continue;
            }
            match index.entry(name.to_string()) {
                hash_map::Entry::Occupied(slot) => {
                    let kept: IpAddr = names[*slot.get()].1;
                    if kept != entry.address() {
                        observer.observe(Event::NameConflict {
                            name: name.to_string(),
                            kept,
                            ignored: entry.address(),
                        });
                    }
                }
                hash_map::Entry::Vacant(slot) => {
                    slot.insert(names.len());
                    names.push((name.to_string(), entry.address()));
                }
            }
        }
    }

    names
}

fn by_name(existing: &[Record]) -> HashMap<(&str, RecordType), &Record> {
    let mut map: HashMap<(&str, RecordType), &Record> = HashMap::with_capacity(existing.len());
    for record in existing {
        map.entry((record.name.as_str(), record.kind)).or_insert(record);
    }
    map
}

/// Diffs the kept entries and alias rules against `existing` records.
pub fn plan(
    existing: &[Record],
    entries: &[Entry],
    aliases: &[Alias],
    observer: &dyn Observer,
) -> RecordBatch {
    let existing: HashMap<(&str, RecordType), &Record> = by_name(existing);
    let names: Vec<(String, IpAddr)> = name_map(entries, observer);
    let mut batch: RecordBatch = RecordBatch::default();

    let mut stage = |name: &str, kind: RecordType, content: String| match existing.get(&(name, kind)) {
        Some(record) if record.content != content => batch.updates.push(Record {
            content,
            ..(*record).clone()
        }),
        Some(_) => {}
        None => batch.inserts.push(Record::new(name, kind, content)),
    };

    for (name, address) in &names {
        stage(name, RecordType::for_address(*address), address.to_string());
    }

    for alias in aliases {
        let name: &str = trim_name(&alias.alias);
        let target: &str = trim_name(&alias.target);
        if name.is_empty() {
            continue;
        }
        if !names.iter().any(|(published, _)| published == target) {
            observer.observe(Event::AliasSkipped {
                alias: alias.alias.clone(),
                target: alias.target.clone(),
            });
            continue;
        }
        stage(name, RecordType::Cname, target.to_string());
    }

    batch
}

/// Brings `store` in line with the kept entries of `entries` and records a
/// sighting for each of them.
pub fn sync(
    store: &mut dyn RecordStore,
    entries: &[Entry],
    aliases: &[Alias],
    observer: &dyn Observer,
) -> Result<SyncSummary, StoreError> {
    let mut existing: Vec<Record> = Vec::new();
    for kind in [RecordType::A, RecordType::Aaaa, RecordType::Cname] {
        existing.extend(store.records_of_type(kind)?);
    }

    let batch: RecordBatch = plan(&existing, entries, aliases, observer);
    if !batch.is_empty() {
        store.apply(&batch)?;
    }
    observer.observe(Event::RecordsUpdated {
        count: batch.updates.len(),
    });
    observer.observe(Event::RecordsInserted {
        count: batch.inserts.len(),
    });

    let sightings: Vec<Sighting> = entries
        .iter()
        .filter(|entry| entry.is_kept())
        .map(|entry| Sighting {
            name: entry.primary_name().to_lowercase(),
            address: entry.address(),
            seen_at: entry.observed_at(),
        })
        .collect();
    store.record_sightings(&sightings)?;
    observer.observe(Event::HostsSighted {
        count: sightings.len(),
    });

    Ok(SyncSummary {
        updated: batch.updates.len(),
        inserted: batch.inserts.len(),
        sighted: sightings.len(),
    })
}
