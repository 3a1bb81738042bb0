use std::collections::HashMap;
use std::collections::hash_map;
use std::net::IpAddr;

use chrono::{DateTime, Utc};
use hostsync_common::network::entry::Entry;

use crate::report::{Event, Observer, Pass};

/// Keeps one entry per address: the most recently observed one, or the first
/// one ingested when timestamps tie. Losers are dropped outright.
pub fn resolve_addresses(entries: Vec<Entry>, observer: &dyn Observer) -> Vec<Entry> {
    let mut slots: HashMap<IpAddr, usize> = HashMap::with_capacity(entries.len());
    let mut dropped: HashMap<IpAddr, usize> = HashMap::new();
    let mut survivors: Vec<Entry> = Vec::with_capacity(entries.len());

    for entry in entries {
        match slots.entry(entry.address()) {
            hash_map::Entry::Occupied(slot) => {
                let existing: &mut Entry = &mut survivors[*slot.get()];
                *dropped.entry(entry.address()).or_default() += 1;
                if entry.observed_at() > existing.observed_at() {
                    *existing = entry;
                }
            }
            hash_map::Entry::Vacant(slot) => {
                slot.insert(survivors.len());
                survivors.push(entry);
            }
        }
    }

    let mut affected: usize = 0;
    for survivor in &survivors {
        if let Some(&count) = dropped.get(&survivor.address()) {
            affected += count;
            observer.observe(Event::DuplicateAddress {
                address: survivor.address(),
                dropped: count,
            });
        }
    }

    observer.observe(Event::PassCompleted {
        pass: Pass::DuplicateAddress,
        affected,
    });
    survivors
}

/// Retires older addresses of a host that has since shown up elsewhere.
///
/// Entries are grouped by primary name (case-insensitive). Within a group,
/// every entry observed earlier than the group's newest entry is dropped.
/// Entries built in the same cycle share a timestamp, so in practice this only
/// removes addresses carried over from a previous cycle.
pub fn resolve_stale_names(entries: Vec<Entry>, observer: &dyn Observer) -> Vec<Entry> {
    let mut newest: HashMap<String, (DateTime<Utc>, IpAddr)> = HashMap::new();
    for entry in &entries {
        let key: String = entry.primary_name().to_lowercase();
        let candidate: (DateTime<Utc>, IpAddr) = (entry.observed_at(), entry.address());
        newest
            .entry(key)
            .and_modify(|current| {
                if candidate.0 > current.0 {
                    *current = candidate;
                }
            })
            .or_insert(candidate);
    }

    let mut affected: usize = 0;
    let survivors: Vec<Entry> = entries
        .into_iter()
        .filter(|entry| {
            let name: String = entry.primary_name().to_lowercase();
            let stale: bool = newest.get(&name).is_some_and(|(seen, address)| {
                entry.observed_at() < *seen && entry.address() != *address
            });
            if stale {
                affected += 1;
                observer.observe(Event::StaleName {
                    name,
                    dropped: entry.address(),
                });
            }
            !stale
        })
        .collect();

    observer.observe(Event::PassCompleted {
        pass: Pass::StaleName,
        affected,
    });
    survivors
}
