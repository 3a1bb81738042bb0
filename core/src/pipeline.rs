//! # Merge Pipeline
//!
//! Turns one live inventory snapshot, the statically configured hosts and the
//! previous cycle's result into the next result set.
//!
//! The order of the steps is part of the contract:
//!
//! 1. ingest static hosts, clients, switches, access points
//! 2. carry forward kept entries of the previous result
//! 3. MAC-name policy
//! 4. qualify names
//! 5. block list
//! 6. static-entry exclusivity
//! 7. duplicate addresses, stale names
//! 8. age-based staleness
//! 9. sort by address
//!
//! Carried entries go through every policy pass again, so a configuration
//! change applies to hosts the controller no longer reports.

use std::collections::HashSet;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use hostsync_common::config::Config;
use hostsync_common::network::entry::{Entry, Source};
use hostsync_common::network::inventory::{LiveInventory, Observation};

use crate::filters::blocklist::BlockRule;
use crate::filters::{blocklist, duplicates, exclusivity, mac, staleness};
use crate::projection::records::Alias;
use crate::qualifier::Qualifier;
use crate::report::{Event, Observer};

/// A host defined in configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticHost {
    pub address: String,
    pub names: Vec<String>,
    pub exclusive: bool,
}

/// Everything configurable about reconciliation and projection.
#[derive(Debug, Clone, Default)]
pub struct Policy {
    pub statics: Vec<StaticHost>,
    pub qualifier: Qualifier,
    pub block_rules: Vec<BlockRule>,
    pub aliases: Vec<Alias>,
    pub keep_macs: bool,
    pub max_age: Option<Duration>,
}

impl Policy {
    pub fn from_config(config: &Config) -> Self {
        let processing = &config.processing;
        Self {
            statics: processing
                .additional
                .iter()
                .map(|additional| StaticHost {
                    address: additional.ip.clone(),
                    names: additional.names(),
                    exclusive: additional.exclusive,
                })
                .collect(),
            qualifier: Qualifier::new(&processing.domains),
            block_rules: processing.blocked.iter().map(BlockRule::from).collect(),
            aliases: processing.cnames.iter().map(Alias::from).collect(),
            keep_macs: processing.keep_macs,
            max_age: config.max_age(),
        }
    }
}

pub struct Reconciler {
    policy: Policy,
    observer: Arc<dyn Observer>,
}

impl Reconciler {
    pub fn new(policy: Policy, observer: Arc<dyn Observer>) -> Self {
        Self { policy, observer }
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Runs one reconciliation pass. Pure apart from the observer: the same
    /// inputs and `now` always produce the same output.
    ///
    /// The result holds exactly one entry per address, sorted by address,
    /// including removed entries so that their disposition can be inspected.
    pub fn reconcile(
        &self,
        live: &LiveInventory,
        previous: &[Entry],
        now: DateTime<Utc>,
    ) -> Vec<Entry> {
        let observer: &dyn Observer = self.observer.as_ref();
        let mut entries: Vec<Entry> = self.ingest(live, now);
        self.carry_forward(&mut entries, previous);

        mac::apply(&mut entries, self.policy.keep_macs, observer);

        for entry in entries.iter_mut() {
            self.policy.qualifier.qualify(entry);
        }

        blocklist::apply(&mut entries, &self.policy.block_rules, observer);
        exclusivity::apply(&mut entries, &self.policy.qualifier, observer);

        let entries: Vec<Entry> = duplicates::resolve_addresses(entries, observer);
        let mut entries: Vec<Entry> = duplicates::resolve_stale_names(entries, observer);

        staleness::apply(&mut entries, self.policy.max_age, now, observer);

        entries.sort_by_key(Entry::address);

        observer.observe(Event::Reconciled {
            total: entries.len(),
            kept: entries.iter().filter(|entry| entry.is_kept()).count(),
        });
        entries
    }

    fn ingest(&self, live: &LiveInventory, now: DateTime<Utc>) -> Vec<Entry> {
        let mut entries: Vec<Entry> = Vec::new();

        let statics = self.policy.statics.iter().map(|host| {
            Entry::new(&host.address, host.names.iter().cloned(), Source::Static, now)
                .map(|entry| entry.with_exclusive(host.exclusive))
                .map_err(|err| (host.address.clone(), err))
        });
        self.collect(Source::Static, statics, &mut entries);

        let sources: [(Source, &[Observation]); 3] = [
            (Source::Client, &live.clients),
            (Source::Switch, &live.devices.switches),
            (Source::AccessPoint, &live.devices.access_points),
        ];
        for (source, observations) in sources {
            let built = observations.iter().map(|obs| {
                Entry::new(&obs.address, [obs.display_name()], source, now)
                    .map(|entry| entry.with_reported_seen(obs.last_seen))
                    .map_err(|err| (obs.address.clone(), err))
            });
            self.collect(source, built, &mut entries);
        }

        entries
    }

    fn collect<I, E>(&self, source: Source, built: I, entries: &mut Vec<Entry>)
    where
        I: Iterator<Item = Result<Entry, (String, E)>>,
        E: std::fmt::Display,
    {
        let mut count: usize = 0;
        for result in built {
            match result {
                Ok(entry) => {
                    entries.push(entry);
                    count += 1;
                }
                Err((address, err)) => self.observer.observe(Event::TupleDropped {
                    source,
                    address,
                    reason: err.to_string(),
                }),
            }
        }
        self.observer.observe(Event::Ingested { source, count });
    }

    /// Appends the previous cycle's kept entries whose address was not
    /// observed this cycle. Static hosts come from the current configuration
    /// only.
    fn carry_forward(&self, entries: &mut Vec<Entry>, previous: &[Entry]) {
        let seen: HashSet<IpAddr> = entries.iter().map(Entry::address).collect();
        let carried: Vec<Entry> = previous
            .iter()
            .filter(|entry| entry.is_kept() && entry.source() != Source::Static)
            .filter(|entry| !seen.contains(&entry.address()))
            .cloned()
            .collect();

        self.observer.observe(Event::CarriedForward {
            count: carried.len(),
        });
        entries.extend(carried);
    }
}
