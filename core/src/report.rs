//! # Pipeline Events
//!
//! Everything the engine wants to tell the outside world goes through an
//! [`Observer`] handed to it at construction time. The binary installs a
//! [`TracingObserver`]; tests install a [`MemoryObserver`] and assert on the
//! captured events.

use std::fmt;
use std::net::IpAddr;
use std::sync::Mutex;

use chrono::TimeDelta;
use hostsync_common::network::entry::Source;
use tracing::{debug, info, warn};

/// The reconciliation passes, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pass {
    MacNames,
    BlockList,
    Exclusivity,
    DuplicateAddress,
    StaleName,
    Age,
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label: &str = match self {
            Pass::MacNames => "mac-names",
            Pass::BlockList => "block-list",
            Pass::Exclusivity => "exclusivity",
            Pass::DuplicateAddress => "duplicate-address",
            Pass::StaleName => "stale-name",
            Pass::Age => "age",
        };
        f.write_str(label)
    }
}

/// The inventory call that was in flight when a fetch failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStage {
    Sites,
    Clients,
    Devices,
}

impl fmt::Display for FetchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label: &str = match self {
            FetchStage::Sites => "sites",
            FetchStage::Clients => "clients",
            FetchStage::Devices => "devices",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    CycleStarted {
        previous: usize,
    },
    InventoryFetched {
        sites: usize,
        clients: usize,
        switches: usize,
        gateways: usize,
        access_points: usize,
    },
    CycleAborted {
        stage: FetchStage,
        reason: String,
        retained: usize,
    },
    Ingested {
        source: Source,
        count: usize,
    },
    TupleDropped {
        source: Source,
        address: String,
        reason: String,
    },
    MacNamesStripped {
        address: IpAddr,
        names: Vec<String>,
    },
    MacOnlyRemoved {
        address: IpAddr,
        names: Vec<String>,
    },
    MacNamesRewritten {
        address: IpAddr,
        count: usize,
    },
    Blocked {
        address: IpAddr,
        name: String,
        rule: usize,
    },
    ExclusiveNameRemoved {
        address: IpAddr,
        name: String,
        emptied: bool,
    },
    CarriedForward {
        count: usize,
    },
    DuplicateAddress {
        address: IpAddr,
        dropped: usize,
    },
    StaleName {
        name: String,
        dropped: IpAddr,
    },
    AgedOut {
        address: IpAddr,
        age: TimeDelta,
    },
    PassCompleted {
        pass: Pass,
        affected: usize,
    },
    Reconciled {
        total: usize,
        kept: usize,
    },
    HostsWritten {
        hosts: usize,
    },
    NameConflict {
        name: String,
        kept: IpAddr,
        ignored: IpAddr,
    },
    AliasSkipped {
        alias: String,
        target: String,
    },
    RecordsUpdated {
        count: usize,
    },
    RecordsInserted {
        count: usize,
    },
    HostsSighted {
        count: usize,
    },
}

pub trait Observer: Send + Sync {
    fn observe(&self, event: Event);
}

/// Forwards events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn observe(&self, event: Event) {
        match event {
            Event::CycleStarted { previous } => {
                info!("Starting new host file generation");
                info!("{previous} existing hosts in the hostmap");
            }
            Event::InventoryFetched {
                sites,
                clients,
                switches,
                gateways,
                access_points,
            } => {
                info!("{sites} sites found");
                info!("{clients} clients connected");
                info!("{switches} switches found");
                info!("{gateways} gateways found");
                info!("{access_points} wireless access points found");
            }
            Event::CycleAborted {
                stage,
                reason,
                retained,
            } => {
                warn!(%stage, "error getting {stage}: {reason}");
                warn!("not updating list of hosts this round, keeping {retained} hosts");
            }
            Event::Ingested { source, count } => debug!(%source, count, "ingested entries"),
            Event::TupleDropped {
                source,
                address,
                reason,
            } => warn!(%source, %address, "dropping record: {reason}"),
            Event::MacNamesStripped { address, names } => {
                debug!(%address, ?names, "stripped MAC names")
            }
            Event::MacOnlyRemoved { address, names } => {
                debug!(%address, ?names, "host only has MAC names")
            }
            Event::MacNamesRewritten { address, count } => {
                debug!(%address, count, "rewrote MAC names")
            }
            Event::Blocked {
                address,
                name,
                rule,
            } => warn!(
                "host name={name} ip={address} is blocked from appearing in output by rule {rule}"
            ),
            Event::ExclusiveNameRemoved {
                address,
                name,
                emptied,
            } => warn!(%address, emptied, "name {name} is reserved by a static host"),
            Event::CarriedForward { count } => debug!(count, "carried forward from last cycle"),
            Event::DuplicateAddress { address, dropped } => {
                debug!(%address, dropped, "dropped older hosts sharing an address")
            }
            Event::StaleName { name, dropped } => {
                info!(%dropped, "dropped stale address for {name}")
            }
            Event::AgedOut { address, age } => {
                info!(%address, age_secs = age.num_seconds(), "host aged out")
            }
            Event::PassCompleted { pass, affected } => info!(%pass, affected, "pass completed"),
            Event::Reconciled { total, kept } => info!(total, kept, "reconciled hosts"),
            Event::HostsWritten { hosts } => info!("wrote {hosts} hosts"),
            Event::NameConflict {
                name,
                kept,
                ignored,
            } => warn!(%kept, %ignored, "name {name} claimed by more than one address"),
            Event::AliasSkipped { alias, target } => warn!(
                "CNAME target '{target}' for '{alias}' not found in hosts, skipping database entry"
            ),
            Event::RecordsUpdated { count } => match count {
                0 => info!("no database records to update"),
                _ => info!("updated {count} database records"),
            },
            Event::RecordsInserted { count } => match count {
                0 => info!("no database records to insert"),
                _ => info!("inserted {count} database records"),
            },
            Event::HostsSighted { count } => debug!(count, "recorded host sightings"),
        }
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct MemoryObserver {
    events: Mutex<Vec<Event>>,
}

impl MemoryObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// How many entries `pass` touched, summed over all runs.
    pub fn affected(&self, pass: Pass) -> usize {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::PassCompleted { pass: p, affected } if p == pass => Some(affected),
                _ => None,
            })
            .sum()
    }
}

impl Observer for MemoryObserver {
    fn observe(&self, event: Event) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
