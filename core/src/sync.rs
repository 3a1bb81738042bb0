//! # Sync Service
//!
//! Drives one fetch-reconcile-publish cycle against an [`Inventory`] port.
//!
//! A cycle either refreshes the result set or, when any inventory call fails,
//! retains the previous one untouched. Partial live data is never merged.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use hostsync_common::network::entry::Entry;
use hostsync_common::network::inventory::{Devices, LiveInventory, Observation, Site};
use thiserror::Error;

use crate::inventory::Inventory;
use crate::pipeline::{Policy, Reconciler};
use crate::projection::hosts_file::{self, HostsSink};
use crate::projection::records::{self, RecordStore, SyncSummary};
use crate::report::{Event, FetchStage, Observer};

/// The output a publish step was writing when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishTarget {
    HostsFile,
    Records,
}

impl fmt::Display for PublishTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishTarget::HostsFile => f.write_str("hosts file"),
            PublishTarget::Records => f.write_str("record store"),
        }
    }
}

#[derive(Debug, Error)]
pub enum CycleError {
    #[error("failed to fetch {stage} from the controller")]
    SourceFetchFailed {
        stage: FetchStage,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
    #[error("failed to write the {target}")]
    PersistenceFailed {
        target: PublishTarget,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

#[derive(Debug)]
pub enum CycleOutcome {
    Refreshed(Vec<Entry>),
    /// The fetch failed; `entries` is the previous result, unchanged.
    Retained { entries: Vec<Entry>, error: CycleError },
}

impl CycleOutcome {
    pub fn entries(&self) -> &[Entry] {
        match self {
            CycleOutcome::Refreshed(entries) => entries,
            CycleOutcome::Retained { entries, .. } => entries,
        }
    }

    pub fn into_entries(self) -> Vec<Entry> {
        match self {
            CycleOutcome::Refreshed(entries) => entries,
            CycleOutcome::Retained { entries, .. } => entries,
        }
    }

    pub fn is_refreshed(&self) -> bool {
        matches!(self, CycleOutcome::Refreshed(_))
    }
}

/// What [`SyncService::publish`] wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Published {
    pub hosts: Option<usize>,
    pub records: Option<SyncSummary>,
}

pub struct SyncService {
    inventory: Box<dyn Inventory>,
    reconciler: Reconciler,
    observer: Arc<dyn Observer>,
}

impl SyncService {
    pub fn new(inventory: Box<dyn Inventory>, policy: Policy, observer: Arc<dyn Observer>) -> Self {
        Self {
            inventory,
            reconciler: Reconciler::new(policy, observer.clone()),
            observer,
        }
    }

    pub fn policy(&self) -> &Policy {
        self.reconciler.policy()
    }

    /// Swaps in a freshly loaded policy; takes effect on the next cycle.
    pub fn set_policy(&mut self, policy: Policy) {
        self.reconciler = Reconciler::new(policy, self.observer.clone());
    }

    /// Fetches sites, then clients, then devices. Stops at the first failure.
    pub async fn fetch(&self) -> Result<LiveInventory, CycleError> {
        let fetch_failed = |stage: FetchStage| {
            move |err: anyhow::Error| CycleError::SourceFetchFailed {
                stage,
                source: err.into(),
            }
        };

        let sites: Vec<Site> = self
            .inventory
            .sites()
            .await
            .map_err(fetch_failed(FetchStage::Sites))?;
        let clients: Vec<Observation> = self
            .inventory
            .clients(&sites)
            .await
            .map_err(fetch_failed(FetchStage::Clients))?;
        let devices: Devices = self
            .inventory
            .devices(&sites)
            .await
            .map_err(fetch_failed(FetchStage::Devices))?;

        Ok(LiveInventory {
            sites,
            clients,
            devices,
        })
    }

    pub async fn run_cycle(&self, previous: Vec<Entry>, now: DateTime<Utc>) -> CycleOutcome {
        self.observer.observe(Event::CycleStarted {
            previous: previous.len(),
        });

        let live: LiveInventory = match self.fetch().await {
            Ok(live) => live,
            Err(error) => {
                if let CycleError::SourceFetchFailed { stage, .. } = &error {
                    self.observer.observe(Event::CycleAborted {
                        stage: *stage,
                        reason: error_chain(&error),
                        retained: previous.len(),
                    });
                }
                return CycleOutcome::Retained {
                    entries: previous,
                    error,
                };
            }
        };

        self.observer.observe(Event::InventoryFetched {
            sites: live.sites.len(),
            clients: live.clients.len(),
            switches: live.devices.switches.len(),
            gateways: live.devices.gateways.len(),
            access_points: live.devices.access_points.len(),
        });

        CycleOutcome::Refreshed(self.reconciler.reconcile(&live, &previous, now))
    }

    /// Writes `entries` to whichever outputs are configured, hosts file first.
    pub fn publish(
        &self,
        entries: &[Entry],
        hosts: Option<&mut dyn HostsSink>,
        store: Option<&mut dyn RecordStore>,
    ) -> Result<Published, CycleError> {
        let mut published: Published = Published::default();

        if let Some(sink) = hosts {
            let written: usize = hosts_file::publish(sink, entries).map_err(|err| {
                CycleError::PersistenceFailed {
                    target: PublishTarget::HostsFile,
                    source: err.into(),
                }
            })?;
            self.observer.observe(Event::HostsWritten { hosts: written });
            published.hosts = Some(written);
        }

        if let Some(store) = store {
            let summary: SyncSummary = records::sync(
                store,
                entries,
                &self.policy().aliases,
                self.observer.as_ref(),
            )
            .map_err(|err| CycleError::PersistenceFailed {
                target: PublishTarget::Records,
                source: err.into(),
            })?;
            published.records = Some(summary);
        }

        Ok(published)
    }
}

/// Joins an error and its sources with `: `.
pub fn error_chain(error: &dyn StdError) -> String {
    let mut message: String = error.to_string();
    let mut source: Option<&dyn StdError> = error.source();
    while let Some(err) = source {
        message.push_str(": ");
        message.push_str(&err.to_string());
        source = err.source();
    }
    message
}
