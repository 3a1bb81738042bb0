//! The port through which the engine reads live network state.
//!
//! Implementations talk to a controller (see `hostsync-controller`) or, in
//! tests, replay scripted responses.

use async_trait::async_trait;
use hostsync_common::network::inventory::{Devices, Observation, Site};

#[async_trait]
pub trait Inventory: Send + Sync {
    /// Lists the sites the account can see.
    async fn sites(&self) -> anyhow::Result<Vec<Site>>;

    /// Lists the clients currently associated in any of `sites`.
    async fn clients(&self, sites: &[Site]) -> anyhow::Result<Vec<Observation>>;

    /// Lists the infrastructure devices of `sites`, split by role.
    async fn devices(&self, sites: &[Site]) -> anyhow::Result<Devices>;
}
