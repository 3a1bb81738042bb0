use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hostsync_common::config::Config;
use hostsync_common::network::inventory::{Devices, LiveInventory, Observation, Site};
use hostsync_core::inventory::Inventory;
use hostsync_core::pipeline::Policy;
use hostsync_core::report::MemoryObserver;
use hostsync_core::sync::SyncService;

#[derive(Default)]
struct State {
    live: LiveInventory,
    down: bool,
}

/// Shared control over a [`FakeController`] between cycles.
#[derive(Clone, Default)]
pub struct Remote(Arc<Mutex<State>>);

impl Remote {
    fn state(&self) -> MutexGuard<'_, State> {
        self.0.lock().unwrap()
    }

    pub fn set_clients(&self, clients: Vec<Observation>) {
        self.state().live.clients = clients;
    }

    pub fn set_devices(&self, devices: Devices) {
        self.state().live.devices = devices;
    }

    pub fn set_down(&self, down: bool) {
        self.state().down = down;
    }
}

pub struct FakeController(Remote);

#[async_trait]
impl Inventory for FakeController {
    async fn sites(&self) -> anyhow::Result<Vec<Site>> {
        if self.0.state().down {
            anyhow::bail!("connection refused");
        }
        Ok(vec![Site::new("default")])
    }

    async fn clients(&self, _sites: &[Site]) -> anyhow::Result<Vec<Observation>> {
        Ok(self.0.state().live.clients.clone())
    }

    async fn devices(&self, _sites: &[Site]) -> anyhow::Result<Devices> {
        Ok(self.0.state().live.devices.clone())
    }
}

/// Parses a configuration the same way the binary does, minus the environment.
pub fn config(toml: &str) -> Config {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(toml.as_bytes()).unwrap();

    let config = Config::from_file(file.path()).unwrap();
    config.validate().unwrap();
    config
}

pub fn service(config: &Config) -> (SyncService, Remote, Arc<MemoryObserver>) {
    let remote = Remote::default();
    let observer = Arc::new(MemoryObserver::new());
    let service = SyncService::new(
        Box::new(FakeController(remote.clone())),
        Policy::from_config(config),
        observer.clone(),
    );
    (service, remote, observer)
}

pub fn client(name: &str, address: &str) -> Observation {
    Observation::new(name, address)
}

/// Seconds after 2024-01-01T00:00:00Z.
pub fn at(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(1_704_067_200 + secs, 0).unwrap()
}
