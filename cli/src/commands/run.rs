//! # Scheduling Loop
//!
//! Runs sync cycles until the configuration stops asking to daemonize or the
//! process receives Ctrl-C. The configuration is re-read at the start of every
//! cycle after the first; a reload that fails keeps the last good one.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use hostsync_common::config::{Config, UnifiConfig};
use hostsync_common::network::entry::Entry;
use hostsync_controller::UnifiClient;
use hostsync_core::pipeline::Policy;
use hostsync_core::projection::hosts_file::HostsSink;
use hostsync_core::projection::records::RecordStore;
use hostsync_core::report::{Observer, TracingObserver};
use hostsync_core::sync::{CycleOutcome, Published, SyncService, error_chain};
use hostsync_storage::{HostsFile, SqliteStore};
use tracing::{error, info, warn};

/// The outputs a cycle publishes to.
#[derive(Default)]
pub struct Outputs {
    hosts: Option<HostsFile>,
    store: Option<SqliteStore>,
}

impl Outputs {
    /// Follows the hosts file path of `config` and opens the database the
    /// first time one is configured. An open database is kept for the life of
    /// the process.
    pub fn refresh(&mut self, config: &Config) -> anyhow::Result<()> {
        let filename: &str = config.hostsfile.filename.trim();
        self.hosts = (!filename.is_empty()).then(|| HostsFile::new(filename));

        if self.store.is_none() && config.database.is_configured() {
            let store: SqliteStore = SqliteStore::from_config(&config.database)
                .context("fatal error opening database")?;
            info!(driver = %config.database.driver, "database connection opened");
            self.store = Some(store);
        }
        Ok(())
    }

    pub fn publish(
        &mut self,
        service: &SyncService,
        entries: &[Entry],
    ) -> anyhow::Result<Published> {
        let hosts: Option<&mut dyn HostsSink> =
            self.hosts.as_mut().map(|sink| sink as &mut dyn HostsSink);
        let store: Option<&mut dyn RecordStore> =
            self.store.as_mut().map(|store| store as &mut dyn RecordStore);

        Ok(service.publish(entries, hosts, store)?)
    }
}

fn build_service(
    unifi: &UnifiConfig,
    policy: Policy,
    observer: Arc<dyn Observer>,
) -> anyhow::Result<SyncService> {
    let client: UnifiClient =
        UnifiClient::new(unifi).context("unable to set up controller client")?;
    info!(controller = %client.base_url(), "controller client ready");
    Ok(SyncService::new(Box::new(client), policy, observer))
}

/// Re-reads the configuration, keeping `current` when the file became unusable.
fn reload(path: &Path, current: Config) -> Config {
    match Config::load(path) {
        Ok(config) => config,
        Err(err) => {
            warn!("keeping previous configuration: {}", error_chain(&err));
            current
        }
    }
}

pub async fn run(path: &Path, once: bool) -> anyhow::Result<()> {
    info!("opening configuration file: {}", path.display());
    let mut config: Config =
        Config::load(path).with_context(|| format!("unable to load {}", path.display()))?;

    let observer: Arc<dyn Observer> = Arc::new(TracingObserver);
    let mut service: SyncService =
        build_service(&config.unifi, Policy::from_config(&config), observer.clone())?;
    let mut outputs: Outputs = Outputs::default();
    let mut entries: Vec<Entry> = Vec::new();
    let mut cycle: u64 = 0;

    loop {
        cycle += 1;
        info!("** Starting cycle {cycle} **");

        if cycle > 1 {
            let reloaded: Config = reload(path, config.clone());
            if reloaded.unifi != config.unifi {
                service = build_service(
                    &reloaded.unifi,
                    Policy::from_config(&reloaded),
                    observer.clone(),
                )?;
            } else {
                service.set_policy(Policy::from_config(&reloaded));
            }
            config = reloaded;
        }
        outputs.refresh(&config)?;

        match service.run_cycle(std::mem::take(&mut entries), Utc::now()).await {
            CycleOutcome::Refreshed(result) => {
                if let Err(err) = outputs.publish(&service, &result) {
                    error!("{err:#}");
                }
                entries = result;
            }
            CycleOutcome::Retained {
                entries: previous,
                error,
            } => {
                error!("{}", error_chain(&error));
                warn!("not updating list of hosts this round, will try again later");
                entries = previous;
            }
        }

        if once || !config.daemonize {
            break;
        }

        let pause = config.sleep_duration();
        info!("sleeping for {} seconds", pause.as_secs());
        info!("** Ending cycle {cycle} **");
        tokio::select! {
            _ = tokio::time::sleep(pause) => {}
            signal = tokio::signal::ctrl_c() => {
                signal.context("unable to listen for Ctrl-C")?;
                info!("interrupted, exiting");
                break;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostsync_common::config::DatabaseConfig;
    use hostsync_common::network::entry::Source;
    use hostsync_core::qualifier::Qualifier;
    use hostsync_core::report::MemoryObserver;

    fn config(dir: &Path) -> Config {
        let mut config = Config::default();
        config.unifi.host = "unifi.lan".into();
        config.hostsfile.filename = dir.join("hosts").display().to_string();
        config.database = DatabaseConfig {
            driver: "sqlite".into(),
            dsn: dir.join("pdns.sqlite").display().to_string(),
        };
        config
    }

    fn entry(address: &str, name: &str) -> Entry {
        let mut entry = Entry::new(address, [name], Source::Client, Utc::now()).unwrap();
        Qualifier::new(["lan"]).qualify(&mut entry);
        entry
    }

    #[test]
    fn outputs_follow_the_configuration() {
        let dir = tempfile::tempdir().unwrap();
        let mut outputs = Outputs::default();

        outputs.refresh(&config(dir.path())).unwrap();
        assert!(outputs.hosts.is_some());
        assert!(outputs.store.is_some());

        let mut without_hosts = config(dir.path());
        without_hosts.hostsfile.filename.clear();
        without_hosts.database = DatabaseConfig::default();
        outputs.refresh(&without_hosts).unwrap();
        assert!(outputs.hosts.is_none());
        assert!(outputs.store.is_some(), "database stays open once opened");
    }

    #[test]
    fn unsupported_driver_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut broken = config(dir.path());
        broken.database.driver = "mysql".into();

        assert!(Outputs::default().refresh(&broken).is_err());
    }

    #[test]
    fn publishes_to_every_output() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let service = build_service(
            &config.unifi,
            Policy::from_config(&config),
            Arc::new(MemoryObserver::new()),
        )
        .unwrap();
        let mut outputs = Outputs::default();
        outputs.refresh(&config).unwrap();

        let published = outputs
            .publish(&service, &[entry("10.0.0.1", "nas"), entry("10.0.0.2", "tv")])
            .unwrap();

        assert_eq!(published.hosts, Some(2));
        assert_eq!(published.records.map(|summary| summary.inserted), Some(2));
        let text = std::fs::read_to_string(dir.path().join("hosts")).unwrap();
        assert!(text.ends_with("10.0.0.1 nas.lan\n10.0.0.2 tv.lan\n"));
    }

    #[test]
    fn broken_reload_keeps_the_current_configuration() {
        let dir = tempfile::tempdir().unwrap();
        let current = config(dir.path());

        let kept = reload(&dir.path().join("missing.toml"), current.clone());

        assert_eq!(kept, current);
    }
}
