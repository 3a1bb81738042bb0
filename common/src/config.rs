//! # Configuration
//!
//! TOML configuration for a scraper instance. The file is re-read at the start
//! of every cycle, then overlaid with `HOSTSYNC_UNIFI_*` environment
//! variables so that credentials can stay out of the file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

pub const ENV_UNIFI_HOST: &str = "HOSTSYNC_UNIFI_HOST";
pub const ENV_UNIFI_USER: &str = "HOSTSYNC_UNIFI_USER";
pub const ENV_UNIFI_PASSWORD: &str = "HOSTSYNC_UNIFI_PASSWORD";

const DEFAULT_SLEEP_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read configuration file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unable to parse configuration file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Keep running cycles instead of exiting after the first one.
    pub daemonize: bool,
    /// Seconds between cycles. Zero means the default of two minutes.
    pub sleep: u64,
    /// Seconds after which an entry no longer reported is dropped. Zero disables ageing.
    pub max_age: u64,
    pub unifi: UnifiConfig,
    pub hostsfile: HostsfileConfig,
    pub processing: ProcessingConfig,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UnifiConfig {
    pub host: String,
    pub user: String,
    pub password: String,
    /// Controllers ship self-signed certificates, so this is off unless asked for.
    pub verify_tls: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HostsfileConfig {
    pub filename: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    pub domains: Vec<String>,
    pub additional: Vec<AdditionalHost>,
    pub blocked: Vec<BlockedHost>,
    pub cnames: Vec<Cname>,
    pub keep_macs: bool,
}

/// A host defined in configuration rather than discovered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AdditionalHost {
    pub ip: String,
    pub hostnames: Vec<String>,
    /// Used when `hostnames` is empty.
    pub name: String,
    /// No other address may publish any of this host's names.
    pub exclusive: bool,
}

impl AdditionalHost {
    pub fn names(&self) -> Vec<String> {
        if self.hostnames.is_empty() {
            vec![self.name.clone()]
        } else {
            self.hostnames.clone()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BlockedHost {
    pub ip: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Cname {
    pub cname: String,
    pub hostname: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub driver: String,
    pub dsn: String,
}

impl DatabaseConfig {
    pub fn is_configured(&self) -> bool {
        !self.driver.is_empty() && !self.dsn.is_empty()
    }
}

impl Config {
    /// Reads, overlays and validates a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config: Config = Self::from_file(path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw: String = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Overrides controller settings with non-empty values from `lookup`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let targets: [(&str, &mut String); 3] = [
            (ENV_UNIFI_HOST, &mut self.unifi.host),
            (ENV_UNIFI_USER, &mut self.unifi.user),
            (ENV_UNIFI_PASSWORD, &mut self.unifi.password),
        ];
        for (key, field) in targets {
            if let Some(value) = lookup(key).filter(|value| !value.is_empty()) {
                *field = value;
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.unifi.host.trim().is_empty() {
            return Err(ConfigError::Invalid("unifi.host must be set".into()));
        }
        if self.hostsfile.filename.is_empty() && !self.database.is_configured() {
            return Err(ConfigError::Invalid(
                "configure hostsfile.filename, a database, or both".into(),
            ));
        }
        if self.database.is_configured() && self.database.driver != "sqlite" {
            return Err(ConfigError::Invalid(format!(
                "unsupported database driver: {}",
                self.database.driver
            )));
        }
        for additional in &self.processing.additional {
            if additional.names().iter().all(|name| name.trim().is_empty()) {
                return Err(ConfigError::Invalid(format!(
                    "additional host {} has no name",
                    additional.ip
                )));
            }
        }
        Ok(())
    }

    pub fn sleep_duration(&self) -> Duration {
        match self.sleep {
            0 => Duration::from_secs(DEFAULT_SLEEP_SECS),
            secs => Duration::from_secs(secs),
        }
    }

    pub fn max_age(&self) -> Option<Duration> {
        (self.max_age > 0).then(|| Duration::from_secs(self.max_age))
    }
}
