//! Wire shapes of the controller's JSON API and their conversion into
//! inventory tuples.

use chrono::{DateTime, Utc};
use hostsync_common::network::inventory::{Devices, Observation, Site};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Meta {
    pub rc: String,
    pub msg: Option<String>,
}

impl Meta {
    /// Responses without a `meta` block are treated as successful.
    pub fn is_ok(&self) -> bool {
        self.rc.is_empty() || self.rc == "ok"
    }
}

/// The `{ "meta": ..., "data": [...] }` wrapper every endpoint returns.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub meta: Meta,
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SiteRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub desc: String,
}

impl From<SiteRecord> for Site {
    fn from(record: SiteRecord) -> Self {
        Site {
            id: record.id,
            name: record.name,
            description: record.desc,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClientRecord {
    pub ip: String,
    pub name: String,
    pub hostname: String,
    pub mac: String,
    pub last_seen: Option<i64>,
}

impl From<ClientRecord> for Observation {
    fn from(record: ClientRecord) -> Self {
        Observation {
            address: record.ip,
            name: record.name,
            hostname: record.hostname,
            mac: record.mac,
            last_seen: record.last_seen.and_then(timestamp),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Switch,
    AccessPoint,
    Gateway,
}

impl DeviceKind {
    pub fn classify(kind: &str) -> Option<Self> {
        match kind.to_ascii_lowercase().as_str() {
            "usw" => Some(DeviceKind::Switch),
            "uap" => Some(DeviceKind::AccessPoint),
            "ugw" | "udm" | "uxg" => Some(DeviceKind::Gateway),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DeviceRecord {
    pub ip: String,
    pub name: String,
    pub mac: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub model: String,
    pub last_seen: Option<i64>,
}

impl DeviceRecord {
    fn into_observation(self) -> Observation {
        Observation {
            address: self.ip,
            name: self.name,
            hostname: String::new(),
            mac: self.mac,
            last_seen: self.last_seen.and_then(timestamp),
        }
    }
}

/// Splits raw device records by role. Unknown device types are skipped.
pub fn split_devices(records: Vec<DeviceRecord>) -> Devices {
    let mut devices: Devices = Devices::default();

    for record in records {
        match DeviceKind::classify(&record.kind) {
            Some(DeviceKind::Switch) => devices.switches.push(record.into_observation()),
            Some(DeviceKind::AccessPoint) => devices.access_points.push(record.into_observation()),
            Some(DeviceKind::Gateway) => devices.gateways.push(record.into_observation()),
            None => debug!(kind = %record.kind, model = %record.model, "skipping device"),
        }
    }

    devices
}

fn timestamp(secs: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
}
