//! Raw inventory tuples as reported by the controller, before any
//! reconciliation. Addresses stay strings here; parsing happens when an
//! [`Entry`](crate::network::entry::Entry) is built from them.

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Site {
    pub id: String,
    pub name: String,
    pub description: String,
}

impl Site {
    pub fn new(name: impl Into<String>) -> Self {
        let name: String = name.into();
        Self {
            id: name.clone(),
            description: name.clone(),
            name,
        }
    }
}

/// One client or device as seen by the controller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Observation {
    pub address: String,
    /// User-assigned alias; may be empty.
    pub name: String,
    /// DHCP hostname; may be empty.
    pub hostname: String,
    pub mac: String,
    pub last_seen: Option<DateTime<Utc>>,
}

impl Observation {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            ..Self::default()
        }
    }

    pub fn with_last_seen(mut self, last_seen: DateTime<Utc>) -> Self {
        self.last_seen = Some(last_seen);
        self
    }

    pub fn with_mac(mut self, mac: impl Into<String>) -> Self {
        self.mac = mac.into();
        self
    }

    /// The name this host should be published under: the alias, else the
    /// DHCP hostname, else the hardware address. Runs of whitespace inside the
    /// name become a single `-` so that it stays one label.
    pub fn display_name(&self) -> String {
        let name: &str = [&self.name, &self.hostname, &self.mac]
            .into_iter()
            .map(|candidate| candidate.trim())
            .find(|candidate| !candidate.is_empty())
            .unwrap_or("");
        name.split_whitespace().collect::<Vec<&str>>().join("-")
    }
}

/// Infrastructure devices, split by role.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Devices {
    pub switches: Vec<Observation>,
    pub gateways: Vec<Observation>,
    pub access_points: Vec<Observation>,
}

/// Everything one successful fetch returned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiveInventory {
    pub sites: Vec<Site>,
    pub clients: Vec<Observation>,
    pub devices: Devices,
}
