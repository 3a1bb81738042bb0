//! # Entry Model
//!
//! An [`Entry`] is one observation of a host: the address it answered on, the
//! short names it is known by, and what the reconciliation passes decided to
//! do with it.
//!
//! Entries are rebuilt from scratch every cycle. The only state carried across
//! cycles is the previous result set, which keeps each entry's original
//! `observed_at` so that it can age out.

use std::fmt;
use std::net::{AddrParseError, IpAddr};

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Why an entry is (or is not) part of the published output.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Disposition {
    #[default]
    Kept,
    /// Every name was a MAC address and `keep_macs` is off.
    RemovedMacOnly,
    /// A block rule matched.
    RemovedBlocked,
    /// All names were claimed exclusively by a static entry at another address.
    RemovedExclusive,
    /// Not observed within the configured maximum age.
    RemovedStale,
}

impl Disposition {
    pub fn is_kept(self) -> bool {
        self == Disposition::Kept
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Disposition::Kept => "kept",
            Disposition::RemovedMacOnly => "mac-only",
            Disposition::RemovedBlocked => "blocked",
            Disposition::RemovedExclusive => "exclusive",
            Disposition::RemovedStale => "stale",
        }
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    Static,
    Client,
    Switch,
    AccessPoint,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label: &str = match self {
            Source::Static => "static",
            Source::Client => "client",
            Source::Switch => "switch",
            Source::AccessPoint => "access point",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EntryError {
    #[error("unable to parse IP address '{address}'")]
    InvalidAddress {
        address: String,
        #[source]
        source: AddrParseError,
    },
    #[error("no usable name for {address}")]
    NoNames { address: IpAddr },
}

/// Names removed from an entry by [`Entry::strip_names`].
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Stripped {
    pub removed: Vec<String>,
    /// The predicate matched every name, so the list was left untouched.
    pub emptied: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    address: IpAddr,
    names: Vec<String>,
    qualified_names: Vec<String>,
    observed_at: DateTime<Utc>,
    reported_seen: Option<DateTime<Utc>>,
    source: Source,
    exclusive: bool,
    disposition: Disposition,
}

impl Entry {
    /// Builds an entry from a raw `(address, names, time)` tuple.
    ///
    /// Blank names are discarded; at least one must remain.
    pub fn new<I, S>(
        address: &str,
        names: I,
        source: Source,
        observed_at: DateTime<Utc>,
    ) -> Result<Self, EntryError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let address: IpAddr =
            address
                .trim()
                .parse()
                .map_err(|source| EntryError::InvalidAddress {
                    address: address.to_string(),
                    source,
                })?;

        let names: Vec<String> = names
            .into_iter()
            .map(Into::into)
            .map(|name: String| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();

        if names.is_empty() {
            return Err(EntryError::NoNames { address });
        }

        Ok(Self {
            address,
            names,
            qualified_names: Vec::new(),
            observed_at,
            reported_seen: None,
            source,
            exclusive: false,
            disposition: Disposition::Kept,
        })
    }

    /// Attaches the controller's own last-seen time. Diagnostics only.
    pub fn with_reported_seen(mut self, reported_seen: Option<DateTime<Utc>>) -> Self {
        self.reported_seen = reported_seen;
        self
    }

    pub fn with_exclusive(mut self, exclusive: bool) -> Self {
        self.exclusive = exclusive;
        self
    }

    pub fn address(&self) -> IpAddr {
        self.address
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// The first name; used to match an entry against older observations.
    pub fn primary_name(&self) -> &str {
        &self.names[0]
    }

    pub fn qualified_names(&self) -> &[String] {
        &self.qualified_names
    }

    pub fn observed_at(&self) -> DateTime<Utc> {
        self.observed_at
    }

    pub fn reported_seen(&self) -> Option<DateTime<Utc>> {
        self.reported_seen
    }

    pub fn source(&self) -> Source {
        self.source
    }

    pub fn is_exclusive(&self) -> bool {
        self.exclusive
    }

    pub fn disposition(&self) -> Disposition {
        self.disposition
    }

    pub fn is_kept(&self) -> bool {
        self.disposition.is_kept()
    }

    /// Records a removal reason. A removed entry never goes back to `Kept`.
    pub fn mark(&mut self, disposition: Disposition) {
        if disposition.is_kept() {
            return;
        }
        self.disposition = disposition;
    }

    pub fn set_qualified_names(&mut self, qualified_names: Vec<String>) {
        self.qualified_names = qualified_names;
    }

    /// Rewrites each name in place, keeping order and length.
    pub fn rewrite_names<F>(&mut self, mut rewrite: F) -> usize
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut changed: usize = 0;
        for name in self.names.iter_mut() {
            if let Some(new_name) = rewrite(name) {
                *name = new_name;
                changed += 1;
            }
        }
        changed
    }

    /// Removes every name matching `predicate`.
    ///
    /// If that would leave no names, nothing is removed and
    /// [`Stripped::emptied`] is set; the caller decides the disposition.
    pub fn strip_names<F>(&mut self, mut predicate: F) -> Stripped
    where
        F: FnMut(&str) -> bool,
    {
        let (removed, remaining): (Vec<String>, Vec<String>) =
            self.names.iter().cloned().partition(|name| predicate(name));

        if removed.is_empty() {
            return Stripped::default();
        }

        if remaining.is_empty() {
            return Stripped {
                removed,
                emptied: true,
            };
        }

        self.names = remaining;
        Stripped {
            removed,
            emptied: false,
        }
    }
}
