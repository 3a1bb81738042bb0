use chrono::{DateTime, TimeDelta, Utc};
use hostsync_common::network::entry::{Entry, Source};

/// Reference "now" shared by the unit tests.
pub fn t0() -> DateTime<Utc> {
    DateTime::from_timestamp(1_704_067_200, 0).unwrap()
}

/// A live client observed `age_secs` before [`t0`].
pub fn host(address: &str, names: &[&str], age_secs: i64) -> Entry {
    Entry::new(
        address,
        names.iter().copied(),
        Source::Client,
        t0() - TimeDelta::seconds(age_secs),
    )
    .unwrap()
}

pub fn static_host(address: &str, names: &[&str], exclusive: bool) -> Entry {
    Entry::new(address, names.iter().copied(), Source::Static, t0())
        .unwrap()
        .with_exclusive(exclusive)
}
