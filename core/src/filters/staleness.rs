use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use hostsync_common::network::entry::{Disposition, Entry};

use crate::report::{Event, Observer, Pass};

/// Marks entries last observed more than `max_age` before `now` as
/// [`Disposition::RemovedStale`]. `None` or a zero duration disables the pass.
pub fn apply(
    entries: &mut [Entry],
    max_age: Option<Duration>,
    now: DateTime<Utc>,
    observer: &dyn Observer,
) -> usize {
    let mut affected: usize = 0;
    let limit: Option<TimeDelta> = max_age
        .filter(|age| !age.is_zero())
        .map(|age| TimeDelta::from_std(age).unwrap_or(TimeDelta::MAX));

    if let Some(max_age) = limit {
        for entry in entries.iter_mut() {
            let age: TimeDelta = now - entry.observed_at();
            if age > max_age {
                entry.mark(Disposition::RemovedStale);
                affected += 1;
                observer.observe(Event::AgedOut {
                    address: entry.address(),
                    age,
                });
            }
        }
    }

    observer.observe(Event::PassCompleted {
        pass: Pass::Age,
        affected,
    });
    affected
}
