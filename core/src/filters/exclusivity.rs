use std::collections::HashMap;
use std::net::IpAddr;

use hostsync_common::network::entry::{Disposition, Entry, Source};

use crate::qualifier::Qualifier;
use crate::report::{Event, Observer, Pass};

/// Lower-cased name -> addresses of the exclusive static hosts that own it.
fn owners(entries: &[Entry]) -> HashMap<String, Vec<IpAddr>> {
    let mut owners: HashMap<String, Vec<IpAddr>> = HashMap::new();
    for entry in entries
        .iter()
        .filter(|entry| entry.source() == Source::Static && entry.is_exclusive())
    {
        for name in entry.names() {
            let addresses: &mut Vec<IpAddr> = owners.entry(name.to_lowercase()).or_default();
            if !addresses.contains(&entry.address()) {
                addresses.push(entry.address());
            }
        }
    }
    owners
}

/// Removes names reserved by exclusive static hosts from every entry at a
/// different address.
///
/// Entries that still have names are re-qualified. Entries that would lose
/// every name keep them and are marked [`Disposition::RemovedExclusive`].
pub fn apply(entries: &mut [Entry], qualifier: &Qualifier, observer: &dyn Observer) -> usize {
    let owners: HashMap<String, Vec<IpAddr>> = owners(entries);
    let mut affected: usize = 0;

    if owners.is_empty() {
        observer.observe(Event::PassCompleted {
            pass: Pass::Exclusivity,
            affected,
        });
        return affected;
    }

    for entry in entries.iter_mut() {
        let address: IpAddr = entry.address();
        let stripped = entry.strip_names(|name| {
            owners
                .get(&name.to_lowercase())
                .is_some_and(|addresses| !addresses.contains(&address))
        });

        if stripped.removed.is_empty() {
            continue;
        }

        affected += 1;
        if stripped.emptied {
            entry.mark(Disposition::RemovedExclusive);
        } else {
            qualifier.qualify(entry);
        }

        for name in stripped.removed {
            observer.observe(Event::ExclusiveNameRemoved {
                address,
                name,
                emptied: stripped.emptied,
            });
        }
    }

    observer.observe(Event::PassCompleted {
        pass: Pass::Exclusivity,
        affected,
    });
    affected
}
