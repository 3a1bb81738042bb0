use hostsync_common::network::entry::{Disposition, Entry};
use hostsync_common::network::mac;

use crate::report::{Event, Observer, Pass};

/// Applies the MAC-name policy and returns how many entries it changed.
///
/// With `keep_macs` off, MAC-looking names are dropped; a host left with no
/// other name is marked [`Disposition::RemovedMacOnly`] and keeps its original
/// names for diagnostics. With `keep_macs` on, MAC-looking names stay but are
/// hyphenated so they form valid labels.
pub fn apply(entries: &mut [Entry], keep_macs: bool, observer: &dyn Observer) -> usize {
    let mut affected: usize = 0;

    for entry in entries.iter_mut() {
        if keep_macs {
            let count: usize = entry.rewrite_names(|name| {
                mac::is_mac_like(name).then(|| mac::hyphenate(name))
            });
            if count > 0 {
                affected += 1;
                observer.observe(Event::MacNamesRewritten {
                    address: entry.address(),
                    count,
                });
            }
            continue;
        }

        let stripped = entry.strip_names(mac::is_mac_like);
        if stripped.emptied {
            entry.mark(Disposition::RemovedMacOnly);
            affected += 1;
            observer.observe(Event::MacOnlyRemoved {
                address: entry.address(),
                names: entry.names().to_vec(),
            });
        } else if !stripped.removed.is_empty() {
            affected += 1;
            observer.observe(Event::MacNamesStripped {
                address: entry.address(),
                names: stripped.removed,
            });
        }
    }

    observer.observe(Event::PassCompleted {
        pass: Pass::MacNames,
        affected,
    });
    affected
}
