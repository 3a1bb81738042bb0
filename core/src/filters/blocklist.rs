use std::net::IpAddr;

use hostsync_common::config::BlockedHost;
use hostsync_common::network::entry::{Disposition, Entry};

use crate::report::{Event, Observer, Pass};

#[derive(Debug, Clone, PartialEq, Eq)]
enum AddressMatch {
    Parsed(IpAddr),
    /// Rule address that is not an IP literal; compared as text.
    Literal(String),
}

impl AddressMatch {
    fn new(raw: &str) -> Option<Self> {
        let raw: &str = raw.trim();
        if raw.is_empty() {
            return None;
        }
        Some(match raw.parse::<IpAddr>() {
            Ok(address) => AddressMatch::Parsed(address),
            Err(_) => AddressMatch::Literal(raw.to_lowercase()),
        })
    }

    fn matches(&self, address: IpAddr) -> bool {
        match self {
            AddressMatch::Parsed(rule) => *rule == address,
            AddressMatch::Literal(rule) => *rule == address.to_string().to_lowercase(),
        }
    }
}

/// One `(name, address)` block rule. Empty halves act as wildcards; a rule
/// with both halves empty never matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockRule {
    name: Option<String>,
    address: Option<AddressMatch>,
}

impl BlockRule {
    pub fn new(name: &str, address: &str) -> Self {
        let name: &str = name.trim();
        Self {
            name: (!name.is_empty()).then(|| name.to_lowercase()),
            address: AddressMatch::new(address),
        }
    }

    /// Returns the entry name that triggered the rule, or the primary name
    /// for address-only rules.
    pub fn matches<'a>(&self, entry: &'a Entry) -> Option<&'a str> {
        let address_ok: bool = self
            .address
            .as_ref()
            .is_none_or(|address| address.matches(entry.address()));

        match (&self.name, &self.address) {
            (None, None) => None,
            (None, Some(_)) => address_ok.then(|| entry.primary_name()),
            (Some(rule_name), _) => {
                if !address_ok {
                    return None;
                }
                entry
                    .names()
                    .iter()
                    .find(|name| name.trim().to_lowercase() == *rule_name)
                    .map(String::as_str)
            }
        }
    }
}

impl From<&BlockedHost> for BlockRule {
    fn from(blocked: &BlockedHost) -> Self {
        BlockRule::new(&blocked.name, &blocked.ip)
    }
}

/// Marks entries matched by any rule as [`Disposition::RemovedBlocked`].
/// The first matching rule wins.
pub fn apply(entries: &mut [Entry], rules: &[BlockRule], observer: &dyn Observer) -> usize {
    let mut affected: usize = 0;

    for entry in entries.iter_mut() {
        let hit: Option<(usize, String)> = rules.iter().enumerate().find_map(|(idx, rule)| {
            rule.matches(entry).map(|name| (idx, name.to_string()))
        });

        if let Some((rule, name)) = hit {
            entry.mark(Disposition::RemovedBlocked);
            affected += 1;
            observer.observe(Event::Blocked {
                address: entry.address(),
                name,
                rule,
            });
        }
    }

    observer.observe(Event::PassCompleted {
        pass: Pass::BlockList,
        affected,
    });
    affected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::MemoryObserver;
    use crate::testutil::host;

    #[test]
    fn name_and_address_must_both_match() {
        let rule = BlockRule::new("powerwall", "192.168.90.2");
        assert_eq!(rule.matches(&host("192.168.90.2", &["powerwall"], 0)), Some("powerwall"));
        assert_eq!(rule.matches(&host("192.168.90.3", &["powerwall"], 0)), None);
        assert_eq!(rule.matches(&host("192.168.90.2", &["other"], 0)), None);
    }

    #[test]
    fn address_only_blocks_any_name() {
        let rule = BlockRule::new("", "192.168.90.2");
        assert!(rule.matches(&host("192.168.90.2", &["powerwall"], 0)).is_some());
        assert!(rule.matches(&host("192.168.90.2", &["anything"], 0)).is_some());
        assert!(rule.matches(&host("192.168.1.1", &["powerwall"], 0)).is_none());
    }

    #[test]
    fn name_only_blocks_any_address() {
        let rule = BlockRule::new("powerwall", "");
        assert!(rule.matches(&host("192.168.90.2", &["powerwall"], 0)).is_some());
        assert!(rule.matches(&host("10.0.0.7", &["alias", "powerwall"], 0)).is_some());
        assert!(rule.matches(&host("10.0.0.7", &["host1"], 0)).is_none());
    }

    #[test]
    fn names_compare_trimmed_and_case_insensitive() {
        let rule = BlockRule::new("  PowerWall ", "");
        assert!(rule.matches(&host("10.0.0.7", &["powerwall"], 0)).is_some());
    }

    #[test]
    fn empty_rule_never_matches() {
        let rule = BlockRule::new(" ", "");
        assert!(rule.matches(&host("10.0.0.7", &["powerwall"], 0)).is_none());
    }

    #[test]
    fn ipv6_rule_matches_any_spelling() {
        let rule = BlockRule::new("", "FD00:0::1");
        assert!(rule.matches(&host("fd00::1", &["nas"], 0)).is_some());
    }

    #[test]
    fn apply_marks_blocked_and_reports_first_rule() {
        let observer = MemoryObserver::new();
        let rules = vec![
            BlockRule::new("blocked", "192.168.1.2"),
            BlockRule::new("", "192.168.1.2"),
        ];
        let mut entries = vec![
            host("192.168.1.1", &["host1"], 0),
            host("192.168.1.2", &["blocked"], 0),
        ];

        let affected = apply(&mut entries, &rules, &observer);

        assert_eq!(affected, 1);
        assert_eq!(entries[0].disposition(), Disposition::Kept);
        assert_eq!(entries[1].disposition(), Disposition::RemovedBlocked);
        assert!(observer.events().contains(&Event::Blocked {
            address: "192.168.1.2".parse().unwrap(),
            name: "blocked".into(),
            rule: 0,
        }));
    }
}
