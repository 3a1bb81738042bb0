use std::sync::OnceLock;

use regex::Regex;

static MAC_PATTERN: OnceLock<Regex> = OnceLock::new();

/// Retrieves or compiles the six-group colon-hex pattern.
fn mac_pattern() -> &'static Regex {
    MAC_PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^[0-9a-f]{2}(:[0-9a-f]{2}){5}$").expect("MAC pattern is a valid regex")
    })
}

/// Returns `true` when a host name is really a MAC address such as `00:11:22:aa:bb:cc`.
///
/// Controllers fall back to the hardware address when a client reports no
/// name, so these tokens show up in the name list of unnamed clients.
pub fn is_mac_like(name: &str) -> bool {
    mac_pattern().is_match(name.trim())
}

/// Rewrites a MAC-looking name into a DNS-safe label (`00-11-22-aa-bb-cc`).
pub fn hyphenate(name: &str) -> String {
    name.trim().replace(':', "-")
}
