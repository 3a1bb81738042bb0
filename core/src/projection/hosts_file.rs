use std::fmt::Write;

use hostsync_common::network::entry::Entry;

pub const HOSTS_HEADER: &str = "# This file created by hostsync\n# Do not manually edit\n\n";

/// Destination for rendered hosts text. Each call replaces the previous
/// contents entirely.
pub trait HostsSink: Send {
    fn write(&mut self, contents: &str) -> std::io::Result<()>;
}

/// Renders one `address fqdn fqdn ...` line per kept entry, in the order
/// given. Entries without qualified names produce no line.
pub fn render(entries: &[Entry]) -> String {
    let mut out: String = String::from(HOSTS_HEADER);

    for entry in entries.iter().filter(|entry| entry.is_kept()) {
        if entry.qualified_names().is_empty() {
            continue;
        }
        // Writing into a String cannot fail.
        let _ = writeln!(
            out,
            "{} {}",
            entry.address(),
            entry.qualified_names().join(" ")
        );
    }

    out
}

/// Renders `entries` and hands the text to `sink`. Returns the number of host
/// lines written.
pub fn publish(sink: &mut dyn HostsSink, entries: &[Entry]) -> std::io::Result<usize> {
    let text: String = render(entries);
    sink.write(&text)?;
    Ok(text.lines().count() - HOSTS_HEADER.lines().count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qualifier::Qualifier;
    use crate::testutil::host;
    use hostsync_common::network::entry::Disposition;

    fn qualified(entries: &mut [Entry], domains: &[&str]) {
        let qualifier = Qualifier::new(domains);
        for entry in entries.iter_mut() {
            qualifier.qualify(entry);
        }
    }

    #[derive(Default)]
    struct Capture(Vec<String>);

    impl HostsSink for Capture {
        fn write(&mut self, contents: &str) -> std::io::Result<()> {
            self.0.push(contents.to_string());
            Ok(())
        }
    }

    #[test]
    fn renders_header_and_kept_entries() {
        let mut entries = vec![
            host("192.168.1.1", &["gateway", "udm"], 0),
            host("192.168.1.2", &["blocked"], 0),
            host("192.168.1.3", &["printer"], 0),
        ];
        qualified(&mut entries, &["example.com", "local"]);
        entries[1].mark(Disposition::RemovedBlocked);

        let text = render(&entries);

        assert_eq!(
            text,
            "# This file created by hostsync\n\
             # Do not manually edit\n\
             \n\
             192.168.1.1 gateway.example.com udm.example.com gateway.local udm.local\n\
             192.168.1.3 printer.example.com printer.local\n"
        );
    }

    #[test]
    fn entries_without_domains_are_skipped() {
        let entries = vec![host("192.168.1.1", &["gateway"], 0)];
        assert_eq!(render(&entries), HOSTS_HEADER);
    }

    #[test]
    fn rendering_is_byte_identical_on_repeat() {
        let mut entries = vec![
            host("10.0.0.1", &["a"], 0),
            host("fd00::1", &["b"], 0),
        ];
        qualified(&mut entries, &["lan"]);

        assert_eq!(render(&entries), render(&entries));
    }

    #[test]
    fn publish_counts_host_lines() {
        let mut entries = vec![
            host("10.0.0.1", &["a"], 0),
            host("10.0.0.2", &["b"], 0),
        ];
        qualified(&mut entries, &["lan"]);
        let mut sink = Capture::default();

        let written = publish(&mut sink, &entries).unwrap();

        assert_eq!(written, 2);
        assert_eq!(sink.0.len(), 1);
        assert!(sink.0[0].ends_with("10.0.0.2 b.lan\n"));
    }
}
