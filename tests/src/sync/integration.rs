use std::net::IpAddr;

use hostsync_common::network::entry::{Disposition, Entry};
use hostsync_common::network::inventory::{Devices, Observation};
use hostsync_core::projection::hosts_file;
use hostsync_core::report::{Event, Pass};
use hostsync_core::sync::{CycleError, CycleOutcome};

use crate::support::{at, client, config, service};

const HOME: &str = r#"
max_age = 3600

[unifi]
host = "https://unifi.example.com"

[hostsfile]
filename = "/tmp/hosts"

[processing]
domains = ["example.com", "local"]

[[processing.additional]]
ip = "192.168.151.1"
name = "unifi"
exclusive = true

[[processing.additional]]
ip = "192.168.151.10"
name = "printer"

[[processing.blocked]]
ip = "192.168.1.99"
"#;

fn addresses(entries: &[Entry]) -> Vec<IpAddr> {
    entries.iter().map(Entry::address).collect()
}

#[tokio::test]
async fn first_cycle_produces_a_sorted_published_set() {
    let (service, remote, _) = service(&config(HOME));
    remote.set_clients(vec![
        client("laptop", "192.168.1.20"),
        client("printer", "192.168.1.10"),
        client("unifi", "192.168.1.1"),
        client("guest", "192.168.1.99"),
        Observation::new("", "192.168.1.50").with_mac("aa:bb:cc:dd:ee:ff"),
    ]);
    remote.set_devices(Devices {
        switches: vec![client("core-switch", "192.168.1.2")],
        gateways: vec![client("udm", "192.168.1.1")],
        access_points: vec![client("attic-ap", "192.168.1.3")],
    });

    let outcome = service.run_cycle(Vec::new(), at(0)).await;
    assert!(outcome.is_refreshed());
    let entries = outcome.into_entries();

    let sorted: Vec<IpAddr> = addresses(&entries);
    assert!(sorted.windows(2).all(|pair| pair[0] < pair[1]));

    let disposition = |address: &str| {
        entries
            .iter()
            .find(|entry| entry.address() == address.parse::<IpAddr>().unwrap())
            .map(Entry::disposition)
    };
    assert_eq!(disposition("192.168.1.1"), Some(Disposition::RemovedExclusive));
    assert_eq!(disposition("192.168.1.99"), Some(Disposition::RemovedBlocked));
    assert_eq!(disposition("192.168.1.50"), Some(Disposition::RemovedMacOnly));
    assert_eq!(disposition("192.168.1.10"), Some(Disposition::Kept));

    assert_eq!(
        hosts_file::render(&entries),
        "# This file created by hostsync\n\
         # Do not manually edit\n\
         \n\
         192.168.1.2 core-switch.example.com core-switch.local\n\
         192.168.1.3 attic-ap.example.com attic-ap.local\n\
         192.168.1.10 printer.example.com printer.local\n\
         192.168.1.20 laptop.example.com laptop.local\n\
         192.168.151.1 unifi.example.com unifi.local\n\
         192.168.151.10 printer.example.com printer.local\n"
    );
}

#[tokio::test]
async fn unchanged_network_reconciles_to_identical_output() {
    let (service, remote, _) = service(&config(HOME));
    remote.set_clients(vec![client("laptop", "192.168.1.20"), client("tv", "fd00::20")]);

    let first = service.run_cycle(Vec::new(), at(0)).await.into_entries();
    let second = service.run_cycle(first.clone(), at(0)).await.into_entries();

    assert_eq!(first, second);
    assert_eq!(hosts_file::render(&first), hosts_file::render(&second));
}

#[tokio::test]
async fn controller_outage_keeps_the_previous_set() {
    let (service, remote, observer) = service(&config(HOME));
    remote.set_clients(vec![client("laptop", "192.168.1.20")]);
    let before = service.run_cycle(Vec::new(), at(0)).await.into_entries();

    remote.set_down(true);
    let outcome = service.run_cycle(before.clone(), at(60)).await;

    match outcome {
        CycleOutcome::Retained { entries, error } => {
            assert_eq!(entries, before);
            assert!(matches!(error, CycleError::SourceFetchFailed { .. }));
        }
        CycleOutcome::Refreshed(_) => panic!("an outage must not refresh the result"),
    }
    assert!(observer.events().iter().any(|event| matches!(
        event,
        Event::CycleAborted { retained, .. } if *retained == before.len()
    )));

    remote.set_down(false);
    assert!(service.run_cycle(before, at(120)).await.is_refreshed());
}

#[tokio::test]
async fn hosts_that_go_quiet_age_out() {
    let (service, remote, observer) = service(&config(HOME));
    remote.set_clients(vec![client("laptop", "192.168.1.20"), client("tv", "192.168.1.30")]);
    let first = service.run_cycle(Vec::new(), at(0)).await.into_entries();

    remote.set_clients(vec![client("laptop", "192.168.1.20")]);
    let later = service.run_cycle(first, at(1800)).await.into_entries();
    let tv = later.iter().find(|entry| entry.names() == ["tv"]).unwrap();
    assert!(tv.is_kept());
    assert_eq!(tv.observed_at(), at(0));

    let expired = service.run_cycle(later, at(3601)).await.into_entries();
    let tv = expired.iter().find(|entry| entry.names() == ["tv"]).unwrap();
    assert_eq!(tv.disposition(), Disposition::RemovedStale);
    assert_eq!(observer.affected(Pass::Age), 1);

    let gone = service.run_cycle(expired, at(3700)).await.into_entries();
    assert!(gone.iter().all(|entry| entry.names() != ["tv"]));
}

#[tokio::test]
async fn moved_host_is_published_at_its_new_address_only() {
    let (service, remote, _) = service(&config(HOME));
    remote.set_clients(vec![client("laptop", "192.168.1.20")]);
    let first = service.run_cycle(Vec::new(), at(0)).await.into_entries();

    remote.set_clients(vec![client("laptop", "192.168.1.21")]);
    let second = service.run_cycle(first, at(300)).await.into_entries();

    let laptop: Vec<IpAddr> = second
        .iter()
        .filter(|entry| entry.names() == ["laptop"])
        .map(Entry::address)
        .collect();
    assert_eq!(laptop, ["192.168.1.21".parse::<IpAddr>().unwrap()]);
}

#[tokio::test]
async fn keep_macs_publishes_hyphenated_names() {
    let toml = HOME.replace("[processing]\n", "[processing]\nkeep_macs = true\n");
    let (service, remote, _) = service(&config(&toml));
    remote.set_clients(vec![
        Observation::new("", "192.168.1.50").with_mac("AA:BB:CC:DD:EE:FF"),
    ]);

    let entries = service.run_cycle(Vec::new(), at(0)).await.into_entries();

    let text = hosts_file::render(&entries);
    assert!(text.contains("192.168.1.50 aa-bb-cc-dd-ee-ff.example.com aa-bb-cc-dd-ee-ff.local\n"));
}
