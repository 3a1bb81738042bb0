use std::fs;

use hostsync_core::projection::hosts_file::HostsSink;
use hostsync_core::projection::records::{RecordStore, RecordType};
use hostsync_core::report::Event;
use hostsync_storage::{HostsFile, SqliteStore};

use crate::support::{at, client, config, service};

const CONFIG: &str = r#"
[unifi]
host = "unifi.lan"

[hostsfile]
filename = "/tmp/hosts"

[database]
driver = "sqlite"
dsn = ":memory:"

[processing]
domains = ["local", "example.com"]

[[processing.cnames]]
cname = "files.example.com"
hostname = "test1.example.com"

[[processing.cnames]]
cname = "ghost.example.com"
hostname = "nowhere.example.com"
"#;

fn content(store: &SqliteStore, kind: RecordType, name: &str) -> Option<String> {
    store
        .records_of_type(kind)
        .unwrap()
        .into_iter()
        .find(|record| record.name == name)
        .map(|record| record.content)
}

#[tokio::test]
async fn records_are_inserted_then_updated_in_place() {
    let config = config(CONFIG);
    let (service, remote, observer) = service(&config);
    let mut store = SqliteStore::from_config(&config.database).unwrap();
    store.add_domain("example.com").unwrap();

    remote.set_clients(vec![
        client("test1", "192.168.1.100"),
        client("test2", "192.168.1.101"),
    ]);
    let first = service.run_cycle(Vec::new(), at(0)).await.into_entries();
    let published = service
        .publish(&first, None, Some(&mut store as &mut dyn RecordStore))
        .unwrap();

    let summary = published.records.unwrap();
    assert_eq!(summary.inserted, 5);
    assert_eq!(summary.updated, 0);
    assert_eq!(store.record_count().unwrap(), 5);
    assert_eq!(
        content(&store, RecordType::Cname, "files.example.com").as_deref(),
        Some("test1.example.com")
    );
    assert!(store.domain_of("test1.example.com").unwrap().is_some());
    assert_eq!(store.domain_of("test1.local").unwrap(), None);
    assert!(observer.events().contains(&Event::AliasSkipped {
        alias: "ghost.example.com".into(),
        target: "nowhere.example.com".into(),
    }));

    remote.set_clients(vec![
        client("test1", "192.168.1.102"),
        client("test2", "192.168.1.103"),
    ]);
    let second = service.run_cycle(first, at(60)).await.into_entries();
    let summary = service
        .publish(&second, None, Some(&mut store as &mut dyn RecordStore))
        .unwrap()
        .records
        .unwrap();

    assert_eq!(summary.updated, 4);
    assert_eq!(summary.inserted, 0);
    assert_eq!(store.record_count().unwrap(), 5);
    for name in ["test1.local", "test1.example.com"] {
        assert_eq!(
            content(&store, RecordType::A, name).as_deref(),
            Some("192.168.1.102")
        );
    }
    for name in ["test2.local", "test2.example.com"] {
        assert_eq!(
            content(&store, RecordType::A, name).as_deref(),
            Some("192.168.1.103")
        );
    }
}

#[tokio::test]
async fn republishing_an_unchanged_set_is_a_no_op() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(CONFIG);
    let (service, remote, _) = service(&config);
    let mut hosts = HostsFile::new(dir.path().join("hosts"));
    let mut store = SqliteStore::open(dir.path().join("pdns.sqlite").to_str().unwrap()).unwrap();

    remote.set_clients(vec![client("test1", "192.168.1.100"), client("nas", "fd00::5")]);
    let entries = service.run_cycle(Vec::new(), at(0)).await.into_entries();

    service
        .publish(
            &entries,
            Some(&mut hosts as &mut dyn HostsSink),
            Some(&mut store as &mut dyn RecordStore),
        )
        .unwrap();
    let first_text = fs::read(hosts.path()).unwrap();

    let again = service.run_cycle(entries, at(0)).await.into_entries();
    let published = service
        .publish(
            &again,
            Some(&mut hosts as &mut dyn HostsSink),
            Some(&mut store as &mut dyn RecordStore),
        )
        .unwrap();

    assert_eq!(fs::read(hosts.path()).unwrap(), first_text);
    let summary = published.records.unwrap();
    assert_eq!((summary.updated, summary.inserted), (0, 0));
    assert_eq!(
        content(&store, RecordType::Aaaa, "nas.local").as_deref(),
        Some("fd00::5")
    );
}

#[tokio::test]
async fn hosts_file_lists_only_published_hosts() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(CONFIG);
    let (service, remote, _) = service(&config);
    let mut hosts = HostsFile::new(dir.path().join("hosts"));

    remote.set_clients(vec![
        client("test1", "192.168.1.100"),
        client("00:11:22:33:44:55", "192.168.1.150"),
    ]);
    let entries = service.run_cycle(Vec::new(), at(0)).await.into_entries();
    let published = service
        .publish(&entries, Some(&mut hosts as &mut dyn HostsSink), None)
        .unwrap();

    assert_eq!(published.hosts, Some(1));
    assert_eq!(published.records, None);
    assert_eq!(
        fs::read_to_string(hosts.path()).unwrap(),
        "# This file created by hostsync\n\
         # Do not manually edit\n\
         \n\
         192.168.1.100 test1.local test1.example.com\n"
    );
}
