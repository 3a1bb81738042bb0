//! # SQLite Record Store
//!
//! PowerDNS generic-SQL schema (`domains`, `records`) plus a `unifi_hosts`
//! table keeping the first and last time each host was seen.
//!
//! `domains` is managed by the DNS administrator. New records are attached to
//! the longest configured zone that contains them, or left without a domain
//! when none matches.

use chrono::Utc;
use hostsync_common::config::DatabaseConfig;
use hostsync_core::projection::records::{
    Record, RecordBatch, RecordStore, RecordType, Sighting, StoreError,
};
use rusqlite::{Connection, OptionalExtension, Transaction, params};
use tracing::debug;

use crate::error::StorageError;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS domains (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    name            VARCHAR(255) NOT NULL,
    master          VARCHAR(128),
    last_check      INTEGER,
    type            VARCHAR(6) NOT NULL DEFAULT 'NATIVE',
    notified_serial INTEGER,
    account         VARCHAR(40)
);

CREATE TABLE IF NOT EXISTS records (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    domain_id   INTEGER,
    name        VARCHAR(255),
    type        VARCHAR(10),
    content     TEXT,
    ttl         INTEGER,
    prio        INTEGER NOT NULL DEFAULT 0,
    change_date INTEGER,
    disabled    BOOLEAN NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS records_name_type ON records (name, type);

CREATE TABLE IF NOT EXISTS unifi_hosts (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    name       VARCHAR(255) NOT NULL UNIQUE,
    ip         VARCHAR(45) NOT NULL,
    first_seen TIMESTAMP NOT NULL,
    last_seen  TIMESTAMP NOT NULL
);
"#;

pub const DRIVER: &str = "sqlite";

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (or creates) the database at `dsn` and ensures the schema exists.
    /// `:memory:` opens a private in-memory database.
    pub fn open(dsn: &str) -> Result<Self, StorageError> {
        let conn: Connection = Connection::open(dsn).map_err(|source| StorageError::Open {
            dsn: dsn.to_string(),
            source,
        })?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::open(":memory:")
    }

    pub fn from_config(config: &DatabaseConfig) -> Result<Self, StorageError> {
        if !config.driver.eq_ignore_ascii_case(DRIVER) {
            return Err(StorageError::UnsupportedDriver(config.driver.clone()));
        }
        Self::open(&config.dsn)
    }

    fn with_connection(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch(SCHEMA).map_err(StorageError::Schema)?;
        Ok(Self { conn })
    }

    /// Registers a zone that new records may be attached to.
    pub fn add_domain(&self, name: &str) -> Result<i64, StorageError> {
        self.conn.execute(
            "INSERT INTO domains (name, type) VALUES (?1, 'NATIVE')",
            params![name.trim().trim_end_matches('.').to_lowercase()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// The `domain_id` stored with the record called `name`, if any.
    pub fn domain_of(&self, name: &str) -> Result<Option<i64>, StorageError> {
        let domain: Option<Option<i64>> = self
            .conn
            .query_row(
                "SELECT domain_id FROM records WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(domain.flatten())
    }

    pub fn record_count(&self) -> Result<usize, StorageError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    fn apply_in(tx: &Transaction<'_>, batch: &RecordBatch) -> rusqlite::Result<()> {
        let now: i64 = Utc::now().timestamp();

        {
            let mut update = tx.prepare(
                "UPDATE records SET content = ?1, ttl = ?2, change_date = ?3 WHERE id = ?4",
            )?;
            for record in &batch.updates {
                let Some(id) = record.id else {
                    continue;
                };
                update.execute(params![record.content, record.ttl, now, id])?;
            }
        }

        let zones: Vec<(i64, String)> = {
            let mut stmt = tx.prepare("SELECT id, name FROM domains")?;
            let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
            rows.collect::<rusqlite::Result<_>>()?
        };

        let mut insert = tx.prepare(
            "INSERT INTO records (domain_id, name, type, content, ttl, change_date) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        for record in &batch.inserts {
            let domain_id: Option<i64> = zone_for(&zones, &record.name);
            insert.execute(params![
                domain_id,
                record.name,
                record.kind.as_str(),
                record.content,
                record.ttl,
                now,
            ])?;
        }

        Ok(())
    }
}

/// The id of the longest zone equal to or containing `name`.
fn zone_for(zones: &[(i64, String)], name: &str) -> Option<i64> {
    let name: String = name.to_lowercase();
    zones
        .iter()
        .filter(|(_, zone)| {
            let zone: String = zone.to_lowercase();
            name == zone || name.ends_with(&format!(".{zone}"))
        })
        .max_by_key(|(_, zone)| zone.len())
        .map(|(id, _)| *id)
}

impl RecordStore for SqliteStore {
    fn records_of_type(&self, kind: RecordType) -> Result<Vec<Record>, StoreError> {
        let read_failed = |source: rusqlite::Error| StoreError::Read {
            kind,
            source: Box::new(source),
        };

        let mut stmt = self
            .conn
            .prepare("SELECT id, name, content, ttl FROM records WHERE type = ?1 ORDER BY id")
            .map_err(read_failed)?;
        let rows = stmt
            .query_map(params![kind.as_str()], |row| {
                Ok(Record {
                    id: Some(row.get(0)?),
                    name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                    kind,
                    content: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                    ttl: row.get::<_, Option<u32>>(3)?.unwrap_or_default(),
                })
            })
            .map_err(read_failed)?;

        rows.collect::<rusqlite::Result<Vec<Record>>>()
            .map_err(read_failed)
    }

    fn apply(&mut self, batch: &RecordBatch) -> Result<(), StoreError> {
        let apply_failed = |source: rusqlite::Error| StoreError::Apply {
            updates: batch.updates.len(),
            inserts: batch.inserts.len(),
            source: Box::new(source),
        };

        let tx: Transaction<'_> = self.conn.transaction().map_err(apply_failed)?;
        Self::apply_in(&tx, batch).map_err(apply_failed)?;
        tx.commit().map_err(apply_failed)?;

        debug!(
            updates = batch.updates.len(),
            inserts = batch.inserts.len(),
            "record batch committed"
        );
        Ok(())
    }

    fn record_sightings(&mut self, sightings: &[Sighting]) -> Result<(), StoreError> {
        let failed = |source: rusqlite::Error| StoreError::Sightings {
            source: Box::new(source),
        };

        let tx: Transaction<'_> = self.conn.transaction().map_err(failed)?;
        {
            let mut upsert = tx
                .prepare(
                    "INSERT INTO unifi_hosts (name, ip, first_seen, last_seen) \
                     VALUES (?1, ?2, ?3, ?3) \
                     ON CONFLICT (name) DO UPDATE SET ip = excluded.ip, last_seen = excluded.last_seen",
                )
                .map_err(failed)?;
            for sighting in sightings {
                upsert
                    .execute(params![
                        sighting.name,
                        sighting.address.to_string(),
                        sighting.seen_at,
                    ])
                    .map_err(failed)?;
            }
        }
        tx.commit().map_err(failed)
    }
}
