//! Output adapters: the hosts file and the SQLite record store.

pub mod error;
pub mod hosts_file;
pub mod sqlite;

pub use error::StorageError;
pub use hosts_file::HostsFile;
pub use sqlite::SqliteStore;
