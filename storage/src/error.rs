use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("unsupported database driver '{0}'")]
    UnsupportedDriver(String),
    #[error("failed to open database '{dsn}'")]
    Open {
        dsn: String,
        #[source]
        source: rusqlite::Error,
    },
    #[error("failed to create database schema")]
    Schema(#[source] rusqlite::Error),
    #[error("database query failed")]
    Query(#[from] rusqlite::Error),
}
