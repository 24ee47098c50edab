//! Repository layer for SQLite persistence.

mod diagnostic;

use std::path::Path;

use chrono::NaiveDateTime;
use rusqlite::Connection;
use thiserror::Error;

use crate::models::RECORDED_AT_FORMAT;

pub use diagnostic::{ColumnFailure, DiagnosticRepository, SchemaReport, TABLE_NAME};

/// Errors raised by the repository layer.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),
}

pub type Result<T> = std::result::Result<T, RepositoryError>;

/// Open a connection to the SQLite database, creating parent directories as needed.
pub fn connect(db_path: &Path) -> Result<Connection> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let conn = Connection::open(db_path)?;
    conn.busy_timeout(std::time::Duration::from_secs(5))?;
    Ok(conn)
}

/// Parse a stored timestamp, defaulting to the Unix epoch on error.
///
/// Accepts the `CURRENT_TIMESTAMP` layout as well as RFC 3339 and the
/// `T`-separated form some SQLite tools write.
pub fn parse_datetime(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, RECORDED_AT_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
        .or_else(|_| {
            chrono::DateTime::parse_from_rfc3339(s).map(|dt| dt.naive_utc())
        })
        .unwrap_or(chrono::DateTime::UNIX_EPOCH.naive_utc())
}
