//! Diagnostic record repository for SQLite persistence.
//!
//! - `schema`: table creation and additive column repair
//! - `query`: history retrieval and vehicle listing
//!
//! Records are append-only: this repository never updates or deletes rows.

mod query;
mod schema;

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection};
use tracing::debug;

use super::{RepositoryError, Result};
use crate::models::{DiagnosticRecord, NewDiagnostic, RECORDED_AT_FORMAT};

pub use schema::{ColumnFailure, SchemaReport};

/// Table holding diagnostic records.
pub const TABLE_NAME: &str = "dtc_logs";

/// SQLite-backed diagnostic record repository.
pub struct DiagnosticRepository {
    db_path: PathBuf,
}

impl DiagnosticRepository {
    /// Create a repository for the given database file.
    ///
    /// Does not touch the schema; call [`ensure_schema`](Self::ensure_schema) at startup.
    pub fn new(db_path: &Path) -> Self {
        Self {
            db_path: db_path.to_path_buf(),
        }
    }

    /// Create a repository and bring its schema up to date.
    pub fn open(db_path: &Path) -> Result<(Self, SchemaReport)> {
        let repo = Self::new(db_path);
        let report = repo.ensure_schema()?;
        Ok((repo, report))
    }

    pub(crate) fn connect(&self) -> Result<Connection> {
        super::connect(&self.db_path)
    }

    /// Append a record. Assigns `id`, and `recorded_at` unless the fragment supplies one.
    pub fn insert(
        &self,
        fragment: &NewDiagnostic,
        interpretation: Option<&str>,
    ) -> Result<DiagnosticRecord> {
        if fragment.vehicle_name.trim().is_empty() {
            return Err(RepositoryError::InvalidRecord(
                "vehicle name is empty".to_string(),
            ));
        }
        if fragment.fault_text.trim().is_empty() {
            return Err(RepositoryError::InvalidRecord(
                "fault text is empty".to_string(),
            ));
        }

        let recorded_at = fragment.recorded_at_or_now();
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        tx.execute(
            &format!(
                r#"
                INSERT INTO {TABLE_NAME}
                    (vehicle_name, dtc_text, ai_interpretation, gps_coordinates,
                     location_address, timestamp, email_timestamp, raw_email)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#
            ),
            params![
                fragment.vehicle_name,
                fragment.fault_text,
                interpretation,
                fragment.gps_coordinates,
                fragment.location_address,
                recorded_at.format(RECORDED_AT_FORMAT).to_string(),
                fragment.email_timestamp,
                fragment.raw_email,
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        debug!("Stored diagnostic {} for {}", id, fragment.vehicle_name);

        Ok(DiagnosticRecord {
            id,
            vehicle_name: fragment.vehicle_name.clone(),
            fault_text: fragment.fault_text.clone(),
            interpretation: interpretation.map(str::to_string),
            gps_coordinates: fragment.gps_coordinates.clone(),
            location_address: fragment.location_address.clone(),
            recorded_at,
            email_timestamp: fragment.email_timestamp.clone(),
            raw_email: fragment.raw_email.clone(),
        })
    }
}
