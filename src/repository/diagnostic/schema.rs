//! Table creation and additive column repair.

use std::collections::HashSet;

use rusqlite::{params, Connection};
use tracing::{info, warn};

use super::{DiagnosticRepository, TABLE_NAME};
use crate::repository::Result;

/// A column the table must carry.
struct RequiredColumn {
    name: &'static str,
    /// Type used when the table is created fresh.
    create_type: &'static str,
    /// Type used when the column is added to an existing table. SQLite rejects
    /// `ADD COLUMN` with a non-constant default, so this may differ.
    repair_type: &'static str,
}

const REQUIRED_COLUMNS: &[RequiredColumn] = &[
    RequiredColumn {
        name: "vehicle_name",
        create_type: "TEXT",
        repair_type: "TEXT",
    },
    RequiredColumn {
        name: "dtc_text",
        create_type: "TEXT",
        repair_type: "TEXT",
    },
    RequiredColumn {
        name: "ai_interpretation",
        create_type: "TEXT",
        repair_type: "TEXT",
    },
    RequiredColumn {
        name: "gps_coordinates",
        create_type: "TEXT",
        repair_type: "TEXT",
    },
    RequiredColumn {
        name: "location_address",
        create_type: "TEXT",
        repair_type: "TEXT",
    },
    RequiredColumn {
        name: "timestamp",
        create_type: "DATETIME DEFAULT CURRENT_TIMESTAMP",
        repair_type: "DATETIME",
    },
    RequiredColumn {
        name: "email_timestamp",
        create_type: "TEXT",
        repair_type: "TEXT",
    },
    RequiredColumn {
        name: "raw_email",
        create_type: "TEXT",
        repair_type: "TEXT",
    },
];

/// A column that could not be added during repair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnFailure {
    pub column: String,
    pub error: String,
}

/// Outcome of a schema check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaReport {
    /// The table did not exist and was created.
    pub created_table: bool,
    /// Columns added to an existing table.
    pub added: Vec<String>,
    /// Columns that are still missing because the `ALTER TABLE` failed.
    pub failed: Vec<ColumnFailure>,
}

impl SchemaReport {
    /// Whether any required column is still missing.
    pub fn is_degraded(&self) -> bool {
        !self.failed.is_empty()
    }
}

impl DiagnosticRepository {
    /// Create the table if absent, otherwise add any missing required columns.
    ///
    /// Existing rows and columns are never dropped or retyped. A column that
    /// fails to be added is recorded in the report and the check continues.
    pub fn ensure_schema(&self) -> Result<SchemaReport> {
        let conn = self.connect()?;
        let existing = existing_columns(&conn)?;

        if existing.is_empty() {
            let columns = REQUIRED_COLUMNS
                .iter()
                .map(|c| format!("{} {}", c.name, c.create_type))
                .collect::<Vec<_>>()
                .join(",\n                ");
            conn.execute_batch(&format!(
                r#"
                CREATE TABLE IF NOT EXISTS {TABLE_NAME} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                {columns}
                );
                "#
            ))?;
            info!("Created {} table", TABLE_NAME);
            return Ok(SchemaReport {
                created_table: true,
                ..SchemaReport::default()
            });
        }

        let mut report = SchemaReport::default();
        for column in REQUIRED_COLUMNS {
            if existing.contains(column.name) {
                continue;
            }
            let sql = format!(
                "ALTER TABLE {TABLE_NAME} ADD COLUMN {} {}",
                column.name, column.repair_type
            );
            match conn.execute(&sql, params![]) {
                Ok(_) => {
                    info!("Added missing column {}", column.name);
                    report.added.push(column.name.to_string());
                }
                Err(e) => {
                    warn!("Error adding column {}: {}", column.name, e);
                    report.failed.push(ColumnFailure {
                        column: column.name.to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }

        Ok(report)
    }
}

/// Column names of the diagnostic table, empty when the table does not exist.
fn existing_columns(conn: &Connection) -> Result<HashSet<String>> {
    let mut pragma = conn.prepare(&format!("PRAGMA table_info(\"{TABLE_NAME}\")"))?;
    let columns = pragma
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<std::result::Result<HashSet<_>, _>>()?;
    Ok(columns)
}
