//! Opening a database written by an older release whose table lacks columns.

use chrono::NaiveDate;
use rusqlite::Connection;
use tempfile::TempDir;

use fleet_dtc::models::NewDiagnostic;
use fleet_dtc::repository::{DiagnosticRepository, TABLE_NAME};

fn legacy_database() -> (TempDir, std::path::PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dtc_logs.db");
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        r#"
        CREATE TABLE dtc_logs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            vehicle_name TEXT,
            dtc_text TEXT,
            ai_interpretation TEXT,
            timestamp DATETIME DEFAULT CURRENT_TIMESTAMP
        );
        INSERT INTO dtc_logs (vehicle_name, dtc_text, ai_interpretation, timestamp)
        VALUES ('Truck-7', 'P0420', 'Catalyst efficiency below threshold', '2026-09-30 16:20:00');
        "#,
    )
    .unwrap();
    (dir, path)
}

fn columns(path: &std::path::Path) -> Vec<String> {
    let conn = Connection::open(path).unwrap();
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({TABLE_NAME})"))
        .unwrap();
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    names
}

#[test]
fn missing_columns_are_added_and_rows_kept() {
    let (_dir, path) = legacy_database();

    let (repo, report) = DiagnosticRepository::open(&path).unwrap();
    assert!(!report.created_table);
    assert!(report.failed.is_empty());
    let mut added = report.added.clone();
    added.sort();
    assert_eq!(
        added,
        vec![
            "email_timestamp",
            "gps_coordinates",
            "location_address",
            "raw_email"
        ]
    );

    let cols = columns(&path);
    for expected in ["gps_coordinates", "location_address", "email_timestamp", "raw_email"] {
        assert!(cols.iter().any(|c| c == expected), "missing {}", expected);
    }

    let sept = NaiveDate::from_ymd_opt(2026, 9, 30).unwrap();
    let records = repo.query(sept, sept, None).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].vehicle_name, "Truck-7");
    assert_eq!(records[0].fault_text, "P0420");
    assert_eq!(records[0].email_timestamp, None);
    assert_eq!(records[0].raw_email, "");
}

#[test]
fn second_check_adds_nothing() {
    let (_dir, path) = legacy_database();

    let (repo, first) = DiagnosticRepository::open(&path).unwrap();
    assert_eq!(first.added.len(), 4);

    let second = repo.ensure_schema().unwrap();
    assert!(!second.created_table);
    assert!(second.added.is_empty());
    assert!(second.failed.is_empty());
    assert_eq!(repo.count().unwrap(), 1);
}

#[test]
fn repaired_table_accepts_new_records() {
    let (_dir, path) = legacy_database();
    let (repo, _) = DiagnosticRepository::open(&path).unwrap();

    let recorded_at = NaiveDate::from_ymd_opt(2026, 10, 18)
        .unwrap()
        .and_hms_opt(8, 0, 0)
        .unwrap();
    let fragment = NewDiagnostic::new("Van 3", "P0171", "Device: Van 3\nEvent: P0171\nSpeed: 0\n")
        .with_email_timestamp("2026-10-18 08:00:00 AM")
        .with_recorded_at(recorded_at);
    let stored = repo.insert(&fragment, Some("System too lean")).unwrap();
    assert_eq!(stored.id, 2);

    assert_eq!(repo.count().unwrap(), 2);
    assert_eq!(repo.vehicle_names().unwrap(), vec!["Truck-7", "Van 3"]);
}
