//! History retrieval.

use chrono::NaiveDate;
use rusqlite::Row;

use super::{DiagnosticRepository, TABLE_NAME};
use crate::models::DiagnosticRecord;
use crate::repository::{parse_datetime, Result};

const SELECT_COLUMNS: &str = "rowid AS id, vehicle_name, dtc_text, ai_interpretation, \
     gps_coordinates, location_address, timestamp, email_timestamp, raw_email";

impl DiagnosticRepository {
    /// Records whose `recorded_at` date falls within `since..=until`, newest first.
    ///
    /// `vehicle` filters by exact vehicle name.
    pub fn query(
        &self,
        since: NaiveDate,
        until: NaiveDate,
        vehicle: Option<&str>,
    ) -> Result<Vec<DiagnosticRecord>> {
        let conn = self.connect()?;

        let since = since.format("%Y-%m-%d").to_string();
        let until = until.format("%Y-%m-%d").to_string();

        let (sql, params_vec): (String, Vec<Box<dyn rusqlite::ToSql>>) = match vehicle {
            Some(name) => (
                format!(
                    "SELECT {SELECT_COLUMNS} FROM {TABLE_NAME}
                     WHERE DATE(timestamp) BETWEEN ?1 AND ?2
                       AND vehicle_name = ?3
                     ORDER BY timestamp DESC, id DESC"
                ),
                vec![Box::new(since), Box::new(until), Box::new(name.to_string())],
            ),
            None => (
                format!(
                    "SELECT {SELECT_COLUMNS} FROM {TABLE_NAME}
                     WHERE DATE(timestamp) BETWEEN ?1 AND ?2
                     ORDER BY timestamp DESC, id DESC"
                ),
                vec![Box::new(since), Box::new(until)],
            ),
        };

        let mut stmt = conn.prepare(&sql)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        let records = stmt
            .query_map(params_refs.as_slice(), row_to_record)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(records)
    }

    /// Distinct vehicle names, sorted.
    pub fn vehicle_names(&self) -> Result<Vec<String>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT DISTINCT vehicle_name FROM {TABLE_NAME}
             WHERE vehicle_name IS NOT NULL
             ORDER BY vehicle_name"
        ))?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(names)
    }

    /// Total number of stored records.
    pub fn count(&self) -> Result<u64> {
        let conn = self.connect()?;
        let count: i64 =
            conn.query_row(&format!("SELECT COUNT(*) FROM {TABLE_NAME}"), [], |row| {
                row.get(0)
            })?;
        Ok(count.max(0) as u64)
    }
}

/// Map a row to a record. Legacy rows may carry NULLs in any column.
fn row_to_record(row: &Row) -> rusqlite::Result<DiagnosticRecord> {
    Ok(DiagnosticRecord {
        id: row.get("id")?,
        vehicle_name: row.get::<_, Option<String>>("vehicle_name")?.unwrap_or_default(),
        fault_text: row.get::<_, Option<String>>("dtc_text")?.unwrap_or_default(),
        interpretation: row.get("ai_interpretation")?,
        gps_coordinates: row
            .get::<_, Option<String>>("gps_coordinates")?
            .unwrap_or_default(),
        location_address: row
            .get::<_, Option<String>>("location_address")?
            .unwrap_or_default(),
        recorded_at: row
            .get::<_, Option<String>>("timestamp")?
            .map(|s| parse_datetime(&s))
            .unwrap_or(chrono::DateTime::UNIX_EPOCH.naive_utc()),
        email_timestamp: row.get("email_timestamp")?,
        raw_email: row.get::<_, Option<String>>("raw_email")?.unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::super::tests::setup_test_repo;
    use crate::models::NewDiagnostic;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, day).unwrap()
    }

    #[test]
    fn test_round_trip() {
        let (repo, _dir) = setup_test_repo();
        let fragment = NewDiagnostic::new("Truck-12", "P0301 misfire", "Device: Truck-12\n...")
            .with_email_timestamp("2026-10-05 09:15:00 AM")
            .with_recorded_at(at(5, 9));
        let stored = repo.insert(&fragment, Some("Cylinder 1 misfire")).unwrap();

        let found = repo.query(date(5), date(5), Some("Truck-12")).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0], stored);
        assert_eq!(found[0].fault_text, "P0301 misfire");
        assert_eq!(found[0].interpretation.as_deref(), Some("Cylinder 1 misfire"));
        assert_eq!(found[0].raw_email, "Device: Truck-12\n...");
    }

    #[test]
    fn test_range_is_inclusive_and_newest_first() {
        let (repo, _dir) = setup_test_repo();
        for (day, name) in [(1, "before"), (2, "start"), (4, "middle"), (6, "end"), (7, "after")] {
            repo.insert(
                &NewDiagnostic::new(name, "P0000", "body").with_recorded_at(at(day, 23)),
                None,
            )
            .unwrap();
        }

        let names: Vec<String> = repo
            .query(date(2), date(6), None)
            .unwrap()
            .into_iter()
            .map(|r| r.vehicle_name)
            .collect();
        assert_eq!(names, vec!["end", "middle", "start"]);
    }

    #[test]
    fn test_vehicle_filter_is_exact() {
        let (repo, _dir) = setup_test_repo();
        for name in ["Truck-1", "Truck-12", "truck-1"] {
            repo.insert(
                &NewDiagnostic::new(name, "P0000", "body").with_recorded_at(at(3, 8)),
                None,
            )
            .unwrap();
        }

        let found = repo.query(date(1), date(31), Some("Truck-1")).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].vehicle_name, "Truck-1");
    }

    #[test]
    fn test_vehicle_names_are_distinct() {
        let (repo, _dir) = setup_test_repo();
        for name in ["Van-2", "Truck-1", "Van-2"] {
            repo.insert(&NewDiagnostic::new(name, "P0000", "body"), None)
                .unwrap();
        }
        assert_eq!(repo.vehicle_names().unwrap(), vec!["Truck-1", "Van-2"]);
    }
}
