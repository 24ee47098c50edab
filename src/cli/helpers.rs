//! Record rendering shared by `fetch` and `history`.

use console::style;

use fleet_dtc::models::DiagnosticRecord;

/// Print records as labelled blocks, newest first as given.
pub fn print_records(records: &[DiagnosticRecord], show_raw: bool) {
    for record in records {
        println!(
            "\n{} {}",
            style(format!("── {} ", record.vehicle_name)).bold(),
            style(record.recorded_at.format("%Y-%m-%d %H:%M:%S")).dim()
        );
        println!("  {:<14} {}", style("DTC:").cyan(), record.fault_text);
        println!(
            "  {:<14} {}",
            style("Email time:").cyan(),
            record.email_timestamp.as_deref().unwrap_or("-")
        );
        println!(
            "  {:<14} {} / {}",
            style("Location:").cyan(),
            record.gps_coordinates,
            record.location_address
        );
        println!("  {}", style("Interpretation:").cyan());
        for line in record.interpretation_text().lines() {
            println!("    {}", line);
        }
        if show_raw {
            println!("  {}", style("Raw email:").cyan());
            for line in record.raw_email.lines() {
                println!("    {}", style(line).dim());
            }
        }
    }
}

/// Records as pretty JSON; `raw_email` is dropped unless requested.
pub fn records_json(records: &[DiagnosticRecord], show_raw: bool) -> serde_json::Result<String> {
    let mut values = Vec::with_capacity(records.len());
    for record in records {
        let mut value = serde_json::to_value(record)?;
        if !show_raw {
            if let Some(obj) = value.as_object_mut() {
                obj.remove("raw_email");
            }
        }
        values.push(value);
    }
    serde_json::to_string_pretty(&values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record() -> DiagnosticRecord {
        DiagnosticRecord {
            id: 1,
            vehicle_name: "Truck-12".into(),
            fault_text: "P0301".into(),
            interpretation: Some("Cylinder 1 misfire".into()),
            gps_coordinates: "N/A".into(),
            location_address: "N/A".into(),
            recorded_at: NaiveDate::from_ymd_opt(2026, 10, 18)
                .unwrap()
                .and_hms_opt(7, 42, 0)
                .unwrap(),
            email_timestamp: None,
            raw_email: "Device: Truck-12".into(),
        }
    }

    #[test]
    fn test_records_json_hides_raw_by_default() {
        let json = records_json(&[record()], false).unwrap();
        assert!(json.contains("Truck-12"));
        assert!(!json.contains("raw_email"));

        let json = records_json(&[record()], true).unwrap();
        assert!(json.contains("\"raw_email\""));
    }
}
