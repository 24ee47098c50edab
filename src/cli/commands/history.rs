//! History command.

use chrono::NaiveDate;
use console::style;

use crate::cli::helpers::{print_records, records_json};
use crate::cli::icons::warning;
use fleet_dtc::config::Config;
use fleet_dtc::history::{query_history, HistoryFilter};
use fleet_dtc::repository::DiagnosticRepository;

/// Show stored records for a date range and optional vehicle.
pub fn cmd_history(
    config: &Config,
    since: NaiveDate,
    until: NaiveDate,
    vehicle: Option<&str>,
    show_raw: bool,
    json: bool,
) -> anyhow::Result<()> {
    let (repository, _) = DiagnosticRepository::open(&config.database_path())?;
    let filter = HistoryFilter::new(since, until).with_vehicle(vehicle);
    let records = query_history(&repository, &filter)?;

    if json {
        println!("{}", records_json(&records, show_raw)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("{} No records found for the selected filters", warning());
        return Ok(());
    }

    println!(
        "{} record(s) from {} to {}{}",
        style(records.len()).bold(),
        since,
        until,
        filter
            .vehicle
            .as_deref()
            .map(|v| format!(" for {}", v))
            .unwrap_or_default()
    );
    print_records(&records, show_raw);

    Ok(())
}
