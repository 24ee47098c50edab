//! Initialize command.

use console::style;

use crate::cli::icons::{error, success, warning};
use fleet_dtc::config::Config;
use fleet_dtc::repository::DiagnosticRepository;

/// Create the database, or add any columns a legacy table is missing.
pub fn cmd_init(config: &Config) -> anyhow::Result<()> {
    let db_path = config.database_path();
    let (repository, report) = DiagnosticRepository::open(&db_path)?;

    if report.created_table {
        println!("  {} Created table", success());
    }
    for column in &report.added {
        println!("  {} Added column: {}", success(), column);
    }
    for failure in &report.failed {
        println!(
            "  {} Could not add column {}: {}",
            error(),
            failure.column,
            failure.error
        );
    }

    if report.is_degraded() {
        println!(
            "{} Database {} is usable but missing columns",
            warning(),
            db_path.display()
        );
    } else {
        println!(
            "{} Initialized {} ({} records)",
            success(),
            style(db_path.display()).cyan(),
            repository.count()?
        );
    }

    Ok(())
}
