//! Vehicles command.

use crate::cli::icons::warning;
use fleet_dtc::config::Config;
use fleet_dtc::repository::DiagnosticRepository;

/// List the distinct vehicle names in the store.
pub fn cmd_vehicles(config: &Config) -> anyhow::Result<()> {
    let (repository, _) = DiagnosticRepository::open(&config.database_path())?;
    let names = repository.vehicle_names()?;

    if names.is_empty() {
        println!("{} No vehicles recorded yet", warning());
    }
    for name in names {
        println!("{}", name);
    }

    Ok(())
}
