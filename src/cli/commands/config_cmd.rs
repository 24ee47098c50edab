//! Configuration display command.

use console::style;

use crate::cli::icons::arrow;
use fleet_dtc::config::Config;

/// Print the effective configuration with secrets masked.
pub fn cmd_config_show(config: &Config) -> anyhow::Result<()> {
    let source = config
        .source_path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "defaults (no config file found)".to_string());

    eprintln!("{} Source:   {}", arrow(), style(source).dim());
    eprintln!(
        "{} Database: {}",
        arrow(),
        style(config.database_path().display()).dim()
    );
    println!("{}", serde_json::to_string_pretty(&config.masked())?);

    Ok(())
}
