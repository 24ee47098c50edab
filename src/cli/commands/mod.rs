//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod config_cmd;
mod fetch;
mod history;
mod init;
mod vehicles;

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use fleet_dtc::config::Config;
use fleet_dtc::history::{self as history_view, default_range};

#[derive(Parser)]
#[command(name = "fleet-dtc")]
#[command(about = "Fetch, interpret and review vehicle diagnostic trouble code alerts")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Database file (overrides config and DTC_DATABASE)
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database or repair a legacy table
    Init,

    /// Fetch alert emails in a date range, interpret them and store the results
    Fetch {
        /// First day to fetch (YYYY-MM-DD, default: first of this month)
        #[arg(long)]
        since: Option<NaiveDate>,
        /// Last day to fetch, inclusive (YYYY-MM-DD, default: today)
        #[arg(long)]
        until: Option<NaiveDate>,
        /// Include the raw email body of each stored record
        #[arg(long)]
        show_raw: bool,
    },

    /// Show stored records
    History {
        /// First day to show (YYYY-MM-DD, default: first of this month)
        #[arg(long)]
        since: Option<NaiveDate>,
        /// Last day to show, inclusive (YYYY-MM-DD, default: today)
        #[arg(long)]
        until: Option<NaiveDate>,
        /// Only show this vehicle (exact name)
        #[arg(long)]
        vehicle: Option<String>,
        /// Include raw email bodies
        #[arg(long)]
        show_raw: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List vehicles with stored records
    Vehicles,

    /// Print the effective configuration with secrets masked
    Config,
}

/// Fill unset range bounds with the month-to-date default.
fn resolve_range(
    since: Option<NaiveDate>,
    until: Option<NaiveDate>,
    today: NaiveDate,
) -> (NaiveDate, NaiveDate) {
    let until = until.unwrap_or(today);
    let (default_since, _) = default_range(until);
    (since.unwrap_or(default_since), until)
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).await?;
    if let Some(database) = cli.database {
        config.database = database.to_string_lossy().into_owned();
    }

    let today = history_view::today();

    match cli.command {
        Commands::Init => init::cmd_init(&config),
        Commands::Fetch {
            since,
            until,
            show_raw,
        } => {
            let (since, until) = resolve_range(since, until, today);
            fetch::cmd_fetch(&config, since, until, show_raw).await
        }
        Commands::History {
            since,
            until,
            vehicle,
            show_raw,
            json,
        } => {
            let (since, until) = resolve_range(since, until, today);
            history::cmd_history(&config, since, until, vehicle.as_deref(), show_raw, json)
        }
        Commands::Vehicles => vehicles::cmd_vehicles(&config),
        Commands::Config => config_cmd::cmd_config_show(&config),
    }
}
