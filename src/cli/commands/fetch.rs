//! Fetch command: run the pipeline over a date range.

use std::sync::Arc;

use chrono::NaiveDate;
use console::style;

use crate::cli::helpers::print_records;
use crate::cli::icons::{arrow, warning};
use crate::cli::progress::render_events;
use fleet_dtc::config::Config;
use fleet_dtc::llm::DtcInterpreter;
use fleet_dtc::mail::{FetchWindow, ImapConnector, MailboxFetcher};
use fleet_dtc::pipeline::{EventSink, Pipeline};
use fleet_dtc::repository::DiagnosticRepository;

/// Fetch, interpret and store alerts received between `since` and `until`.
pub async fn cmd_fetch(
    config: &Config,
    since: NaiveDate,
    until: NaiveDate,
    show_raw: bool,
) -> anyhow::Result<()> {
    let window = FetchWindow::new(since, until)?;

    let (repository, report) = DiagnosticRepository::open(&config.database_path())?;
    for failure in &report.failed {
        eprintln!(
            "{} Column {} is missing: {}",
            warning(),
            failure.column,
            failure.error
        );
    }

    let connector = ImapConnector::new(config.mail.clone());
    let fetcher = MailboxFetcher::new(Arc::new(connector), config.mail.filter.clone());
    let interpreter = DtcInterpreter::from_config(config.llm.clone())?;
    let pipeline = Pipeline::new(fetcher, interpreter, repository);

    println!(
        "{} Fetching alerts from {} to {}",
        arrow(),
        style(since).cyan(),
        style(until).cyan()
    );

    let (events, rx) = EventSink::channel();
    let display = tokio::spawn(render_events(rx));
    let summary = pipeline.run(window, &events).await;
    drop(events);
    display.await?;

    if !summary.records.is_empty() {
        println!("\n{}", style("Current analysis results").bold());
        print_records(&summary.records, show_raw);
    }

    Ok(())
}
