//! Spinner display fed by pipeline status events.

use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc::UnboundedReceiver;

use super::icons::{error, success, warning};
use fleet_dtc::pipeline::PipelineEvent;

fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Render events until every sender is dropped.
pub async fn render_events(mut rx: UnboundedReceiver<PipelineEvent>) {
    let pb = spinner();
    pb.set_message("Starting...");

    while let Some(event) = rx.recv().await {
        match &event {
            PipelineEvent::StageChanged { .. } | PipelineEvent::ExtractionMissed { .. } => {}
            PipelineEvent::NoResults => {
                pb.suspend(|| println!("{} {}", warning(), event));
            }
            PipelineEvent::FetchFailed { .. } | PipelineEvent::RecordFailed { .. } => {
                pb.suspend(|| eprintln!("{} {}", error(), style(&event).red()));
            }
            PipelineEvent::MessageSkipped { .. }
            | PipelineEvent::InterpretFailed { .. }
            | PipelineEvent::NoRecordsProduced { .. } => {
                pb.suspend(|| eprintln!("{} {}", warning(), style(&event).yellow()));
            }
            PipelineEvent::MessagesFound { .. } => {
                pb.suspend(|| println!("{} {}", success(), event));
            }
            PipelineEvent::RecordStored { .. } => {
                pb.suspend(|| println!("  {} {}", success(), style(&event).dim()));
            }
            PipelineEvent::RunCompleted { .. } => {
                pb.finish_and_clear();
                println!("{} {}", success(), event);
            }
            _ => pb.set_message(event.to_string()),
        }
    }

    if !pb.is_finished() {
        pb.finish_and_clear();
    }
}
