//! The fetch run and its status channel.

mod events;
mod runner;

pub use events::{EventSink, PipelineEvent, RunStage};
pub use runner::{Pipeline, RunSummary};
