//! fleet-dtc: vehicle diagnostic trouble code alerts from mailbox to history.
//!
//! Alert emails are fetched from an IMAP mailbox, the device and fault codes
//! are extracted from each body, a language model explains the codes, and
//! the result is stored in SQLite for later review.

#![allow(clippy::should_implement_trait)]

pub mod config;
pub mod extract;
pub mod history;
pub mod llm;
pub mod mail;
pub mod models;
pub mod pipeline;
pub mod repository;

pub use config::Config;
pub use history::{query_history, HistoryFilter};
pub use pipeline::{EventSink, Pipeline, PipelineEvent, RunSummary};
