//! Status events emitted while a fetch run progresses.

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    Idle,
    Fetching,
    Extracting,
    Interpreting,
    Persisting,
    Done,
}

impl RunStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Fetching => "fetching",
            Self::Extracting => "extracting",
            Self::Interpreting => "interpreting",
            Self::Persisting => "persisting",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress and failure notifications for the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    StageChanged {
        stage: RunStage,
    },
    Connecting {
        server: String,
    },
    Searching {
        criteria: String,
    },
    /// The search matched nothing. Not an error.
    NoResults,
    /// Connection, login or search failed; the batch is empty.
    FetchFailed {
        error: String,
    },
    MessagesFound {
        count: usize,
    },
    MessageFetched {
        id: u32,
        subject: Option<String>,
    },
    MessageSkipped {
        id: u32,
        reason: String,
    },
    ExtractionMissed {
        id: u32,
    },
    InterpretStarted {
        vehicle: String,
    },
    InterpretCompleted {
        vehicle: String,
    },
    InterpretFailed {
        vehicle: String,
        error: String,
    },
    RecordStored {
        id: i64,
        vehicle: String,
    },
    RecordFailed {
        vehicle: String,
        error: String,
    },
    /// Messages were fetched but no record was stored, either because none
    /// held a diagnostic block or because every insert failed.
    NoRecordsProduced {
        fetched: usize,
    },
    RunCompleted {
        fetched: usize,
        processed: usize,
        skipped: usize,
        failed: usize,
    },
}

impl PipelineEvent {
    /// Whether the event reports something the operator should see as a warning.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            Self::FetchFailed { .. }
                | Self::MessageSkipped { .. }
                | Self::InterpretFailed { .. }
                | Self::RecordFailed { .. }
                | Self::NoRecordsProduced { .. }
        )
    }
}

impl fmt::Display for PipelineEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StageChanged { stage } => write!(f, "Stage: {}", stage),
            Self::Connecting { server } => write!(f, "Connecting to {}", server),
            Self::Searching { criteria } => write!(f, "Searching: {}", criteria),
            Self::NoResults => write!(f, "No emails found in the selected date range"),
            Self::FetchFailed { error } => write!(f, "Error fetching emails: {}", error),
            Self::MessagesFound { count } => write!(f, "Found {} email(s)", count),
            Self::MessageFetched { id, subject } => match subject {
                Some(subject) => write!(f, "Fetched message {}: {}", id, subject),
                None => write!(f, "Fetched message {}", id),
            },
            Self::MessageSkipped { id, reason } => {
                write!(f, "Skipped message {}: {}", id, reason)
            }
            Self::ExtractionMissed { id } => {
                write!(f, "No diagnostic block in message {}", id)
            }
            Self::InterpretStarted { vehicle } => write!(f, "Interpreting codes for {}", vehicle),
            Self::InterpretCompleted { vehicle } => {
                write!(f, "Interpretation ready for {}", vehicle)
            }
            Self::InterpretFailed { vehicle, error } => {
                write!(f, "Error interpreting codes for {}: {}", vehicle, error)
            }
            Self::RecordStored { id, vehicle } => write!(f, "Stored record {} for {}", id, vehicle),
            Self::RecordFailed { vehicle, error } => {
                write!(f, "Failed to store record for {}: {}", vehicle, error)
            }
            Self::NoRecordsProduced { fetched } => write!(
                f,
                "{} email(s) fetched but no records were stored",
                fetched
            ),
            Self::RunCompleted {
                fetched,
                processed,
                skipped,
                failed,
            } => write!(
                f,
                "Processed {} of {} email(s) ({} skipped, {} failed)",
                processed, fetched, skipped, failed
            ),
        }
    }
}

/// Sending half of the status channel.
///
/// Every event is also logged. Sending never fails: events are dropped once
/// the receiver is gone.
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    tx: Option<mpsc::UnboundedSender<PipelineEvent>>,
}

impl EventSink {
    pub fn new(tx: mpsc::UnboundedSender<PipelineEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    /// A sink with its receiving half.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<PipelineEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    /// A sink that only logs.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn emit(&self, event: PipelineEvent) {
        match &event {
            PipelineEvent::ExtractionMissed { .. }
            | PipelineEvent::MessageFetched { .. }
            | PipelineEvent::StageChanged { .. } => debug!("{}", event),
            e if e.is_warning() => warn!("{}", event),
            _ => info!("{}", event),
        }

        if let Some(tx) = &self.tx {
            let _ = tx.send(event);
        }
    }
}
