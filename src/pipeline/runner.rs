//! Drives one fetch run: mailbox batch, then extract, interpret and store per message.

use tracing::debug;

use super::events::{EventSink, PipelineEvent, RunStage};
use crate::extract::extract;
use crate::llm::DtcInterpreter;
use crate::mail::{FetchWindow, FetchedMessage, MailboxFetcher};
use crate::models::DiagnosticRecord;
use crate::repository::DiagnosticRepository;

/// Outcome of a run.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Messages returned by the mailbox.
    pub fetched: usize,
    /// Records written to the store.
    pub processed: usize,
    /// Messages without a diagnostic block.
    pub skipped: usize,
    /// Records whose insert failed.
    pub failed: usize,
    /// The records written by this run, in mailbox order.
    pub records: Vec<DiagnosticRecord>,
}

/// Fetch → extract → interpret → persist, one message at a time.
pub struct Pipeline {
    fetcher: MailboxFetcher,
    interpreter: DtcInterpreter,
    repository: DiagnosticRepository,
}

impl Pipeline {
    pub fn new(
        fetcher: MailboxFetcher,
        interpreter: DtcInterpreter,
        repository: DiagnosticRepository,
    ) -> Self {
        Self {
            fetcher,
            interpreter,
            repository,
        }
    }

    pub fn repository(&self) -> &DiagnosticRepository {
        &self.repository
    }

    /// Run the pipeline over every message in the window.
    ///
    /// Never fails. Transport problems surface as events and an empty summary;
    /// per-message problems are counted and the batch continues.
    pub async fn run(&self, window: FetchWindow, events: &EventSink) -> RunSummary {
        events.emit(PipelineEvent::StageChanged {
            stage: RunStage::Idle,
        });
        events.emit(PipelineEvent::StageChanged {
            stage: RunStage::Fetching,
        });
        let messages = self.fetcher.fetch(window, events).await;

        let mut summary = RunSummary {
            fetched: messages.len(),
            ..RunSummary::default()
        };

        for message in &messages {
            self.process(message, events, &mut summary).await;
        }

        if summary.fetched > 0 && summary.processed == 0 {
            events.emit(PipelineEvent::NoRecordsProduced {
                fetched: summary.fetched,
            });
        }
        events.emit(PipelineEvent::RunCompleted {
            fetched: summary.fetched,
            processed: summary.processed,
            skipped: summary.skipped,
            failed: summary.failed,
        });
        events.emit(PipelineEvent::StageChanged {
            stage: RunStage::Done,
        });

        summary
    }

    async fn process(&self, message: &FetchedMessage, events: &EventSink, summary: &mut RunSummary) {
        events.emit(PipelineEvent::StageChanged {
            stage: RunStage::Extracting,
        });
        let Some(mut fragment) = extract(&message.body) else {
            events.emit(PipelineEvent::ExtractionMissed { id: message.id });
            summary.skipped += 1;
            return;
        };

        // The Date header is authoritative; the body Time: line is the fallback.
        if let Some(date) = &message.email_timestamp {
            fragment.email_timestamp = Some(date.clone());
        }

        events.emit(PipelineEvent::StageChanged {
            stage: RunStage::Interpreting,
        });
        let interpretation = self
            .interpreter
            .interpret(&fragment.vehicle_name, &fragment.fault_text, events)
            .await;

        events.emit(PipelineEvent::StageChanged {
            stage: RunStage::Persisting,
        });
        match self.repository.insert(&fragment, Some(&interpretation)) {
            Ok(record) => {
                debug!("Message {} stored as record {}", message.id, record.id);
                events.emit(PipelineEvent::RecordStored {
                    id: record.id,
                    vehicle: record.vehicle_name.clone(),
                });
                summary.processed += 1;
                summary.records.push(record);
            }
            Err(e) => {
                events.emit(PipelineEvent::RecordFailed {
                    vehicle: fragment.vehicle_name.clone(),
                    error: e.to_string(),
                });
                summary.failed += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    use crate::llm::{ChatMessage, CompletionBackend, LlmError};
    use crate::mail::{MailError, MailboxConnector, MailboxSession, SearchFilter};

    struct Inbox(Vec<&'static str>);

    struct InboxSession(Vec<&'static str>);

    impl MailboxConnector for Inbox {
        fn server(&self) -> String {
            "test".into()
        }

        fn open(&self) -> Result<Box<dyn MailboxSession>, MailError> {
            Ok(Box::new(InboxSession(self.0.clone())))
        }
    }

    impl MailboxSession for InboxSession {
        fn search(&mut self, _query: &str) -> Result<Vec<u32>, MailError> {
            Ok((1..=self.0.len() as u32).collect())
        }

        fn fetch_raw(&mut self, id: u32) -> Result<Vec<u8>, MailError> {
            Ok(self.0[id as usize - 1].as_bytes().to_vec())
        }

        fn logout(&mut self) -> Result<(), MailError> {
            Ok(())
        }
    }

    struct Echo;

    #[async_trait]
    impl CompletionBackend for Echo {
        async fn complete(&self, _model: &str, messages: &[ChatMessage]) -> Result<String, LlmError> {
            Ok(format!("explained: {}", messages[1].content))
        }
    }

    fn pipeline(inbox: Vec<&'static str>, repository: DiagnosticRepository) -> Pipeline {
        let fetcher = MailboxFetcher::new(Arc::new(Inbox(inbox)), SearchFilter::default());
        let interpreter = DtcInterpreter::new(Box::new(Echo), "gpt-4", "sys");
        Pipeline::new(fetcher, interpreter, repository)
    }

    fn window() -> FetchWindow {
        let today = crate::history::today();
        FetchWindow::new(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(), today).unwrap()
    }

    #[tokio::test]
    async fn test_mixed_batch_counts() {
        let dir = TempDir::new().unwrap();
        let (repo, _) = DiagnosticRepository::open(&dir.path().join("dtc.db")).unwrap();
        let pipeline = pipeline(
            vec![
                "Date: Sat, 17 Oct 2026 14:05:09 -0700\r\nSubject: alert\r\n\r\nDevice: Truck-12\r\nEvent: P0301 misfire\r\nSpeed: 0\r\nTime: 10/17/2026 2:05 PM\r\n",
                "Subject: newsletter\r\n\r\nNothing to see here.\r\n",
            ],
            repo,
        );
        let (events, mut rx) = EventSink::channel();

        let summary = pipeline.run(window(), &events).await;
        assert_eq!(summary.fetched, 2);
        assert_eq!(summary.processed, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failed, 0);

        let record = &summary.records[0];
        assert_eq!(record.vehicle_name, "Truck-12");
        assert_eq!(
            record.interpretation.as_deref(),
            Some("explained: What do these diagnostic trouble codes mean: P0301 misfire?")
        );
        assert_eq!(record.email_timestamp.as_deref(), Some("2026-10-17 02:05:09 PM"));
        assert_eq!(pipeline.repository().count().unwrap(), 1);

        let mut stages = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let PipelineEvent::StageChanged { stage } = event {
                stages.push(stage);
            }
        }
        assert_eq!(
            stages,
            vec![
                RunStage::Idle,
                RunStage::Fetching,
                RunStage::Extracting,
                RunStage::Interpreting,
                RunStage::Persisting,
                RunStage::Extracting,
                RunStage::Done,
            ]
        );
    }

    #[tokio::test]
    async fn test_body_time_used_without_date_header() {
        let dir = TempDir::new().unwrap();
        let (repo, _) = DiagnosticRepository::open(&dir.path().join("dtc.db")).unwrap();
        let pipeline = pipeline(
            vec!["Subject: alert\r\n\r\nDevice: Van 3\r\nEvent: P0420\r\nSpeed: 0\r\nTime: 10/17/2026 2:05 PM\r\n"],
            repo,
        );

        let summary = pipeline.run(window(), &EventSink::disabled()).await;
        assert_eq!(
            summary.records[0].email_timestamp.as_deref(),
            Some("10/17/2026 2:05 PM")
        );
    }

    #[tokio::test]
    async fn test_insert_failure_counted_and_batch_continues() {
        let dir = TempDir::new().unwrap();
        // No schema: every insert fails.
        let repo = DiagnosticRepository::new(&dir.path().join("dtc.db"));
        let pipeline = pipeline(
            vec![
                "Subject: a\r\n\r\nDevice: A\r\nEvent: P0001\r\nSpeed: 0\r\n",
                "Subject: b\r\n\r\nDevice: B\r\nEvent: P0002\r\nSpeed: 0\r\n",
            ],
            repo,
        );
        let (events, mut rx) = EventSink::channel();

        let summary = pipeline.run(window(), &events).await;
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.processed, 0);
        assert!(summary.records.is_empty());

        let mut record_failures = 0;
        let mut no_records = false;
        while let Ok(event) = rx.try_recv() {
            match event {
                PipelineEvent::RecordFailed { .. } => record_failures += 1,
                PipelineEvent::NoRecordsProduced { fetched: 2 } => no_records = true,
                _ => {}
            }
        }
        assert_eq!(record_failures, 2);
        assert!(no_records);
    }
}
