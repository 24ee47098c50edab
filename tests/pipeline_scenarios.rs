//! End-to-end runs over an in-memory mailbox and a scripted model.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use tempfile::TempDir;
use tokio::sync::mpsc::UnboundedReceiver;

use fleet_dtc::history::{query_history, today, HistoryFilter};
use fleet_dtc::llm::{ChatMessage, CompletionBackend, DtcInterpreter, LlmError, FALLBACK_INTERPRETATION};
use fleet_dtc::mail::{
    FetchWindow, MailError, MailboxConnector, MailboxFetcher, MailboxSession, SearchFilter,
};
use fleet_dtc::pipeline::{EventSink, Pipeline, PipelineEvent};
use fleet_dtc::repository::DiagnosticRepository;

struct Inbox {
    messages: Vec<String>,
    queries: Arc<Mutex<Vec<String>>>,
}

struct InboxSession {
    messages: Vec<String>,
    queries: Arc<Mutex<Vec<String>>>,
}

impl MailboxConnector for Inbox {
    fn server(&self) -> String {
        "imap.test:993".to_string()
    }

    fn open(&self) -> Result<Box<dyn MailboxSession>, MailError> {
        Ok(Box::new(InboxSession {
            messages: self.messages.clone(),
            queries: Arc::clone(&self.queries),
        }))
    }
}

impl MailboxSession for InboxSession {
    fn search(&mut self, query: &str) -> Result<Vec<u32>, MailError> {
        self.queries.lock().unwrap().push(query.to_string());
        Ok((1..=self.messages.len() as u32).collect())
    }

    fn fetch_raw(&mut self, id: u32) -> Result<Vec<u8>, MailError> {
        Ok(self.messages[id as usize - 1].clone().into_bytes())
    }

    fn logout(&mut self) -> Result<(), MailError> {
        Ok(())
    }
}

/// Answers with a canned reply, or fails with a timeout.
struct Model {
    reply: Option<String>,
}

#[async_trait]
impl CompletionBackend for Model {
    async fn complete(&self, _model: &str, messages: &[ChatMessage]) -> Result<String, LlmError> {
        assert_eq!(messages.len(), 2);
        match &self.reply {
            Some(reply) => Ok(reply.clone()),
            None => Err(LlmError::Timeout("deadline elapsed".to_string())),
        }
    }
}

struct Harness {
    pipeline: Pipeline,
    queries: Arc<Mutex<Vec<String>>>,
    _dir: TempDir,
}

fn harness(messages: Vec<String>, reply: Option<&str>) -> Harness {
    let dir = TempDir::new().unwrap();
    let (repository, _) = DiagnosticRepository::open(&dir.path().join("dtc_logs.db")).unwrap();
    let queries = Arc::new(Mutex::new(Vec::new()));
    let inbox = Inbox {
        messages,
        queries: Arc::clone(&queries),
    };
    let fetcher = MailboxFetcher::new(Arc::new(inbox), SearchFilter::default());
    let interpreter = DtcInterpreter::new(
        Box::new(Model {
            reply: reply.map(str::to_string),
        }),
        "gpt-4",
        "You are a vehicle diagnostic expert.",
    );
    Harness {
        pipeline: Pipeline::new(fetcher, interpreter, repository),
        queries,
        _dir: dir,
    }
}

fn alert(body: &str) -> String {
    format!(
        "From: notify@onestepgps.com\r\nDate: Sat, 17 Oct 2026 14:05:09 -0700\r\nSubject: DTC Alert\r\n\r\n{}",
        body
    )
}

fn window() -> FetchWindow {
    FetchWindow::new(
        NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(),
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap(),
    )
    .unwrap()
}

fn drain(mut rx: UnboundedReceiver<PipelineEvent>) -> Vec<PipelineEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn well_formed_alert_is_stored() {
    let h = harness(
        vec![alert("Device: Truck-12\nEvent: P0301 misfire\nSpeed: 0\n")],
        Some("Cylinder 1 is misfiring. Check the plug and coil."),
    );
    let (events, rx) = EventSink::channel();

    let summary = h.pipeline.run(window(), &events).await;
    assert_eq!(summary.fetched, 1);
    assert_eq!(summary.processed, 1);

    let record = &summary.records[0];
    assert_eq!(record.vehicle_name, "Truck-12");
    assert_eq!(record.fault_text, "P0301 misfire");
    assert_eq!(record.gps_coordinates, "N/A");
    assert_eq!(record.location_address, "N/A");
    assert_eq!(
        record.interpretation.as_deref(),
        Some("Cylinder 1 is misfiring. Check the plug and coil.")
    );
    assert_eq!(
        record.email_timestamp.as_deref(),
        Some("2026-10-17 02:05:09 PM")
    );

    assert_eq!(
        h.queries.lock().unwrap().as_slice(),
        [r#"FROM "notify@onestepgps.com" SINCE 01-OCT-2026 BEFORE 19-OCT-2026"#]
    );

    let events = drain(rx);
    assert!(events.contains(&PipelineEvent::RunCompleted {
        fetched: 1,
        processed: 1,
        skipped: 0,
        failed: 0,
    }));
}

#[tokio::test]
async fn model_timeout_stores_fallback_text() {
    let h = harness(
        vec![alert("Device: Truck-12\nEvent: P0301 misfire\nSpeed: 0\n")],
        None,
    );
    let (events, rx) = EventSink::channel();

    let summary = h.pipeline.run(window(), &events).await;
    assert_eq!(summary.processed, 1);
    assert_eq!(
        summary.records[0].interpretation.as_deref(),
        Some(FALLBACK_INTERPRETATION)
    );
    assert_eq!(h.pipeline.repository().count().unwrap(), 1);

    assert!(drain(rx)
        .iter()
        .any(|e| matches!(e, PipelineEvent::InterpretFailed { vehicle, .. } if vehicle == "Truck-12")));
}

#[tokio::test]
async fn empty_mailbox_reports_no_results() {
    let h = harness(Vec::new(), Some("unused"));
    let (events, rx) = EventSink::channel();

    let summary = h.pipeline.run(window(), &events).await;
    assert_eq!(summary.fetched, 0);
    assert!(summary.records.is_empty());
    assert_eq!(h.pipeline.repository().count().unwrap(), 0);

    let events = drain(rx);
    assert!(events.contains(&PipelineEvent::NoResults));
    assert!(!events
        .iter()
        .any(|e| matches!(e, PipelineEvent::NoRecordsProduced { .. })));
}

#[tokio::test]
async fn unrecognized_messages_are_skipped_without_writes() {
    let h = harness(
        vec![
            alert("Your monthly fleet report is attached.\n"),
            alert("Device: Truck-12\nEvent: P0301 misfire\n"),
        ],
        Some("unused"),
    );
    let (events, rx) = EventSink::channel();

    let summary = h.pipeline.run(window(), &events).await;
    assert_eq!(summary.fetched, 2);
    assert_eq!(summary.skipped, 2);
    assert_eq!(summary.processed, 0);
    assert_eq!(h.pipeline.repository().count().unwrap(), 0);
    assert!(drain(rx).contains(&PipelineEvent::NoRecordsProduced { fetched: 2 }));
}

#[tokio::test]
async fn stored_records_show_up_in_history() {
    let body = "Device: Van 7\nEvent: P0171 System too lean\n  P0174 Bank 2 lean\nSpeed: 35 mph\nTime: 10/17/2026 2:05 PM\n";
    let h = harness(vec![alert(body)], Some("Both banks are running lean."));

    let summary = h.pipeline.run(window(), &EventSink::disabled()).await;
    let stored = &summary.records[0];

    let filter = HistoryFilter::month_to_date(today()).with_vehicle(Some("Van 7"));
    let history = query_history(h.pipeline.repository(), &filter).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(&history[0], stored);
    assert_eq!(history[0].fault_text, "P0171 System too lean\n  P0174 Bank 2 lean");
    assert!(history[0].raw_email.contains("Device: Van 7\nEvent: P0171"));

    let other = HistoryFilter::month_to_date(today()).with_vehicle(Some("Truck-12"));
    assert!(query_history(h.pipeline.repository(), &other)
        .unwrap()
        .is_empty());
}
