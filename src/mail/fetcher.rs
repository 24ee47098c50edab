//! Fetching alert messages for a date window.

use std::sync::Arc;

use tracing::debug;

use super::message::{parse_message, FetchedMessage};
use super::search::{build_query, FetchWindow, SearchFilter};
use super::{MailError, Result};
use crate::pipeline::{EventSink, PipelineEvent};

/// Opens authenticated, read-only sessions on a mailbox.
pub trait MailboxConnector: Send + Sync {
    /// Server label for status output.
    fn server(&self) -> String;

    /// Connect, authenticate and select the mailbox.
    fn open(&self) -> Result<Box<dyn MailboxSession>>;
}

/// An open mailbox session.
pub trait MailboxSession: Send {
    /// Run an IMAP `SEARCH`, returning matching sequence numbers in ascending order.
    fn search(&mut self, query: &str) -> Result<Vec<u32>>;

    /// Full raw bytes of one message, without changing its flags.
    fn fetch_raw(&mut self, id: u32) -> Result<Vec<u8>>;

    fn logout(&mut self) -> Result<()>;
}

/// Logs the session out when dropped, on success and failure paths alike.
struct SessionGuard {
    session: Box<dyn MailboxSession>,
}

impl SessionGuard {
    fn session(&mut self) -> &mut dyn MailboxSession {
        self.session.as_mut()
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if let Err(e) = self.session.logout() {
            debug!("Mailbox logout failed: {}", e);
        }
    }
}

/// Retrieves alert messages matching a search filter.
pub struct MailboxFetcher {
    connector: Arc<dyn MailboxConnector>,
    filter: SearchFilter,
}

impl MailboxFetcher {
    pub fn new(connector: Arc<dyn MailboxConnector>, filter: SearchFilter) -> Self {
        Self { connector, filter }
    }

    /// Fetch every message in the window.
    ///
    /// Never fails: connection, login and search errors are reported as a
    /// `FetchFailed` event and yield an empty batch. A message that cannot be
    /// fetched or parsed is reported and skipped.
    pub async fn fetch(&self, window: FetchWindow, events: &EventSink) -> Vec<FetchedMessage> {
        let connector = Arc::clone(&self.connector);
        let query = build_query(&self.filter, &window);
        let task_events = events.clone();

        // The mailbox client is blocking; keep it off the async worker.
        let joined = tokio::task::spawn_blocking(move || {
            fetch_blocking(connector.as_ref(), &query, &task_events)
        })
        .await;

        match joined {
            Ok(Ok(messages)) => messages,
            Ok(Err(e)) => {
                events.emit(PipelineEvent::FetchFailed {
                    error: e.to_string(),
                });
                Vec::new()
            }
            Err(e) => {
                events.emit(PipelineEvent::FetchFailed {
                    error: format!("mailbox task aborted: {}", e),
                });
                Vec::new()
            }
        }
    }
}

fn fetch_blocking(
    connector: &dyn MailboxConnector,
    query: &str,
    events: &EventSink,
) -> Result<Vec<FetchedMessage>> {
    events.emit(PipelineEvent::Connecting {
        server: connector.server(),
    });
    let mut guard = SessionGuard {
        session: connector.open()?,
    };

    events.emit(PipelineEvent::Searching {
        criteria: query.to_string(),
    });
    let ids = guard.session().search(query)?;

    if ids.is_empty() {
        events.emit(PipelineEvent::NoResults);
        return Ok(Vec::new());
    }
    events.emit(PipelineEvent::MessagesFound { count: ids.len() });

    let mut messages = Vec::with_capacity(ids.len());
    for id in ids {
        let parsed = guard
            .session()
            .fetch_raw(id)
            .and_then(|raw| parse_message(id, &raw));
        match parsed {
            Ok(message) => {
                events.emit(PipelineEvent::MessageFetched {
                    id,
                    subject: message.subject.clone(),
                });
                messages.push(message);
            }
            Err(e) => events.emit(PipelineEvent::MessageSkipped {
                id,
                reason: e.to_string(),
            }),
        }
    }

    Ok(messages)
}
