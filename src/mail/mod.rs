//! Mailbox access: search criteria, message parsing and the IMAP fetcher.

mod config;
mod fetcher;
mod imap_client;
mod message;
mod search;

use thiserror::Error;

pub use config::MailConfig;
pub use fetcher::{MailboxConnector, MailboxFetcher, MailboxSession};
pub use imap_client::ImapConnector;
pub use message::{format_email_date, parse_message, FetchedMessage};
pub use search::{build_query, imap_date, FetchWindow, SearchFilter};

/// Errors that can occur while talking to the mailbox.
#[derive(Debug, Error)]
pub enum MailError {
    #[error("TLS setup failed: {0}")]
    Tls(String),

    #[error("Failed to connect to {server}: {error}")]
    Connection { server: String, error: String },

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Failed to open mailbox {mailbox}: {error}")]
    Mailbox { mailbox: String, error: String },

    #[error("Search failed: {0}")]
    Search(String),

    #[error("Failed to fetch message {id}: {error}")]
    Fetch { id: u32, error: String },

    #[error("Failed to parse message: {0}")]
    Parse(String),

    #[error("Invalid fetch window: {0}")]
    InvalidWindow(String),
}

pub type Result<T> = std::result::Result<T, MailError>;
