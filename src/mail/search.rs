//! IMAP search criteria for the fetch window.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{MailError, Result};

/// Inclusive date range bounding a mailbox search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchWindow {
    since: NaiveDate,
    until: NaiveDate,
}

impl FetchWindow {
    /// Create a window; `since` must not be after `until`.
    pub fn new(since: NaiveDate, until: NaiveDate) -> Result<Self> {
        if since > until {
            return Err(MailError::InvalidWindow(format!(
                "start date {} is after end date {}",
                since, until
            )));
        }
        Ok(Self { since, until })
    }

    pub fn since(&self) -> NaiveDate {
        self.since
    }

    pub fn until(&self) -> NaiveDate {
        self.until
    }

    /// Exclusive upper bound for IMAP `BEFORE`, one day after `until`.
    pub fn before(&self) -> NaiveDate {
        self.until
            .checked_add_days(Days::new(1))
            .unwrap_or(NaiveDate::MAX)
    }
}

/// Which messages count as diagnostic alerts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchFilter {
    /// Messages from this sender address.
    From(String),
    /// Messages whose subject contains this text.
    Subject(String),
}

impl Default for SearchFilter {
    fn default() -> Self {
        SearchFilter::From("notify@onestepgps.com".to_string())
    }
}

/// Format a date the way IMAP expects: `DD-MON-YYYY`, upper-cased.
pub fn imap_date(date: NaiveDate) -> String {
    date.format("%d-%b-%Y").to_string().to_uppercase()
}

/// Build the IMAP `SEARCH` criteria for a filter and window.
pub fn build_query(filter: &SearchFilter, window: &FetchWindow) -> String {
    let key = match filter {
        SearchFilter::From(address) => format!("FROM {}", quote(address)),
        SearchFilter::Subject(text) => format!("SUBJECT {}", quote(text)),
    };
    format!(
        "{} SINCE {} BEFORE {}",
        key,
        imap_date(window.since()),
        imap_date(window.before())
    )
}

/// Quote a search string, escaping backslashes and double quotes.
fn quote(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{}\"", escaped)
}
