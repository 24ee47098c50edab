//! Diagnostic trouble code records.

use chrono::{NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder for fields no component populates yet.
pub const SENTINEL: &str = "N/A";

/// Layout of `recorded_at` in the store (matches SQLite `CURRENT_TIMESTAMP`).
pub const RECORDED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A diagnostic alert extracted from a notification email, not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDiagnostic {
    pub vehicle_name: String,
    pub fault_text: String,
    pub gps_coordinates: String,
    pub location_address: String,
    /// Timestamp asserted by the sender, as a display string.
    pub email_timestamp: Option<String>,
    /// Full message body, kept verbatim for auditing.
    pub raw_email: String,
    /// Overrides the store-assigned creation time when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recorded_at: Option<NaiveDateTime>,
}

impl NewDiagnostic {
    /// Build a fragment with the placeholder location fields.
    pub fn new(
        vehicle_name: impl Into<String>,
        fault_text: impl Into<String>,
        raw_email: impl Into<String>,
    ) -> Self {
        Self {
            vehicle_name: vehicle_name.into(),
            fault_text: fault_text.into(),
            gps_coordinates: SENTINEL.to_string(),
            location_address: SENTINEL.to_string(),
            email_timestamp: None,
            raw_email: raw_email.into(),
            recorded_at: None,
        }
    }

    pub fn with_email_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.email_timestamp = Some(timestamp.into());
        self
    }

    pub fn with_recorded_at(mut self, recorded_at: NaiveDateTime) -> Self {
        self.recorded_at = Some(recorded_at);
        self
    }

    /// Creation time to store: the supplied override, or [`recording_now`].
    pub fn recorded_at_or_now(&self) -> NaiveDateTime {
        self.recorded_at.unwrap_or_else(recording_now)
    }
}

/// Current time on the clock `recorded_at` is stamped with (UTC, whole seconds).
pub fn recording_now() -> NaiveDateTime {
    let now = Utc::now().naive_utc();
    now.with_nanosecond(0).unwrap_or(now)
}

/// A persisted diagnostic record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticRecord {
    pub id: i64,
    pub vehicle_name: String,
    pub fault_text: String,
    pub interpretation: Option<String>,
    pub gps_coordinates: String,
    pub location_address: String,
    pub recorded_at: NaiveDateTime,
    pub email_timestamp: Option<String>,
    pub raw_email: String,
}

impl DiagnosticRecord {
    /// Interpretation text for display, empty when none was stored.
    pub fn interpretation_text(&self) -> &str {
        self.interpretation.as_deref().unwrap_or("")
    }
}
