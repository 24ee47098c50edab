//! Extraction of diagnostic alerts from notification email bodies.
//!
//! Alerts arrive as plain text with a fixed layout:
//!
//! ```text
//! Device: Truck-12
//! Event: P0301 Cylinder 1 misfire detected
//! Speed: 0 mph
//! Time: 10/18/2026 07:42 AM
//! ```
//!
//! The event text may wrap across several lines; it ends at the `Speed:` line.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::{NewDiagnostic, SENTINEL};

static DEVICE_EVENT_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)Device: (.*?)\nEvent: (.*?)\nSpeed:")
        .expect("device/event pattern should compile")
});

static TIME_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Time: (.*?)\n").expect("time pattern should compile"));

/// Extract a diagnostic fragment from a raw email body.
///
/// Returns `None` when the body lacks the `Device:`/`Event:`/`Speed:` block or
/// when either captured field is blank. Callers must skip such messages.
pub fn extract(raw_body: &str) -> Option<NewDiagnostic> {
    let normalized = raw_body.replace("\r\n", "\n");

    let captures = DEVICE_EVENT_BLOCK.captures(&normalized)?;
    let vehicle_name = captures.get(1)?.as_str().trim();
    let fault_text = captures.get(2)?.as_str().trim();
    if vehicle_name.is_empty() || fault_text.is_empty() {
        return None;
    }

    let timestamp = body_timestamp(&normalized).unwrap_or_else(|| SENTINEL.to_string());

    Some(NewDiagnostic::new(vehicle_name, fault_text, raw_body).with_email_timestamp(timestamp))
}

/// The `Time:` line of a body, trimmed.
pub fn body_timestamp(body: &str) -> Option<String> {
    TIME_LINE
        .captures(body)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
}
