//! RFC 822 message parsing.

use mail_parser::{Message, MessageParser, MimeHeaders, PartType};

use super::{MailError, Result};

/// Display layout for the `Date` header.
const EMAIL_DATE_FORMAT: &str = "%Y-%m-%d %I:%M:%S %p";

/// A message pulled from the mailbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedMessage {
    /// Mailbox sequence number.
    pub id: u32,
    pub subject: Option<String>,
    /// Plain-text body.
    pub body: String,
    /// `Date` header in display form.
    pub email_timestamp: Option<String>,
}

/// Parse raw message bytes into a [`FetchedMessage`].
pub fn parse_message(id: u32, raw: &[u8]) -> Result<FetchedMessage> {
    let message = MessageParser::default()
        .parse(raw)
        .ok_or_else(|| MailError::Parse(format!("message {} is not valid RFC 822", id)))?;

    let email_timestamp = message
        .date()
        .and_then(|date| format_email_date(&date.to_rfc3339()));

    Ok(FetchedMessage {
        id,
        subject: message.subject().map(str::to_string),
        body: plain_text_body(&message),
        email_timestamp,
    })
}

/// Reformat an RFC 3339 timestamp for display, keeping the sender's offset.
pub fn format_email_date(rfc3339: &str) -> Option<String> {
    chrono::DateTime::parse_from_rfc3339(rfc3339)
        .ok()
        .map(|dt| dt.format(EMAIL_DATE_FORMAT).to_string())
}

/// First `text/plain` part of a multipart message, or the decoded single part.
fn plain_text_body(message: &Message) -> String {
    let is_multipart = message
        .parts
        .first()
        .map(|part| matches!(part.body, PartType::Multipart(_)))
        .unwrap_or(false);

    if is_multipart {
        return message
            .parts
            .iter()
            .find(|part| matches!(part.body, PartType::Text(_)) && is_text_plain(part))
            .and_then(|part| part.text_contents())
            .map(str::to_string)
            .unwrap_or_default();
    }

    message
        .parts
        .first()
        .map(|part| match part.text_contents() {
            Some(text) => text.to_string(),
            None => String::from_utf8_lossy(part.contents()).into_owned(),
        })
        .unwrap_or_default()
}

/// Parts without a content type default to `text/plain`.
fn is_text_plain(part: &mail_parser::MessagePart) -> bool {
    match part.content_type() {
        None => true,
        Some(ct) => {
            ct.ctype().eq_ignore_ascii_case("text")
                && ct
                    .subtype()
                    .map(|s| s.eq_ignore_ascii_case("plain"))
                    .unwrap_or(true)
        }
    }
}
