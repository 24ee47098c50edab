//! Mailbox connection settings.

use serde::{Deserialize, Serialize};

use super::SearchFilter;

/// Settings for the IMAP mailbox that receives diagnostic alerts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MailConfig {
    /// IMAP server host name
    #[serde(default = "default_server")]
    pub server: String,
    /// IMAP over TLS port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Login user name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Login password
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Mailbox to search
    #[serde(default = "default_mailbox")]
    pub mailbox: String,
    /// Sender or subject restriction for alert messages
    #[serde(default)]
    pub filter: SearchFilter,
}

fn default_server() -> String {
    "imap.ionos.com".to_string()
}

fn default_port() -> u16 {
    993
}

fn default_mailbox() -> String {
    "INBOX".to_string()
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            server: default_server(),
            port: default_port(),
            username: None,
            password: None,
            mailbox: default_mailbox(),
            filter: SearchFilter::default(),
        }
    }
}

impl MailConfig {
    /// Apply environment variable overrides.
    ///
    /// Supported env vars:
    /// - `IMAP_SERVER`, `IMAP_PORT`, `IMAP_MAILBOX`
    /// - `EMAIL_USER`, `EMAIL_PASSWORD`
    /// - `DTC_SENDER`: restrict to this sender
    /// - `DTC_SUBJECT`: restrict by subject instead (wins over `DTC_SENDER`)
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(server) = lookup("IMAP_SERVER") {
            self.server = server;
        }
        if let Some(port) = lookup("IMAP_PORT").and_then(|v| v.parse().ok()) {
            self.port = port;
        }
        if let Some(mailbox) = lookup("IMAP_MAILBOX") {
            self.mailbox = mailbox;
        }
        if let Some(user) = lookup("EMAIL_USER") {
            self.username = Some(user);
        }
        if let Some(password) = lookup("EMAIL_PASSWORD") {
            self.password = Some(password);
        }
        if let Some(subject) = lookup("DTC_SUBJECT") {
            self.filter = SearchFilter::Subject(subject);
        } else if let Some(sender) = lookup("DTC_SENDER") {
            self.filter = SearchFilter::From(sender);
        }
        self
    }

    /// `host:port` label for status output.
    pub fn server_label(&self) -> String {
        format!("{}:{}", self.server, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MailConfig::default();
        assert_eq!(config.server_label(), "imap.ionos.com:993");
        assert_eq!(config.mailbox, "INBOX");
        assert_eq!(
            config.filter,
            SearchFilter::From("notify@onestepgps.com".into())
        );
    }

    #[test]
    fn test_env_overrides() {
        let config = MailConfig::default().with_overrides(|key| match key {
            "EMAIL_USER" => Some("fleet@example.com".into()),
            "EMAIL_PASSWORD" => Some("hunter2".into()),
            "IMAP_PORT" => Some("1993".into()),
            "DTC_SUBJECT" => Some("DTC Alert".into()),
            "DTC_SENDER" => Some("ignored@example.com".into()),
            _ => None,
        });
        assert_eq!(config.username.as_deref(), Some("fleet@example.com"));
        assert_eq!(config.password.as_deref(), Some("hunter2"));
        assert_eq!(config.port, 1993);
        assert_eq!(config.filter, SearchFilter::Subject("DTC Alert".into()));
    }
}
