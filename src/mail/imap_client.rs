//! IMAP over TLS mailbox access, using rustls with the system trust store.

use std::net::TcpStream;
use std::sync::Arc;

use rustls::pki_types::ServerName;
use rustls::{ClientConfig, ClientConnection, RootCertStore, StreamOwned};
use tracing::{debug, warn};

use super::fetcher::{MailboxConnector, MailboxSession};
use super::{MailConfig, MailError, Result};

type TlsStream = StreamOwned<ClientConnection, TcpStream>;

fn build_tls_config() -> Result<Arc<ClientConfig>> {
    let result = rustls_native_certs::load_native_certs();
    for e in &result.errors {
        warn!("Error loading system certificates: {}", e);
    }

    let mut root_store = RootCertStore::empty();
    let mut loaded = 0u32;
    for cert in result.certs {
        match root_store.add(cert) {
            Ok(()) => loaded += 1,
            Err(e) => warn!("Skipping invalid system certificate: {}", e),
        }
    }
    if loaded == 0 {
        return Err(MailError::Tls("no valid system certificates found".into()));
    }

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| MailError::Tls(e.to_string()))?
        .with_root_certificates(root_store)
        .with_no_client_auth();
    Ok(Arc::new(config))
}

/// Opens read-only IMAP sessions against the configured server.
pub struct ImapConnector {
    config: MailConfig,
}

impl ImapConnector {
    pub fn new(config: MailConfig) -> Self {
        Self { config }
    }
}

impl MailboxConnector for ImapConnector {
    fn server(&self) -> String {
        self.config.server_label()
    }

    fn open(&self) -> Result<Box<dyn MailboxSession>> {
        let username = self
            .config
            .username
            .as_deref()
            .ok_or_else(|| MailError::Auth("no mailbox user configured (EMAIL_USER)".into()))?;
        let password = self.config.password.as_deref().ok_or_else(|| {
            MailError::Auth("no mailbox password configured (EMAIL_PASSWORD)".into())
        })?;

        let server_name = ServerName::try_from(self.config.server.clone())
            .map_err(|e| MailError::Tls(e.to_string()))?;
        let tls = ClientConnection::new(build_tls_config()?, server_name)
            .map_err(|e| MailError::Tls(e.to_string()))?;
        let connection_error = |error: String| MailError::Connection {
            server: self.server(),
            error,
        };

        let tcp = TcpStream::connect((self.config.server.as_str(), self.config.port))
            .map_err(|e| connection_error(e.to_string()))?;
        let mut client = ::imap::Client::new(StreamOwned::new(tls, tcp));
        client
            .read_greeting()
            .map_err(|e| connection_error(e.to_string()))?;

        let mut session = client
            .login(username, password)
            .map_err(|(e, _client)| MailError::Auth(e.to_string()))?;
        debug!("Logged in to {} as {}", self.server(), username);

        // EXAMINE opens the mailbox read-only so no flags change.
        if let Err(e) = session.examine(&self.config.mailbox) {
            let _ = session.logout();
            return Err(MailError::Mailbox {
                mailbox: self.config.mailbox.clone(),
                error: e.to_string(),
            });
        }

        Ok(Box::new(ImapSession { session }))
    }
}

struct ImapSession {
    session: ::imap::Session<TlsStream>,
}

impl MailboxSession for ImapSession {
    fn search(&mut self, query: &str) -> Result<Vec<u32>> {
        let ids = self
            .session
            .search(query)
            .map_err(|e| MailError::Search(e.to_string()))?;
        let mut ids: Vec<u32> = ids.into_iter().collect();
        ids.sort_unstable();
        Ok(ids)
    }

    fn fetch_raw(&mut self, id: u32) -> Result<Vec<u8>> {
        let fetches = self
            .session
            .fetch(id.to_string(), "BODY.PEEK[]")
            .map_err(|e| MailError::Fetch {
                id,
                error: e.to_string(),
            })?;

        fetches
            .iter()
            .find_map(|fetch| fetch.body())
            .map(<[u8]>::to_vec)
            .ok_or_else(|| MailError::Fetch {
                id,
                error: "server returned no body".to_string(),
            })
    }

    fn logout(&mut self) -> Result<()> {
        self.session
            .logout()
            .map_err(|e| MailError::Connection {
                server: "imap".to_string(),
                error: e.to_string(),
            })
    }
}
