//! GNTP (Growl Notification Transport Protocol) notifier adapter
//!
//! Speaks GNTP/1.0 over one TCP connection per request. Registration
//! declares the application and its notification types; each notify call
//! then references one of those types.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

use crate::application::ports::{NotificationError, Notifier, RegistrationError};
use crate::domain::config::{DEFAULT_HOSTNAME, DEFAULT_PORT, DEFAULT_TIMEOUT_SECS};
use crate::domain::notification::{Notification, NotifierSession, Registration};

use super::origin::OriginInfo;

const GNTP_VERSION: &str = "GNTP/1.0";
const CRLF: &str = "\r\n";
const TERMINATOR: &[u8] = b"\r\n\r\n";
const MAX_RESPONSE_BYTES: usize = 64 * 1024;

/// Connection settings for a GNTP receiver
#[derive(Debug, Clone)]
pub struct GntpConfig {
    pub hostname: String,
    pub port: u16,
    pub password: Option<String>,
    pub timeout: Duration,
}

impl Default for GntpConfig {
    fn default() -> Self {
        Self {
            hostname: DEFAULT_HOSTNAME.to_string(),
            port: DEFAULT_PORT,
            password: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// A parsed GNTP response
#[derive(Debug, Clone, PartialEq, Eq)]
struct GntpResponse {
    ok: bool,
    headers: HashMap<String, String>,
}

impl GntpResponse {
    fn parse(raw: &[u8]) -> Result<Self, String> {
        let text = String::from_utf8_lossy(raw);
        let mut lines = text.split(CRLF);

        let status = lines.next().unwrap_or_default();
        let mut parts = status.split_whitespace();
        if parts.next() != Some(GNTP_VERSION) {
            return Err(format!("unexpected status line '{}'", status));
        }
        let ok = match parts.next() {
            Some("-OK") => true,
            Some("-ERROR") => false,
            other => {
                return Err(format!(
                    "unexpected response type '{}'",
                    other.unwrap_or_default()
                ))
            }
        };

        let headers = lines
            .take_while(|line| !line.is_empty())
            .filter_map(|line| line.split_once(':'))
            .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
            .collect();

        Ok(Self { ok, headers })
    }

    fn header(&self, name: &str) -> &str {
        self.headers.get(name).map(String::as_str).unwrap_or_default()
    }
}

/// Transport-level failure, mapped onto the port errors by the caller
#[derive(Debug)]
enum Failure {
    Connect(String),
    Timeout,
    Protocol(String),
    Rejected { code: String, description: String },
}

impl Failure {
    fn into_registration_error(self, address: String, timeout: Duration) -> RegistrationError {
        match self {
            Self::Connect(message) => RegistrationError::Connect { address, message },
            Self::Timeout => RegistrationError::Timeout(timeout.as_secs()),
            Self::Protocol(message) => RegistrationError::Protocol(message),
            Self::Rejected { code, description } => {
                RegistrationError::Rejected { code, description }
            }
        }
    }

    fn into_notification_error(self, address: String, timeout: Duration) -> NotificationError {
        match self {
            Self::Connect(message) => NotificationError::Unreachable { address, message },
            Self::Timeout => NotificationError::Timeout(timeout.as_secs()),
            Self::Protocol(message) => NotificationError::Protocol(message),
            Self::Rejected { code, description } => {
                NotificationError::Rejected { code, description }
            }
        }
    }
}

/// GNTP notifier
pub struct GntpNotifier {
    config: GntpConfig,
    origin: OriginInfo,
}

impl GntpNotifier {
    /// Create a notifier for the given receiver, describing the local host
    pub fn new(config: GntpConfig) -> Self {
        Self::with_origin(config, OriginInfo::detect())
    }

    /// Create with explicit origin information
    pub fn with_origin(config: GntpConfig, origin: OriginInfo) -> Self {
        Self { config, origin }
    }

    /// `host:port` of the receiver
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.hostname, self.config.port)
    }

    fn request_line(&self, message_type: &str) -> String {
        match self.config.password.as_deref().filter(|p| !p.is_empty()) {
            Some(password) => {
                let salt: [u8; 16] = rand::random();
                format!(
                    "{} {} NONE {}{}",
                    GNTP_VERSION,
                    message_type,
                    key_hash(password, &salt),
                    CRLF
                )
            }
            None => format!("{} {} NONE{}", GNTP_VERSION, message_type, CRLF),
        }
    }

    fn origin_headers(&self, message: &mut String) {
        for (name, value) in self.origin.headers() {
            push_header(message, name, value);
        }
    }

    /// Encode a REGISTER request
    fn encode_register(&self, registration: &Registration) -> String {
        let mut message = self.request_line("REGISTER");
        push_header(&mut message, "Application-Name", &registration.app_name);
        if let Some(icon) = &registration.icon {
            push_header(&mut message, "Application-Icon", icon);
        }
        self.origin_headers(&mut message);
        push_header(
            &mut message,
            "Notifications-Count",
            &registration.categories.len().to_string(),
        );
        message.push_str(CRLF);

        for category in &registration.categories {
            push_header(&mut message, "Notification-Name", category);
            push_header(&mut message, "Notification-Display-Name", category);
            push_header(&mut message, "Notification-Enabled", "True");
            message.push_str(CRLF);
        }
        message
    }

    /// Encode a NOTIFY request
    fn encode_notify(&self, session: &NotifierSession, notification: &Notification) -> String {
        let options = &notification.options;
        let mut message = self.request_line("NOTIFY");
        push_header(&mut message, "Application-Name", session.app_name());
        push_header(&mut message, "Notification-Name", &notification.category);
        push_header(&mut message, "Notification-Title", &notification.title);
        push_header(&mut message, "Notification-Text", &notification.body);
        push_header(
            &mut message,
            "Notification-Sticky",
            if options.sticky { "True" } else { "False" },
        );
        if let Some(identifier) = &options.identifier {
            push_header(&mut message, "Notification-Coalescing-ID", identifier);
        }
        if let Some(callback) = &options.callback {
            push_header(&mut message, "Notification-Callback-Target", callback);
        }
        self.origin_headers(&mut message);
        message.push_str(CRLF);
        message
    }

    async fn send(&self, message: &str) -> Result<GntpResponse, Failure> {
        match tokio::time::timeout(self.config.timeout, self.exchange(message)).await {
            Ok(result) => result,
            Err(_) => Err(Failure::Timeout),
        }
    }

    async fn exchange(&self, message: &str) -> Result<GntpResponse, Failure> {
        let mut stream = TcpStream::connect((self.config.hostname.as_str(), self.config.port))
            .await
            .map_err(|e| Failure::Connect(e.to_string()))?;

        stream
            .write_all(message.as_bytes())
            .await
            .map_err(|e| Failure::Connect(e.to_string()))?;
        stream
            .flush()
            .await
            .map_err(|e| Failure::Connect(e.to_string()))?;

        let mut response = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = stream
                .read(&mut chunk)
                .await
                .map_err(|e| Failure::Protocol(e.to_string()))?;
            if n == 0 {
                break;
            }
            response.extend_from_slice(&chunk[..n]);
            if contains_terminator(&response) {
                break;
            }
            if response.len() > MAX_RESPONSE_BYTES {
                return Err(Failure::Protocol("response too large".to_string()));
            }
        }

        if response.is_empty() {
            return Err(Failure::Protocol("empty response".to_string()));
        }

        let response = GntpResponse::parse(&response).map_err(Failure::Protocol)?;
        if response.ok {
            Ok(response)
        } else {
            Err(Failure::Rejected {
                code: response.header("Error-Code").to_string(),
                description: response.header("Error-Description").to_string(),
            })
        }
    }
}

#[async_trait]
impl Notifier for GntpNotifier {
    async fn register(
        &self,
        registration: &Registration,
    ) -> Result<NotifierSession, RegistrationError> {
        let message = self.encode_register(registration);
        debug!(address = %self.address(), categories = registration.categories.len(), "Sending GNTP REGISTER");

        self.send(&message)
            .await
            .map_err(|f| f.into_registration_error(self.address(), self.config.timeout))?;

        Ok(registration.clone().into_session())
    }

    async fn notify(
        &self,
        session: &NotifierSession,
        notification: &Notification,
    ) -> Result<(), NotificationError> {
        session.ensure_declared(&notification.category)?;

        let message = self.encode_notify(session, notification);
        debug!(address = %self.address(), category = %notification.category, "Sending GNTP NOTIFY");

        self.send(&message)
            .await
            .map_err(|f| f.into_notification_error(self.address(), self.config.timeout))?;
        Ok(())
    }
}

/// GNTP password key hash: `SHA256:<hex(sha256(sha256(password || salt)))>.<hex(salt)>`
fn key_hash(password: &str, salt: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hasher.update(salt);
    let key = hasher.finalize();
    let hash = Sha256::digest(key);
    format!("SHA256:{}.{}", hex::encode_upper(hash), hex::encode_upper(salt))
}

/// Header values may not contain CRLF
fn push_header(message: &mut String, name: &str, value: &str) {
    let value = value.replace(CRLF, "\n").replace('\r', "\n");
    message.push_str(name);
    message.push_str(": ");
    message.push_str(&value);
    message.push_str(CRLF);
}

fn contains_terminator(buf: &[u8]) -> bool {
    buf.windows(TERMINATOR.len()).any(|w| w == TERMINATOR)
}
