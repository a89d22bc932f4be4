//! Email delivery via SMTP.
//!
//! [`SmtpMailer`] wraps the `lettre` async SMTP transport to send the
//! plain-text messages produced by email behaviors. Configuration is loaded
//! from environment variables; if `SMTP_HOST` is not set,
//! [`EmailConfig::from_env`] returns `None` and [`DisabledMailer`] should be
//! used instead.

use std::sync::LazyLock;

use async_trait::async_trait;
use lettre::message::header::{ContentType, HeaderName, HeaderValue};
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use regex::Regex;
use serde::Serialize;

use crate::collaborators::Mailer;
use crate::error::BehaviorResult;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for email delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// An attachment could not be read.
    #[error("Attachment error: {path}: {source}")]
    Attachment {
        path: String,
        source: std::io::Error,
    },

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),
}

// ---------------------------------------------------------------------------
// EmailConfig
// ---------------------------------------------------------------------------

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

/// Configuration for the SMTP transport.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// SMTP server hostname.
    pub smtp_host: String,
    /// SMTP server port (defaults to 587).
    pub smtp_port: u16,
    /// Optional SMTP username.
    pub smtp_user: Option<String>,
    /// Optional SMTP password.
    pub smtp_password: Option<String>,
}

impl EmailConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `SMTP_HOST` is not set, signalling that email
    /// delivery is not configured.
    ///
    /// | Variable        | Required | Default |
    /// |-----------------|----------|---------|
    /// | `SMTP_HOST`     | yes      | —       |
    /// | `SMTP_PORT`     | no       | `587`   |
    /// | `SMTP_USER`     | no       | —       |
    /// | `SMTP_PASSWORD` | no       | —       |
    pub fn from_env() -> Option<Self> {
        let smtp_host = std::env::var("SMTP_HOST").ok()?;
        Some(Self {
            smtp_host,
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            smtp_user: std::env::var("SMTP_USER").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
        })
    }
}

// ---------------------------------------------------------------------------
// OutgoingEmail
// ---------------------------------------------------------------------------

/// A fully substituted email ready for the transport.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutgoingEmail {
    pub from_name: String,
    pub from_addr: String,
    /// Parsed recipient mailboxes, formatted.
    pub recipients: Vec<String>,
    /// Raw `Name: value` header lines.
    pub headers: Vec<String>,
    pub subject: String,
    pub message: String,
    /// Paths of files to attach.
    pub attachments: Vec<String>,
}

static RECIPIENT_SEPARATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[,;\r\n]+").expect("valid regex"));

/// Parse a recipient list separated by commas, semicolons or line breaks.
///
/// Entries that are not valid RFC 5322 mailboxes are dropped.
pub fn parse_recipients(raw: &str) -> Vec<Mailbox> {
    RECIPIENT_SEPARATOR_RE
        .split(raw)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<Mailbox>().ok())
        .collect()
}

/// Assemble a MIME message from an outgoing email and already-read
/// attachment contents.
pub fn build_message(
    email: &OutgoingEmail,
    attachments: Vec<(String, Vec<u8>)>,
) -> Result<Message, EmailError> {
    let from_name = Some(email.from_name.trim())
        .filter(|n| !n.is_empty())
        .map(str::to_string);
    let from = Mailbox::new(from_name, email.from_addr.trim().parse::<Address>()?);

    let mut builder = Message::builder().from(from).subject(email.subject.clone());
    for recipient in &email.recipients {
        builder = builder.to(recipient.parse::<Mailbox>()?);
    }
    for line in &email.headers {
        let Some((name, value)) = line.split_once(':') else {
            tracing::warn!(header = %line, "Skipping malformed email header");
            continue;
        };
        match HeaderName::new_from_ascii(name.trim().to_string()) {
            Ok(name) => {
                builder = builder.raw_header(HeaderValue::new(name, value.trim().to_string()));
            }
            Err(e) => tracing::warn!(header = %line, error = %e, "Skipping invalid email header"),
        }
    }

    let body = SinglePart::builder()
        .header(ContentType::TEXT_PLAIN)
        .body(email.message.clone());
    if attachments.is_empty() {
        return builder
            .singlepart(body)
            .map_err(|e| EmailError::Build(e.to_string()));
    }

    let octet_stream = ContentType::parse("application/octet-stream")
        .map_err(|e| EmailError::Build(e.to_string()))?;
    let mut parts = MultiPart::mixed().singlepart(body);
    for (filename, content) in attachments {
        parts = parts.singlepart(Attachment::new(filename).body(content, octet_stream.clone()));
    }
    builder
        .multipart(parts)
        .map_err(|e| EmailError::Build(e.to_string()))
}

// ---------------------------------------------------------------------------
// SmtpMailer
// ---------------------------------------------------------------------------

/// Sends behavior emails via SMTP.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    /// Create a mailer with the given configuration.
    pub fn new(config: &EmailConfig) -> Result<Self, EmailError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port);

        if let (Some(user), Some(pass)) = (&config.smtp_user, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            transport: builder.build(),
        })
    }

    async fn read_attachments(paths: &[String]) -> Result<Vec<(String, Vec<u8>)>, EmailError> {
        let mut out = Vec::with_capacity(paths.len());
        for path in paths {
            let content = tokio::fs::read(path)
                .await
                .map_err(|source| EmailError::Attachment {
                    path: path.clone(),
                    source,
                })?;
            let filename = std::path::Path::new(path)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.clone());
            out.push((filename, content));
        }
        Ok(out)
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &OutgoingEmail) -> BehaviorResult<()> {
        let attachments = Self::read_attachments(&email.attachments).await?;
        let message = build_message(email, attachments)?;
        self.transport
            .send(message)
            .await
            .map_err(EmailError::from)?;

        tracing::info!(
            recipients = email.recipients.len(),
            subject = %email.subject,
            "Behavior email sent"
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// DisabledMailer
// ---------------------------------------------------------------------------

/// Mailer used when SMTP is not configured; logs and drops every message.
#[derive(Debug, Default)]
pub struct DisabledMailer;

#[async_trait]
impl Mailer for DisabledMailer {
    async fn send(&self, email: &OutgoingEmail) -> BehaviorResult<()> {
        tracing::warn!(
            recipients = email.recipients.len(),
            subject = %email.subject,
            "SMTP not configured, behavior email dropped"
        );
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        false
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn outgoing() -> OutgoingEmail {
        OutgoingEmail {
            from_name: "Shop".to_string(),
            from_addr: "shop@example.com".to_string(),
            recipients: vec!["Jane <jane@example.com>".to_string()],
            headers: vec!["X-Campaign: welcome".to_string(), "broken".to_string()],
            subject: "Welcome".to_string(),
            message: "Hello Jane".to_string(),
            attachments: vec![],
        }
    }

    #[test]
    fn from_env_returns_none_without_smtp_host() {
        std::env::remove_var("SMTP_HOST");
        assert!(EmailConfig::from_env().is_none());
    }

    #[test]
    fn email_error_display_build() {
        let err = EmailError::Build("missing body".to_string());
        assert_eq!(err.to_string(), "Email build error: missing body");
    }

    #[test]
    fn email_error_display_address() {
        let addr_err: Result<lettre::Address, _> = "not-an-email".parse();
        let err = EmailError::Address(addr_err.unwrap_err());
        assert!(err.to_string().contains("Email address parse error"));
    }

    #[test]
    fn parse_recipients_keeps_valid_mailboxes() {
        let parsed = parse_recipients("a@example.com, Bob <b@example.com>;\nbad-address, ");
        let emails: Vec<String> = parsed.iter().map(|m| m.email.to_string()).collect();
        assert_eq!(emails, vec!["a@example.com", "b@example.com"]);
    }

    #[test]
    fn parse_recipients_rejects_unparseable_list() {
        assert!(parse_recipients("bad-address").is_empty());
        assert!(parse_recipients("").is_empty());
    }

    #[test]
    fn build_message_includes_headers_and_subject() {
        let message = build_message(&outgoing(), vec![]).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("X-Campaign: welcome"));
        assert!(raw.contains("Subject: Welcome"));
        assert!(raw.contains("jane@example.com"));
    }

    #[test]
    fn build_message_with_attachment_is_multipart() {
        let message =
            build_message(&outgoing(), vec![("a.txt".to_string(), b"hi".to_vec())]).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("multipart/mixed"));
        assert!(raw.contains("a.txt"));
    }

    #[test]
    fn build_message_rejects_bad_sender() {
        let mut email = outgoing();
        email.from_addr = "nobody".to_string();
        assert!(matches!(build_message(&email, vec![]), Err(EmailError::Address(_))));
    }
}
