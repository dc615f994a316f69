//! Email delivery
//!
//! [`SmtpNotifier`] wraps the `lettre` async SMTP transport. Configuration is
//! loaded from environment variables; if `SMTP_HOST` is not set,
//! [`SmtpConfig::from_env`] returns `None` and the [`LogNotifier`] is used.

use std::sync::{Arc, Mutex};

use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::application::notification::{Delivery, EmailMessage, Notifier};

/// Default SMTP port (STARTTLS)
const DEFAULT_SMTP_PORT: u16 = 587;

/// Default sender address when `SMTP_FROM` is not set
const DEFAULT_FROM_ADDRESS: &str = "noreply@maskani.local";

/// SMTP settings
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub from_address: String,
    pub user: Option<String>,
    pub password: Option<String>,
}

impl SmtpConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable        | Required | Default                  |
    /// |-----------------|----------|--------------------------|
    /// | `SMTP_HOST`     | yes      | -                        |
    /// | `SMTP_PORT`     | no       | `587`                    |
    /// | `SMTP_FROM`     | no       | `noreply@maskani.local`  |
    /// | `SMTP_USER`     | no       | -                        |
    /// | `SMTP_PASSWORD` | no       | -                        |
    pub fn from_env() -> Option<Self> {
        let host = std::env::var("SMTP_HOST").ok()?;
        Some(Self {
            host,
            port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            from_address: std::env::var("SMTP_FROM")
                .unwrap_or_else(|_| DEFAULT_FROM_ADDRESS.to_string()),
            user: std::env::var("SMTP_USER").ok(),
            password: std::env::var("SMTP_PASSWORD").ok(),
        })
    }
}

/// SMTP delivery
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl SmtpNotifier {
    pub fn new(config: &SmtpConfig) -> Result<Self, lettre::transport::smtp::Error> {
        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?.port(config.port);

        if let (Some(user), Some(pass)) = (&config.user, &config.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from_address: config.from_address.clone(),
        })
    }

    fn build(&self, message: &EmailMessage, recipient: &str) -> Result<Message, String> {
        let from = self
            .from_address
            .parse()
            .map_err(|e| format!("invalid sender: {e}"))?;
        let to = recipient
            .parse()
            .map_err(|e| format!("invalid recipient: {e}"))?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(message.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(message.body.clone())
            .map_err(|e| e.to_string())
    }
}

impl Notifier for SmtpNotifier {
    async fn send(&self, message: &EmailMessage, recipient: &str) -> Delivery {
        let email = match self.build(message, recipient) {
            Ok(email) => email,
            Err(reason) => return Delivery::Failed(reason),
        };
        match self.transport.send(email).await {
            Ok(_) => Delivery::Delivered,
            Err(e) => Delivery::Failed(e.to_string()),
        }
    }
}

/// Writes emails to the log instead of sending them
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    async fn send(&self, message: &EmailMessage, recipient: &str) -> Delivery {
        tracing::info!(
            to = recipient,
            subject = %message.subject,
            body = %message.body,
            "Email not sent (no SMTP configured)"
        );
        Delivery::Delivered
    }
}

/// Records sends in memory; optionally fails every send
#[derive(Debug, Clone, Default)]
pub struct MemoryNotifier {
    sent: Arc<Mutex<Vec<(String, EmailMessage)>>>,
    failure: Arc<Mutex<Option<String>>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every following send with `reason`
    pub fn fail_with(&self, reason: impl Into<String>) {
        *self.failure.lock().unwrap_or_else(|e| e.into_inner()) = Some(reason.into());
    }

    /// `(recipient, message)` pairs, oldest first
    pub fn sent(&self) -> Vec<(String, EmailMessage)> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Notifier for MemoryNotifier {
    async fn send(&self, message: &EmailMessage, recipient: &str) -> Delivery {
        let failure = self.failure.lock().unwrap_or_else(|e| e.into_inner()).clone();
        if let Some(reason) = failure {
            return Delivery::Failed(reason);
        }
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((recipient.to_string(), message.clone()));
        Delivery::Delivered
    }
}

/// Notifier selected at startup
pub enum Mailer {
    Smtp(SmtpNotifier),
    Log(LogNotifier),
    Memory(MemoryNotifier),
}

impl Mailer {
    /// SMTP when configured, otherwise log-only
    pub fn from_env() -> Result<Self, lettre::transport::smtp::Error> {
        match SmtpConfig::from_env() {
            Some(config) => {
                tracing::info!(host = %config.host, port = config.port, "SMTP delivery enabled");
                Ok(Self::Smtp(SmtpNotifier::new(&config)?))
            }
            None => {
                tracing::warn!("SMTP_HOST not set, emails will only be logged");
                Ok(Self::Log(LogNotifier))
            }
        }
    }

    /// In-memory notifier, if this mailer wraps one
    pub fn as_memory(&self) -> Option<&MemoryNotifier> {
        match self {
            Self::Memory(m) => Some(m),
            _ => None,
        }
    }
}

impl Notifier for Mailer {
    async fn send(&self, message: &EmailMessage, recipient: &str) -> Delivery {
        match self {
            Self::Smtp(n) => n.send(message, recipient).await,
            Self::Log(n) => n.send(message, recipient).await,
            Self::Memory(n) => n.send(message, recipient).await,
        }
    }
}
