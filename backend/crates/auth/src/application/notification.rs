//! Notifications
//!
//! Outbound email is fire-and-forget: the dispatcher hands the message to a
//! spawned task and returns immediately. The outcome is logged and recorded in
//! the notification log, never reported to the HTTP caller.

use std::sync::Arc;

use platform::clock::Clock;

use crate::domain::entity::{DeliveryStatus, NotificationChannel, NotificationLogEntry};
use crate::domain::repository::NotificationLogRepository;
use crate::domain::value_object::NotificationId;

/// Product name used in email subjects
pub const PRODUCT_NAME: &str = "Maskani";

/// Plain-text email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub subject: String,
    pub body: String,
}

/// Outcome of a single send
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    Failed(String),
}

/// Delivery channel
#[trait_variant::make(Notifier: Send)]
pub trait LocalNotifier {
    async fn send(&self, message: &EmailMessage, recipient: &str) -> Delivery;
}

/// Email sent after registration
pub fn registration_email(name: &str, link: &str) -> EmailMessage {
    EmailMessage {
        subject: format!("Verify your email at {PRODUCT_NAME}"),
        body: format!(
            "Hello {name}.\n\nWelcome! To verify your email, please follow this link:\n{link}\n\nThank you."
        ),
    }
}

/// Email sent after a forgot-password request
pub fn reset_email(name: &str, link: &str) -> EmailMessage {
    EmailMessage {
        subject: format!("Password recovery at {PRODUCT_NAME}"),
        body: format!(
            "To recover the password for user: {name}\n\nFollow this link:\n{link}\n\nIf this was a mistake, you can ignore this message."
        ),
    }
}

/// Sends email in the background and records the outcome
pub struct NotificationDispatcher<R, N> {
    repo: Arc<R>,
    notifier: Arc<N>,
    clock: Arc<dyn Clock>,
}

impl<R, N> Clone for NotificationDispatcher<R, N> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            notifier: self.notifier.clone(),
            clock: self.clock.clone(),
        }
    }
}

impl<R, N> NotificationDispatcher<R, N>
where
    R: NotificationLogRepository + Send + Sync + 'static,
    N: Notifier + Sync + 'static,
{
    pub fn new(repo: Arc<R>, notifier: Arc<N>, clock: Arc<dyn Clock>) -> Self {
        Self {
            repo,
            notifier,
            clock,
        }
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Queue `message` for `recipient` without waiting for delivery
    pub fn dispatch(&self, recipient: String, message: EmailMessage) -> tokio::task::JoinHandle<()> {
        let dispatcher = self.clone();
        tokio::spawn(async move { dispatcher.deliver(&recipient, message).await })
    }

    async fn deliver(&self, recipient: &str, message: EmailMessage) {
        let delivery = self.notifier.send(&message, recipient).await;

        let (status, error) = match delivery {
            Delivery::Delivered => {
                tracing::info!(to = recipient, subject = %message.subject, "Email delivered");
                (DeliveryStatus::Success, None)
            }
            Delivery::Failed(reason) => {
                tracing::warn!(
                    to = recipient,
                    subject = %message.subject,
                    error = %reason,
                    "Email delivery failed"
                );
                (DeliveryStatus::Failed, Some(reason))
            }
        };

        let entry = NotificationLogEntry {
            id: NotificationId::new(),
            destination: recipient.to_string(),
            subject: message.subject,
            message: message.body,
            channel: NotificationChannel::Email,
            status,
            error,
            created_at: self.clock.now(),
        };

        if let Err(e) = self.repo.record(&entry).await {
            tracing::warn!(error = %e, "Failed to record notification");
        }
    }
}
