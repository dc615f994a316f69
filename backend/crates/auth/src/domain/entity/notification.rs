//! Notification Log Entity
//!
//! Audit record of an outbound notification attempt.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::value_object::NotificationId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationChannel {
    Email,
    Sms,
}

impl NotificationChannel {
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Sms => "sms",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Success,
    Failed,
}

impl DeliveryStatus {
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct NotificationLogEntry {
    pub id: NotificationId,
    pub destination: String,
    pub subject: String,
    pub message: String,
    pub channel: NotificationChannel,
    pub status: DeliveryStatus,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}
