//! Access Log Entity
//!
//! Immutable audit record appended on every successful login or refresh.

use chrono::{DateTime, Utc};
use platform::client::RequestMeta;

use crate::domain::value_object::{AccessLogId, Email};

#[derive(Debug, Clone)]
pub struct AccessLogEntry {
    pub id: AccessLogId,
    pub email: Email,
    pub ip: String,
    pub browser: String,
    pub country: String,
    pub created_at: DateTime<Utc>,
}

impl AccessLogEntry {
    pub fn new(email: Email, meta: &RequestMeta, now: DateTime<Utc>) -> Self {
        Self {
            id: AccessLogId::new(),
            email,
            ip: meta.ip.clone(),
            browser: meta.browser.clone(),
            country: meta.country.clone(),
            created_at: now,
        }
    }
}
