//! Password Reset Request Entity
//!
//! One row per forgot-password call. A request is consumed at most once:
//! consumption flips `used` and stamps the metadata of the consuming request.

use chrono::{DateTime, Utc};
use platform::client::RequestMeta;

use crate::domain::value_object::{Email, PasswordResetId};

#[derive(Debug, Clone)]
pub struct PasswordResetRequest {
    pub id: PasswordResetId,
    pub email: Email,
    /// Unique opaque token embedded in the reset link
    pub verification: String,
    pub used: bool,
    /// Metadata of the forgot-password request
    pub requested_by: RequestMeta,
    /// Metadata of the request that consumed the token
    pub consumed_by: Option<RequestMeta>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PasswordResetRequest {
    pub fn new(
        email: Email,
        verification: String,
        requested_by: RequestMeta,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: PasswordResetId::new(),
            email,
            verification,
            used: false,
            requested_by,
            consumed_by: None,
            created_at: now,
            updated_at: now,
        }
    }
}
