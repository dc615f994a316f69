//! Account Entity
//!
//! Identity record with credentials, role and login-guard state.

use chrono::{DateTime, Utc};
use platform::password::HashedPassword;

use crate::domain::value_object::{AccountId, AccountRole, AccountStatus, Email};

/// Account entity
#[derive(Debug, Clone)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    /// Unique, stored lower-cased
    pub email: Email,
    pub phone: String,
    /// Argon2id PHC hash, never plaintext
    pub password: HashedPassword,
    pub role: AccountRole,
    pub status: AccountStatus,
    pub verified: bool,
    /// Single-use email verification token
    pub verification: String,
    /// Consecutive failed logins
    pub login_attempts: i32,
    /// Blocked while `now < block_expires`
    pub block_expires: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create an account
#[derive(Debug)]
pub struct NewAccount {
    pub name: String,
    pub email: Email,
    pub phone: String,
    pub password: HashedPassword,
    pub role: AccountRole,
    pub verification: String,
}

impl Account {
    /// Create a fresh, unverified account
    pub fn new(input: NewAccount, now: DateTime<Utc>) -> Self {
        Self {
            id: AccountId::new(),
            name: input.name,
            email: input.email,
            phone: input.phone,
            password: input.password,
            role: input.role,
            status: AccountStatus::default(),
            verified: false,
            verification: input.verification,
            login_attempts: 0,
            block_expires: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Inside the block window
    pub fn is_blocked(&self, now: DateTime<Utc>) -> bool {
        self.block_expires.is_some_and(|until| now < until)
    }

    /// Over the attempt threshold and a recorded block window has elapsed
    pub fn has_expired_block(&self, now: DateTime<Utc>, threshold: i32) -> bool {
        self.login_attempts > threshold && self.block_expires.is_some_and(|until| until <= now)
    }
}

/// Partial profile update (`PATCH /profile`)
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.phone.is_none()
    }
}
