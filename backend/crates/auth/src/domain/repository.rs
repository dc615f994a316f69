//! Repository Traits
//!
//! Interfaces for data persistence. Implementations are in the infrastructure
//! layer (`infra::postgres`, `infra::memory`).
//!
//! Counter updates and token consumption are single atomic operations so two
//! concurrent requests can never both observe the same pre-update state.

use chrono::{DateTime, Utc};
use platform::client::RequestMeta;
use platform::password::HashedPassword;

use crate::domain::entity::{
    AccessLogEntry, Account, NotificationLogEntry, PasswordResetRequest, ProfileUpdate,
};
use crate::domain::value_object::{AccountId, Email};
use crate::error::AuthResult;

/// Every store the auth HTTP surface needs, implemented by one backend
pub trait AuthRepository:
    AccountRepository
    + AccessLogRepository
    + PasswordResetRepository
    + NotificationLogRepository
    + Clone
    + Send
    + Sync
    + 'static
{
}

impl<T> AuthRepository for T where
    T: AccountRepository
        + AccessLogRepository
        + PasswordResetRepository
        + NotificationLogRepository
        + Clone
        + Send
        + Sync
        + 'static
{
}

/// Credential store
#[trait_variant::make(AccountRepository: Send)]
pub trait LocalAccountRepository {
    /// Insert a new account; a duplicate email fails with `EmailAlreadyExists`
    async fn create(&self, account: &Account) -> AuthResult<()>;

    /// Find a non-deleted account by id
    async fn find_by_id(&self, id: &AccountId) -> AuthResult<Option<Account>>;

    /// Find a non-deleted account by (normalized) email
    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<Account>>;

    /// Whether any account (including soft-deleted) holds this email
    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool>;

    /// Atomically increment `login_attempts` and return the new value.
    ///
    /// When the new value exceeds `threshold`, `block_expires` is set to
    /// `block_until` in the same write.
    async fn record_failed_login(
        &self,
        id: &AccountId,
        threshold: i32,
        block_until: DateTime<Utc>,
    ) -> AuthResult<i32>;

    /// Zero `login_attempts` only if it exceeds `threshold` and the block
    /// window ended at or before `now`; returns the stored counter afterwards
    async fn reset_expired_block(
        &self,
        id: &AccountId,
        threshold: i32,
        now: DateTime<Utc>,
    ) -> AuthResult<i32>;

    /// Set `login_attempts` back to zero
    async fn reset_login_attempts(&self, id: &AccountId) -> AuthResult<()>;

    /// Mark the unverified account holding `token` as verified.
    /// Returns `None` when no unverified account holds the token.
    async fn mark_verified(&self, token: &str) -> AuthResult<Option<Account>>;

    /// Replace the password hash; returns `false` if the account is gone
    async fn update_password(&self, id: &AccountId, password: &HashedPassword) -> AuthResult<bool>;

    /// Apply a partial profile update and return the updated account
    async fn update_profile(
        &self,
        id: &AccountId,
        update: &ProfileUpdate,
    ) -> AuthResult<Option<Account>>;
}

/// Append-only access log
#[trait_variant::make(AccessLogRepository: Send)]
pub trait LocalAccessLogRepository {
    async fn append(&self, entry: &AccessLogEntry) -> AuthResult<()>;
}

/// Password reset requests
#[trait_variant::make(PasswordResetRepository: Send)]
pub trait LocalPasswordResetRepository {
    /// Store a new reset request
    async fn create(&self, request: &PasswordResetRequest) -> AuthResult<()>;

    /// Consume an unused reset token and set the owner's password, all or nothing.
    ///
    /// * unknown or used token: `NotFoundOrAlreadyUsed`
    /// * owning account vanished: `NotFound`
    ///
    /// Any failure leaves both the request and the password untouched.
    async fn complete_reset(
        &self,
        token: &str,
        password: &HashedPassword,
        consumed_by: &RequestMeta,
        now: DateTime<Utc>,
    ) -> AuthResult<Email>;
}

/// Notification audit log
#[trait_variant::make(NotificationLogRepository: Send)]
pub trait LocalNotificationLogRepository {
    async fn record(&self, entry: &NotificationLogEntry) -> AuthResult<()>;
}
