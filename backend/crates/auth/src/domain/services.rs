//! Login Guard
//!
//! Tracks failed attempts per account and enforces temporary blocking.
//!
//! ```text
//!   OPEN ──(attempts > threshold)──▶ BLOCKED ──(now ≥ block_expires)──▶ EXPIRED_BLOCK
//!    ▲                                                                      │
//!    └──────────────────────(attempts reset to 0 on next login)─────────────┘
//! ```
//!
//! The counter increment and the block timestamp are one write, so no stored
//! state can be over the threshold without a block window. The expired-block
//! reset is conditional on the stored values, never on a stale read.

use chrono::{DateTime, Duration, Utc};

use crate::domain::entity::Account;
use crate::domain::repository::AccountRepository;
use crate::error::{AuthError, AuthResult};

/// Outcome of a failed password comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailedAttempt {
    /// Still under the threshold
    WrongPassword { attempts: i32 },
    /// Threshold exceeded; blocked until the given instant
    Blocked { attempts: i32, until: DateTime<Utc> },
}

impl From<FailedAttempt> for AuthError {
    fn from(outcome: FailedAttempt) -> Self {
        match outcome {
            FailedAttempt::WrongPassword { .. } => AuthError::WrongPassword,
            FailedAttempt::Blocked { .. } => AuthError::BlockedUser,
        }
    }
}

/// Login guard bound to a repository and the current instant
pub struct LoginGuard<'a, R> {
    repo: &'a R,
    threshold: i32,
    block_duration: Duration,
    now: DateTime<Utc>,
}

impl<'a, R> LoginGuard<'a, R>
where
    R: AccountRepository,
{
    pub fn new(repo: &'a R, threshold: i32, block_duration: Duration, now: DateTime<Utc>) -> Self {
        Self {
            repo,
            threshold,
            block_duration,
            now,
        }
    }

    /// Fails with `BlockedUser` inside the block window
    pub fn check_not_blocked(&self, account: &Account) -> AuthResult<()> {
        if account.is_blocked(self.now) {
            return Err(AuthError::BlockedUser);
        }
        Ok(())
    }

    /// Reset the counter if a previous block has elapsed
    pub async fn check_and_reset_expired_block(&self, account: &mut Account) -> AuthResult<()> {
        if account.has_expired_block(self.now, self.threshold) {
            account.login_attempts = self
                .repo
                .reset_expired_block(&account.id, self.threshold, self.now)
                .await?;
            tracing::info!(
                account_id = %account.id,
                attempts = account.login_attempts,
                "Block expired, login attempts reset"
            );
        }
        Ok(())
    }

    /// Persist one more failed attempt and decide whether to block
    pub async fn record_failed_attempt(&self, account: &Account) -> AuthResult<FailedAttempt> {
        let until = self.now + self.block_duration;
        let attempts = self
            .repo
            .record_failed_login(&account.id, self.threshold, until)
            .await?;
        if attempts <= self.threshold {
            return Ok(FailedAttempt::WrongPassword { attempts });
        }

        tracing::warn!(
            account_id = %account.id,
            attempts,
            blocked_until = %until,
            "Account blocked after too many failed logins"
        );
        Ok(FailedAttempt::Blocked { attempts, until })
    }

    /// Clear the counter after a successful comparison
    pub async fn record_success(&self, account: &mut Account) -> AuthResult<()> {
        if account.login_attempts != 0 {
            self.repo.reset_login_attempts(&account.id).await?;
            account.login_attempts = 0;
        }
        Ok(())
    }
}
