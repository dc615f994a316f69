//! Login Use Case
//!
//! Authenticates an account by email and password, enforcing the login guard,
//! and issues a bearer token.

use std::sync::Arc;

use platform::client::RequestMeta;
use platform::clock::Clock;
use platform::password::ClearTextPassword;
use platform::retry::{retry_transient, with_timeout};

use crate::application::config::AuthConfig;
use crate::application::token::TokenService;
use crate::domain::entity::{AccessLogEntry, Account};
use crate::domain::repository::{AccessLogRepository, AccountRepository};
use crate::domain::services::LoginGuard;
use crate::domain::value_object::Email;
use crate::error::{AuthError, AuthResult};

/// Login input
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Login output
pub struct LoginOutput {
    pub token: String,
    pub account: Account,
}

/// Login use case
pub struct LoginUseCase<R>
where
    R: AccountRepository + AccessLogRepository + Sync,
{
    repo: Arc<R>,
    tokens: Arc<TokenService>,
    clock: Arc<dyn Clock>,
    config: Arc<AuthConfig>,
}

impl<R> LoginUseCase<R>
where
    R: AccountRepository + AccessLogRepository + Sync,
{
    pub fn new(
        repo: Arc<R>,
        tokens: Arc<TokenService>,
        clock: Arc<dyn Clock>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            repo,
            tokens,
            clock,
            config,
        }
    }

    pub async fn execute(&self, input: LoginInput, meta: RequestMeta) -> AuthResult<LoginOutput> {
        let email = Email::new(input.email)?;
        let policy = &self.config.storage_retry;

        let mut account = retry_transient(policy, || self.repo.find_by_email(&email))
            .await?
            .ok_or(AuthError::UserDoesNotExist)?;

        let now = self.clock.now();
        let guard = LoginGuard::new(
            self.repo.as_ref(),
            self.config.login_attempts_threshold,
            self.config.block_duration,
            now,
        );

        guard.check_not_blocked(&account)?;
        with_timeout(policy.timeout, guard.check_and_reset_expired_block(&mut account)).await?;

        let password = ClearTextPassword::for_comparison(input.password);
        if !account.password.verify(&password) {
            let outcome =
                with_timeout(policy.timeout, guard.record_failed_attempt(&account)).await?;
            tracing::warn!(account_id = %account.id, ?outcome, "Login failed");
            return Err(outcome.into());
        }

        with_timeout(policy.timeout, guard.record_success(&mut account)).await?;

        let entry = AccessLogEntry::new(account.email.clone(), &meta, now);
        with_timeout(policy.timeout, self.repo.append(&entry)).await?;

        let token = self.tokens.issue(&account.id)?;

        tracing::info!(account_id = %account.id, ip = %meta.ip, "Account logged in");

        Ok(LoginOutput { token, account })
    }
}
