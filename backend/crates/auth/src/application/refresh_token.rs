//! Refresh Token Use Case
//!
//! Exchanges a valid bearer token for a fresh one.

use std::sync::Arc;

use platform::client::RequestMeta;
use platform::clock::Clock;
use platform::retry::{retry_transient, with_timeout};

use crate::application::config::AuthConfig;
use crate::application::token::TokenService;
use crate::domain::entity::AccessLogEntry;
use crate::domain::repository::{AccessLogRepository, AccountRepository};
use crate::error::{AuthError, AuthResult};

/// Refresh token use case
pub struct RefreshTokenUseCase<R>
where
    R: AccountRepository + AccessLogRepository,
{
    repo: Arc<R>,
    tokens: Arc<TokenService>,
    clock: Arc<dyn Clock>,
    config: Arc<AuthConfig>,
}

impl<R> RefreshTokenUseCase<R>
where
    R: AccountRepository + AccessLogRepository,
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

    pub async fn execute(&self, bearer: &str, meta: RequestMeta) -> AuthResult<String> {
        let account_id = self.tokens.resolve(bearer)?;
        let policy = &self.config.storage_retry;

        let account = retry_transient(policy, || self.repo.find_by_id(&account_id))
            .await?
            .ok_or(AuthError::UserDoesNotExist)?;

        let entry = AccessLogEntry::new(account.email.clone(), &meta, self.clock.now());
        with_timeout(policy.timeout, self.repo.append(&entry)).await?;

        tracing::debug!(account_id = %account.id, "Token refreshed");

        self.tokens.issue(&account.id)
    }
}
