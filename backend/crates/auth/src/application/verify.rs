//! Verify Use Case
//!
//! Consumes an email verification token. The lookup only matches unverified
//! accounts, so a token verifies at most once.

use std::sync::Arc;

use platform::retry::with_timeout;

use crate::application::config::AuthConfig;
use crate::domain::repository::AccountRepository;
use crate::domain::value_object::Email;
use crate::error::{AuthError, AuthResult};

/// Verify output
pub struct VerifyOutput {
    pub email: Email,
    pub verified: bool,
}

/// Verify use case
pub struct VerifyUseCase<R>
where
    R: AccountRepository,
{
    repo: Arc<R>,
    config: Arc<AuthConfig>,
}

impl<R> VerifyUseCase<R>
where
    R: AccountRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<AuthConfig>) -> Self {
        Self { repo, config }
    }

    pub async fn execute(&self, token: &str) -> AuthResult<VerifyOutput> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::Validation("ID_IS_EMPTY".to_string()));
        }

        let account = with_timeout(self.config.storage_retry.timeout, self.repo.mark_verified(token))
            .await?
            .ok_or(AuthError::NotFoundOrAlreadyVerified)?;

        tracing::info!(account_id = %account.id, "Email verified");

        Ok(VerifyOutput {
            email: account.email,
            verified: account.verified,
        })
    }
}
