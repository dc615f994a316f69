//! Reset Password Use Case
//!
//! Consumes a reset token and replaces the password in one transaction.

use std::sync::Arc;

use platform::client::RequestMeta;
use platform::clock::Clock;
use platform::password::ClearTextPassword;
use platform::retry::with_timeout;

use crate::application::config::AuthConfig;
use crate::domain::repository::PasswordResetRepository;
use crate::error::{AuthError, AuthResult};

/// Reset password input
pub struct ResetPasswordInput {
    /// Reset token from the email link
    pub token: String,
    pub password: String,
}

/// Reset password use case
pub struct ResetPasswordUseCase<R>
where
    R: PasswordResetRepository,
{
    repo: Arc<R>,
    clock: Arc<dyn Clock>,
    config: Arc<AuthConfig>,
}

impl<R> ResetPasswordUseCase<R>
where
    R: PasswordResetRepository,
{
    pub fn new(repo: Arc<R>, clock: Arc<dyn Clock>, config: Arc<AuthConfig>) -> Self {
        Self {
            repo,
            clock,
            config,
        }
    }

    pub async fn execute(&self, input: ResetPasswordInput, meta: RequestMeta) -> AuthResult<()> {
        let token = input.token.trim();
        if token.is_empty() {
            return Err(AuthError::Validation("ID_IS_EMPTY".to_string()));
        }

        let password = ClearTextPassword::new(input.password)?;
        let hashed = password.hash(&self.config.password_cost)?;

        let email = with_timeout(
            self.config.storage_retry.timeout,
            self.repo
                .complete_reset(token, &hashed, &meta, self.clock.now()),
        )
        .await?;

        tracing::info!(email = %email, ip = %meta.ip, "Password reset completed");

        Ok(())
    }
}
