//! Forgot Password Use Case
//!
//! Records a password reset request and queues the reset email.

use std::sync::Arc;

use platform::client::RequestMeta;
use platform::clock::Clock;
use platform::retry::{retry_transient, with_timeout};

use crate::application::config::AuthConfig;
use crate::application::notification::{NotificationDispatcher, Notifier, reset_email};
use crate::domain::entity::PasswordResetRequest;
use crate::domain::repository::{
    AccountRepository, NotificationLogRepository, PasswordResetRepository,
};
use crate::domain::value_object::Email;
use crate::error::{AuthError, AuthResult};

/// Forgot password output
pub struct ForgotPasswordOutput {
    pub email: Email,
    /// Raw reset token; only rendered when the config allows it
    pub verification: String,
}

/// Forgot password use case
pub struct ForgotPasswordUseCase<R, N>
where
    R: AccountRepository
        + PasswordResetRepository
        + NotificationLogRepository
        + Send
        + Sync
        + 'static,
    N: Notifier + Sync + 'static,
{
    repo: Arc<R>,
    notifications: NotificationDispatcher<R, N>,
    clock: Arc<dyn Clock>,
    config: Arc<AuthConfig>,
}

impl<R, N> ForgotPasswordUseCase<R, N>
where
    R: AccountRepository
        + PasswordResetRepository
        + NotificationLogRepository
        + Send
        + Sync
        + 'static,
    N: Notifier + Sync + 'static,
{
    pub fn new(
        repo: Arc<R>,
        notifications: NotificationDispatcher<R, N>,
        clock: Arc<dyn Clock>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            repo,
            notifications,
            clock,
            config,
        }
    }

    pub async fn execute(&self, email: String, meta: RequestMeta) -> AuthResult<ForgotPasswordOutput> {
        let email = Email::new(email)?;
        let policy = &self.config.storage_retry;

        let account = retry_transient(policy, || AccountRepository::find_by_email(&*self.repo, &email))
            .await?
            .ok_or(AuthError::UserDoesNotExist)?;

        let request = PasswordResetRequest::new(
            account.email.clone(),
            platform::crypto::opaque_token(),
            meta,
            self.clock.now(),
        );
        with_timeout(
            policy.timeout,
            PasswordResetRepository::create(&*self.repo, &request),
        )
        .await?;

        let link = self.config.reset_link(&request.verification);
        self.notifications.dispatch(
            account.email.as_str().to_string(),
            reset_email(&account.name, &link),
        );

        tracing::info!(account_id = %account.id, "Password reset requested");

        Ok(ForgotPasswordOutput {
            email: request.email,
            verification: request.verification,
        })
    }
}
