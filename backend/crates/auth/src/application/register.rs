//! Register Use Case
//!
//! Creates an unverified account, logs it in immediately and queues the
//! verification email.

use std::sync::Arc;

use platform::clock::Clock;
use platform::password::ClearTextPassword;
use platform::retry::{retry_transient, with_timeout};

use crate::application::config::AuthConfig;
use crate::application::notification::{NotificationDispatcher, Notifier, registration_email};
use crate::application::token::TokenService;
use crate::domain::entity::{Account, NewAccount};
use crate::domain::repository::{AccountRepository, NotificationLogRepository};
use crate::domain::value_object::{AccountRole, Email};
use crate::error::{AuthError, AuthResult};

/// Register input
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
}

/// Register output
pub struct RegisterOutput {
    pub token: String,
    pub account: Account,
}

/// Trimmed, non-empty text field
pub(crate) fn required_text(value: String, field: &str) -> AuthResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AuthError::Validation(format!("{field}_IS_EMPTY")));
    }
    Ok(trimmed.to_string())
}

/// Register use case
pub struct RegisterUseCase<R, N>
where
    R: AccountRepository + NotificationLogRepository + Send + Sync + 'static,
    N: Notifier + Sync + 'static,
{
    repo: Arc<R>,
    tokens: Arc<TokenService>,
    notifications: NotificationDispatcher<R, N>,
    clock: Arc<dyn Clock>,
    config: Arc<AuthConfig>,
}

impl<R, N> RegisterUseCase<R, N>
where
    R: AccountRepository + NotificationLogRepository + Send + Sync + 'static,
    N: Notifier + Sync + 'static,
{
    pub fn new(
        repo: Arc<R>,
        tokens: Arc<TokenService>,
        notifications: NotificationDispatcher<R, N>,
        clock: Arc<dyn Clock>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            repo,
            tokens,
            notifications,
            clock,
            config,
        }
    }

    pub async fn execute(&self, input: RegisterInput) -> AuthResult<RegisterOutput> {
        let name = required_text(input.name, "NAME")?;
        let phone = required_text(input.phone, "PHONE")?;
        let email = Email::new(input.email)?;
        let password = ClearTextPassword::new(input.password)?;
        let policy = &self.config.storage_retry;

        if retry_transient(policy, || self.repo.exists_by_email(&email)).await? {
            return Err(AuthError::EmailAlreadyExists);
        }

        let account = Account::new(
            NewAccount {
                name,
                email,
                phone,
                password: password.hash(&self.config.password_cost)?,
                role: AccountRole::User,
                verification: platform::crypto::opaque_token(),
            },
            self.clock.now(),
        );

        // The unique index still rejects a concurrent duplicate
        with_timeout(policy.timeout, self.repo.create(&account)).await?;

        let token = self.tokens.issue(&account.id)?;

        let link = self.config.verification_link(&account.verification);
        self.notifications.dispatch(
            account.email.as_str().to_string(),
            registration_email(&account.name, &link),
        );

        tracing::info!(account_id = %account.id, "Account registered");

        Ok(RegisterOutput { token, account })
    }
}
