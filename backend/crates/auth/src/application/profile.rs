//! Profile Use Cases
//!
//! Read and update the authenticated account, and change its password.

use std::sync::Arc;

use platform::password::ClearTextPassword;
use platform::retry::{retry_transient, with_timeout};

use crate::application::config::AuthConfig;
use crate::application::register::required_text;
use crate::domain::entity::{Account, ProfileUpdate};
use crate::domain::repository::AccountRepository;
use crate::domain::value_object::AccountId;
use crate::error::{AuthError, AuthResult};

/// Change password input
pub struct ChangePasswordInput {
    pub old_password: String,
    pub new_password: String,
}

/// Profile use case
pub struct ProfileUseCase<R>
where
    R: AccountRepository,
{
    repo: Arc<R>,
    config: Arc<AuthConfig>,
}

impl<R> ProfileUseCase<R>
where
    R: AccountRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<AuthConfig>) -> Self {
        Self { repo, config }
    }

    pub async fn get(&self, id: &AccountId) -> AuthResult<Account> {
        retry_transient(&self.config.storage_retry, || self.repo.find_by_id(id))
            .await?
            .ok_or(AuthError::NotFound)
    }

    /// Apply a partial update; an empty update returns the current profile
    pub async fn update(&self, id: &AccountId, update: ProfileUpdate) -> AuthResult<Account> {
        let update = ProfileUpdate {
            name: update.name.map(|v| required_text(v, "NAME")).transpose()?,
            phone: update.phone.map(|v| required_text(v, "PHONE")).transpose()?,
        };
        if update.is_empty() {
            return self.get(id).await;
        }

        let account = with_timeout(
            self.config.storage_retry.timeout,
            self.repo.update_profile(id, &update),
        )
        .await?
        .ok_or(AuthError::NotFound)?;

        tracing::info!(account_id = %account.id, "Profile updated");
        Ok(account)
    }

    pub async fn change_password(&self, id: &AccountId, input: ChangePasswordInput) -> AuthResult<()> {
        let account = self.get(id).await?;

        let old = ClearTextPassword::for_comparison(input.old_password);
        if !account.password.verify(&old) {
            return Err(AuthError::WrongPassword);
        }

        let hashed = ClearTextPassword::new(input.new_password)?.hash(&self.config.password_cost)?;

        let updated = with_timeout(
            self.config.storage_retry.timeout,
            self.repo.update_password(id, &hashed),
        )
        .await?;
        if !updated {
            return Err(AuthError::NotFound);
        }

        tracing::info!(account_id = %account.id, "Password changed");
        Ok(())
    }
}
