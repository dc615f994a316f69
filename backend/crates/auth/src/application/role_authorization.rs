//! Role Authorization Use Case

use std::sync::Arc;

use platform::retry::retry_transient;

use crate::application::config::AuthConfig;
use crate::domain::entity::Account;
use crate::domain::repository::AccountRepository;
use crate::domain::value_object::{AccountId, AccountRole};
use crate::error::{AuthError, AuthResult};

/// Checks the authenticated account against a set of allowed roles
pub struct RoleAuthorizationUseCase<R>
where
    R: AccountRepository,
{
    repo: Arc<R>,
    config: Arc<AuthConfig>,
}

impl<R> RoleAuthorizationUseCase<R>
where
    R: AccountRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<AuthConfig>) -> Self {
        Self { repo, config }
    }

    /// Returns the loaded account when its role is allowed
    pub async fn execute(&self, account_id: &AccountId, allowed: &[AccountRole]) -> AuthResult<Account> {
        let account = retry_transient(&self.config.storage_retry, || {
            self.repo.find_by_id(account_id)
        })
        .await?
        .ok_or(AuthError::PrincipalNotFound)?;

        if !allowed.contains(&account.role) {
            tracing::warn!(
                account_id = %account.id,
                role = %account.role,
                "Role not allowed"
            );
            return Err(AuthError::Unauthorized);
        }

        Ok(account)
    }
}
