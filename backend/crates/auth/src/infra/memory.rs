//! In-Memory Repository
//!
//! Implements every auth repository trait over a single mutex-guarded state.
//! Each trait method takes the lock once, so counter increments and token
//! consumption are atomic just like their SQL counterparts.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use platform::client::RequestMeta;
use platform::password::HashedPassword;

use crate::domain::entity::{
    AccessLogEntry, Account, NotificationLogEntry, PasswordResetRequest, ProfileUpdate,
};
use crate::domain::repository::{
    AccessLogRepository, AccountRepository, NotificationLogRepository, PasswordResetRepository,
};
use crate::domain::value_object::{AccountId, Email};
use crate::error::{AuthError, AuthResult};

#[derive(Default)]
struct State {
    accounts: HashMap<AccountId, Account>,
    access_log: Vec<AccessLogEntry>,
    resets: Vec<PasswordResetRequest>,
    notifications: Vec<NotificationLogEntry>,
}

/// Repository backed by process memory (tests, local demos)
#[derive(Clone, Default)]
pub struct InMemoryAuthRepository {
    state: Arc<Mutex<State>>,
    failing_reads: Arc<AtomicU32>,
}

impl InMemoryAuthRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Make the next `n` account lookups fail with `StorageUnavailable`
    pub fn fail_next_reads(&self, n: u32) {
        self.failing_reads.store(n, Ordering::SeqCst);
    }

    fn check_read(&self) -> AuthResult<()> {
        let remaining = self
            .failing_reads
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        match remaining {
            Ok(_) => Err(AuthError::StorageUnavailable),
            Err(_) => Ok(()),
        }
    }

    /// Snapshot of an account regardless of status
    pub fn account_by_email(&self, email: &str) -> Option<Account> {
        let email = email.trim().to_lowercase();
        self.lock()
            .accounts
            .values()
            .find(|a| a.email.as_str() == email)
            .cloned()
    }

    /// Overwrite a stored account (test setup)
    pub fn put_account(&self, account: Account) {
        self.lock().accounts.insert(account.id, account);
    }

    pub fn access_log(&self) -> Vec<AccessLogEntry> {
        self.lock().access_log.clone()
    }

    pub fn reset_requests(&self) -> Vec<PasswordResetRequest> {
        self.lock().resets.clone()
    }

    pub fn notifications(&self) -> Vec<NotificationLogEntry> {
        self.lock().notifications.clone()
    }
}

fn live<'a>(state: &'a mut State, id: &AccountId) -> Option<&'a mut Account> {
    state
        .accounts
        .get_mut(id)
        .filter(|a| !a.status.is_deleted())
}

impl AccountRepository for InMemoryAuthRepository {
    async fn create(&self, account: &Account) -> AuthResult<()> {
        let mut state = self.lock();
        if state.accounts.values().any(|a| a.email == account.email) {
            return Err(AuthError::EmailAlreadyExists);
        }
        state.accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &AccountId) -> AuthResult<Option<Account>> {
        self.check_read()?;
        Ok(live(&mut self.lock(), id).map(|a| a.clone()))
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<Account>> {
        self.check_read()?;
        Ok(self
            .lock()
            .accounts
            .values()
            .find(|a| &a.email == email && !a.status.is_deleted())
            .cloned())
    }

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool> {
        self.check_read()?;
        Ok(self.lock().accounts.values().any(|a| &a.email == email))
    }

    async fn record_failed_login(
        &self,
        id: &AccountId,
        threshold: i32,
        block_until: DateTime<Utc>,
    ) -> AuthResult<i32> {
        let mut state = self.lock();
        let account = live(&mut state, id).ok_or(AuthError::UserDoesNotExist)?;
        account.login_attempts += 1;
        if account.login_attempts > threshold {
            account.block_expires = Some(block_until);
        }
        Ok(account.login_attempts)
    }

    async fn reset_expired_block(
        &self,
        id: &AccountId,
        threshold: i32,
        now: DateTime<Utc>,
    ) -> AuthResult<i32> {
        let mut state = self.lock();
        let account = live(&mut state, id).ok_or(AuthError::UserDoesNotExist)?;
        if account.has_expired_block(now, threshold) {
            account.login_attempts = 0;
        }
        Ok(account.login_attempts)
    }

    async fn reset_login_attempts(&self, id: &AccountId) -> AuthResult<()> {
        let mut state = self.lock();
        let account = live(&mut state, id).ok_or(AuthError::UserDoesNotExist)?;
        account.login_attempts = 0;
        Ok(())
    }

    async fn mark_verified(&self, token: &str) -> AuthResult<Option<Account>> {
        let mut state = self.lock();
        let account = state
            .accounts
            .values_mut()
            .find(|a| a.verification == token && !a.verified);
        Ok(account.map(|a| {
            a.verified = true;
            a.clone()
        }))
    }

    async fn update_password(&self, id: &AccountId, password: &HashedPassword) -> AuthResult<bool> {
        let mut state = self.lock();
        Ok(match live(&mut state, id) {
            Some(account) => {
                account.password = password.clone();
                true
            }
            None => false,
        })
    }

    async fn update_profile(
        &self,
        id: &AccountId,
        update: &ProfileUpdate,
    ) -> AuthResult<Option<Account>> {
        let mut state = self.lock();
        Ok(live(&mut state, id).map(|account| {
            if let Some(name) = &update.name {
                account.name = name.clone();
            }
            if let Some(phone) = &update.phone {
                account.phone = phone.clone();
            }
            account.clone()
        }))
    }
}

impl AccessLogRepository for InMemoryAuthRepository {
    async fn append(&self, entry: &AccessLogEntry) -> AuthResult<()> {
        self.lock().access_log.push(entry.clone());
        Ok(())
    }
}

impl PasswordResetRepository for InMemoryAuthRepository {
    async fn create(&self, request: &PasswordResetRequest) -> AuthResult<()> {
        self.lock().resets.push(request.clone());
        Ok(())
    }

    async fn complete_reset(
        &self,
        token: &str,
        password: &HashedPassword,
        consumed_by: &RequestMeta,
        now: DateTime<Utc>,
    ) -> AuthResult<Email> {
        let mut state = self.lock();

        let index = state
            .resets
            .iter()
            .position(|r| r.verification == token && !r.used)
            .ok_or(AuthError::NotFoundOrAlreadyUsed)?;
        let email = state.resets[index].email.clone();

        // Validate everything before mutating so a failure leaves no trace
        let account = state
            .accounts
            .values_mut()
            .find(|a| a.email == email && !a.status.is_deleted())
            .ok_or(AuthError::NotFound)?;
        account.password = password.clone();
        account.updated_at = now;

        let request = &mut state.resets[index];
        request.used = true;
        request.consumed_by = Some(consumed_by.clone());
        request.updated_at = now;

        Ok(email)
    }
}

impl NotificationLogRepository for InMemoryAuthRepository {
    async fn record(&self, entry: &NotificationLogEntry) -> AuthResult<()> {
        self.lock().notifications.push(entry.clone());
        Ok(())
    }
}
