//! PostgreSQL Repository Implementations

use std::future::Future;
use std::pin::Pin;

use chrono::{DateTime, Utc};
use platform::client::RequestMeta;
use platform::password::HashedPassword;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::domain::entity::{
    AccessLogEntry, Account, NotificationLogEntry, PasswordResetRequest, ProfileUpdate,
};
use crate::domain::repository::{
    AccessLogRepository, AccountRepository, NotificationLogRepository, PasswordResetRepository,
};
use crate::domain::value_object::{AccountId, AccountRole, AccountStatus, Email};
use crate::error::{AuthError, AuthResult};

/// Unique index on `lower(email)`
const EMAIL_UNIQUE_INDEX: &str = "users_email_lower_key";

/// Future returned by a transaction body
pub type TxFuture<'c, T> = Pin<Box<dyn Future<Output = AuthResult<T>> + Send + 'c>>;

/// PostgreSQL-backed auth repository
#[derive(Clone)]
pub struct PgAuthRepository {
    pool: PgPool,
}

impl PgAuthRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run `body` inside a transaction; commit on `Ok`, roll back on `Err`
    pub async fn with_transaction<T, F>(&self, body: F) -> AuthResult<T>
    where
        T: Send,
        F: for<'c> FnOnce(&'c mut PgConnection) -> TxFuture<'c, T> + Send,
    {
        let mut tx = self.pool.begin().await?;
        match body(&mut *tx).await {
            Ok(value) => {
                tx.commit().await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback) = tx.rollback().await {
                    tracing::error!(error = %rollback, "Transaction rollback failed");
                }
                Err(err)
            }
        }
    }
}

fn map_create_error(err: sqlx::Error) -> AuthError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() && db.constraint() == Some(EMAIL_UNIQUE_INDEX) {
            return AuthError::EmailAlreadyExists;
        }
    }
    err.into()
}

// ============================================================================
// Account Repository Implementation
// ============================================================================

impl AccountRepository for PgAuthRepository {
    async fn create(&self, account: &Account) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (
                id,
                name,
                email,
                phone,
                password,
                role,
                status,
                verified,
                verification,
                login_attempts,
                block_expires,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(account.id.as_uuid())
        .bind(&account.name)
        .bind(account.email.as_str())
        .bind(&account.phone)
        .bind(account.password.as_phc_string())
        .bind(account.role.code())
        .bind(account.status.code())
        .bind(account.verified)
        .bind(&account.verification)
        .bind(account.login_attempts)
        .bind(account.block_expires)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_create_error)?;

        Ok(())
    }

    async fn find_by_id(&self, id: &AccountId) -> AuthResult<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT
                id, name, email, phone, password, role, status, verified,
                verification, login_attempts, block_expires, created_at, updated_at
            FROM users
            WHERE id = $1 AND status <> 'deleted'
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_account()).transpose()
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT
                id, name, email, phone, password, role, status, verified,
                verification, login_attempts, block_expires, created_at, updated_at
            FROM users
            WHERE lower(email) = $1 AND status <> 'deleted'
            "#,
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_account()).transpose()
    }

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE lower(email) = $1)",
        )
        .bind(email.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn record_failed_login(
        &self,
        id: &AccountId,
        threshold: i32,
        block_until: DateTime<Utc>,
    ) -> AuthResult<i32> {
        let attempts = sqlx::query_scalar::<_, i32>(
            r#"
            UPDATE users SET
                login_attempts = login_attempts + 1,
                block_expires = CASE
                    WHEN login_attempts + 1 > $2 THEN $3
                    ELSE block_expires
                END,
                updated_at = now()
            WHERE id = $1 AND status <> 'deleted'
            RETURNING login_attempts
            "#,
        )
        .bind(id.as_uuid())
        .bind(threshold)
        .bind(block_until)
        .fetch_optional(&self.pool)
        .await?;

        attempts.ok_or(AuthError::UserDoesNotExist)
    }

    async fn reset_expired_block(
        &self,
        id: &AccountId,
        threshold: i32,
        now: DateTime<Utc>,
    ) -> AuthResult<i32> {
        let attempts = sqlx::query_scalar::<_, i32>(
            r#"
            UPDATE users SET
                login_attempts = CASE
                    WHEN login_attempts > $2 AND block_expires <= $3 THEN 0
                    ELSE login_attempts
                END,
                updated_at = now()
            WHERE id = $1 AND status <> 'deleted'
            RETURNING login_attempts
            "#,
        )
        .bind(id.as_uuid())
        .bind(threshold)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        attempts.ok_or(AuthError::UserDoesNotExist)
    }

    async fn reset_login_attempts(&self, id: &AccountId) -> AuthResult<()> {
        let updated = sqlx::query(
            "UPDATE users SET login_attempts = 0, updated_at = now() WHERE id = $1 AND status <> 'deleted'",
        )
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(AuthError::UserDoesNotExist);
        }
        Ok(())
    }

    async fn mark_verified(&self, token: &str) -> AuthResult<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            UPDATE users SET
                verified = true,
                updated_at = now()
            WHERE verification = $1 AND verified = false
            RETURNING
                id, name, email, phone, password, role, status, verified,
                verification, login_attempts, block_expires, created_at, updated_at
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_account()).transpose()
    }

    async fn update_password(&self, id: &AccountId, password: &HashedPassword) -> AuthResult<bool> {
        let updated = sqlx::query(
            r#"
            UPDATE users SET
                password = $2,
                updated_at = now()
            WHERE id = $1 AND status <> 'deleted'
            "#,
        )
        .bind(id.as_uuid())
        .bind(password.as_phc_string())
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(updated > 0)
    }

    async fn update_profile(
        &self,
        id: &AccountId,
        update: &ProfileUpdate,
    ) -> AuthResult<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            UPDATE users SET
                name = COALESCE($2, name),
                phone = COALESCE($3, phone),
                updated_at = now()
            WHERE id = $1 AND status <> 'deleted'
            RETURNING
                id, name, email, phone, password, role, status, verified,
                verification, login_attempts, block_expires, created_at, updated_at
            "#,
        )
        .bind(id.as_uuid())
        .bind(update.name.as_deref())
        .bind(update.phone.as_deref())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_account()).transpose()
    }
}

// ============================================================================
// Access Log Repository Implementation
// ============================================================================

impl AccessLogRepository for PgAuthRepository {
    async fn append(&self, entry: &AccessLogEntry) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO user_access (id, email, ip, browser, country, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(entry.id.as_uuid())
        .bind(entry.email.as_str())
        .bind(&entry.ip)
        .bind(&entry.browser)
        .bind(&entry.country)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// ============================================================================
// Password Reset Repository Implementation
// ============================================================================

impl PasswordResetRepository for PgAuthRepository {
    async fn create(&self, request: &PasswordResetRequest) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO forgot_passwords (
                id,
                email,
                verification,
                used,
                ip_request,
                browser_request,
                country_request,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(request.id.as_uuid())
        .bind(request.email.as_str())
        .bind(&request.verification)
        .bind(request.used)
        .bind(&request.requested_by.ip)
        .bind(&request.requested_by.browser)
        .bind(&request.requested_by.country)
        .bind(request.created_at)
        .bind(request.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn complete_reset(
        &self,
        token: &str,
        password: &HashedPassword,
        consumed_by: &RequestMeta,
        now: DateTime<Utc>,
    ) -> AuthResult<Email> {
        let token = token.to_owned();
        let hash = password.as_phc_string().to_owned();
        let meta = consumed_by.clone();

        self.with_transaction(move |conn| {
            Box::pin(async move {
                // Conditional update: a second consumer sees no row
                let email = sqlx::query_scalar::<_, String>(
                    r#"
                    UPDATE forgot_passwords SET
                        used = true,
                        ip_changed = $2,
                        browser_changed = $3,
                        country_changed = $4,
                        updated_at = $5
                    WHERE verification = $1 AND used = false
                    RETURNING email
                    "#,
                )
                .bind(&token)
                .bind(&meta.ip)
                .bind(&meta.browser)
                .bind(&meta.country)
                .bind(now)
                .fetch_optional(&mut *conn)
                .await?
                .ok_or(AuthError::NotFoundOrAlreadyUsed)?;

                let updated = sqlx::query(
                    r#"
                    UPDATE users SET
                        password = $2,
                        updated_at = $3
                    WHERE lower(email) = $1 AND status <> 'deleted'
                    "#,
                )
                .bind(&email)
                .bind(&hash)
                .bind(now)
                .execute(&mut *conn)
                .await?
                .rows_affected();

                if updated == 0 {
                    return Err(AuthError::NotFound);
                }

                Ok(Email::from_db(email))
            })
        })
        .await
    }
}

// ============================================================================
// Notification Log Repository Implementation
// ============================================================================

impl NotificationLogRepository for PgAuthRepository {
    async fn record(&self, entry: &NotificationLogEntry) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO notifications (
                id,
                destination,
                subject,
                message,
                channel,
                status,
                error,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(entry.id.as_uuid())
        .bind(&entry.destination)
        .bind(&entry.subject)
        .bind(&entry.message)
        .bind(entry.channel.code())
        .bind(entry.status.code())
        .bind(entry.error.as_deref())
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// ============================================================================
// Row Types for sqlx mapping
// ============================================================================

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: Uuid,
    name: String,
    email: String,
    phone: String,
    password: String,
    role: String,
    status: String,
    verified: bool,
    verification: String,
    login_attempts: i32,
    block_expires: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AccountRow {
    fn into_account(self) -> AuthResult<Account> {
        let password = HashedPassword::from_phc_string(self.password)
            .map_err(|e| AuthError::Internal(format!("Invalid password hash: {}", e)))?;
        let role = AccountRole::from_code(&self.role)
            .ok_or_else(|| AuthError::Internal(format!("Invalid role: {}", self.role)))?;
        let status = AccountStatus::from_code(&self.status)
            .ok_or_else(|| AuthError::Internal(format!("Invalid status: {}", self.status)))?;

        Ok(Account {
            id: AccountId::from_uuid(self.id),
            name: self.name,
            email: Email::from_db(self.email),
            phone: self.phone,
            password,
            role,
            status,
            verified: self.verified,
            verification: self.verification,
            login_attempts: self.login_attempts,
            block_expires: self.block_expires,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
