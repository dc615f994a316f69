//! Auth Error Types
//!
//! This module provides auth-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, code, kind::ErrorKind};
use platform::retry::Transient;
use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// No (live) account for the given email or id
    #[error("User does not exist")]
    UserDoesNotExist,

    /// Registration with an email that is already taken
    #[error("Email already exists")]
    EmailAlreadyExists,

    /// Password mismatch below the lockout threshold
    #[error("Wrong password")]
    WrongPassword,

    /// Account is inside its block window
    #[error("Account is temporarily blocked")]
    BlockedUser,

    /// Verification token unknown or account already verified
    #[error("Verification token not found or already verified")]
    NotFoundOrAlreadyVerified,

    /// Reset token unknown or already consumed
    #[error("Reset token not found or already used")]
    NotFoundOrAlreadyUsed,

    /// Referenced record vanished during a flow
    #[error("Not found")]
    NotFound,

    /// Authenticated account no longer exists (role check)
    #[error("Authenticated account not found")]
    PrincipalNotFound,

    /// Role not in the allowed set
    #[error("Unauthorized")]
    Unauthorized,

    /// Missing or unusable credentials on a protected route
    #[error("Authentication required")]
    Unauthenticated,

    /// Token could not be opened, verified or has expired
    #[error("Bad token")]
    BadToken,

    /// Input failed validation; carries the message code
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Constraint violation reported by storage; carries the constraint message
    #[error("Storage rejected the write: {0}")]
    Constraint(String),

    /// Transient storage failure
    #[error("Storage unavailable")]
    StorageUnavailable,

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::UserDoesNotExist
            | AuthError::EmailAlreadyExists
            | AuthError::NotFoundOrAlreadyVerified
            | AuthError::NotFoundOrAlreadyUsed
            | AuthError::NotFound
            | AuthError::Validation(_)
            | AuthError::Constraint(_) => ErrorKind::UnprocessableEntity,
            AuthError::WrongPassword | AuthError::BlockedUser | AuthError::BadToken => {
                ErrorKind::Conflict
            }
            AuthError::PrincipalNotFound | AuthError::Unauthorized | AuthError::Unauthenticated => {
                ErrorKind::Unauthorized
            }
            AuthError::StorageUnavailable => ErrorKind::ServiceUnavailable,
            AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Message code sent to the client
    pub fn message_code(&self) -> String {
        match self {
            AuthError::UserDoesNotExist => code::USER_DOES_NOT_EXIST.into(),
            AuthError::EmailAlreadyExists => code::EMAIL_ALREADY_EXISTS.into(),
            AuthError::WrongPassword => code::WRONG_PASSWORD.into(),
            AuthError::BlockedUser => code::BLOCKED_USER.into(),
            AuthError::NotFoundOrAlreadyVerified => code::NOT_FOUND_OR_ALREADY_VERIFIED.into(),
            AuthError::NotFoundOrAlreadyUsed => code::NOT_FOUND_OR_ALREADY_USED.into(),
            AuthError::NotFound | AuthError::PrincipalNotFound => code::NOT_FOUND.into(),
            AuthError::Unauthorized | AuthError::Unauthenticated => code::UNAUTHORIZED.into(),
            AuthError::BadToken => code::BAD_TOKEN.into(),
            AuthError::Validation(msg) | AuthError::Constraint(msg) => msg.clone(),
            AuthError::StorageUnavailable => code::STORAGE_UNAVAILABLE.into(),
            AuthError::Internal(_) => code::INTERNAL_ERROR.into(),
        }
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        AppError::new(self.kind(), self.message_code())
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::StorageUnavailable => {
                tracing::error!("Auth storage unavailable");
            }
            AuthError::WrongPassword => {
                tracing::warn!("Login attempt with wrong password");
            }
            AuthError::BlockedUser => {
                tracing::warn!("Login attempt on blocked account");
            }
            AuthError::BadToken => {
                tracing::warn!("Rejected bearer token");
            }
            AuthError::Unauthorized | AuthError::PrincipalNotFound => {
                tracing::warn!(error = %self, "Role authorization denied");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        // Reuse the kernel classification of storage failures
        let classified = AppError::from(err);
        match classified.kind() {
            ErrorKind::ServiceUnavailable => AuthError::StorageUnavailable,
            ErrorKind::UnprocessableEntity => AuthError::Constraint(classified.message().to_owned()),
            _ => AuthError::Internal(format!("{classified:?}")),
        }
    }
}

impl From<axum::extract::rejection::JsonRejection> for AuthError {
    fn from(rejection: axum::extract::rejection::JsonRejection) -> Self {
        let detail = rejection.body_text();
        tracing::debug!(%detail, "Rejected request body");
        if detail.contains("missing field") {
            AuthError::Validation("MISSING".to_string())
        } else {
            AuthError::Validation("INVALID_BODY".to_string())
        }
    }
}

impl From<platform::password::PasswordPolicyError> for AuthError {
    fn from(err: platform::password::PasswordPolicyError) -> Self {
        AuthError::Validation(err.to_string())
    }
}

impl From<platform::password::PasswordHashError> for AuthError {
    fn from(err: platform::password::PasswordHashError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

impl From<platform::cipher::CipherError> for AuthError {
    fn from(err: platform::cipher::CipherError) -> Self {
        tracing::debug!(error = %err, "Token could not be opened");
        AuthError::BadToken
    }
}

impl Transient for AuthError {
    fn is_transient(&self) -> bool {
        matches!(self, AuthError::StorageUnavailable)
    }

    fn timed_out() -> Self {
        AuthError::StorageUnavailable
    }
}
