//! Query Error Types
//!
//! Errors raised while translating list queries and running generic CRUD
//! operations. They render through the unified `kernel::error::AppError`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, code, kind::ErrorKind};
use platform::retry::Transient;
use thiserror::Error;

/// Query-specific result type alias
pub type QueryResult<T> = Result<T, QueryError>;

#[derive(Debug, Error)]
pub enum QueryError {
    /// `filter`/`fields` could not be turned into a predicate
    #[error("Malformed filter: {0}")]
    Filter(String),

    /// Attributes or ids rejected; carries the client message
    #[error("Validation failed: {0}")]
    Validation(String),

    /// No document with the given id
    #[error("Not found")]
    NotFound,

    /// Transient storage failure
    #[error("Storage unavailable")]
    StorageUnavailable,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl QueryError {
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            QueryError::Filter(_) | QueryError::Validation(_) | QueryError::NotFound => {
                ErrorKind::UnprocessableEntity
            }
            QueryError::StorageUnavailable => ErrorKind::ServiceUnavailable,
            QueryError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Message code sent to the client
    pub fn message_code(&self) -> String {
        match self {
            QueryError::Filter(_) => code::ERROR_WITH_FILTER.into(),
            QueryError::Validation(msg) => msg.clone(),
            QueryError::NotFound => code::NOT_FOUND.into(),
            QueryError::StorageUnavailable => code::STORAGE_UNAVAILABLE.into(),
            QueryError::Internal(_) => code::INTERNAL_ERROR.into(),
        }
    }

    pub fn to_app_error(&self) -> AppError {
        AppError::new(self.kind(), self.message_code())
    }

    fn log(&self) {
        match self {
            QueryError::Internal(msg) => tracing::error!(message = %msg, "Query internal error"),
            QueryError::StorageUnavailable => tracing::error!("Query storage unavailable"),
            QueryError::Filter(detail) => tracing::debug!(%detail, "Rejected filter"),
            _ => tracing::debug!(error = %self, "Query error"),
        }
    }
}

impl IntoResponse for QueryError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<sqlx::Error> for QueryError {
    fn from(err: sqlx::Error) -> Self {
        if matches!(err, sqlx::Error::RowNotFound) {
            return QueryError::NotFound;
        }
        let classified = AppError::from(err);
        match classified.kind() {
            ErrorKind::ServiceUnavailable => QueryError::StorageUnavailable,
            ErrorKind::UnprocessableEntity => QueryError::Validation(classified.message().to_owned()),
            _ => QueryError::Internal(format!("{classified:?}")),
        }
    }
}

impl From<axum::extract::rejection::JsonRejection> for QueryError {
    fn from(rejection: axum::extract::rejection::JsonRejection) -> Self {
        tracing::debug!(detail = %rejection.body_text(), "Rejected request body");
        QueryError::Validation("INVALID_BODY".to_string())
    }
}

impl From<axum::extract::rejection::QueryRejection> for QueryError {
    fn from(rejection: axum::extract::rejection::QueryRejection) -> Self {
        QueryError::Filter(rejection.body_text())
    }
}

impl Transient for QueryError {
    fn is_transient(&self) -> bool {
        matches!(self, QueryError::StorageUnavailable)
    }

    fn timed_out() -> Self {
        QueryError::StorageUnavailable
    }
}
