//! Error conversions - From implementations for common error types
//!
//! Provides automatic conversion from common error types to [`AppError`],
//! and the HTTP rendering of [`AppError`] when the `axum` feature is enabled.

use super::app_error::AppError;

// ============================================================================
// Standard library conversions
// ============================================================================

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::internal("I/O operation failed").with_source(err)
    }
}

// ============================================================================
// serde_json conversions
// ============================================================================

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_syntax() || err.is_data() {
            AppError::unprocessable(format!("JSON parse error: {}", err)).with_source(err)
        } else {
            AppError::internal("JSON serialization error").with_source(err)
        }
    }
}

// ============================================================================
// SQLx conversions (feature-gated)
// ============================================================================

/// ストレージ障害を分類する
///
/// * 接続断・プールタイムアウト・リソース不足は 503 `STORAGE_UNAVAILABLE`（リトライ可能）
/// * 制約違反は 422 とし、制約名（なければ DB のメッセージ）をそのまま返す
/// * それ以外は 500
#[cfg(feature = "sqlx")]
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => {
                AppError::unprocessable(super::code::NOT_FOUND).with_source(err)
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                AppError::service_unavailable().with_source(err)
            }
            sqlx::Error::Database(db_err) => {
                // https://www.postgresql.org/docs/current/errcodes-appendix.html
                let code = db_err.code().map(|c| c.into_owned()).unwrap_or_default();
                let app_err = match code.as_str() {
                    // Class 23: Integrity Constraint Violation
                    // Class 22: Data Exception (invalid text representation, too long)
                    "23505" | "23503" | "23502" | "23514" | "22P02" | "22001" => {
                        let detail = db_err
                            .constraint()
                            .map(str::to_owned)
                            .unwrap_or_else(|| db_err.message().to_owned());
                        AppError::unprocessable(detail)
                    }
                    // Class 53: Insufficient Resources, 57: Operator Intervention, 08: Connection Exception
                    c if c.starts_with("53") || c.starts_with("57") || c.starts_with("08") => {
                        AppError::service_unavailable()
                    }
                    _ => AppError::internal("Database error"),
                };
                app_err.with_source(err)
            }
            _ => AppError::internal("Database error").with_source(err),
        }
    }
}

// ============================================================================
// Axum conversions (feature-gated)
// ============================================================================

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::Json;
        use axum::http::StatusCode;

        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let body = serde_json::json!({
            "errors": { "msg": self.public_message() },
        });

        (status, Json(body)).into_response()
    }
}
