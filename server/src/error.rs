//! Error types for the HTTP service.
//!
//! [`ServerError`] covers startup: configuration, opening the database and
//! binding the listener. [`AppError`] is the per-request error; it converts
//! into a JSON response of the form `{"error": "<message>"}`.

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use table_browser_sqlite::SqliteError;
use thiserror::Error;

/// Errors that can occur while configuring or starting the service.
#[derive(Debug, Error)]
pub enum ServerError {
    /// File or socket I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// YAML parsing failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// A configuration value is out of range or unparsable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The database could not be opened or closed.
    #[error(transparent)]
    Storage(#[from] SqliteError),
}

/// Convenience alias for results with [`ServerError`].
pub type Result<T> = std::result::Result<T, ServerError>;

/// JSON error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Request-level error.
#[derive(Debug, Error)]
pub enum AppError {
    /// The request itself is unusable: bad table name, body or query string.
    #[error("{0}")]
    BadRequest(String),

    /// The named table does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The database rejected the operation.
    #[error("{0}")]
    Storage(SqliteError),

    /// The request handler failed outside of storage.
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Storage(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<SqliteError> for AppError {
    fn from(e: SqliteError) -> Self {
        match e {
            SqliteError::InvalidTableName(_) => AppError::BadRequest(e.to_string()),
            SqliteError::TableNotFound(_) => AppError::NotFound(e.to_string()),
            other => AppError::Storage(other),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(e: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("storage task failed: {e}"))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            AppError::Storage(e) => tracing::error!(error = %e, "storage operation failed"),
            AppError::Internal(msg) => tracing::error!(error = %msg, "request failed"),
            AppError::BadRequest(msg) | AppError::NotFound(msg) => {
                tracing::debug!(status = status.as_u16(), error = %msg, "rejected request")
            }
        }
        let body = Json(ErrorResponse {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_errors_map_to_status() {
        let bad: AppError = SqliteError::InvalidTableName("a b".into()).into();
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);

        let missing: AppError = SqliteError::TableNotFound("ghost".into()).into();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        assert_eq!(missing.to_string(), "table not found: ghost");

        let poisoned: AppError = SqliteError::ConnectionPoisoned("read_page").into();
        assert_eq!(poisoned.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_error_response_serialization() {
        let body = ErrorResponse {
            error: "boom".to_string(),
        };
        assert_eq!(serde_json::to_string(&body).unwrap(), r#"{"error":"boom"}"#);
    }
}
