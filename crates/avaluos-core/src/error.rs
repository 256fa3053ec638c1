//! Error types module
//!
//! All fallible operations of the tracker report `AppError`. Upload failures are
//! never propagated past the workflow boundary: the session store converts them
//! with [`ErrorMetadata::client_message`] and keeps the text for display. Query
//! failures reach the caller of the query layer unchanged.
//!
//! The `Database` variant carries the sqlx error when the `sqlx` feature is on
//! and a plain message otherwise.

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;

use crate::validation::ValidationError;

/// User-facing messages shown in the upload dialog.
pub mod messages {
    pub const UNSUPPORTED_FILE_TYPE: &str = "Tipo de archivo no permitido";
    pub const NOT_AUTHENTICATED: &str = "Usuario no autenticado";
    pub const APPRAISER_NOT_FOUND: &str = "No se encontró información del perito";

    /// Size-limit message, expressed in whole megabytes.
    pub fn file_too_large(max_bytes: usize) -> String {
        format!("El archivo excede el límite de {}MB", max_bytes / (1024 * 1024))
    }
}

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Expected errors like validation failures
    Debug,
    /// Recoverable issues caused by the caller or the environment
    Warn,
    /// Unexpected failures
    Error,
}

/// Describes how an error should be presented and logged.
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "STORAGE_ERROR")
    fn error_code(&self) -> &'static str;

    /// Whether a user retry can succeed without changing anything
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the user
    fn suggested_action(&self) -> Option<&'static str>;

    /// Human-readable message for the UI
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[cfg(not(feature = "sqlx"))]
    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("No authenticated user")]
    NotAuthenticated,

    #[error("No appraiser mapping for user {0}")]
    AppraiserNotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Record update failed: {0}")]
    Update(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

#[cfg(feature = "sqlx")]
impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        AppError::Database(err)
    }
}

/// Static metadata for each variant: (error_code, recoverable, suggested_action, log_level).
fn app_error_static_metadata(
    err: &AppError,
) -> (&'static str, bool, Option<&'static str>, LogLevel) {
    match err {
        AppError::Database(_) => (
            "DATABASE_ERROR",
            true,
            Some("Retry after a short delay"),
            LogLevel::Error,
        ),
        AppError::Validation(_) => (
            "VALIDATION_ERROR",
            false,
            Some("Choose a PDF, Word, JPEG or PNG file of at most 5MB"),
            LogLevel::Debug,
        ),
        AppError::NotAuthenticated => (
            "NOT_AUTHENTICATED",
            false,
            Some("Sign in again"),
            LogLevel::Warn,
        ),
        AppError::AppraiserNotFound(_) => (
            "APPRAISER_NOT_FOUND",
            false,
            Some("Ask an administrator to assign an appraiser to this account"),
            LogLevel::Warn,
        ),
        AppError::Storage(_) => (
            "STORAGE_ERROR",
            true,
            Some("Retry the upload"),
            LogLevel::Error,
        ),
        AppError::Update(_) => (
            "UPDATE_ERROR",
            true,
            Some("Retry the upload"),
            LogLevel::Error,
        ),
        AppError::Query(_) => (
            "QUERY_ERROR",
            true,
            Some("Wait for the next refresh or change the filters"),
            LogLevel::Error,
        ),
        AppError::InvalidInput(_) => (
            "INVALID_INPUT",
            false,
            Some("Check the parameters and try again"),
            LogLevel::Debug,
        ),
        AppError::Config(_) => (
            "CONFIG_ERROR",
            false,
            Some("Check the environment configuration"),
            LogLevel::Error,
        ),
    }
}

impl AppError {
    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).0
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).1
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).2
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).3
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Validation(ValidationError::FileTooLarge { max, .. }) => {
                messages::file_too_large(*max)
            }
            AppError::Validation(ValidationError::UnsupportedContentType { .. }) => {
                messages::UNSUPPORTED_FILE_TYPE.to_string()
            }
            AppError::NotAuthenticated => messages::NOT_AUTHENTICATED.to_string(),
            AppError::AppraiserNotFound(_) => messages::APPRAISER_NOT_FOUND.to_string(),
            AppError::Storage(ref msg) => msg.clone(),
            AppError::Update(ref msg) => msg.clone(),
            AppError::Query(ref msg) => msg.clone(),
            AppError::Database(_) => "Failed to access database".to_string(),
            AppError::InvalidInput(ref msg) => msg.clone(),
            AppError::Config(ref msg) => msg.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_file_too_large() {
        let err = AppError::from(ValidationError::FileTooLarge {
            size: 6 * 1024 * 1024,
            max: 5 * 1024 * 1024,
        });
        assert_eq!(err.client_message(), "El archivo excede el límite de 5MB");
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
        assert!(!err.is_recoverable());
        assert_eq!(err.log_level(), LogLevel::Debug);
    }

    #[test]
    fn test_client_message_unsupported_type() {
        let err = AppError::from(ValidationError::UnsupportedContentType {
            content_type: "text/plain".to_string(),
        });
        assert_eq!(err.client_message(), "Tipo de archivo no permitido");
    }

    #[test]
    fn test_auth_errors() {
        assert_eq!(
            AppError::NotAuthenticated.client_message(),
            "Usuario no autenticado"
        );
        let err = AppError::AppraiserNotFound("user-1".to_string());
        assert_eq!(err.client_message(), "No se encontró información del perito");
        assert_eq!(err.error_code(), "APPRAISER_NOT_FOUND");
    }

    #[test]
    fn test_backend_errors_are_recoverable() {
        let storage = AppError::Storage("bucket offline".to_string());
        assert!(storage.is_recoverable());
        assert_eq!(storage.client_message(), "bucket offline");

        let update = AppError::Update("row locked".to_string());
        assert_eq!(update.error_code(), "UPDATE_ERROR");
        assert_eq!(update.log_level(), LogLevel::Error);
    }

    #[test]
    fn test_detailed_message_includes_source_chain() {
        let err = AppError::from(ValidationError::UnsupportedContentType {
            content_type: "text/plain".to_string(),
        });
        let details = err.detailed_message();
        assert!(details.starts_with("Validation failed:"));
        assert!(details.contains("\n  Caused by:"));

        let flat = AppError::Update("row locked".to_string());
        assert_eq!(flat.detailed_message(), "Record update failed: row locked");
    }
}
