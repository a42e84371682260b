//! # API Error Type
//!
//! Unified error type for application commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in CodeScan                               │
//! │                                                                         │
//! │  Command Function  →  Result<T, ApiError>                              │
//! │         │                                                               │
//! │         ├── ValidationError / CoreError ──► VALIDATION_ERROR           │
//! │         ├── DbError::NoMigrationPath    ──► MIGRATION_ERROR            │
//! │         ├── DbError::StorageUnavailable ──► STORAGE_ERROR              │
//! │         ├── DbError (other)             ──► DATABASE_ERROR             │
//! │         ├── ArchiveError::NotFound      ──► NOT_FOUND                  │
//! │         ├── ArchiveError (I/O, writer)  ──► STORAGE_ERROR              │
//! │         └── ConfigError                 ──► CONFIG_ERROR               │
//! │                                                                         │
//! │  `--output json` prints the error as:                                  │
//! │  { "code": "NOT_FOUND", "message": "Document not found: x.json" }      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

use codescan_archive::ArchiveError;
use codescan_core::{CoreError, ValidationError};
use codescan_db::DbError;

/// Result alias for commands.
pub type ApiResult<T> = Result<T, ApiError>;

/// Error returned from commands.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for command responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Document or file not found
    NotFound,

    /// Input validation failed
    ValidationError,

    /// Database operation failed
    DatabaseError,

    /// The database schema can't be opened by this build
    MigrationError,

    /// Disk or file failure
    StorageError,

    /// Operation not allowed in the current state
    Conflict,

    /// Configuration couldn't be loaded or is invalid
    ConfigError,

    /// Internal error
    Internal,
}

impl ErrorCode {
    /// The serialized form, e.g. `NOT_FOUND`.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::MigrationError => "MIGRATION_ERROR",
            ErrorCode::StorageError => "STORAGE_ERROR",
            ErrorCode::Conflict => "CONFLICT",
            ErrorCode::ConfigError => "CONFIG_ERROR",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Conflict, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Validation(e) => ApiError::validation(e.to_string()),
            DbError::NoMigrationPath { .. } => {
                tracing::error!(error = %err, "Database schema cannot be opened");
                ApiError::new(ErrorCode::MigrationError, err.to_string())
            }
            DbError::MigrationFailed(e) => {
                tracing::error!("Database migration failed: {}", e);
                ApiError::new(ErrorCode::MigrationError, "Database migration failed")
            }
            DbError::StorageUnavailable(e) => {
                tracing::error!("Storage unavailable: {}", e);
                ApiError::new(ErrorCode::StorageError, "Database storage unavailable")
            }
            DbError::ConnectionFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::QueryFailed(e) => {
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database transaction failed")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts archive errors to API errors.
impl From<ArchiveError> for ApiError {
    fn from(err: ArchiveError) -> Self {
        match err {
            ArchiveError::NotFound(_) => ApiError::new(ErrorCode::NotFound, err.to_string()),
            ArchiveError::InvalidName(_) => ApiError::validation(err.to_string()),
            ArchiveError::Io(_)
            | ArchiveError::Json(_)
            | ArchiveError::WriterClosed
            | ArchiveError::TaskFailed(_) => {
                tracing::error!(error = %err, "File operation failed");
                ApiError::new(ErrorCode::StorageError, err.to_string())
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for ApiError {}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Failures while loading or saving [`AppConfig`](crate::config::AppConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write config {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("No config path available")]
    NoConfigPath,
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        ApiError::new(ErrorCode::ConfigError, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_shape() {
        let err = ApiError::new(ErrorCode::NotFound, "Document not found: x.json");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["message"], "Document not found: x.json");
        assert_eq!(err.to_string(), "[NOT_FOUND] Document not found: x.json");
    }

    #[test]
    fn test_code_strings_match_serde() {
        for code in [
            ErrorCode::NotFound,
            ErrorCode::ValidationError,
            ErrorCode::DatabaseError,
            ErrorCode::MigrationError,
            ErrorCode::StorageError,
            ErrorCode::Conflict,
            ErrorCode::ConfigError,
            ErrorCode::Internal,
        ] {
            assert_eq!(serde_json::to_value(code).unwrap(), code.as_str());
        }
    }

    #[test]
    fn test_db_error_mapping() {
        let err: ApiError = DbError::NoMigrationPath { from: 7, to: 3 }.into();
        assert_eq!(err.code, ErrorCode::MigrationError);
        assert!(err.message.contains("7"));

        let validation = ValidationError::Required {
            field: "content".into(),
        };
        let err: ApiError = DbError::Validation(validation).into();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err: ApiError = DbError::StorageUnavailable("disk full".into()).into();
        assert_eq!(err.code, ErrorCode::StorageError);
    }

    #[test]
    fn test_archive_error_mapping() {
        let err: ApiError = ArchiveError::NotFound("x".into()).into();
        assert_eq!(err.code, ErrorCode::NotFound);

        let err: ApiError = ArchiveError::InvalidName("../x".into()).into();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err: ApiError = ArchiveError::WriterClosed.into();
        assert_eq!(err.code, ErrorCode::StorageError);
    }
}
