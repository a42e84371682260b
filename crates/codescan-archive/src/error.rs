//! # Archive Error Types
//!
//! Errors from mirror, export and document browser file operations.
//!
//! A corrupt or missing mirror document is NOT an error: reading it yields
//! an empty list. These variants cover the failures that remain.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for archive operations.
pub type ArchiveResult<T> = Result<T, ArchiveError>;

#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Filesystem failure (permissions, disk full, ...).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A document could not be serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The document id or path does not name anything.
    #[error("Document not found: {0}")]
    NotFound(String),

    /// A display name or document id that could escape its folder, or an
    /// operation the target does not allow.
    #[error("Invalid document name: {0}")]
    InvalidName(String),

    /// The mirror writer task has stopped.
    #[error("Mirror writer is not running")]
    WriterClosed,

    /// A blocking file task panicked or was cancelled.
    #[error("File task failed: {0}")]
    TaskFailed(String),
}

impl ArchiveError {
    pub(crate) fn not_found(path: impl Into<PathBuf>) -> Self {
        ArchiveError::NotFound(path.into().display().to_string())
    }
}

impl From<tokio::task::JoinError> for ArchiveError {
    fn from(err: tokio::task::JoinError) -> Self {
        ArchiveError::TaskFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            ArchiveError::not_found("/tmp/x.json").to_string(),
            "Document not found: /tmp/x.json"
        );
        assert_eq!(
            ArchiveError::WriterClosed.to_string(),
            "Mirror writer is not running"
        );
    }
}
