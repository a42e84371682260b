//! # Error Types
//!
//! Domain-specific error types for codescan-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  codescan-core errors (this file)                                      │
//! │  ├── CoreError        - General domain errors                          │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  codescan-db errors       → DbError                                    │
//! │  codescan-archive errors  → ArchiveError                               │
//! │  CLI errors               → ApiError (code + message)                  │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError / DbError → ApiError → user         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core domain errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A code-type tag outside the fixed vocabulary was supplied where a
    /// strict parse was requested.
    #[error("Unknown code type: {0}")]
    UnknownCodeType(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field length is not one of the accepted lengths.
    #[error("{field} must be {expected} characters long, got {actual}")]
    InvalidLength {
        field: String,
        expected: String,
        actual: usize,
    },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustBeNonNegative { field: String },

    /// Invalid format (e.g. non-digit characters in an EAN-13).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}
