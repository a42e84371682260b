//! # Validation Module
//!
//! Input rules applied before anything is stored or encoded.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Layer 1: Decoder / input form                                         │
//! │  └── produces (content, code type, remark)                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── content must be non-empty                                         │
//! │  ├── timestamp must be non-negative                                    │
//! │  └── EAN-13 input: 12 or 13 digits                                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: SQLite (NOT NULL constraints)                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::classify::is_all_digits;
use crate::error::ValidationError;
use crate::types::{CodeType, NewScanResult};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validates scan content.
///
/// ## Rules
/// - Must not be empty or whitespace-only
///
/// ## Example
/// ```rust
/// use codescan_core::validation::validate_content;
///
/// assert!(validate_content("4006381333931").is_ok());
/// assert!(validate_content("").is_err());
/// ```
pub fn validate_content(content: &str) -> ValidationResult<()> {
    if content.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "content".to_string(),
        });
    }

    Ok(())
}

/// Validates a timestamp in epoch milliseconds.
pub fn validate_timestamp(timestamp: i64) -> ValidationResult<()> {
    if timestamp < 0 {
        return Err(ValidationError::MustBeNonNegative {
            field: "timestamp".to_string(),
        });
    }

    Ok(())
}

/// Validates a record before insert.
pub fn validate_new_scan(scan: &NewScanResult) -> ValidationResult<()> {
    validate_content(&scan.content)?;
    validate_timestamp(scan.timestamp)
}

/// Validates text that is about to be encoded as an EAN-13 barcode.
///
/// ## Rules
/// - 12 digits (check digit computed by the encoder) or 13 digits
/// - ASCII digits only
///
/// The length check comes first, so "12ab" reports a length problem.
pub fn validate_ean13(text: &str) -> ValidationResult<()> {
    let len = text.chars().count();
    if len != 12 && len != 13 {
        return Err(ValidationError::InvalidLength {
            field: "EAN-13".to_string(),
            expected: "12 or 13".to_string(),
            actual: len,
        });
    }

    if !is_all_digits(text) {
        return Err(ValidationError::InvalidFormat {
            field: "EAN-13".to_string(),
            reason: "must contain only digits".to_string(),
        });
    }

    Ok(())
}

/// Validates text for a target symbology.
///
/// EAN-13 has its own rule; every other type only needs content.
pub fn validate_for_code_type(text: &str, code_type: CodeType) -> ValidationResult<()> {
    match code_type {
        CodeType::Ean13 => validate_ean13(text),
        _ => validate_content(text),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_content() {
        assert!(validate_content("hello").is_ok());
        assert!(validate_content("").is_err());
        assert!(validate_content("   ").is_err());
    }

    #[test]
    fn test_validate_timestamp() {
        assert!(validate_timestamp(0).is_ok());
        assert!(validate_timestamp(1_700_000_000_000).is_ok());
        assert!(validate_timestamp(-1).is_err());
    }

    #[test]
    fn test_validate_new_scan() {
        assert!(validate_new_scan(&NewScanResult::new("x")).is_ok());
        assert!(validate_new_scan(&NewScanResult::new("")).is_err());
        assert!(validate_new_scan(&NewScanResult::new("x").with_timestamp(-5)).is_err());
    }

    #[test]
    fn test_validate_ean13() {
        assert!(validate_ean13("400638133393").is_ok());
        assert!(validate_ean13("4006381333931").is_ok());

        assert!(matches!(
            validate_ean13("12345"),
            Err(ValidationError::InvalidLength { actual: 5, .. })
        ));
        assert!(matches!(
            validate_ean13("40063813339a"),
            Err(ValidationError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_validate_for_code_type() {
        assert!(validate_for_code_type("hello world", CodeType::QrCode).is_ok());
        assert!(validate_for_code_type("hello world", CodeType::Ean13).is_err());
        assert!(validate_for_code_type("", CodeType::Code128).is_err());
    }
}
