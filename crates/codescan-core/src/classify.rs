//! # Code-Type Classification
//!
//! Best-effort guesses of a record's symbology from the shape of its
//! content. Used in two places:
//!
//! - the v2 → v3 schema migration, which backfills `codeType` for rows
//!   stored before the column existed;
//! - scans handed over without a symbology.
//!
//! ## Backfill Rules (checked in order)
//! ```text
//! ┌──────────────────────────────────────────────┬──────────────┐
//! │ content                                      │ code type    │
//! ├──────────────────────────────────────────────┼──────────────┤
//! │ exactly 12 or 13 chars, all digits           │ EAN_13       │
//! │ 20 chars or more, not all digits             │ QR_CODE      │
//! │ 8..=20 chars, all digits                     │ CODE_128     │
//! │ anything else                                │ UNKNOWN      │
//! └──────────────────────────────────────────────┴──────────────┘
//! ```
//!
//! The symbology that produced a stored string cannot be recovered, so
//! this is lossy: a 13-character URL is `UNKNOWN`, a 12-digit CODE_128
//! payload becomes `EAN_13`.

use crate::types::CodeType;

/// Infers a code type from content shape (backfill rules above).
///
/// ## Example
/// ```rust
/// use codescan_core::classify::infer_code_type;
/// use codescan_core::CodeType;
///
/// assert_eq!(infer_code_type("12345678"), CodeType::Code128);
/// assert_eq!(infer_code_type("ab"), CodeType::Unknown);
/// ```
pub fn infer_code_type(content: &str) -> CodeType {
    let len = content.chars().count();
    let digits = is_all_digits(content);

    if (len == 12 || len == 13) && digits {
        CodeType::Ean13
    } else if len >= 20 && !digits {
        CodeType::QrCode
    } else if (8..=20).contains(&len) && digits {
        CodeType::Code128
    } else {
        CodeType::Unknown
    }
}

/// Guess for a live scan that arrived without a symbology: web links come
/// from QR codes, everything else stays unknown.
pub fn infer_scan_code_type(content: &str) -> CodeType {
    if is_web_link(content) {
        CodeType::QrCode
    } else {
        CodeType::Unknown
    }
}

/// Returns true if the content looks like a web address.
pub fn is_web_link(content: &str) -> bool {
    let lower = content.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("www.")
}

/// Non-empty and made only of ASCII digits.
pub fn is_all_digits(content: &str) -> bool {
    !content.is_empty() && content.bytes().all(|b| b.is_ascii_digit())
}
