//! # Domain Types
//!
//! Core domain types used throughout CodeScan.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  NewScanResult  │   │   ScanResult    │   │    CodeType     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  content        │──►│  id (assigned)  │   │  QR_CODE        │       │
//! │  │  remark?        │   │  content        │   │  EAN_13         │       │
//! │  │  code_type      │   │  remark?        │   │  CODE_128 ...   │       │
//! │  │  timestamp (ms) │   │  code_type      │   │  UNKNOWN        │       │
//! │  └─────────────────┘   │  timestamp (ms) │   └─────────────────┘       │
//! │     decoder/import     └─────────────────┘                              │
//! │                           stored row                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::time::now_millis;

// =============================================================================
// Code Type
// =============================================================================

/// Barcode symbology tag stored with every record.
///
/// The textual tags are part of the on-disk format (database column and
/// JSON mirror), so they never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CodeType {
    #[serde(rename = "QR_CODE")]
    QrCode,
    #[serde(rename = "EAN_13")]
    Ean13,
    #[serde(rename = "CODE_128")]
    Code128,
    #[serde(rename = "CODE_39")]
    Code39,
    #[serde(rename = "CODE_93")]
    Code93,
    #[serde(rename = "CODABAR")]
    Codabar,
    #[serde(rename = "EAN_8")]
    Ean8,
    #[serde(rename = "ITF")]
    Itf,
    #[serde(rename = "UPC_A")]
    UpcA,
    #[serde(rename = "UPC_E")]
    UpcE,
    #[serde(rename = "PDF417")]
    Pdf417,
    #[serde(rename = "AZTEC")]
    Aztec,
    #[default]
    #[serde(rename = "UNKNOWN")]
    Unknown,
}

impl CodeType {
    /// Every member of the vocabulary.
    pub const ALL: [CodeType; 13] = [
        CodeType::QrCode,
        CodeType::Ean13,
        CodeType::Code128,
        CodeType::Code39,
        CodeType::Code93,
        CodeType::Codabar,
        CodeType::Ean8,
        CodeType::Itf,
        CodeType::UpcA,
        CodeType::UpcE,
        CodeType::Pdf417,
        CodeType::Aztec,
        CodeType::Unknown,
    ];

    /// Returns the on-disk tag.
    pub const fn as_str(&self) -> &'static str {
        match self {
            CodeType::QrCode => "QR_CODE",
            CodeType::Ean13 => "EAN_13",
            CodeType::Code128 => "CODE_128",
            CodeType::Code39 => "CODE_39",
            CodeType::Code93 => "CODE_93",
            CodeType::Codabar => "CODABAR",
            CodeType::Ean8 => "EAN_8",
            CodeType::Itf => "ITF",
            CodeType::UpcA => "UPC_A",
            CodeType::UpcE => "UPC_E",
            CodeType::Pdf417 => "PDF417",
            CodeType::Aztec => "AZTEC",
            CodeType::Unknown => "UNKNOWN",
        }
    }

    /// Lenient conversion used when reading stored data.
    ///
    /// Anything outside the vocabulary (including the empty string and
    /// tags written by older app versions) resolves to `Unknown`, so a
    /// record never carries an empty or foreign tag.
    pub fn from_tag(tag: &str) -> Self {
        tag.parse().unwrap_or(CodeType::Unknown)
    }
}

impl fmt::Display for CodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CodeType {
    type Err = CoreError;

    /// Strict parse: accepts the exact tags, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        CodeType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| CoreError::UnknownCodeType(s.to_string()))
    }
}

// =============================================================================
// New Scan Result
// =============================================================================

/// A record that has not been stored yet.
///
/// Produced by the decoder hand-off, by JSON import and by the mirror
/// reader; consumed by `ScanResultRepository::insert`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewScanResult {
    /// Decoded payload.
    pub content: String,

    /// Optional annotation. `None` means "no remark".
    pub remark: Option<String>,

    /// Symbology tag.
    pub code_type: CodeType,

    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl NewScanResult {
    /// Creates a record stamped with the current time and an `Unknown` type.
    pub fn new(content: impl Into<String>) -> Self {
        NewScanResult {
            content: content.into(),
            remark: None,
            code_type: CodeType::Unknown,
            timestamp: now_millis(),
        }
    }

    /// Sets the remark. Empty or whitespace-only text means no remark.
    pub fn with_remark(mut self, remark: Option<impl Into<String>>) -> Self {
        self.remark = normalize_remark(remark.map(Into::into));
        self
    }

    /// Sets the code type.
    pub fn with_code_type(mut self, code_type: CodeType) -> Self {
        self.code_type = code_type;
        self
    }

    /// Sets the timestamp (milliseconds since epoch).
    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// The remark with empty text treated as absent.
    pub fn remark_text(&self) -> Option<&str> {
        self.remark.as_deref().filter(|r| !r.trim().is_empty())
    }

    /// Attaches the identity assigned by the store.
    pub fn into_stored(self, id: i64) -> ScanResult {
        ScanResult {
            id,
            content: self.content,
            remark: normalize_remark(self.remark),
            code_type: self.code_type,
            timestamp: self.timestamp,
        }
    }
}

// =============================================================================
// Scan Result
// =============================================================================

/// One stored scan or import event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    /// Store-assigned identifier; unique, increasing, never reused.
    pub id: i64,

    /// Decoded payload.
    pub content: String,

    /// Optional annotation.
    pub remark: Option<String>,

    /// Symbology tag.
    pub code_type: CodeType,

    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl ScanResult {
    /// Returns the record without its identity, e.g. for writing it to a
    /// JSON document.
    pub fn to_new(&self) -> NewScanResult {
        NewScanResult {
            content: self.content.clone(),
            remark: self.remark.clone(),
            code_type: self.code_type,
            timestamp: self.timestamp,
        }
    }
}

/// Maps empty remarks to `None`.
pub fn normalize_remark(remark: Option<String>) -> Option<String> {
    remark.filter(|r| !r.trim().is_empty())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_type_tags_round_trip() {
        for t in CodeType::ALL {
            assert_eq!(t.as_str().parse::<CodeType>().unwrap(), t);
            assert_eq!(CodeType::from_tag(&t.to_string()), t);
        }
    }

    #[test]
    fn test_code_type_parse_is_case_insensitive() {
        assert_eq!("qr_code".parse::<CodeType>().unwrap(), CodeType::QrCode);
        assert_eq!(" ean_13 ".parse::<CodeType>().unwrap(), CodeType::Ean13);
        assert!("LINEAR_CODE".parse::<CodeType>().is_err());
    }

    #[test]
    fn test_from_tag_never_yields_foreign_tags() {
        assert_eq!(CodeType::from_tag(""), CodeType::Unknown);
        assert_eq!(CodeType::from_tag("LINEAR_CODE"), CodeType::Unknown);
        assert_eq!(CodeType::from_tag("PDF417"), CodeType::Pdf417);
    }

    #[test]
    fn test_code_type_serde_uses_tags() {
        let json = serde_json::to_string(&CodeType::Ean13).unwrap();
        assert_eq!(json, "\"EAN_13\"");
        let back: CodeType = serde_json::from_str("\"UPC_A\"").unwrap();
        assert_eq!(back, CodeType::UpcA);
    }

    #[test]
    fn test_default_code_type_is_unknown() {
        assert_eq!(CodeType::default(), CodeType::Unknown);
        assert_eq!(NewScanResult::new("x").code_type, CodeType::Unknown);
    }

    #[test]
    fn test_empty_remark_is_no_remark() {
        let r = NewScanResult::new("abc").with_remark(Some(""));
        assert_eq!(r.remark, None);

        let r = NewScanResult::new("abc").with_remark(Some("shelf 3"));
        assert_eq!(r.remark_text(), Some("shelf 3"));

        let stored = NewScanResult {
            remark: Some("  ".to_string()),
            ..NewScanResult::new("abc")
        }
        .into_stored(7);
        assert_eq!(stored.id, 7);
        assert_eq!(stored.remark, None);
    }

    #[test]
    fn test_to_new_drops_identity() {
        let stored = NewScanResult::new("abc")
            .with_code_type(CodeType::QrCode)
            .with_timestamp(42)
            .into_stored(3);
        let fresh = stored.to_new();
        assert_eq!(fresh.content, "abc");
        assert_eq!(fresh.code_type, CodeType::QrCode);
        assert_eq!(fresh.timestamp, 42);
    }
}
