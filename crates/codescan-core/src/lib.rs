//! # codescan-core: Pure Domain Logic for CodeScan
//!
//! Record model and rules for scan history. Everything in here is a pure
//! function or a plain data type; the database and file layers build on it.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        CodeScan Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │          Scanner UI / decoder (external collaborator)           │   │
//! │  │        hands over (content, code type, optional remark)         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ codescan-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌────────────┐  ┌────────────┐  ┌──────────┐  │   │
//! │  │   │   types   │  │  classify  │  │ validation │  │   time   │  │   │
//! │  │   │ScanResult │  │ backfill   │  │  content   │  │ mirror & │  │   │
//! │  │   │ CodeType  │  │ heuristic  │  │  EAN-13    │  │ export   │  │   │
//! │  │   └───────────┘  └────────────┘  └────────────┘  └──────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO FILES • PURE FUNCTIONS              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                │                                   │                    │
//! │  ┌─────────────▼──────────────┐    ┌───────────────▼────────────────┐  │
//! │  │  codescan-db (SQLite)      │    │  codescan-archive (JSON files) │  │
//! │  └────────────────────────────┘    └────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - `ScanResult`, `NewScanResult`, `CodeType`
//! - [`classify`] - code-type inference from content shape
//! - [`validation`] - input rules
//! - [`time`] - epoch-millisecond helpers and the on-disk date-time formats
//! - [`error`] - domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use codescan_core::classify::infer_code_type;
//! use codescan_core::CodeType;
//!
//! assert_eq!(infer_code_type("123456789012"), CodeType::Ean13);
//! assert_eq!(infer_code_type("http://example.com/xyz"), CodeType::QrCode);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod classify;
pub mod error;
pub mod time;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, ValidationError};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// File name of the embedded database.
pub const DATABASE_NAME: &str = "scan_database";

/// Table holding one row per scan/import event.
pub const SCAN_TABLE: &str = "scan_results";
