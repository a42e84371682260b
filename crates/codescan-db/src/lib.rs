//! # codescan-db: Database Layer for CodeScan
//!
//! Scan history storage in a single SQLite file (`scan_database`) accessed
//! through sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        CodeScan Data Flow                               │
//! │                                                                         │
//! │  record_scan / history command                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   codescan-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repository   │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ (scan_result) │    │ user_version │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ insert        │    │ 1 → 2 remark │  │   │
//! │  │   │ SharedDatabase│    │ get_all       │    │ 2 → 3 type   │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  scan_database (SQLite, WAL)                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`pool`] - `Database`, `SharedDatabase`, `DbConfig`
//! - [`migrations`] - schema versions and upgrade steps
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use codescan_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("data/scan_database")).await?;
//! let history = db.scan_results().get_all().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use migrations::CURRENT_VERSION;
pub use pool::{Database, DbConfig, SharedDatabase};

pub use repository::scan_result::ScanResultRepository;
