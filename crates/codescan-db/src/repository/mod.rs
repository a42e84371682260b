//! # Repository Module
//!
//! Database repository implementations for CodeScan.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CLI command                                                           │
//! │       │                                                                 │
//! │       │  db.scan_results().get_all()                                   │
//! │       ▼                                                                 │
//! │  ScanResultRepository                                                  │
//! │  ├── insert(&self, scan)          → id                                 │
//! │  ├── insert_many(&self, scans)    → ids (one transaction)              │
//! │  ├── get_all(&self)               → newest first                       │
//! │  └── count(&self)                                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  scan_results table                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod scan_result;
