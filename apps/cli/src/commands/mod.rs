//! # Commands
//!
//! Entry points for the scanner UI and the CLI. Each takes the shared
//! [`AppState`](crate::state::AppState) and returns
//! `Result<T, ApiError>`; `T` is a serializable DTO.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs        ◄─── You are here (exports)
//! ├── scan.rs       ◄─── record_scan, validate
//! ├── history.rs    ◄─── history, export/import, mirror restore/rebuild/delete
//! ├── documents.rs  ◄─── document browser: roots, list, read, delete
//! └── status.rs     ◄─── paths, schema version, counts
//! ```

pub mod documents;
pub mod history;
pub mod scan;
pub mod status;

pub use documents::{delete_document, list_documents, query_roots, read_document};
pub use history::{
    delete_mirror, export_history, history, import_file, rebuild_mirror, restore_from_mirror,
    ImportSummary,
};
pub use scan::{record_scan, validate, ScanDto};
pub use status::{status, StatusDto};
