//! # codescan-archive: Files Outside the Database
//!
//! The JSON mirror of the scan history, export/import files and the
//! virtual folder tree used by file browsers.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  record_scan ─► codescan-db (source of truth)                          │
//! │       │                                                                 │
//! │       └──────► MirrorHandle ─► MirrorWriter ─► data/auto_save_file.json │
//! │                                                                         │
//! │  export_history ─► ExportDir ─► export/scan_file_<stamp>.json          │
//! │  import_file    ◄─ import()  ◄─ any mirror-format file                 │
//! │                                                                         │
//! │  docs list/cat/rm ─► DocumentStore ─► history/ export/ data/ public/   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`document`] - mirror document encode / lenient decode
//! - [`mirror`] - the mirror file (blocking I/O off the async runtime)
//! - [`writer`] - single-writer queue for the mirror
//! - [`export`] - export file naming, export and import
//! - [`documents`] - virtual folder browser
//! - [`error`] - archive error types

pub mod document;
pub mod documents;
pub mod error;
pub mod export;
pub mod mirror;
pub mod writer;

pub use documents::{DocumentInfo, DocumentStore, Folder, RootInfo};
pub use error::{ArchiveError, ArchiveResult};
pub use export::{export_file_name, import, ExportDir};
pub use mirror::MirrorFile;
pub use writer::{MirrorHandle, MirrorWriter};
