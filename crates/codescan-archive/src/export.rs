//! # Export / Import Files
//!
//! Snapshots of the scan history in the mirror document format, named
//! `scan_file_<YYYY-MM-DD_HH.mm.ss>.json` and stored under
//! `<data_dir>/export`.

use chrono::{DateTime, Local, TimeZone};
use std::fmt::Display;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::info;

use codescan_core::time::format_export_stamp;
use codescan_core::NewScanResult;

use crate::error::{ArchiveError, ArchiveResult};
use crate::mirror::{read_document, write_document};

/// Folder under the data directory holding export files.
pub const EXPORT_DIR: &str = "export";

const EXPORT_PREFIX: &str = "scan_file_";
const EXPORT_EXTENSION: &str = "json";

/// Export file name for a given moment.
///
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use codescan_archive::export::export_file_name;
///
/// let at = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
/// assert_eq!(export_file_name(&at), "scan_file_2024-03-09_07.05.01.json");
/// ```
pub fn export_file_name<Tz>(at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!(
        "{EXPORT_PREFIX}{}.{EXPORT_EXTENSION}",
        format_export_stamp(at)
    )
}

/// The export folder.
#[derive(Debug, Clone)]
pub struct ExportDir {
    dir: PathBuf,
}

impl ExportDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        ExportDir { dir: dir.into() }
    }

    /// The standard location under an app data directory.
    pub fn in_data_dir(data_dir: impl AsRef<Path>) -> Self {
        ExportDir::new(data_dir.as_ref().join(EXPORT_DIR))
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Writes `records` to a new export file named for the current local
    /// time and returns its path.
    pub async fn export(&self, records: Vec<NewScanResult>) -> ArchiveResult<PathBuf> {
        self.export_at(records, Local::now()).await
    }

    /// Like [`export`](Self::export) with an explicit file name moment. A
    /// file with the same name is overwritten.
    pub async fn export_at(
        &self,
        records: Vec<NewScanResult>,
        at: DateTime<Local>,
    ) -> ArchiveResult<PathBuf> {
        let path = self.dir.join(export_file_name(&at));
        let target = path.clone();
        let count = records.len();

        tokio::task::spawn_blocking(move || write_document(&target, &records)).await??;

        info!(path = %path.display(), count, "History exported");
        Ok(path)
    }
}

/// Reads an export (or any mirror-format) file.
///
/// Unparseable content reads as empty; a path that does not exist is
/// `NotFound`.
pub async fn import(path: impl AsRef<Path>) -> ArchiveResult<Vec<NewScanResult>> {
    let path = path.as_ref().to_path_buf();

    tokio::task::spawn_blocking(move || {
        match std::fs::metadata(&path) {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Err(ArchiveError::InvalidName(format!("{} is not a file", path.display()))),
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(ArchiveError::not_found(&path)),
            Err(e) => return Err(e.into()),
        }

        let records = read_document(&path)?;
        info!(path = %path.display(), count = records.len(), "Import file read");
        Ok(records)
    })
    .await?
}

// =============================================================================
// Unit Tests
// =============================================================================
