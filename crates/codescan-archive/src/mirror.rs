//! # Mirror File
//!
//! The auto-save JSON copy of the scan history at
//! `<data_dir>/data/auto_save_file.json`.
//!
//! Every operation runs its file I/O on tokio's blocking pool. Writes go to
//! a sibling temporary file that is then renamed over the target, so a
//! crash mid-write leaves either the old or the new document.
//!
//! `MirrorFile` itself does not serialize callers. Concurrent mutation goes
//! through [`MirrorWriter`](crate::writer::MirrorWriter).

use chrono::Local;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use codescan_core::time::now_millis;
use codescan_core::NewScanResult;

use crate::document;
use crate::error::ArchiveResult;

/// Folder under the data directory holding the mirror.
pub const MIRROR_DIR: &str = "data";

/// Mirror document file name.
pub const MIRROR_FILE_NAME: &str = "auto_save_file.json";

#[derive(Debug, Clone)]
pub struct MirrorFile {
    path: PathBuf,
}

impl MirrorFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        MirrorFile { path: path.into() }
    }

    /// The standard location under an app data directory.
    pub fn in_data_dir(data_dir: impl AsRef<Path>) -> Self {
        MirrorFile::new(data_dir.as_ref().join(MIRROR_DIR).join(MIRROR_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every record. Missing or corrupt files read as empty.
    pub async fn read_all(&self) -> ArchiveResult<Vec<NewScanResult>> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || read_document(&path)).await?
    }

    /// Replaces the document with exactly `records`, in order.
    pub async fn write_all(&self, records: Vec<NewScanResult>) -> ArchiveResult<()> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            write_document(&path, &records)?;
            debug!(path = %path.display(), count = records.len(), "Mirror rewritten");
            Ok(())
        })
        .await?
    }

    /// Appends one record, rewriting the whole document.
    pub async fn append(&self, record: NewScanResult) -> ArchiveResult<()> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            let mut records = read_document(&path)?;
            records.push(record);
            write_document(&path, &records)?;
            debug!(path = %path.display(), count = records.len(), "Appended to mirror");
            Ok(())
        })
        .await?
    }

    /// Removes the document. Returns whether a file was removed; absence is
    /// not an error.
    pub async fn delete(&self) -> ArchiveResult<bool> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || match fs::remove_file(&path) {
            Ok(()) => {
                debug!(path = %path.display(), "Mirror deleted");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        })
        .await?
    }
}

// =============================================================================
// Blocking helpers (shared with export/import)
// =============================================================================

/// Reads a mirror-format document from disk.
///
/// Missing files and unparseable content yield an empty list. Other I/O
/// failures (permissions) are errors.
pub(crate) fn read_document(path: &Path) -> ArchiveResult<Vec<NewScanResult>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    match String::from_utf8(bytes) {
        Ok(text) => Ok(document::decode(&text, &Local, now_millis())),
        Err(_) => {
            warn!(path = %path.display(), "Document is not UTF-8, treating as empty");
            Ok(Vec::new())
        }
    }
}

/// Writes a mirror-format document via temp file + rename.
pub(crate) fn write_document(path: &Path, records: &[NewScanResult]) -> ArchiveResult<()> {
    let text = document::encode(records, &Local)?;
    write_atomically(path, text.as_bytes())
}

/// Writes `bytes` to a uniquely named temp file beside `path`, then renames
/// it over `path`. Concurrent writers never share a temp file.
pub(crate) fn write_atomically(path: &Path, bytes: &[u8]) -> ArchiveResult<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut tmp = tempfile::Builder::new()
        .prefix(&format!(".{name}."))
        .suffix(".tmp")
        .tempfile_in(parent)?;
    tmp.write_all(bytes)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
