//! # Document Browser
//!
//! Exposes the app's files as a small tree of virtual folders so an
//! external file browser can list, open and manage them.
//!
//! ```text
//! root
//! ├── history        <data_dir>/history
//! ├── export         <data_dir>/export
//! ├── data           <data_dir>/data        (mirror lives here)
//! └── public_data    configured public directory (optional)
//! ```
//!
//! Folder ids are fixed. A file's id is its bare name; lookups search the
//! folders in the order shown above and the first hit wins. An empty id or
//! the literal `"null"` means `root`.
//!
//! With a mirror writer attached ([`DocumentStore::with_mirror`]), every
//! write, create and delete runs on the writer's queue, so editing or
//! removing `data/auto_save_file.json` never races a mirror append.

use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tracing::{debug, info};

use crate::error::{ArchiveError, ArchiveResult};
use crate::export::EXPORT_DIR;
use crate::mirror::{write_atomically, MIRROR_DIR};
use crate::writer::MirrorHandle;

/// Folder under the data directory for history files.
pub const HISTORY_DIR: &str = "history";

/// MIME type reported for folders.
pub const MIME_TYPE_DIR: &str = "inode/directory";

/// MIME type for extensions we don't recognize.
pub const MIME_TYPE_ANY: &str = "*/*";

// =============================================================================
// Folders
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Folder {
    Root,
    History,
    Export,
    Data,
    PublicData,
}

impl Folder {
    /// Child folders in lookup order.
    pub const SEARCH_ORDER: [Folder; 4] = [
        Folder::History,
        Folder::Export,
        Folder::Data,
        Folder::PublicData,
    ];

    pub const fn id(&self) -> &'static str {
        match self {
            Folder::Root => "root",
            Folder::History => "history",
            Folder::Export => "export",
            Folder::Data => "data",
            Folder::PublicData => "public_data",
        }
    }

    pub const fn display_name(&self) -> &'static str {
        match self {
            Folder::Root => "CodeScan",
            Folder::History => "History",
            Folder::Export => "Export",
            Folder::Data => "Data",
            Folder::PublicData => "Public Data",
        }
    }

    /// Maps a document id to a folder, if it names one.
    pub fn from_id(id: &str) -> Option<Folder> {
        match id {
            "" | "null" | "root" => Some(Folder::Root),
            "history" => Some(Folder::History),
            "export" => Some(Folder::Export),
            "data" => Some(Folder::Data),
            "public_data" => Some(Folder::PublicData),
            _ => None,
        }
    }
}

// =============================================================================
// Rows
// =============================================================================

/// The single browsable root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RootInfo {
    pub root_id: String,
    pub title: String,
    pub summary: String,
    pub mime_types: String,
    pub supports_create: bool,
    pub local_only: bool,
}

/// One folder or file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentInfo {
    pub id: String,
    pub display_name: String,
    pub mime_type: String,
    pub is_dir: bool,
    /// File size in bytes; `None` for folders.
    pub size: Option<u64>,
    /// Milliseconds since epoch.
    pub last_modified: Option<i64>,
    pub supports_create: bool,
}

impl DocumentInfo {
    fn folder(folder: Folder) -> Self {
        DocumentInfo {
            id: folder.id().to_string(),
            display_name: folder.display_name().to_string(),
            mime_type: MIME_TYPE_DIR.to_string(),
            is_dir: true,
            size: None,
            last_modified: None,
            supports_create: true,
        }
    }

    fn from_path(path: &Path) -> ArchiveResult<Self> {
        let meta = fs::metadata(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let last_modified = meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .and_then(|d| i64::try_from(d.as_millis()).ok());

        Ok(DocumentInfo {
            id: name.clone(),
            mime_type: if meta.is_dir() {
                MIME_TYPE_DIR.to_string()
            } else {
                mime_type_for(&name).to_string()
            },
            display_name: name,
            is_dir: meta.is_dir(),
            size: (!meta.is_dir()).then(|| meta.len()),
            last_modified,
            supports_create: false,
        })
    }
}

/// MIME type from a file name's extension.
pub fn mime_type_for(name: &str) -> &'static str {
    let extension = match name.rsplit_once('.') {
        Some((_, ext)) => ext.to_ascii_lowercase(),
        None => return MIME_TYPE_ANY,
    };

    match extension.as_str() {
        "json" => "application/json",
        "txt" | "log" => "text/plain",
        "csv" => "text/csv",
        "html" | "htm" => "text/html",
        "xml" => "application/xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "db" | "sqlite" => "application/vnd.sqlite3",
        _ => MIME_TYPE_ANY,
    }
}

/// Rejects ids and names that could leave their folder.
fn check_name(name: &str) -> ArchiveResult<()> {
    if name.is_empty()
        || name == "."
        || name.contains("..")
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0')
    {
        return Err(ArchiveError::InvalidName(name.to_string()));
    }
    Ok(())
}

// =============================================================================
// Store
// =============================================================================

/// Virtual folder tree over the app's directories.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    history: PathBuf,
    export: PathBuf,
    data: PathBuf,
    public_data: Option<PathBuf>,
    mirror: Option<MirrorHandle>,
}

impl DocumentStore {
    pub fn new(data_dir: impl AsRef<Path>, public_data: Option<PathBuf>) -> Self {
        let data_dir = data_dir.as_ref();
        DocumentStore {
            history: data_dir.join(HISTORY_DIR),
            export: data_dir.join(EXPORT_DIR),
            data: data_dir.join(MIRROR_DIR),
            public_data,
            mirror: None,
        }
    }

    /// Serializes mutations with the mirror writer.
    pub fn with_mirror(mut self, mirror: MirrorHandle) -> Self {
        self.mirror = Some(mirror);
        self
    }

    async fn mutate<F>(&self, job: F) -> ArchiveResult<()>
    where
        F: FnOnce() -> ArchiveResult<()> + Send + 'static,
    {
        match &self.mirror {
            Some(mirror) => mirror.exclusive(job).await,
            None => tokio::task::spawn_blocking(job).await?,
        }
    }

    fn folder_dir(&self, folder: Folder) -> Option<&Path> {
        match folder {
            Folder::Root => None,
            Folder::History => Some(&self.history),
            Folder::Export => Some(&self.export),
            Folder::Data => Some(&self.data),
            Folder::PublicData => self.public_data.as_deref(),
        }
    }

    /// Folders that exist in this configuration, in lookup order.
    pub fn folders(&self) -> Vec<Folder> {
        Folder::SEARCH_ORDER
            .into_iter()
            .filter(|f| self.folder_dir(*f).is_some())
            .collect()
    }

    /// Finds the file a child id refers to.
    fn resolve(&self, id: &str) -> ArchiveResult<PathBuf> {
        check_name(id)?;
        self.folders()
            .into_iter()
            .filter_map(|f| self.folder_dir(f))
            .map(|dir| dir.join(id))
            .find(|path| path.exists())
            .ok_or_else(|| ArchiveError::NotFound(id.to_string()))
    }

    fn known_folder(&self, id: &str) -> ArchiveResult<Option<Folder>> {
        match Folder::from_id(id) {
            Some(folder) if folder != Folder::Root && self.folder_dir(folder).is_none() => {
                Err(ArchiveError::NotFound(id.to_string()))
            }
            other => Ok(other),
        }
    }

    pub fn query_roots(&self) -> Vec<RootInfo> {
        vec![RootInfo {
            root_id: Folder::Root.id().to_string(),
            title: Folder::Root.display_name().to_string(),
            summary: "Scan history, exports and data files".to_string(),
            mime_types: MIME_TYPE_ANY.to_string(),
            supports_create: true,
            local_only: true,
        }]
    }

    /// Describes one folder or file.
    pub async fn query_document(&self, id: &str) -> ArchiveResult<DocumentInfo> {
        if let Some(folder) = self.known_folder(id)? {
            return Ok(DocumentInfo::folder(folder));
        }

        let store = self.clone();
        let id = id.to_string();
        tokio::task::spawn_blocking(move || DocumentInfo::from_path(&store.resolve(&id)?)).await?
    }

    /// Lists a folder. A folder whose directory doesn't exist yet is empty.
    pub async fn list_children(&self, parent_id: &str) -> ArchiveResult<Vec<DocumentInfo>> {
        let folder = self
            .known_folder(parent_id)?
            .ok_or_else(|| ArchiveError::NotFound(parent_id.to_string()))?;

        if folder == Folder::Root {
            return Ok(self.folders().into_iter().map(DocumentInfo::folder).collect());
        }

        let dir = self
            .folder_dir(folder)
            .map(Path::to_path_buf)
            .ok_or_else(|| ArchiveError::NotFound(parent_id.to_string()))?;

        tokio::task::spawn_blocking(move || {
            let entries = match fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
                Err(e) => return Err(e.into()),
            };

            let mut children = Vec::new();
            for entry in entries {
                children.push(DocumentInfo::from_path(&entry?.path())?);
            }
            children.sort_by(|a, b| a.display_name.cmp(&b.display_name));
            Ok(children)
        })
        .await?
    }

    /// Reads a file's bytes.
    pub async fn read(&self, id: &str) -> ArchiveResult<Vec<u8>> {
        if self.known_folder(id)?.is_some() {
            return Err(ArchiveError::InvalidName(format!("{id} is a folder")));
        }

        let store = self.clone();
        let id = id.to_string();
        tokio::task::spawn_blocking(move || {
            let path = store.resolve(&id)?;
            if path.is_dir() {
                return Err(ArchiveError::InvalidName(format!("{id} is a folder")));
            }
            Ok(fs::read(path)?)
        })
        .await?
    }

    /// Replaces an existing file's bytes.
    pub async fn write(&self, id: &str, bytes: Vec<u8>) -> ArchiveResult<()> {
        if self.known_folder(id)?.is_some() {
            return Err(ArchiveError::InvalidName(format!("{id} is a folder")));
        }

        let store = self.clone();
        let id = id.to_string();
        self.mutate(move || {
            let path = store.resolve(&id)?;
            if path.is_dir() {
                return Err(ArchiveError::InvalidName(format!("{id} is a folder")));
            }
            write_atomically(&path, &bytes)?;
            debug!(path = %path.display(), len = bytes.len(), "Document written");
            Ok(())
        })
        .await
    }

    /// Creates an empty file in a folder and returns its id. An existing
    /// file of that name is left as is.
    pub async fn create(&self, parent_id: &str, display_name: &str) -> ArchiveResult<String> {
        check_name(display_name)?;
        let folder = self
            .known_folder(parent_id)?
            .ok_or_else(|| ArchiveError::NotFound(parent_id.to_string()))?;
        let dir = self
            .folder_dir(folder)
            .map(Path::to_path_buf)
            .ok_or_else(|| ArchiveError::InvalidName("files cannot be created in root".into()))?;

        let name = display_name.to_string();
        let file_name = name.clone();
        self.mutate(move || {
            fs::create_dir_all(&dir)?;
            let path = dir.join(&file_name);
            match fs::OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(_) => info!(path = %path.display(), "Document created"),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    debug!(path = %path.display(), "Document already exists")
                }
                Err(e) => return Err(e.into()),
            }
            Ok(())
        })
        .await?;
        Ok(name)
    }

    /// Deletes a file, or a folder's directory with everything in it.
    /// The root cannot be deleted.
    pub async fn delete(&self, id: &str) -> ArchiveResult<()> {
        let target = match self.known_folder(id)? {
            Some(Folder::Root) => {
                return Err(ArchiveError::InvalidName("root cannot be deleted".into()))
            }
            Some(folder) => self.folder_dir(folder).map(Path::to_path_buf),
            None => None,
        };

        let store = self.clone();
        let id = id.to_string();
        self.mutate(move || {
            let path = match target {
                Some(dir) => dir,
                None => store.resolve(&id)?,
            };

            let result = if path.is_dir() {
                fs::remove_dir_all(&path)
            } else {
                fs::remove_file(&path)
            };
            match result {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }

            info!(path = %path.display(), "Document deleted");
            Ok(())
        })
        .await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
