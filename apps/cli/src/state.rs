//! # Application State
//!
//! Everything a command needs, built once from [`AppConfig`].
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  AppState                                                              │
//! │  ├── config      AppConfig (resolved paths, mirror flag)               │
//! │  ├── db          SharedDatabase: opened (and migrated) on first use    │
//! │  ├── mirror      MirrorHandle → MirrorWriter task                      │
//! │  ├── exports     ExportDir    (<data_dir>/export)                      │
//! │  └── documents   DocumentStore, mutations queued on the mirror writer  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The database is not touched until a command asks for it, so commands
//! that only work on files (e.g. `delete-mirror`) never open or migrate it.

use tokio::task::JoinHandle;
use tracing::{info, warn};

use codescan_archive::{DocumentStore, ExportDir, MirrorFile, MirrorHandle, MirrorWriter};
use codescan_db::{Database, DbConfig, SharedDatabase};

use crate::config::AppConfig;
use crate::error::ApiResult;

pub struct AppState {
    config: AppConfig,
    db: SharedDatabase,
    mirror: MirrorHandle,
    mirror_task: JoinHandle<()>,
    mirror_path: std::path::PathBuf,
    exports: ExportDir,
    documents: DocumentStore,
}

impl AppState {
    /// Builds the state and spawns the mirror writer. Must be called inside
    /// a tokio runtime.
    pub fn new(config: AppConfig) -> Self {
        let data_dir = config.data_dir();
        let db_config = DbConfig::new(config.database_path())
            .max_connections(config.storage.max_connections);

        let mirror_file = MirrorFile::in_data_dir(&data_dir);
        let mirror_path = mirror_file.path().to_path_buf();
        let (mirror, mirror_task) = MirrorWriter::spawn(mirror_file);
        let documents = DocumentStore::new(&data_dir, config.storage.public_data_dir.clone())
            .with_mirror(mirror.clone());

        info!(
            data_dir = %data_dir.display(),
            mirror_enabled = config.mirror.enabled,
            "Application state initialized"
        );

        AppState {
            db: SharedDatabase::new(db_config),
            mirror,
            mirror_task,
            mirror_path,
            exports: ExportDir::in_data_dir(&data_dir),
            documents,
            config,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// The database, opened on first call.
    pub async fn db(&self) -> ApiResult<&Database> {
        Ok(self.db.get().await?)
    }

    /// Whether the database has been opened yet.
    pub fn db_is_open(&self) -> bool {
        self.db.is_open()
    }

    pub fn mirror(&self) -> &MirrorHandle {
        &self.mirror
    }

    pub fn mirror_path(&self) -> &std::path::Path {
        &self.mirror_path
    }

    pub fn exports(&self) -> &ExportDir {
        &self.exports
    }

    pub fn documents(&self) -> &DocumentStore {
        &self.documents
    }

    /// State rooted at a scratch directory with default settings.
    #[cfg(test)]
    pub(crate) fn for_tests(data_dir: &std::path::Path) -> Self {
        let mut config = AppConfig::default();
        config.storage.data_dir = Some(data_dir.to_path_buf());
        AppState::new(config)
    }

    /// Drains the mirror queue and closes the database.
    pub async fn shutdown(self) {
        if let Err(e) = self.mirror.shutdown().await {
            warn!(error = %e, "Mirror writer already stopped");
        }
        if let Err(e) = self.mirror_task.await {
            warn!(error = %e, "Mirror writer task failed");
        }
        self.db.close().await;
        info!("Application state shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_database_opens_lazily() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::for_tests(dir.path());

        assert!(!state.db_is_open());
        assert!(!dir.path().join("scan_database").exists());

        let db = state.db().await.unwrap();
        assert_eq!(db.schema_version().await.unwrap(), codescan_db::CURRENT_VERSION);
        assert!(state.db_is_open());

        state.shutdown().await;
    }

    #[tokio::test]
    async fn test_paths_follow_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::for_tests(dir.path());

        assert_eq!(
            state.mirror_path(),
            dir.path().join("data").join("auto_save_file.json")
        );
        assert_eq!(state.exports().path(), dir.path().join("export"));

        state.shutdown().await;
    }
}
