//! # History Commands
//!
//! Reading the history and moving it between the store and JSON files.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   export_history ─────► export/scan_file_<stamp>.json   (newest first) │
//! │                                                                         │
//! │   import_file ◄──────── any mirror-format file                         │
//! │        │                 insert all, then rebuild the mirror           │
//! │        ▼                                                                │
//! │   ┌──────────────┐  rebuild_mirror   ┌──────────────────────────────┐  │
//! │   │ scan_results │ ────────────────► │ data/auto_save_file.json     │  │
//! │   │   (SQLite)   │ ◄──────────────── │ (oldest first, appended to)  │  │
//! │   └──────────────┘ restore_from_mirror └─────────────────────────────┘  │
//! │                     (empty store only)                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use codescan_archive::import;
use codescan_core::{NewScanResult, ScanResult};

use crate::commands::scan::ScanDto;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Outcome of [`import_file`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub imported: usize,
    pub mirrored: bool,
}

/// Full history, newest first.
pub async fn history(state: &AppState) -> ApiResult<Vec<ScanDto>> {
    let records = state.db().await?.scan_results().get_all().await?;
    debug!(count = records.len(), "history command");
    Ok(records.into_iter().map(ScanDto::from).collect())
}

/// Writes the full history to a new export file and returns its path.
pub async fn export_history(state: &AppState) -> ApiResult<PathBuf> {
    let records = state.db().await?.scan_results().get_all().await?;
    let path = state.exports().export(detach(&records)).await?;
    Ok(path)
}

/// Inserts every record of a mirror-format file into the store.
///
/// All or nothing: one invalid record rejects the whole file. An
/// unreadable file imports nothing.
pub async fn import_file(state: &AppState, path: impl AsRef<Path>) -> ApiResult<ImportSummary> {
    let records = import(path.as_ref()).await?;
    if records.is_empty() {
        info!(path = %path.as_ref().display(), "Nothing to import");
        return Ok(ImportSummary {
            imported: 0,
            mirrored: false,
        });
    }

    let imported = state.db().await?.scan_results().insert_many(&records).await?;

    let mirrored = if state.config().mirror.enabled {
        match rebuild_mirror(state).await {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "Imported records not mirrored");
                false
            }
        }
    } else {
        false
    };

    info!(imported, mirrored, "Import complete");
    Ok(ImportSummary { imported, mirrored })
}

/// Reloads an empty store from the mirror file. Returns how many records
/// were inserted.
pub async fn restore_from_mirror(state: &AppState) -> ApiResult<usize> {
    let repo = state.db().await?.scan_results();
    let existing = repo.count().await?;
    if existing > 0 {
        return Err(ApiError::conflict(format!(
            "History already holds {existing} records; restore only fills an empty store"
        )));
    }

    let records = state.mirror().read_all().await?;
    let restored = repo.insert_many(&records).await?;

    info!(restored, "History restored from mirror");
    Ok(restored)
}

/// Rewrites the mirror from the store, oldest first so later appends stay
/// in chronological order. Returns how many records were written.
pub async fn rebuild_mirror(state: &AppState) -> ApiResult<usize> {
    let mut records = detach(&state.db().await?.scan_results().get_all().await?);
    records.reverse();
    let count = records.len();

    state.mirror().replace_all(records).await?;

    info!(count, "Mirror rebuilt");
    Ok(count)
}

/// Deletes the mirror file. `false` if there was none.
pub async fn delete_mirror(state: &AppState) -> ApiResult<bool> {
    let deleted = state.mirror().delete().await?;
    info!(deleted, "delete_mirror command");
    Ok(deleted)
}

fn detach(records: &[ScanResult]) -> Vec<NewScanResult> {
    records.iter().map(ScanResult::to_new).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::scan::record_scan;
    use crate::error::ErrorCode;
    use codescan_core::CodeType;

    async fn seed(state: &AppState, contents: &[&str]) {
        let records: Vec<NewScanResult> = contents
            .iter()
            .enumerate()
            .map(|(i, c)| {
                NewScanResult::new(*c)
                    .with_code_type(CodeType::Code128)
                    .with_timestamp(1_700_000_000_000 + i as i64 * 1_000)
            })
            .collect();
        state
            .db()
            .await
            .unwrap()
            .scan_results()
            .insert_many(&records)
            .await
            .unwrap();
    }

    fn contents(records: &[NewScanResult]) -> Vec<&str> {
        records.iter().map(|r| r.content.as_str()).collect()
    }

    #[tokio::test]
    async fn test_history_is_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::for_tests(dir.path());
        seed(&state, &["first", "second", "third"]).await;

        let items = history(&state).await.unwrap();
        let names: Vec<&str> = items.iter().map(|s| s.content.as_str()).collect();
        assert_eq!(names, vec!["third", "second", "first"]);

        state.shutdown().await;
    }

    #[tokio::test]
    async fn test_export_then_import_into_fresh_store() {
        let source_dir = tempfile::tempdir().unwrap();
        let source = AppState::for_tests(source_dir.path());
        seed(&source, &["a", "b"]).await;
        let path = export_history(&source).await.unwrap();
        source.shutdown().await;

        let target_dir = tempfile::tempdir().unwrap();
        let target = AppState::for_tests(target_dir.path());
        let summary = import_file(&target, &path).await.unwrap();

        assert_eq!(
            summary,
            ImportSummary {
                imported: 2,
                mirrored: true
            }
        );
        let items = history(&target).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].content, "b");
        assert_eq!(items[0].timestamp, 1_700_000_001_000);

        let mirrored = target.mirror().read_all().await.unwrap();
        assert_eq!(contents(&mirrored), vec!["a", "b"]);

        target.shutdown().await;
    }

    #[tokio::test]
    async fn test_import_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::for_tests(dir.path());

        let err = import_file(&state, dir.path().join("nope.json"))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        state.shutdown().await;
    }

    #[tokio::test]
    async fn test_rebuild_then_append_stays_chronological() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::for_tests(dir.path());
        seed(&state, &["old", "newer"]).await;

        assert_eq!(rebuild_mirror(&state).await.unwrap(), 2);
        record_scan(&state, "latest".into(), None, None).await.unwrap();

        let mirrored = state.mirror().read_all().await.unwrap();
        assert_eq!(contents(&mirrored), vec!["old", "newer", "latest"]);

        state.shutdown().await;
    }

    #[tokio::test]
    async fn test_restore_from_mirror() {
        let dir = tempfile::tempdir().unwrap();

        let first = AppState::for_tests(dir.path());
        record_scan(&first, "one".into(), None, None).await.unwrap();
        record_scan(&first, "two".into(), None, None).await.unwrap();
        first.shutdown().await;

        let mut config = crate::config::AppConfig::default();
        config.storage.data_dir = Some(dir.path().to_path_buf());
        config.storage.database_path = Some(dir.path().join("replacement_database"));
        let second = AppState::new(config);
        assert_eq!(restore_from_mirror(&second).await.unwrap(), 2);
        assert_eq!(history(&second).await.unwrap().len(), 2);

        let err = restore_from_mirror(&second).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Conflict);

        second.shutdown().await;
    }

    #[tokio::test]
    async fn test_delete_mirror() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::for_tests(dir.path());

        assert!(!delete_mirror(&state).await.unwrap());
        record_scan(&state, "x".into(), None, None).await.unwrap();
        assert!(delete_mirror(&state).await.unwrap());
        assert!(!state.mirror_path().exists());
        assert_eq!(history(&state).await.unwrap().len(), 1);

        state.shutdown().await;
    }
}
