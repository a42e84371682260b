//! Document browser commands over [`DocumentStore`](codescan_archive::DocumentStore).

use tracing::debug;

use codescan_archive::{DocumentInfo, RootInfo};

use crate::error::ApiResult;
use crate::state::AppState;

pub fn query_roots(state: &AppState) -> Vec<RootInfo> {
    state.documents().query_roots()
}

/// Lists a folder (`root`, `history`, `export`, `data`, `public_data`).
pub async fn list_documents(state: &AppState, parent_id: &str) -> ApiResult<Vec<DocumentInfo>> {
    debug!(parent_id, "list_documents command");
    Ok(state.documents().list_children(parent_id).await?)
}

pub async fn read_document(state: &AppState, id: &str) -> ApiResult<Vec<u8>> {
    debug!(id, "read_document command");
    Ok(state.documents().read(id).await?)
}

pub async fn delete_document(state: &AppState, id: &str) -> ApiResult<()> {
    debug!(id, "delete_document command");
    Ok(state.documents().delete(id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{export_history, record_scan};
    use crate::error::ErrorCode;

    #[tokio::test]
    async fn test_browse_mirror_and_exports() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::for_tests(dir.path());

        record_scan(&state, "hello".into(), None, None).await.unwrap();
        let export = export_history(&state).await.unwrap();
        let export_name = export.file_name().unwrap().to_string_lossy().into_owned();

        let roots = query_roots(&state);
        assert_eq!(roots.len(), 1);

        let folders: Vec<String> = list_documents(&state, "root")
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(folders, vec!["history", "export", "data"]);

        let data = list_documents(&state, "data").await.unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0].id, "auto_save_file.json");
        assert_eq!(data[0].mime_type, "application/json");

        let bytes = read_document(&state, &export_name).await.unwrap();
        assert!(String::from_utf8(bytes).unwrap().contains("hello"));

        delete_document(&state, &export_name).await.unwrap();
        let err = read_document(&state, &export_name).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        state.shutdown().await;
    }

    #[tokio::test]
    async fn test_rejects_escaping_ids() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::for_tests(dir.path());

        let err = read_document(&state, "../scan_database").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = delete_document(&state, "root").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        state.shutdown().await;
    }
}
