//! Where things live and how much is in them.

use serde::Serialize;
use std::path::PathBuf;

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusDto {
    pub data_dir: PathBuf,
    pub database_path: PathBuf,
    pub schema_version: u32,
    pub scan_count: i64,
    pub mirror_path: PathBuf,
    pub mirror_enabled: bool,
    pub mirror_records: usize,
    pub export_dir: PathBuf,
}

/// Opens the database (migrating it if needed) and reports counts.
pub async fn status(state: &AppState) -> ApiResult<StatusDto> {
    let db = state.db().await?;
    let config = state.config();

    Ok(StatusDto {
        data_dir: config.data_dir(),
        database_path: config.database_path(),
        schema_version: db.schema_version().await?,
        scan_count: db.scan_results().count().await?,
        mirror_path: state.mirror_path().to_path_buf(),
        mirror_enabled: config.mirror.enabled,
        mirror_records: state.mirror().read_all().await?.len(),
        export_dir: state.exports().path().to_path_buf(),
    })
}
