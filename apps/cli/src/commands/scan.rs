//! # Scan Commands
//!
//! ## Record Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  decoder hands over (content, code type?, remark?)                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  code type missing? ── web link → QR_CODE, else UNKNOWN                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  scan_results.insert()      (validates; the store is authoritative)    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  mirror.append()            (only if mirroring is enabled; a failure   │
//! │                              here is logged and the scan still counts) │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use codescan_core::classify::infer_scan_code_type;
use codescan_core::time::format_mirror_time;
use codescan_core::validation::validate_for_code_type;
use codescan_core::{CodeType, NewScanResult, ScanResult};

use crate::error::ApiResult;
use crate::state::AppState;

/// Scan record for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanDto {
    pub id: i64,
    pub content: String,
    pub code_type: CodeType,
    pub remark: Option<String>,
    /// Milliseconds since epoch.
    pub timestamp: i64,
    /// Local wall-clock time, `YYYY-MM-DD HH:MM:SS`.
    pub time: String,
}

impl From<ScanResult> for ScanDto {
    fn from(r: ScanResult) -> Self {
        ScanDto {
            time: format_mirror_time(r.timestamp, &Local),
            id: r.id,
            content: r.content,
            code_type: r.code_type,
            remark: r.remark,
            timestamp: r.timestamp,
        }
    }
}

/// Stores one decoded scan and mirrors it.
pub async fn record_scan(
    state: &AppState,
    content: String,
    code_type: Option<CodeType>,
    remark: Option<String>,
) -> ApiResult<ScanDto> {
    let code_type = code_type.unwrap_or_else(|| infer_scan_code_type(&content));
    debug!(code_type = %code_type, "record_scan command");

    let scan = NewScanResult::new(content)
        .with_code_type(code_type)
        .with_remark(remark);

    let stored = state.db().await?.scan_results().insert(&scan).await?;

    if state.config().mirror.enabled {
        if let Err(e) = state.mirror().append(stored.to_new()).await {
            warn!(id = stored.id, error = %e, "Scan stored but not mirrored");
        }
    }

    info!(id = stored.id, code_type = %stored.code_type, "Scan recorded");
    Ok(ScanDto::from(stored))
}

/// Checks text before it is encoded as a barcode of `code_type`.
pub fn validate(content: &str, code_type: CodeType) -> ApiResult<()> {
    validate_for_code_type(content, code_type)?;
    Ok(())
}
