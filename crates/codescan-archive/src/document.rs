//! # Mirror Document Format
//!
//! A mirror document is a JSON array of objects, one per record. Two key
//! sets exist in the wild: the current one and an older English one.
//!
//! ```text
//! ┌────────────┬──────────────┬─────────────┐
//! │ field      │ written key  │ older key   │
//! ├────────────┼──────────────┼─────────────┤
//! │ content    │ 数据         │ content     │
//! │ code type  │ 类型         │ codeType    │
//! │ remark     │ 备注         │ remark      │
//! │ time       │ 时间         │ timestamp   │
//! └────────────┴──────────────┴─────────────┘
//! ```
//!
//! ## Writing
//! Always the current keys, in the order above. A missing remark is `""`.
//! Time is local `YYYY-MM-DD HH:MM:SS`. Two-space pretty printing.
//!
//! ## Reading
//! Lenient. Per element, the current key wins if present, else the older
//! key. Elements that are not objects or whose content is empty are
//! dropped. A missing or unparseable time becomes `now`. An integer time is
//! taken as epoch milliseconds. A document that is not a JSON array reads
//! as empty.

use chrono::TimeZone;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt::Display;
use tracing::{debug, warn};

use codescan_core::time::{format_mirror_time, parse_mirror_time};
use codescan_core::{normalize_remark, CodeType, NewScanResult};

use crate::error::ArchiveResult;

pub const KEY_CONTENT: &str = "数据";
pub const KEY_CODE_TYPE: &str = "类型";
pub const KEY_REMARK: &str = "备注";
pub const KEY_TIME: &str = "时间";

pub const LEGACY_KEY_CONTENT: &str = "content";
pub const LEGACY_KEY_CODE_TYPE: &str = "codeType";
pub const LEGACY_KEY_REMARK: &str = "remark";
pub const LEGACY_KEY_TIME: &str = "timestamp";

/// One written element. Field order is the on-disk key order.
#[derive(Serialize)]
struct DocumentEntry<'a> {
    #[serde(rename = "数据")]
    content: &'a str,
    #[serde(rename = "类型")]
    code_type: &'a str,
    #[serde(rename = "备注")]
    remark: &'a str,
    #[serde(rename = "时间")]
    time: String,
}

/// Serializes records as a mirror document.
pub fn encode<Tz>(records: &[NewScanResult], tz: &Tz) -> ArchiveResult<String>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let entries: Vec<DocumentEntry<'_>> = records
        .iter()
        .map(|record| DocumentEntry {
            content: &record.content,
            code_type: record.code_type.as_str(),
            remark: record.remark_text().unwrap_or(""),
            time: format_mirror_time(record.timestamp, tz),
        })
        .collect();

    Ok(serde_json::to_string_pretty(&entries)?)
}

/// Parses a mirror document. Never fails; see the module docs for the
/// leniency rules.
pub fn decode<Tz: TimeZone>(text: &str, tz: &Tz, now: i64) -> Vec<NewScanResult> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let items = match serde_json::from_str::<Value>(text) {
        Ok(Value::Array(items)) => items,
        Ok(_) => {
            warn!("Mirror document is not a JSON array, treating as empty");
            return Vec::new();
        }
        Err(e) => {
            warn!(error = %e, "Mirror document is not valid JSON, treating as empty");
            return Vec::new();
        }
    };

    let total = items.len();
    let records: Vec<NewScanResult> = items
        .iter()
        .filter_map(|item| decode_entry(item, tz, now))
        .collect();

    if records.len() < total {
        debug!(total, kept = records.len(), "Dropped unusable mirror entries");
    }
    records
}

fn decode_entry<Tz: TimeZone>(item: &Value, tz: &Tz, now: i64) -> Option<NewScanResult> {
    let object = item.as_object()?;

    let content = field(object, KEY_CONTENT, LEGACY_KEY_CONTENT)
        .and_then(text_of)
        .unwrap_or_default();
    if content.trim().is_empty() {
        return None;
    }

    let code_type = field(object, KEY_CODE_TYPE, LEGACY_KEY_CODE_TYPE)
        .and_then(text_of)
        .map(|tag| CodeType::from_tag(&tag))
        .unwrap_or_default();

    let remark = normalize_remark(field(object, KEY_REMARK, LEGACY_KEY_REMARK).and_then(text_of));

    let timestamp = field(object, KEY_TIME, LEGACY_KEY_TIME)
        .and_then(|value| time_of(value, tz))
        .unwrap_or(now);

    Some(NewScanResult {
        content,
        remark,
        code_type,
        timestamp,
    })
}

fn field<'a>(object: &'a Map<String, Value>, key: &str, legacy: &str) -> Option<&'a Value> {
    object.get(key).or_else(|| object.get(legacy))
}

fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn time_of<Tz: TimeZone>(value: &Value, tz: &Tz) -> Option<i64> {
    match value {
        Value::String(s) => parse_mirror_time(s, tz),
        Value::Number(n) => n.as_i64().filter(|millis| *millis >= 0),
        _ => None,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
