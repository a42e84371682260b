//! # Scan Result Repository
//!
//! Inserts and lists scan history rows.
//!
//! Rows come back newest first. Two rows with the same timestamp (a batch
//! import stamped in one millisecond, say) are ordered by id, also newest
//! first, so the listing is stable.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use codescan_core::validation::validate_new_scan;
use codescan_core::{normalize_remark, CodeType, NewScanResult, ScanResult};

use crate::error::{DbError, DbResult};

/// Raw row shape of `scan_results`.
#[derive(Debug, sqlx::FromRow)]
struct ScanResultRow {
    id: i64,
    content: String,
    remark: Option<String>,
    #[sqlx(rename = "codeType")]
    code_type: String,
    timestamp: i64,
}

impl From<ScanResultRow> for ScanResult {
    fn from(row: ScanResultRow) -> Self {
        ScanResult {
            id: row.id,
            content: row.content,
            remark: normalize_remark(row.remark),
            code_type: CodeType::from_tag(&row.code_type),
            timestamp: row.timestamp,
        }
    }
}

/// Repository for scan history.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.scan_results();
///
/// let stored = repo.insert(&NewScanResult::new("4006381333931")).await?;
/// let history = repo.get_all().await?;
/// ```
#[derive(Debug, Clone)]
pub struct ScanResultRepository {
    pool: SqlitePool,
}

impl ScanResultRepository {
    /// Creates a new ScanResultRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ScanResultRepository { pool }
    }

    /// Stores one record and returns it with its new id.
    ///
    /// ## Errors
    /// * `DbError::Validation` - empty content or negative timestamp
    /// * `DbError::QueryFailed` / `StorageUnavailable` - SQLite refused the write
    pub async fn insert(&self, scan: &NewScanResult) -> DbResult<ScanResult> {
        let mut conn = self.pool.acquire().await?;
        let id = insert_on(&mut conn, scan).await?;

        debug!(id, code_type = %scan.code_type, "Inserted scan result");
        Ok(scan.clone().into_stored(id))
    }

    /// Stores a batch in one transaction.
    ///
    /// Either every record is stored or none is. Ids follow input order.
    pub async fn insert_many(&self, scans: &[NewScanResult]) -> DbResult<usize> {
        for scan in scans {
            validate_new_scan(scan)?;
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        for scan in scans {
            insert_on(&mut tx, scan).await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        debug!(count = scans.len(), "Inserted scan result batch");
        Ok(scans.len())
    }

    /// Lists every stored record, newest first.
    pub async fn get_all(&self) -> DbResult<Vec<ScanResult>> {
        let rows: Vec<ScanResultRow> = sqlx::query_as(
            r#"
            SELECT id, content, remark, codeType, timestamp
            FROM scan_results
            ORDER BY timestamp DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), "Loaded scan history");
        Ok(rows.into_iter().map(ScanResult::from).collect())
    }

    /// Number of stored records.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM scan_results")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

async fn insert_on(conn: &mut SqliteConnection, scan: &NewScanResult) -> DbResult<i64> {
    validate_new_scan(scan)?;

    let result = sqlx::query(
        r#"
        INSERT INTO scan_results (content, remark, codeType, timestamp)
        VALUES (?1, ?2, ?3, ?4)
        "#,
    )
    .bind(&scan.content)
    .bind(scan.remark_text())
    .bind(scan.code_type.as_str())
    .bind(scan.timestamp)
    .execute(conn)
    .await?;

    Ok(result.last_insert_rowid())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn repo() -> ScanResultRepository {
        Database::new(DbConfig::in_memory())
            .await
            .unwrap()
            .scan_results()
    }

    #[tokio::test]
    async fn test_insert_then_get_all() {
        let repo = repo().await;
        let scan = NewScanResult::new("4006381333931")
            .with_code_type(CodeType::Ean13)
            .with_remark(Some("shelf 3"))
            .with_timestamp(1_000);

        let stored = repo.insert(&scan).await.unwrap();
        let all = repo.get_all().await.unwrap();

        assert_eq!(all, vec![scan.clone().into_stored(stored.id)]);
        assert_eq!(stored, all[0]);
    }

    #[tokio::test]
    async fn test_ids_are_unique_and_increasing() {
        let repo = repo().await;
        let a = repo.insert(&NewScanResult::new("a").with_timestamp(1)).await.unwrap().id;
        let b = repo.insert(&NewScanResult::new("b").with_timestamp(1)).await.unwrap().id;
        assert!(b > a);
    }

    #[tokio::test]
    async fn test_get_all_orders_newest_first_with_stable_ties() {
        let repo = repo().await;
        let old = repo.insert(&NewScanResult::new("old").with_timestamp(10)).await.unwrap().id;
        let tie_a = repo.insert(&NewScanResult::new("tie-a").with_timestamp(20)).await.unwrap().id;
        let tie_b = repo.insert(&NewScanResult::new("tie-b").with_timestamp(20)).await.unwrap().id;
        let new = repo.insert(&NewScanResult::new("new").with_timestamp(30)).await.unwrap().id;

        let ids: Vec<i64> = repo.get_all().await.unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![new, tie_b, tie_a, old]);
    }

    #[tokio::test]
    async fn test_empty_remark_is_stored_as_null() {
        let repo = repo().await;
        let mut scan = NewScanResult::new("x").with_timestamp(1);
        scan.remark = Some("   ".to_string());
        repo.insert(&scan).await.unwrap();

        let stored: Option<String> = sqlx::query_scalar("SELECT remark FROM scan_results")
            .fetch_one(&repo.pool)
            .await
            .unwrap();
        assert_eq!(stored, None);
    }

    #[tokio::test]
    async fn test_insert_rejects_invalid_records() {
        let repo = repo().await;

        let err = repo.insert(&NewScanResult::new("")).await.unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));

        let err = repo
            .insert(&NewScanResult::new("x").with_timestamp(-1))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));

        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_insert_many_is_all_or_nothing() {
        let repo = repo().await;
        let batch = vec![
            NewScanResult::new("one").with_timestamp(1),
            NewScanResult::new("").with_timestamp(2),
        ];
        assert!(repo.insert_many(&batch).await.is_err());
        assert_eq!(repo.count().await.unwrap(), 0);

        let batch = vec![
            NewScanResult::new("one").with_timestamp(1),
            NewScanResult::new("two").with_timestamp(2),
        ];
        assert_eq!(repo.insert_many(&batch).await.unwrap(), 2);

        let all = repo.get_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].content, "two");
        assert!(all[0].id > all[1].id);
    }

    #[tokio::test]
    async fn test_unrecognized_stored_tag_reads_as_unknown() {
        let repo = repo().await;
        sqlx::query("INSERT INTO scan_results (content, codeType, timestamp) VALUES ('x', 'MAXICODE', 1)")
            .execute(&repo.pool)
            .await
            .unwrap();

        let all = repo.get_all().await.unwrap();
        assert_eq!(all[0].code_type, CodeType::Unknown);
    }
}
