//! # Database Migrations
//!
//! Schema versioning for `scan_database`.
//!
//! The stored version lives in SQLite's `PRAGMA user_version`. Every step
//! is additive (one new column) and backfills existing rows.
//!
//! ## How Migrations Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Migration Process                                  │
//! │                                                                         │
//! │  Database::new()                                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Read PRAGMA user_version                                              │
//! │       │                                                                 │
//! │       ├── 0, no table?       Create v3 schema, stamp 3                 │
//! │       ├── 0, table exists?   NoMigrationPath (unknown origin)          │
//! │       ├── 3?                 Nothing to do                             │
//! │       ├── > 3?               NoMigrationPath (no downgrades)           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  plan(stored, 3)  ── gap in the chain? ──► NoMigrationPath             │
//! │       │                                                                 │
//! │       ├── 1 → 2  ADD COLUMN remark TEXT                   ✓            │
//! │       └── 2 → 3  ADD COLUMN codeType ... DEFAULT 'UNKNOWN'             │
//! │                  + backfill from content shape            ✓            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Each step: BEGIN → statements → backfill → user_version → COMMIT     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Adding New Migrations
//!
//! 1. Bump [`CURRENT_VERSION`] and update [`CREATE_SCHEMA`] so fresh
//!    databases get the new shape directly
//! 2. Append a [`Migration`] to [`MIGRATIONS`] from the previous version
//! 3. **NEVER** modify an existing step - always add new ones
//! 4. There is no destructive fallback: a missing step makes the database
//!    impossible to open, which is the intended failure

use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use codescan_core::classify::infer_code_type;
use codescan_core::{CodeType, SCAN_TABLE};

use crate::error::{DbError, DbResult};

/// Schema version this build reads and writes.
pub const CURRENT_VERSION: u32 = 3;

/// Statements creating the current schema on an empty database.
pub const CREATE_SCHEMA: &[&str] = &[r#"
CREATE TABLE scan_results (
    id        INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
    content   TEXT NOT NULL,
    remark    TEXT,
    codeType  TEXT NOT NULL DEFAULT 'UNKNOWN',
    timestamp INTEGER NOT NULL
)
"#];

/// Post-statement data fix-ups a step can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backfill {
    /// Classify every row's `content` and store the guess in `codeType`.
    InferCodeType,
}

/// One upgrade step between adjacent schema versions.
#[derive(Debug)]
pub struct Migration {
    pub from: u32,
    pub to: u32,
    pub description: &'static str,
    pub statements: &'static [&'static str],
    pub backfill: Option<Backfill>,
}

/// Registered upgrade steps, oldest first.
pub static MIGRATIONS: &[Migration] = &[
    Migration {
        from: 1,
        to: 2,
        description: "add remark",
        statements: &["ALTER TABLE scan_results ADD COLUMN remark TEXT"],
        backfill: None,
    },
    Migration {
        from: 2,
        to: 3,
        description: "add codeType",
        statements: &[
            "ALTER TABLE scan_results ADD COLUMN codeType TEXT NOT NULL DEFAULT 'UNKNOWN'",
        ],
        backfill: Some(Backfill::InferCodeType),
    },
];

/// Resolves the chain of steps from `from` to `to`.
///
/// ## Returns
/// * `Ok(vec![])` - already at `to`
/// * `Ok(steps)` - steps to apply, in order
/// * `Err(NoMigrationPath)` - downgrade requested or a step is missing
pub fn plan(from: u32, to: u32, registry: &[Migration]) -> DbResult<Vec<&Migration>> {
    if from > to {
        return Err(DbError::NoMigrationPath { from, to });
    }

    let mut steps = Vec::new();
    let mut version = from;

    while version < to {
        let step = registry
            .iter()
            .find(|m| m.from == version && m.to > version && m.to <= to)
            .ok_or(DbError::NoMigrationPath { from, to })?;
        steps.push(step);
        version = step.to;
    }

    Ok(steps)
}

/// Brings the database to [`CURRENT_VERSION`].
///
/// ## Returns
/// The schema version the database is at afterwards.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<u32> {
    let stored = stored_version(pool).await?;
    debug!(stored, current = CURRENT_VERSION, "Checking schema version");

    if stored == 0 {
        if table_exists(pool).await? {
            warn!("scan_results exists without a schema version");
            return Err(DbError::NoMigrationPath {
                from: 0,
                to: CURRENT_VERSION,
            });
        }
        create_schema(pool).await?;
        info!(version = CURRENT_VERSION, "Created fresh schema");
        return Ok(CURRENT_VERSION);
    }

    if stored == CURRENT_VERSION {
        debug!("Schema is up to date");
        return Ok(stored);
    }

    let steps = plan(stored, CURRENT_VERSION, MIGRATIONS)?;
    info!(from = stored, to = CURRENT_VERSION, steps = steps.len(), "Upgrading schema");

    for step in steps {
        apply(pool, step).await?;
    }

    info!("All migrations applied successfully");
    Ok(CURRENT_VERSION)
}

/// Returns `(stored_version, current_version)`.
///
/// ## Usage
/// For diagnostics and health checks.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(u32, u32)> {
    Ok((stored_version(pool).await?, CURRENT_VERSION))
}

/// Reads `PRAGMA user_version`.
pub async fn stored_version(pool: &SqlitePool) -> DbResult<u32> {
    let raw: i64 = sqlx::query_scalar("PRAGMA user_version")
        .fetch_one(pool)
        .await?;

    u32::try_from(raw)
        .map_err(|_| DbError::MigrationFailed(format!("invalid stored schema version {raw}")))
}

async fn table_exists(pool: &SqlitePool) -> DbResult<bool> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1")
            .bind(SCAN_TABLE)
            .fetch_one(pool)
            .await?;

    Ok(count > 0)
}

async fn create_schema(pool: &SqlitePool) -> DbResult<()> {
    let mut tx = pool.begin().await?;

    for statement in CREATE_SCHEMA {
        sqlx::query(statement)
            .execute(&mut *tx)
            .await
            .map_err(|e| DbError::MigrationFailed(format!("create schema: {e}")))?;
    }

    sqlx::query(&format!("PRAGMA user_version = {CURRENT_VERSION}"))
        .execute(&mut *tx)
        .await?;

    tx.commit()
        .await
        .map_err(|e| DbError::MigrationFailed(format!("create schema: {e}")))?;
    Ok(())
}

/// Applies one step atomically, stamping the new version in the same
/// transaction.
async fn apply(pool: &SqlitePool, step: &Migration) -> DbResult<()> {
    let fail = |e: sqlx::Error| {
        DbError::MigrationFailed(format!(
            "{} -> {} ({}): {e}",
            step.from, step.to, step.description
        ))
    };

    let mut tx = pool.begin().await.map_err(fail)?;

    let version: i64 = sqlx::query_scalar("PRAGMA user_version")
        .fetch_one(&mut *tx)
        .await
        .map_err(fail)?;
    if version != i64::from(step.from) {
        return Err(DbError::MigrationFailed(format!(
            "expected schema version {} before step '{}', found {version}",
            step.from, step.description
        )));
    }

    for statement in step.statements {
        sqlx::query(statement)
            .execute(&mut *tx)
            .await
            .map_err(fail)?;
    }

    if let Some(Backfill::InferCodeType) = step.backfill {
        let rows: Vec<(i64, String)> = sqlx::query_as("SELECT id, content FROM scan_results")
            .fetch_all(&mut *tx)
            .await
            .map_err(fail)?;

        let mut updated = 0usize;
        for (id, content) in &rows {
            let code_type = infer_code_type(content);
            if code_type == CodeType::Unknown {
                continue;
            }
            sqlx::query("UPDATE scan_results SET codeType = ?1 WHERE id = ?2")
                .bind(code_type.as_str())
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(fail)?;
            updated += 1;
        }
        debug!(rows = rows.len(), updated, "Backfilled codeType");
    }

    sqlx::query(&format!("PRAGMA user_version = {}", step.to))
        .execute(&mut *tx)
        .await
        .map_err(fail)?;

    tx.commit().await.map_err(fail)?;

    info!(from = step.from, to = step.to, step = step.description, "Migration applied");
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use codescan_core::NewScanResult;
    use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
    use std::path::Path;

    type ColumnInfo = (String, String, i64, Option<String>, i64);

    /// Builds an on-disk database at an old schema version, the way an
    /// earlier app release would have left it.
    async fn legacy_fixture(path: &Path, version: u32, rows: &[(&str, i64)]) {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .unwrap();

        sqlx::query(
            "CREATE TABLE scan_results (
                id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
                content TEXT NOT NULL,
                timestamp INTEGER NOT NULL
            )",
        )
        .execute(&pool)
        .await
        .unwrap();
        if version >= 2 {
            sqlx::query("ALTER TABLE scan_results ADD COLUMN remark TEXT")
                .execute(&pool)
                .await
                .unwrap();
        }
        for (content, ts) in rows {
            sqlx::query("INSERT INTO scan_results (content, timestamp) VALUES (?1, ?2)")
                .bind(*content)
                .bind(*ts)
                .execute(&pool)
                .await
                .unwrap();
        }
        sqlx::query(&format!("PRAGMA user_version = {version}"))
            .execute(&pool)
            .await
            .unwrap();
        pool.close().await;
    }

    async fn columns(db: &Database) -> Vec<ColumnInfo> {
        sqlx::query_as(
            r#"SELECT name, type, "notnull", dflt_value, pk
               FROM pragma_table_info('scan_results') ORDER BY name"#,
        )
        .fetch_all(db.pool())
        .await
        .unwrap()
    }

    async fn type_of(db: &Database, content: &str) -> String {
        sqlx::query_scalar("SELECT codeType FROM scan_results WHERE content = ?1")
            .bind(content)
            .fetch_one(db.pool())
            .await
            .unwrap()
    }

    #[test]
    fn test_plan_full_chain() {
        let steps = plan(1, 3, MIGRATIONS).unwrap();
        let path: Vec<(u32, u32)> = steps.iter().map(|m| (m.from, m.to)).collect();
        assert_eq!(path, vec![(1, 2), (2, 3)]);

        assert!(plan(3, 3, MIGRATIONS).unwrap().is_empty());
    }

    #[test]
    fn test_plan_rejects_gaps_and_downgrades() {
        let only_second = &MIGRATIONS[1..];
        assert!(matches!(
            plan(1, 3, only_second),
            Err(DbError::NoMigrationPath { from: 1, to: 3 })
        ));
        assert!(matches!(
            plan(4, 3, MIGRATIONS),
            Err(DbError::NoMigrationPath { from: 4, to: 3 })
        ));
    }

    #[tokio::test]
    async fn test_fresh_database_is_current() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert_eq!(db.schema_version().await.unwrap(), CURRENT_VERSION);
        assert_eq!(
            migration_status(db.pool()).await.unwrap(),
            (CURRENT_VERSION, CURRENT_VERSION)
        );
    }

    #[tokio::test]
    async fn test_reopen_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan_database");

        let db = Database::new(DbConfig::new(&path)).await.unwrap();
        db.scan_results()
            .insert(&NewScanResult::new("kept").with_timestamp(5))
            .await
            .unwrap();
        db.close().await;

        let db = Database::new(DbConfig::new(&path)).await.unwrap();
        assert_eq!(db.scan_results().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_v1_upgrade_backfills_code_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan_database");
        legacy_fixture(
            &path,
            1,
            &[
                ("123456789012", 1_000),
                ("http://example.com/xyz", 2_000),
                ("12345678", 3_000),
                ("ab", 4_000),
            ],
        )
        .await;

        let db = Database::new(DbConfig::new(&path)).await.unwrap();
        assert_eq!(db.schema_version().await.unwrap(), 3);

        assert_eq!(type_of(&db, "123456789012").await, "EAN_13");
        assert_eq!(type_of(&db, "http://example.com/xyz").await, "QR_CODE");
        assert_eq!(type_of(&db, "12345678").await, "CODE_128");
        assert_eq!(type_of(&db, "ab").await, "UNKNOWN");

        let all = db.scan_results().get_all().await.unwrap();
        assert!(all.iter().all(|r| r.remark.is_none()));
    }

    #[tokio::test]
    async fn test_v2_upgrade_runs_only_second_step() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan_database");
        legacy_fixture(&path, 2, &[("4006381333931", 10)]).await;

        let db = Database::new(DbConfig::new(&path)).await.unwrap();
        assert_eq!(db.schema_version().await.unwrap(), 3);
        assert_eq!(type_of(&db, "4006381333931").await, "EAN_13");
    }

    #[tokio::test]
    async fn test_upgraded_schema_matches_fresh_schema() {
        let dir = tempfile::tempdir().unwrap();
        let legacy_path = dir.path().join("legacy");
        let rows = [("hello", 100), ("987654321", 200), ("x", 200)];
        legacy_fixture(&legacy_path, 1, &rows).await;

        let upgraded = Database::new(DbConfig::new(&legacy_path)).await.unwrap();
        let fresh = Database::new(DbConfig::new(dir.path().join("fresh")))
            .await
            .unwrap();
        for (content, ts) in rows {
            fresh
                .scan_results()
                .insert(&NewScanResult::new(content).with_timestamp(ts))
                .await
                .unwrap();
        }

        assert_eq!(columns(&upgraded).await, columns(&fresh).await);

        let strip = |rs: Vec<codescan_core::ScanResult>| {
            rs.into_iter()
                .map(|r| (r.id, r.content, r.remark, r.timestamp))
                .collect::<Vec<_>>()
        };
        assert_eq!(
            strip(upgraded.scan_results().get_all().await.unwrap()),
            strip(fresh.scan_results().get_all().await.unwrap())
        );
    }

    #[tokio::test]
    async fn test_newer_schema_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan_database");
        legacy_fixture(&path, 7, &[("precious", 1)]).await;

        let err = Database::new(DbConfig::new(&path)).await.unwrap_err();
        assert!(matches!(err, DbError::NoMigrationPath { from: 7, to: 3 }));
    }

    #[tokio::test]
    async fn test_unversioned_table_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan_database");
        legacy_fixture(&path, 0, &[("precious", 1)]).await;

        let err = Database::new(DbConfig::new(&path)).await.unwrap_err();
        assert!(matches!(err, DbError::NoMigrationPath { from: 0, .. }));
    }

    #[tokio::test]
    async fn test_failed_step_rolls_back_version_and_backfill() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan_database");
        legacy_fixture(&path, 2, &[("123456789012", 1_000)]).await;

        // A v2 file that already carries codeType makes the 2 -> 3 ALTER fail.
        let raw = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(SqliteConnectOptions::new().filename(&path))
            .await
            .unwrap();
        sqlx::query("ALTER TABLE scan_results ADD COLUMN codeType TEXT")
            .execute(&raw)
            .await
            .unwrap();
        raw.close().await;

        let err = Database::new(DbConfig::new(&path)).await.unwrap_err();
        assert!(matches!(err, DbError::MigrationFailed(_)), "got {err:?}");

        let raw = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(SqliteConnectOptions::new().filename(&path))
            .await
            .unwrap();
        let version: i64 = sqlx::query_scalar("PRAGMA user_version")
            .fetch_one(&raw)
            .await
            .unwrap();
        assert_eq!(version, 2);

        let code_type: Option<String> =
            sqlx::query_scalar("SELECT codeType FROM scan_results WHERE content = ?1")
                .bind("123456789012")
                .fetch_one(&raw)
                .await
                .unwrap();
        assert_eq!(code_type, None);
        raw.close().await;
    }
}
