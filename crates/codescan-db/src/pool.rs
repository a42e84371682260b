//! # Database Pool Management
//!
//! Connection pool creation and the lazily-opened process-wide handle.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Database Access                                    │
//! │                                                                         │
//! │  CLI startup                                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SharedDatabase::new(DbConfig)   ← nothing opened yet                  │
//! │       │                                                                 │
//! │       │ first command that needs storage                               │
//! │       ▼                                                                 │
//! │  SharedDatabase::get()                                                 │
//! │       │                                                                 │
//! │       ├── already open? ──► &Database                                  │
//! │       │                                                                 │
//! │       ▼  (concurrent callers wait on the same init)                    │
//! │  Database::new(config) ← pool + migrations                             │
//! │       │                                                                 │
//! │       ├── Ok  ──► stored, every later get() returns it                 │
//! │       └── Err ──► returned, next get() retries                         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## WAL Mode
//! Readers don't block the writer, so `history` can run while a scan is
//! being recorded.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::scan_result::ScanResultRepository;

const MEMORY_PATH: &str = ":memory:";

// =============================================================================
// Configuration
// =============================================================================

/// Database configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("/path/to/data/scan_database")
///     .max_connections(4)
///     .min_connections(1);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Path to the SQLite database file.
    pub database_path: PathBuf,

    /// Maximum number of connections in the pool.
    /// Default: 5
    pub max_connections: u32,

    /// Minimum number of connections to keep alive.
    /// Default: 1
    pub min_connections: u32,

    /// Connection timeout duration.
    /// Default: 30 seconds
    pub connect_timeout: Duration,

    /// Idle timeout before closing a connection.
    /// Default: 10 minutes
    pub idle_timeout: Duration,

    /// Whether to run migrations on connect.
    /// Default: true
    pub run_migrations: bool,
}

impl DbConfig {
    /// Creates a new database configuration with the given path.
    ///
    /// ## Arguments
    /// * `path` - Path to the SQLite database file. Will be created if it doesn't exist.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            run_migrations: true,
        }
    }

    /// Sets the maximum number of connections.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets the minimum number of connections.
    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    /// Sets the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets whether to run migrations on connect.
    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// Creates an in-memory database configuration (for testing).
    ///
    /// Each call yields a separate, isolated database.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(MEMORY_PATH),
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
            run_migrations: true,
        }
    }

    /// True for configurations created by [`DbConfig::in_memory`].
    pub fn is_in_memory(&self) -> bool {
        self.database_path == Path::new(MEMORY_PATH)
    }

    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        let options = if self.is_in_memory() {
            SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
        } else {
            SqliteConnectOptions::new()
                .filename(&self.database_path)
                .create_if_missing(true)
        };

        Ok(options
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal))
    }
}

// =============================================================================
// Database
// =============================================================================

/// Main database handle providing repository access.
///
/// Cheap to clone; clones share the pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens (creating if needed) the database and brings its schema to
    /// [`migrations::CURRENT_VERSION`].
    ///
    /// ## What This Does
    /// 1. Creates the parent directory and the file if missing
    /// 2. Configures WAL mode and NORMAL synchronous
    /// 3. Creates the connection pool
    /// 4. Runs migrations (if enabled)
    ///
    /// ## Returns
    /// * `Ok(Database)` - Ready-to-use database handle
    /// * `Err(DbError)` - Storage, connection or migration failure
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            "Initializing database connection"
        );

        if !config.is_in_memory() {
            if let Some(parent) = config.database_path.parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent)
                        .await
                        .map_err(|e| DbError::StorageUnavailable(e.to_string()))?;
                }
            }
        }

        let connect_options = config.connect_options()?;
        debug!("Connection options configured");

        let mut pool_options = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout);

        // An in-memory database disappears with its last connection.
        pool_options = if config.is_in_memory() {
            pool_options.idle_timeout(None).max_lifetime(None)
        } else {
            pool_options.idle_timeout(Some(config.idle_timeout))
        };

        let pool = pool_options
            .connect_with(connect_options)
            .await
            .map_err(|e| match e {
                sqlx::Error::Io(io) => DbError::StorageUnavailable(io.to_string()),
                other => DbError::ConnectionFailed(other.to_string()),
            })?;

        info!(
            max_connections = config.max_connections,
            "Database pool created"
        );

        let db = Database { pool };

        if config.run_migrations {
            if let Err(e) = db.run_migrations().await {
                db.close().await;
                return Err(e);
            }
        }

        Ok(db)
    }

    /// Runs database migrations.
    ///
    /// Idempotent: a database already at the current version is untouched.
    pub async fn run_migrations(&self) -> DbResult<()> {
        let version = migrations::run_migrations(&self.pool).await?;
        info!(version, "Schema ready");
        Ok(())
    }

    /// Returns a reference to the connection pool.
    ///
    /// ## Usage
    /// For advanced queries not covered by repositories.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Returns the scan result repository.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let history = db.scan_results().get_all().await?;
    /// ```
    pub fn scan_results(&self) -> ScanResultRepository {
        ScanResultRepository::new(self.pool.clone())
    }

    /// Schema version currently stamped in the file.
    pub async fn schema_version(&self) -> DbResult<u32> {
        migrations::stored_version(&self.pool).await
    }

    /// Closes the database connection pool.
    ///
    /// ## Note
    /// After calling close, all repository operations will fail.
    pub async fn close(&self) {
        info!("Closing database connection pool");
        self.pool.close().await;
    }

    /// Checks if the database is healthy (can execute queries).
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .is_ok()
    }
}

// =============================================================================
// Shared Handle
// =============================================================================

/// Process-wide, lazily-opened [`Database`].
///
/// The first [`get`](SharedDatabase::get) opens the database; concurrent
/// first callers share that one initialization. A failed open is not
/// cached.
#[derive(Debug)]
pub struct SharedDatabase {
    config: DbConfig,
    cell: OnceCell<Database>,
}

impl SharedDatabase {
    pub fn new(config: DbConfig) -> Self {
        SharedDatabase {
            config,
            cell: OnceCell::new(),
        }
    }

    /// Returns the open database, opening it on first use.
    pub async fn get(&self) -> DbResult<&Database> {
        self.cell
            .get_or_try_init(|| async {
                debug!("Opening shared database");
                Database::new(self.config.clone()).await
            })
            .await
    }

    /// True once a `get` has succeeded.
    pub fn is_open(&self) -> bool {
        self.cell.initialized()
    }

    /// Closes the pool if it was ever opened.
    pub async fn close(&self) {
        if let Some(db) = self.cell.get() {
            db.close().await;
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
