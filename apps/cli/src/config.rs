//! # Application Configuration
//!
//! ## Load Order (later overrides earlier)
//! 1. Default values
//! 2. Config file (`codescan.toml` in the platform config dir, or `--config`)
//! 3. Environment variables (`CODESCAN_*`)
//! 4. Command-line flags (applied by the caller)
//!
//! ## Example `codescan.toml`
//! ```toml
//! [storage]
//! data_dir = "/home/me/.local/share/codescan"
//! public_data_dir = "/home/me/Documents/CodeScan"
//! max_connections = 4
//!
//! [mirror]
//! enabled = true
//!
//! [logging]
//! filter = "info,codescan=debug,sqlx=warn"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use codescan_core::DATABASE_NAME;

use crate::error::ConfigError;

/// Config file name inside the platform config directory.
pub const CONFIG_FILE_NAME: &str = "codescan.toml";

/// Default log filter.
pub const DEFAULT_LOG_FILTER: &str = "info,codescan=debug,sqlx=warn";

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "codescan", "codescan")
}

// =============================================================================
// Sections
// =============================================================================

/// Where files live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root for the database, mirror, exports and history folders.
    /// Default: the platform data directory.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Database file override. Default: `<data_dir>/scan_database`.
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Shared folder exposed as `public_data` in the document browser.
    #[serde(default)]
    pub public_data_dir: Option<PathBuf>,

    /// Maximum SQLite pool connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    4
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            data_dir: None,
            database_path: None,
            public_data_dir: None,
            max_connections: default_max_connections(),
        }
    }
}

/// JSON mirror behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorConfig {
    /// Mirror every recorded or imported scan to the JSON file.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl Default for MirrorConfig {
    fn default() -> Self {
        MirrorConfig { enabled: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing` filter directive. `RUST_LOG` takes precedence.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            filter: default_log_filter(),
        }
    }
}

// =============================================================================
// AppConfig
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub mirror: MirrorConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// A missing file is not an error; an unreadable or malformed one is.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = match config_path.or_else(Self::default_config_path) {
            Some(path) if path.exists() => Self::from_file(&path)?,
            Some(path) => {
                debug!(path = %path.display(), "Config file not found, using defaults");
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Parses a config file without applying overrides.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        info!(path = %path.display(), "Loading config from file");
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or(ConfigError::NoConfigPath)?;

        let write_err = |source| ConfigError::Write {
            path: path.clone(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(write_err)?;

        info!(path = %path.display(), "Config saved");
        Ok(path)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "storage.max_connections must be greater than 0".into(),
            ));
        }

        if let Err(e) = EnvFilter::try_new(&self.logging.filter) {
            return Err(ConfigError::Invalid(format!(
                "logging.filter '{}' is not a valid filter: {}",
                self.logging.filter, e
            )));
        }

        Ok(())
    }

    /// Applies `CODESCAN_*` environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from any key lookup.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup("CODESCAN_DATA_DIR") {
            debug!(data_dir = %dir, "Overriding data dir from environment");
            self.storage.data_dir = Some(PathBuf::from(dir));
        }

        if let Some(path) = lookup("CODESCAN_DB_PATH") {
            debug!(database_path = %path, "Overriding database path from environment");
            self.storage.database_path = Some(PathBuf::from(path));
        }

        if let Some(dir) = lookup("CODESCAN_PUBLIC_DATA_DIR") {
            self.storage.public_data_dir = Some(PathBuf::from(dir));
        }

        if let Some(flag) = lookup("CODESCAN_MIRROR") {
            match parse_flag(&flag) {
                Some(enabled) => self.mirror.enabled = enabled,
                None => warn!(value = %flag, "Ignoring unrecognized CODESCAN_MIRROR value"),
            }
        }

        if let Some(filter) = lookup("CODESCAN_LOG") {
            self.logging.filter = filter;
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    // =========================================================================
    // Resolved Paths
    // =========================================================================

    /// Data directory: configured, else the platform data dir, else
    /// `./codescan-data`.
    pub fn data_dir(&self) -> PathBuf {
        self.storage
            .data_dir
            .clone()
            .or_else(|| project_dirs().map(|dirs| dirs.data_dir().to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("codescan-data"))
    }

    /// Database file: configured, else `<data_dir>/scan_database`.
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| self.data_dir().join(DATABASE_NAME))
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(config.mirror.enabled);
        assert_eq!(config.storage.max_connections, 4);
        assert_eq!(config.logging.filter, DEFAULT_LOG_FILTER);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [storage]
            data_dir = "/srv/codescan"

            [mirror]
            enabled = false
            "#,
        )
        .unwrap();

        assert_eq!(config.storage.data_dir, Some(PathBuf::from("/srv/codescan")));
        assert_eq!(config.storage.max_connections, 4);
        assert!(!config.mirror.enabled);
        assert_eq!(config.logging.filter, DEFAULT_LOG_FILTER);
        assert_eq!(
            config.database_path(),
            PathBuf::from("/srv/codescan").join("scan_database")
        );
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("CODESCAN_DATA_DIR", "/data"),
            ("CODESCAN_DB_PATH", "/db/scans.sqlite"),
            ("CODESCAN_MIRROR", "off"),
            ("CODESCAN_LOG", "warn"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.data_dir(), PathBuf::from("/data"));
        assert_eq!(config.database_path(), PathBuf::from("/db/scans.sqlite"));
        assert!(!config.mirror.enabled);
        assert_eq!(config.logging.filter, "warn");
    }

    #[test]
    fn test_bad_mirror_flag_is_ignored() {
        let mut config = AppConfig::default();
        config.apply_overrides(|key| (key == "CODESCAN_MIRROR").then(|| "maybe".to_string()));
        assert!(config.mirror.enabled);
    }

    #[test]
    fn test_validation() {
        let mut config = AppConfig::default();
        config.storage.max_connections = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = AppConfig::default();
        config.logging.filter = "info,[[[".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);

        let mut config = AppConfig::default();
        config.storage.public_data_dir = Some(PathBuf::from("/public"));
        config.save(Some(path.clone())).unwrap();

        let loaded = AppConfig::from_file(&path).unwrap();
        assert_eq!(loaded.storage.public_data_dir, Some(PathBuf::from("/public")));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[storage\nmax_connections = ").unwrap();

        assert!(matches!(
            AppConfig::from_file(&path),
            Err(ConfigError::Parse { .. })
        ));
    }
}
