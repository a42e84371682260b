//! # CodeScan Application Library
//!
//! Application layer for the scan history store: configuration, shared
//! state, the commands a scanner UI calls, and the `codescan` CLI that
//! drives them.
//!
//! ## Module Organization
//! ```text
//! codescan_cli/
//! ├── lib.rs          ◄─── You are here (startup, dispatch, output)
//! ├── cli.rs          ◄─── clap argument definitions
//! ├── config.rs       ◄─── AppConfig: defaults → TOML → env → flags
//! ├── state.rs        ◄─── AppState: lazy database, mirror writer, folders
//! ├── commands/       ◄─── record_scan, history, export/import, mirror, docs
//! └── error.rs        ◄─── ApiError returned by every command
//! ```
//!
//! ## Startup Sequence
//! 1. Parse arguments
//! 2. Load configuration and apply `--data-dir`
//! 3. Initialize tracing with the configured filter (`RUST_LOG` wins)
//! 4. Build `AppState` (spawns the mirror writer; the database opens on
//!    first use and runs pending migrations)
//! 5. Run the command, print its result
//! 6. Drain the mirror queue and close the database

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod state;

use serde::Serialize;
use std::io::Write;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command, DocsCommand, OutputFormat};
use config::AppConfig;
use error::{ApiError, ApiResult};
use state::AppState;

/// Loads configuration, runs one command and shuts down cleanly.
pub async fn run(cli: Cli) -> ApiResult<()> {
    let mut config = AppConfig::load(cli.config.clone())?;
    if let Some(dir) = cli.data_dir {
        config.storage.data_dir = Some(dir);
    }

    init_tracing(&config.logging.filter);
    info!(version = env!("CARGO_PKG_VERSION"), "Starting codescan");

    if let Command::InitConfig = cli.command {
        let path = config.save(cli.config)?;
        return emit(cli.output, &path, |p| format!("Config written to {}", p.display()));
    }

    let state = AppState::new(config);
    let result = dispatch(&state, cli.command, cli.output).await;
    state.shutdown().await;
    result
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=codescan=trace` - Show trace for codescan crates only
/// - Default: the configured filter (`info,codescan=debug,sqlx=warn`)
///
/// Logs go to stderr so command output on stdout stays parseable.
pub fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Prints a command failure in the requested format.
pub fn report_error(err: &ApiError, output: OutputFormat) {
    match output {
        OutputFormat::Plain => eprintln!("error: {err}"),
        OutputFormat::Json => match serde_json::to_string_pretty(err) {
            Ok(json) => eprintln!("{json}"),
            Err(_) => eprintln!("error: {err}"),
        },
    }
}

async fn dispatch(state: &AppState, command: Command, output: OutputFormat) -> ApiResult<()> {
    debug!(?command, "Dispatching command");

    match command {
        Command::Scan {
            content,
            code_type,
            remark,
        } => {
            let scan = commands::record_scan(state, content, code_type, remark).await?;
            emit(output, &scan, |s| {
                format!("Recorded #{} {} {}", s.id, s.code_type, s.content)
            })
        }

        Command::History { limit } => {
            let mut items = commands::history(state).await?;
            if let Some(limit) = limit {
                items.truncate(limit);
            }
            emit(output, &items, |items| {
                items
                    .iter()
                    .map(|s| match &s.remark {
                        Some(remark) => format!(
                            "{:>6}  {}  {:<9}  {}  ({})",
                            s.id, s.time, s.code_type.as_str(), s.content, remark
                        ),
                        None => format!(
                            "{:>6}  {}  {:<9}  {}",
                            s.id,
                            s.time,
                            s.code_type.as_str(),
                            s.content
                        ),
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }

        Command::Export => {
            let path = commands::export_history(state).await?;
            emit(output, &path, |p| format!("Exported to {}", p.display()))
        }

        Command::Import { path } => {
            let summary = commands::import_file(state, &path).await?;
            emit(output, &summary, |s| format!("Imported {} records", s.imported))
        }

        Command::Restore => {
            let restored = commands::restore_from_mirror(state).await?;
            emit(output, &restored, |n| format!("Restored {n} records from the mirror"))
        }

        Command::RebuildMirror => {
            let count = commands::rebuild_mirror(state).await?;
            emit(output, &count, |n| format!("Mirror rewritten with {n} records"))
        }

        Command::DeleteMirror => {
            let deleted = commands::delete_mirror(state).await?;
            emit(output, &deleted, |deleted| {
                if *deleted {
                    "Mirror deleted".to_string()
                } else {
                    "No mirror file".to_string()
                }
            })
        }

        Command::Validate { content, code_type } => {
            commands::validate(&content, code_type)?;
            emit(output, &true, |_| format!("Valid {code_type} content"))
        }

        Command::Status => {
            let status = commands::status(state).await?;
            emit(output, &status, |s| {
                format!(
                    "data dir:        {}\ndatabase:        {} (schema v{})\nscans:           {}\nmirror:          {} ({} records, {})\nexports:         {}",
                    s.data_dir.display(),
                    s.database_path.display(),
                    s.schema_version,
                    s.scan_count,
                    s.mirror_path.display(),
                    s.mirror_records,
                    if s.mirror_enabled { "enabled" } else { "disabled" },
                    s.export_dir.display(),
                )
            })
        }

        Command::Docs { action } => match action {
            DocsCommand::List { folder } => {
                let docs = commands::list_documents(state, &folder).await?;
                emit(output, &docs, |docs| {
                    docs.iter()
                        .map(|d| match d.size {
                            Some(size) => format!("{:<32}  {:>10}  {}", d.id, size, d.mime_type),
                            None => format!("{}/", d.id),
                        })
                        .collect::<Vec<_>>()
                        .join("\n")
                })
            }
            DocsCommand::Cat { id } => {
                let bytes = commands::read_document(state, &id).await?;
                std::io::stdout()
                    .write_all(&bytes)
                    .map_err(|e| ApiError::internal(format!("Failed to write output: {e}")))
            }
            DocsCommand::Rm { id } => {
                commands::delete_document(state, &id).await?;
                emit(output, &id, |id| format!("Deleted {id}"))
            }
        },

        Command::InitConfig => Err(ApiError::internal("init-config is handled before startup")),
    }
}

/// Prints a command result as plain text or JSON.
fn emit<T: Serialize>(
    output: OutputFormat,
    value: &T,
    plain: impl FnOnce(&T) -> String,
) -> ApiResult<()> {
    match output {
        OutputFormat::Plain => {
            let text = plain(value);
            if !text.is_empty() {
                println!("{text}");
            }
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value)
                .map_err(|e| ApiError::internal(format!("Failed to encode output: {e}")))?;
            println!("{json}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(dir: &std::path::Path, args: &[&str]) -> Cli {
        let config = dir.join("codescan.toml");
        let data = dir.join("data-root");
        let mut argv = vec![
            "codescan".to_string(),
            "--config".to_string(),
            config.display().to_string(),
            "--data-dir".to_string(),
            data.display().to_string(),
        ];
        argv.extend(args.iter().map(|a| a.to_string()));
        Cli::try_parse_from(argv).unwrap()
    }

    #[tokio::test]
    async fn test_run_scan_then_export() {
        let dir = tempfile::tempdir().unwrap();

        run(cli(dir.path(), &["scan", "4006381333931", "--type", "EAN_13"]))
            .await
            .unwrap();
        run(cli(dir.path(), &["--output", "json", "export"]))
            .await
            .unwrap();

        let exports: Vec<_> = std::fs::read_dir(dir.path().join("data-root").join("export"))
            .unwrap()
            .collect();
        assert_eq!(exports.len(), 1);
        assert!(dir
            .path()
            .join("data-root")
            .join("data")
            .join("auto_save_file.json")
            .exists());
    }

    #[tokio::test]
    async fn test_run_reports_validation_failure() {
        let dir = tempfile::tempdir().unwrap();

        let err = run(cli(dir.path(), &["validate", "123"])).await.unwrap_err();
        assert_eq!(err.code, error::ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_init_config_writes_file() {
        let dir = tempfile::tempdir().unwrap();

        run(cli(dir.path(), &["init-config"])).await.unwrap();

        let saved = AppConfig::from_file(&dir.path().join("codescan.toml")).unwrap();
        assert_eq!(saved.storage.data_dir, Some(dir.path().join("data-root")));
    }
}
