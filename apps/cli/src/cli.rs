//! Command-line interface definitions for `codescan`.
//!
//! Uses `clap` derive macros for declarative argument parsing.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use codescan_core::CodeType;

/// Scan history store with a JSON mirror.
#[derive(Parser, Debug)]
#[command(name = "codescan")]
#[command(version)]
#[command(about = "Record, browse and export barcode scan history", long_about = None)]
pub struct Cli {
    /// Config file (default: codescan.toml in the platform config dir)
    #[arg(long, global = true, env = "CODESCAN_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Data directory (overrides config and CODESCAN_DATA_DIR)
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "plain")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Record a decoded scan
    Scan {
        /// Decoded content
        content: String,

        /// Symbology tag, e.g. EAN_13 or QR_CODE (inferred when omitted)
        #[arg(short = 't', long = "type", value_parser = parse_code_type)]
        code_type: Option<CodeType>,

        /// Free-text remark
        #[arg(short, long)]
        remark: Option<String>,
    },

    /// Show the scan history, newest first
    History {
        /// Show at most this many records
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Export the history to export/scan_file_<time>.json
    Export,

    /// Import a mirror-format JSON file into the history
    Import {
        /// File to import
        path: PathBuf,
    },

    /// Fill an empty history from the mirror file
    Restore,

    /// Rewrite the mirror file from the history
    RebuildMirror,

    /// Delete the mirror file
    DeleteMirror,

    /// Check text before encoding it as a barcode
    Validate {
        content: String,

        #[arg(short = 't', long = "type", value_parser = parse_code_type, default_value = "EAN_13")]
        code_type: CodeType,
    },

    /// Show paths, schema version and record counts
    Status,

    /// Browse the history, export and data folders
    Docs {
        #[command(subcommand)]
        action: DocsCommand,
    },

    /// Write the effective configuration to the config file
    InitConfig,
}

#[derive(Subcommand, Debug)]
pub enum DocsCommand {
    /// List a folder (root, history, export, data, public_data)
    List {
        #[arg(default_value = "root")]
        folder: String,
    },

    /// Print a document's contents
    Cat { id: String },

    /// Delete a document or folder
    Rm { id: String },
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable plain text
    Plain,
    /// JSON structured output
    Json,
}

/// Parses a symbology tag, case-insensitively.
pub fn parse_code_type(value: &str) -> Result<CodeType, String> {
    value.parse::<CodeType>().map_err(|_| {
        let known: Vec<&str> = CodeType::ALL.iter().map(CodeType::as_str).collect();
        format!("unknown code type '{}' (expected one of {})", value, known.join(", "))
    })
}
