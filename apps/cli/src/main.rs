//! # codescan
//!
//! Command-line entry point. Setup and dispatch live in the library so they
//! can be tested.

use clap::Parser;
use std::process::ExitCode;

use codescan_cli::cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let output = cli.output;

    match codescan_cli::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            codescan_cli::report_error(&e, output);
            ExitCode::FAILURE
        }
    }
}
