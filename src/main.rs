//! # apim-bulk
//!
//! Bulk export and import of API definitions against WSO2 API Manager.
//!
//! ## Quick Start
//!
//! ```bash
//! # Preview which published APIs would be exported
//! apim-bulk export -e dev --status PUBLISHED --dry-run
//!
//! # Export them into ./archives
//! apim-bulk export -e dev --status PUBLISHED -d archives
//!
//! # Import every Payment* archive into prod with an override file
//! apim-bulk import -e prod -d archives -n 'Payment*' --params params/prod.yaml --update
//! ```
//!
//! Every real run prints a summary and writes `logs/<operation>_<env>_<timestamp>.log`.
//! The exit code is 0 only when every matched API succeeded (or for a dry run).

use apim_bulk::{commands, logging, Cli};
use clap::Parser;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let Some(cmd) = cli.cmd else {
        eprintln!("No command provided. Use --help to see available commands.");
        return ExitCode::FAILURE;
    };
    match commands::run(cmd, &cli.config).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
