//! # apim-bulk
//!
//! Bulk export and import of API definitions against a WSO2 API Manager
//! environment. All remote work is delegated to `apictl`; this crate
//! decides which APIs take part in a batch, runs one `apictl` call per
//! API, and reports the tallies.

use clap::Parser;
use std::path::PathBuf;

pub mod apictl;
pub mod batch;
pub mod commands;
pub mod config;
pub mod constants;
pub mod entity;
pub mod filter;
pub mod logging;
pub mod runlog;
pub mod summary;

/// Bulk export/import of WSO2 API Manager APIs through apictl
#[derive(Parser)]
#[command(
    name = "apim-bulk",
    version,
    about = "Bulk export and import of WSO2 API Manager APIs through apictl",
    long_about = "Bulk export and import of WSO2 API Manager APIs through apictl.\n\nSelect APIs by name glob, explicit name:version[:provider], provider or lifecycle status,\npreview the selection with --dry-run, and get a per-run summary and timestamped log."
)]
pub struct Cli {
    /// Project configuration file
    #[arg(long, global = true, default_value = constants::APIM_BULK_CONFIG)]
    pub config: PathBuf,
    /// Increase diagnostic output (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
    #[command(subcommand)]
    pub cmd: Option<commands::Commands>,
}
