use anyhow::Result;
use clap::{Args, Subcommand};
use std::{io, path::Path, process::ExitCode};

use crate::{
    apictl::Apictl,
    batch::plan,
    config::{load_repo_config, EnvironmentConfig, RepoConfig},
    entity::Entity,
    filter::FilterSet,
    runlog::RunLog,
    summary::RunOutcome,
};

pub mod clean_logs;
pub mod completions;
pub mod doctor;
pub mod env;
pub mod export;
pub mod import;
pub mod init;

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(about = "Export every matching API from an environment via apictl")]
    Export(export::ExportArgs),
    #[command(about = "Import every matching <name>_<version>.zip archive from a directory")]
    Import(import::ImportArgs),
    #[command(about = "Check apictl, configuration and (optionally) an environment without touching any API")]
    Doctor {
        /// Also log in to and list APIs from this environment
        #[arg(short, long)]
        env: Option<String>,
    },
    #[command(about = "Scaffold a default apim-bulk.yaml in the current directory")]
    Init,
    #[command(about = "Manage globally defined environments (list/add/remove)")]
    Env {
        #[command(subcommand)]
        cmd: env::EnvCommands,
    },
    #[command(about = "Delete old run logs")]
    CleanLogs(clean_logs::CleanLogsArgs),
    #[command(about = "Emit a shell completion script")]
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Filter flags shared by `export` and `import`
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Glob on the API name (`*` and `?`); repeatable, comma-separated
    #[arg(short = 'n', long = "name-pattern", value_delimiter = ',')]
    pub name_patterns: Vec<String>,
    /// Explicit API as name:version or name:version:provider; repeatable, comma-separated
    #[arg(short = 'a', long = "api", value_delimiter = ',')]
    pub apis: Vec<String>,
    /// Only APIs owned by this provider
    #[arg(short, long)]
    pub provider: Option<String>,
    /// Only APIs in this lifecycle status (e.g. PUBLISHED)
    #[arg(short, long)]
    pub status: Option<String>,
    /// Show what would be processed without calling apictl or writing logs
    #[arg(long)]
    pub dry_run: bool,
}

impl FilterArgs {
    pub fn build(&self) -> Result<FilterSet> {
        FilterSet::from_args(
            &self.name_patterns,
            &self.apis,
            self.provider.as_deref(),
            self.status.as_deref(),
        )
    }
}

pub async fn run(cmd: Commands, config_path: &Path) -> Result<ExitCode> {
    let cfg = load_repo_config(config_path)?;
    match cmd {
        Commands::Export(args) => Ok(export::run(args, &cfg).await?.exit_code()),
        Commands::Import(args) => Ok(import::run(args, &cfg).await?.exit_code()),
        Commands::Doctor { env } => doctor::run(&cfg, env.as_deref()).await.map(|_| ExitCode::SUCCESS),
        Commands::Init => init::run(config_path).map(|_| ExitCode::SUCCESS),
        Commands::Env { cmd } => env::run(cmd, &cfg).map(|_| ExitCode::SUCCESS),
        Commands::CleanLogs(args) => clean_logs::run(args, &cfg).map(|_| ExitCode::SUCCESS),
        Commands::Completions { shell } => {
            completions::run(shell, &mut io::stdout());
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Pre-flight for anything that talks to an environment: apictl runs,
/// and the environment's login (when configured) succeeds.
pub async fn connect(cfg: &RepoConfig, env: &EnvironmentConfig) -> Result<Apictl> {
    let apictl = Apictl::new(cfg);
    let version = apictl.version().await?;
    tracing::info!("using {} ({})", apictl.program(), version.lines().next().unwrap_or(""));

    if let Some((username, password)) = env.login.credentials()? {
        apictl.login(&env.name, &username, &password).await?;
        tracing::info!("logged in to '{}' as {}", env.name, username);
    }
    Ok(apictl)
}

/// Dry run: classify every entity and print it, nothing else
pub fn preview(entities: &[Entity], filters: &FilterSet, verb: &str) -> RunOutcome {
    let mut out = RunLog::console();
    let plan = plan(entities, filters);
    for entry in &plan.entries {
        if entry.included {
            out.line(&format!("would {verb} {}", entry.entity));
        } else {
            out.line(&format!("would skip {}", entry.entity));
        }
    }
    out.line(&format!(
        "dry run: {} of {} APIs would be {verb}ed, {} skipped",
        plan.matched(),
        plan.entries.len(),
        plan.skipped()
    ));
    RunOutcome::Preview
}

/// Header written at the top of a run transcript
pub fn log_header(log: &mut RunLog, operation: &str, env: &str, filters: &FilterSet, count: usize) {
    log.line(&format!(
        "{operation} started {} against '{env}' with {count} candidate APIs",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    ));
    let active = filters.describe();
    if active.is_empty() {
        log.line("filters: none (all APIs)");
    } else {
        for line in active {
            log.line(&format!("filter {line}"));
        }
    }
}
