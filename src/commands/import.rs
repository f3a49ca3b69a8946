use anyhow::{bail, Context, Result};
use clap::{ArgAction, Args};
use std::path::{Path, PathBuf};

use crate::{
    apictl::{self, Apictl, ImportOptions},
    batch::{run_batch, Performer},
    config::RepoConfig,
    entity::{discover_archives, Entity},
    runlog::RunLog,
    summary::{report, RunOutcome},
};

use super::{connect, log_header, preview, FilterArgs};

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Target environment, as known to apictl
    #[arg(short, long)]
    pub env: String,
    /// Directory holding <name>_<version>.zip archives
    #[arg(short = 'd', long)]
    pub input_dir: PathBuf,
    /// apictl params file overriding per-environment settings
    #[arg(long)]
    pub params: Option<PathBuf>,
    /// Update APIs that already exist in the target environment
    #[arg(long)]
    pub update: bool,
    /// Keep the provider recorded in the archive
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub preserve_provider: bool,
    #[command(flatten)]
    pub filters: FilterArgs,
}

struct Importer<'a> {
    apictl: &'a Apictl,
    env: &'a str,
    opts: ImportOptions<'a>,
}

impl Performer for Importer<'_> {
    fn verb(&self) -> &'static str {
        "import"
    }

    async fn perform(&mut self, entity: &Entity, log: &mut RunLog) -> Result<()> {
        let archive = entity
            .archive
            .as_deref()
            .with_context(|| format!("{entity} has no archive on disk"))?;
        let out = self.apictl.import_api(archive, self.env, &self.opts).await?;
        apictl::check(&out, log)
    }
}

pub async fn run(args: ImportArgs, cfg: &RepoConfig) -> Result<RunOutcome> {
    cfg.validate()?;
    let filters = args.filters.build()?;
    let env = cfg.environment(&args.env)?;

    let entities = discover_archives(&args.input_dir)?;
    if entities.is_empty() {
        bail!(
            "no <name>_<version>.zip archives found in {}",
            args.input_dir.display()
        );
    }

    if args.filters.dry_run {
        return Ok(preview(&entities, &filters, "import"));
    }

    let params = args
        .params
        .clone()
        .or_else(|| env.params_file.as_ref().map(PathBuf::from));
    if let Some(path) = &params {
        ensure_file(path)?;
    }

    let apictl = connect(cfg, &env).await?;

    let mut log = RunLog::create(&cfg.log_dir(), "import", &env.name)?;
    log_header(&mut log, "import", &env.name, &filters, entities.len());
    if let Some(path) = &params {
        log.line(&format!("params file: {}", path.display()));
    }

    let mut importer = Importer {
        apictl: &apictl,
        env: &env.name,
        opts: ImportOptions {
            params: params.as_deref(),
            update: args.update,
            preserve_provider: args.preserve_provider,
        },
    };
    let result = run_batch(&entities, &filters, &mut importer, &mut log).await;
    Ok(report(&result, "import", &mut log))
}

fn ensure_file(path: &Path) -> Result<()> {
    if !path.is_file() {
        bail!("params file {} does not exist", path.display());
    }
    Ok(())
}
