use anyhow::{Context, Result};
use clap::{ArgAction, Args};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    apictl::{self, Apictl, ExportOptions},
    batch::{run_batch, Performer},
    config::RepoConfig,
    entity::Entity,
    runlog::RunLog,
    summary::{report, RunOutcome},
};

use super::{connect, log_header, preview, FilterArgs};

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Source environment, as known to apictl
    #[arg(short, long)]
    pub env: String,
    /// Move exported archives into this directory
    #[arg(short = 'd', long)]
    pub output_dir: Option<PathBuf>,
    /// Keep the lifecycle status in the exported archive
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub preserve_status: bool,
    #[command(flatten)]
    pub filters: FilterArgs,
}

struct Exporter<'a> {
    apictl: &'a Apictl,
    env: &'a str,
    opts: ExportOptions,
    archive_dir: PathBuf,
    output_dir: Option<&'a Path>,
}

impl Performer for Exporter<'_> {
    fn verb(&self) -> &'static str {
        "export"
    }

    async fn perform(&mut self, entity: &Entity, log: &mut RunLog) -> Result<()> {
        let out = self.apictl.export_api(entity, self.env, self.opts).await?;
        apictl::check(&out, log)?;

        if let Some(dest) = self.output_dir {
            let archive = self.archive_dir.join(entity.archive_file_name());
            let target = relocate(&archive, dest)?;
            log.detail(&format!("archive saved to {}", target.display()));
        }
        Ok(())
    }
}

/// Move `archive` into `dir`, falling back to copy + delete across filesystems
fn relocate(archive: &Path, dir: &Path) -> Result<PathBuf> {
    let file_name = archive
        .file_name()
        .with_context(|| format!("no file name in {}", archive.display()))?;
    let target = dir.join(file_name);
    if fs::rename(archive, &target).is_err() {
        fs::copy(archive, &target).with_context(|| {
            format!("copying {} to {}", archive.display(), target.display())
        })?;
        fs::remove_file(archive)
            .with_context(|| format!("removing {}", archive.display()))?;
    }
    Ok(target)
}

pub async fn run(args: ExportArgs, cfg: &RepoConfig) -> Result<RunOutcome> {
    cfg.validate()?;
    let filters = args.filters.build()?;
    let env = cfg.environment(&args.env)?;

    let apictl = connect(cfg, &env).await?;
    let entities = apictl.list_apis(&env.name, cfg.list_limit()).await?;

    if args.filters.dry_run {
        return Ok(preview(&entities, &filters, "export"));
    }

    if let Some(dir) = &args.output_dir {
        fs::create_dir_all(dir)
            .with_context(|| format!("creating output directory {}", dir.display()))?;
    }

    let mut log = RunLog::create(&cfg.log_dir(), "export", &env.name)?;
    log_header(&mut log, "export", &env.name, &filters, entities.len());

    let mut exporter = Exporter {
        apictl: &apictl,
        env: &env.name,
        opts: ExportOptions {
            preserve_status: args.preserve_status,
        },
        archive_dir: cfg.export_dir(&env.name),
        output_dir: args.output_dir.as_deref(),
    };
    let result = run_batch(&entities, &filters, &mut exporter, &mut log).await;
    Ok(report(&result, "export", &mut log))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_relocate_moves_archive() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let archive = src.path().join("PizzaShack_1.0.0.zip");
        fs::write(&archive, b"PK").unwrap();

        let target = relocate(&archive, dst.path()).unwrap();

        assert_eq!(target, dst.path().join("PizzaShack_1.0.0.zip"));
        assert!(target.exists());
        assert!(!archive.exists());
    }

    #[test]
    fn test_relocate_missing_archive_fails() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        assert!(relocate(&src.path().join("Missing_1.zip"), dst.path()).is_err());
    }
}
