use anyhow::{Context, Result};
use clap::Args;
use dialoguer::Confirm;
use std::{
    fs,
    path::{Path, PathBuf},
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use crate::{config::RepoConfig, constants::DEFAULT_LOG_RETENTION_DAYS};

#[derive(Args, Debug)]
pub struct CleanLogsArgs {
    /// Remove logs last modified more than this many days ago
    #[arg(long, default_value_t = DEFAULT_LOG_RETENTION_DAYS)]
    pub older_than: u64,
    /// Remove every log regardless of age
    #[arg(long, conflicts_with = "older_than")]
    pub all: bool,
    /// Do not ask for confirmation
    #[arg(short, long)]
    pub yes: bool,
}

const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// Modification time before which a log counts as stale.
///
/// An age reaching back past the epoch clamps to the epoch, so nothing is removed.
pub fn cutoff_for(days: u64) -> SystemTime {
    days.checked_mul(SECS_PER_DAY)
        .and_then(|secs| SystemTime::now().checked_sub(Duration::from_secs(secs)))
        .unwrap_or(UNIX_EPOCH)
}

/// `*.log` files in `dir` modified before `cutoff` (all of them when `None`)
pub fn stale_logs(dir: &Path, cutoff: Option<SystemTime>) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut stale = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("reading {}", dir.display()))? {
        let path = entry?.path();
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("log") {
            continue;
        }
        let keep = match cutoff {
            Some(cutoff) => fs::metadata(&path)?.modified()? >= cutoff,
            None => false,
        };
        if !keep {
            stale.push(path);
        }
    }
    stale.sort();
    Ok(stale)
}

pub fn run(args: CleanLogsArgs, cfg: &RepoConfig) -> Result<()> {
    let dir = cfg.log_dir();
    let cutoff = if args.all {
        None
    } else {
        Some(cutoff_for(args.older_than))
    };

    let stale = stale_logs(&dir, cutoff)?;
    if stale.is_empty() {
        println!("No logs to remove in {}", dir.display());
        return Ok(());
    }

    if !args.yes {
        let confirmed = Confirm::new()
            .with_prompt(format!("Remove {} log files from {}?", stale.len(), dir.display()))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("Aborted");
            return Ok(());
        }
    }

    for path in &stale {
        fs::remove_file(path).with_context(|| format!("removing {}", path.display()))?;
        tracing::debug!("removed {}", path.display());
    }
    println!("removed {} log files from {}", stale.len(), dir.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_stale_logs_only_picks_log_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("export_dev_20240101_000000.log"), "x").unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();
        fs::create_dir(dir.path().join("nested.log")).unwrap();

        let all = stale_logs(dir.path(), None).unwrap();
        assert_eq!(all, vec![dir.path().join("export_dev_20240101_000000.log")]);
    }

    #[test]
    fn test_recent_logs_are_kept() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("import_qa_20240101_000000.log"), "x").unwrap();

        let cutoff = SystemTime::now() - Duration::from_secs(24 * 60 * 60);
        assert!(stale_logs(dir.path(), Some(cutoff)).unwrap().is_empty());
    }

    #[test]
    fn test_cutoff_for_huge_age_clamps_to_epoch() {
        assert_eq!(cutoff_for(u64::MAX), UNIX_EPOCH);
        assert_eq!(cutoff_for(1_000_000_000_000_000), UNIX_EPOCH);
        assert!(cutoff_for(1) < SystemTime::now());
    }

    #[test]
    fn test_run_with_huge_age_keeps_every_log() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("export_dev_20240101_000000.log");
        fs::write(&log, "x").unwrap();
        let cfg = RepoConfig {
            log_dir: Some(dir.path().display().to_string()),
            ..Default::default()
        };

        let args = CleanLogsArgs {
            older_than: 1_000_000_000_000_000,
            all: false,
            yes: true,
        };
        run(args, &cfg).unwrap();

        assert!(log.exists());
    }

    #[test]
    fn test_missing_dir_has_no_logs() {
        let dir = TempDir::new().unwrap();
        assert!(stale_logs(&dir.path().join("logs"), None).unwrap().is_empty());
    }
}
