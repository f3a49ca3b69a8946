//! Thin adapter over the `apictl` command-line tool.
//!
//! Every call is a single blocking (awaited) process invocation; success
//! is the exit status, nothing else of the output is interpreted except
//! the API listing.

use anyhow::{anyhow, bail, Context, Result};
use std::{
    io,
    path::Path,
    process::{Output, Stdio},
};
use tokio::{io::AsyncWriteExt, process::Command};

use crate::{
    config::RepoConfig,
    entity::{parse_listing, Entity},
    runlog::RunLog,
};

pub struct Apictl {
    program: String,
}

/// Options for `apictl export api`
#[derive(Debug, Clone, Copy)]
pub struct ExportOptions {
    pub preserve_status: bool,
}

/// Options for `apictl import api`
#[derive(Debug, Clone, Default)]
pub struct ImportOptions<'a> {
    pub params: Option<&'a Path>,
    pub update: bool,
    pub preserve_provider: bool,
}

impl Apictl {
    pub fn new(cfg: &RepoConfig) -> Self {
        Apictl {
            program: cfg.apictl().to_string(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn spawn_error(&self, e: io::Error) -> anyhow::Error {
        if e.kind() == io::ErrorKind::NotFound {
            anyhow!("'{}' not found; install apictl or set `apictl` in the config", self.program)
        } else {
            anyhow!(e).context(format!("running {}", self.program))
        }
    }

    async fn exec(&self, args: &[String]) -> Result<Output> {
        tracing::debug!("{} {}", self.program, args.join(" "));
        Command::new(&self.program)
            .args(args)
            .output()
            .await
            .map_err(|e| self.spawn_error(e))
    }

    /// Pre-flight: the binary exists and runs
    pub async fn version(&self) -> Result<String> {
        let out = self.exec(&["version".to_string()]).await?;
        if !out.status.success() {
            bail!("{} version failed: {}", self.program, failure_text(&out));
        }
        Ok(String::from_utf8_lossy(&out.stdout).trim().to_string())
    }

    /// The password goes to apictl on stdin so it never shows up in argv.
    pub async fn login(&self, env: &str, username: &str, password: &str) -> Result<()> {
        let args = ["login", env, "-u", username, "--password-stdin", "-k"];
        tracing::debug!("{} {}", self.program, args.join(" "));
        let mut child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.spawn_error(e))?;
        if let Some(mut stdin) = child.stdin.take() {
            // apictl may exit before reading; its status is what counts
            if let Err(e) = stdin.write_all(format!("{password}\n").as_bytes()).await {
                tracing::debug!("writing password to {}: {e}", self.program);
            }
        }
        let out = child
            .wait_with_output()
            .await
            .with_context(|| format!("waiting for {} login", self.program))?;
        if !out.status.success() {
            bail!("login to '{}' as {} failed: {}", env, username, failure_text(&out));
        }
        Ok(())
    }

    /// List every API in `env`
    ///
    /// A failing call is a pre-flight error; a successful call that yields
    /// no usable records is a listing error.
    pub async fn list_apis(&self, env: &str, limit: u32) -> Result<Vec<Entity>> {
        let args = vec![
            "get".to_string(),
            "apis".to_string(),
            "-e".to_string(),
            env.to_string(),
            "--limit".to_string(),
            limit.to_string(),
            "--format".to_string(),
            "{{ json . }}".to_string(),
        ];
        let out = self.exec(&args).await?;
        if !out.status.success() {
            bail!("listing APIs in '{}' failed: {}", env, failure_text(&out));
        }
        let stdout = String::from_utf8_lossy(&out.stdout);
        let entities = parse_listing(&stdout);
        if entities.is_empty() {
            bail!("listing APIs in '{}' returned no usable records", env);
        }
        if limit > 0 && entities.len() as u64 >= u64::from(limit) {
            tracing::warn!(
                "listing returned {} APIs, the configured limit; raise `listLimit` if APIs are missing",
                entities.len()
            );
        }
        Ok(entities)
    }

    pub async fn export_api(&self, entity: &Entity, env: &str, opts: ExportOptions) -> Result<Output> {
        let mut args = vec![
            "export".to_string(),
            "api".to_string(),
            "-n".to_string(),
            entity.name.clone(),
            "-v".to_string(),
            entity.version.clone(),
        ];
        if !entity.provider.is_empty() {
            args.push("-r".to_string());
            args.push(entity.provider.clone());
        }
        args.push("-e".to_string());
        args.push(env.to_string());
        args.push(format!("--preserve-status={}", opts.preserve_status));
        self.exec(&args).await
    }

    pub async fn import_api(&self, archive: &Path, env: &str, opts: &ImportOptions<'_>) -> Result<Output> {
        let mut args = vec![
            "import".to_string(),
            "api".to_string(),
            "-f".to_string(),
            archive.display().to_string(),
            "-e".to_string(),
            env.to_string(),
        ];
        if let Some(params) = opts.params {
            args.push("--params".to_string());
            args.push(params.display().to_string());
        }
        if opts.update {
            args.push("--update".to_string());
        }
        args.push(format!("--preserve-provider={}", opts.preserve_provider));
        self.exec(&args).await
    }
}

/// stderr if present, otherwise stdout, otherwise the exit status
pub fn failure_text(out: &Output) -> String {
    let stderr = String::from_utf8_lossy(&out.stderr).trim().to_string();
    if !stderr.is_empty() {
        return stderr;
    }
    let stdout = String::from_utf8_lossy(&out.stdout).trim().to_string();
    if !stdout.is_empty() {
        return stdout;
    }
    out.status.to_string()
}

/// Turn a finished call into the batch outcome, keeping its output in the log
pub fn check(out: &Output, log: &mut RunLog) -> Result<()> {
    let stdout = String::from_utf8_lossy(&out.stdout);
    let stderr = String::from_utf8_lossy(&out.stderr);
    if !stdout.trim().is_empty() {
        log.detail(stdout.trim_end());
    }
    if !stderr.trim().is_empty() {
        log.detail(stderr.trim_end());
    }
    if !out.status.success() {
        bail!("{} ({})", failure_text(out), out.status);
    }
    Ok(())
}
