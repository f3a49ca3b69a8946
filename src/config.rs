//! Configuration management for apim-bulk
//!
//! Two files feed the configuration:
//! - the project file `apim-bulk.yaml` (optional, selected with `--config`)
//! - the global environments file `~/.config/apim-bulk/environments.yaml`,
//!   or the path in `APIM_BULK_ENVIRONMENTS_PATH`
//!
//! ## Environment Variable Expansion
//!
//! The project file supports shell-style placeholders, expanded before parsing:
//! - `${VAR}` - Simple substitution
//! - `${VAR:-default}` - Use default if VAR is unset or empty
//! - `${VAR-default}` - Use default if VAR is unset
//! - `${VAR:+alt}` - Use alt if VAR is set and non-empty
//! - `${VAR+alt}` - Use alt if VAR is set

use anyhow::{bail, Context};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;
use std::{env, fs, path::PathBuf};

use crate::constants::{
    DEFAULT_APICTL, DEFAULT_LIST_LIMIT, DEFAULT_LOG_DIR, ENVIRONMENTS_PATH_ENV,
    GLOBAL_ENVIRONMENTS_FILE,
};

/// Project configuration loaded from `apim-bulk.yaml`
///
/// # Example
///
/// ```yaml
/// apictl: /opt/apictl/apictl
/// logDir: logs
/// listLimit: 500
/// externalEnvironmentsFile: ${APIM_SHARED_ENVS:-}
/// environments:
///   - name: dev
///     login:
///       type: password
///       username: admin
///       passwordEnv: APIM_DEV_PASSWORD
///   - name: prod
///     paramsFile: params/prod.yaml
/// ```
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct RepoConfig {
    /// Path or name of the apictl binary
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apictl: Option<String>,
    /// Directory receiving run logs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<String>,
    /// Value for `apictl get apis --limit`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_limit: Option<u32>,
    /// Directory where apictl leaves exported archives
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_dir: Option<String>,
    /// Optional path to a shared environments file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_environments_file: Option<String>,
    /// Environment definitions specific to this project
    #[serde(default)]
    pub environments: Vec<EnvironmentConfig>,
}

/// An apictl environment, as registered with `apictl add env`
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentConfig {
    pub name: String,
    #[serde(default)]
    pub login: LoginConfig,
    /// Default `--params` file for imports into this environment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params_file: Option<String>,
}

/// How to log in to an environment before a run.
///
/// Passwords are only ever read from environment variables.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[serde(tag = "type")]
pub enum LoginConfig {
    /// Rely on an existing apictl session
    #[default]
    None,
    Password {
        username: String,
        /// Environment variable containing the password
        #[serde(rename = "passwordEnv")]
        password_env: String,
    },
}

/// Shared environment definitions
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct GlobalConfig {
    #[serde(default)]
    pub environments: Vec<EnvironmentConfig>,
}

impl RepoConfig {
    pub fn apictl(&self) -> &str {
        self.apictl.as_deref().unwrap_or(DEFAULT_APICTL)
    }

    pub fn log_dir(&self) -> PathBuf {
        PathBuf::from(self.log_dir.as_deref().unwrap_or(DEFAULT_LOG_DIR))
    }

    pub fn list_limit(&self) -> u32 {
        self.list_limit.unwrap_or(DEFAULT_LIST_LIMIT)
    }

    /// Directory where apictl writes `<name>_<version>.zip` for `env`
    pub fn export_dir(&self, env: &str) -> PathBuf {
        match &self.export_dir {
            Some(dir) => PathBuf::from(dir),
            None => {
                let mut p = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
                p.push(".wso2apictl/exported/apis");
                p.push(env);
                p
            }
        }
    }

    /// Merge global, external, and project environments
    ///
    /// Later sources win on name clashes:
    /// 1. Global environments file
    /// 2. External file named by `externalEnvironmentsFile`
    /// 3. Project-local environments
    ///
    /// The result is sorted by name.
    pub fn merge_environments(
        &self,
        global: GlobalConfig,
    ) -> anyhow::Result<Vec<EnvironmentConfig>> {
        let mut map = HashMap::new();
        for e in global.environments {
            map.insert(e.name.clone(), e);
        }
        if let Some(path) = self.external_environments_file.as_deref().filter(|p| !p.is_empty()) {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("reading external environments from {path}"))?;
            let ext: GlobalConfig = serde_yaml::from_str(&contents)
                .with_context(|| format!("parsing external environments from {path}"))?;
            for e in ext.environments {
                map.insert(e.name.clone(), e);
            }
        }
        for e in &self.environments {
            map.insert(e.name.clone(), e.clone());
        }
        let mut merged: Vec<EnvironmentConfig> = map.into_values().collect();
        merged.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(merged)
    }

    /// Look up `name` among the merged environments.
    ///
    /// An environment nobody configured is still usable: it simply has no
    /// login step and no default params file.
    pub fn environment(&self, name: &str) -> anyhow::Result<EnvironmentConfig> {
        let merged = self.merge_environments(load_global_config()?)?;
        Ok(merged
            .into_iter()
            .find(|e| e.name == name)
            .unwrap_or_else(|| EnvironmentConfig {
                name: name.to_string(),
                ..Default::default()
            }))
    }

    /// Reject duplicate environment names inside the project file
    pub fn validate(&self) -> anyhow::Result<()> {
        let mut seen = std::collections::HashSet::new();
        for e in &self.environments {
            if e.name.trim().is_empty() {
                bail!("environment with an empty name");
            }
            if !seen.insert(e.name.as_str()) {
                bail!("duplicate environment '{}'", e.name);
            }
        }
        if self.list_limit == Some(0) {
            bail!("listLimit must be greater than 0");
        }
        Ok(())
    }
}

impl LoginConfig {
    /// Resolve `(username, password)`, or `None` when no login is configured
    pub fn credentials(&self) -> anyhow::Result<Option<(String, String)>> {
        match self {
            LoginConfig::None => Ok(None),
            LoginConfig::Password {
                username,
                password_env,
            } => {
                let pw = env::var(password_env)
                    .with_context(|| format!("password variable {password_env} is not set"))?;
                Ok(Some((username.clone(), pw)))
            }
        }
    }
}

/// Load the project configuration; a missing file yields the defaults
pub fn load_repo_config(path: &Path) -> anyhow::Result<RepoConfig> {
    if !path.exists() {
        tracing::debug!("No config at {}, using defaults", path.display());
        return Ok(RepoConfig::default());
    }
    let preprocessed = preprocess_config(path)?;
    let cfg: RepoConfig = serde_yaml::from_str(&preprocessed)
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(cfg)
}

pub fn save_repo_config(cfg: &RepoConfig, path: &Path) -> anyhow::Result<()> {
    let data = serde_yaml::to_string(cfg)?;
    fs::write(path, data).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

fn global_config_path() -> PathBuf {
    env::var(ENVIRONMENTS_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let mut p = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
            p.push(GLOBAL_ENVIRONMENTS_FILE);
            p
        })
}

pub fn load_global_config() -> anyhow::Result<GlobalConfig> {
    let path = global_config_path();
    if !path.exists() {
        return Ok(GlobalConfig::default());
    }
    let data = fs::read_to_string(&path)
        .with_context(|| format!("reading global environments {}", path.display()))?;
    let cfg: GlobalConfig = serde_yaml::from_str(&data)
        .with_context(|| format!("parsing global environments {}", path.display()))?;
    Ok(cfg)
}

pub fn save_global_config(cfg: &GlobalConfig) -> anyhow::Result<PathBuf> {
    let path = global_config_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let data = serde_yaml::to_string(cfg)?;
    fs::write(&path, data)?;
    Ok(path)
}

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?:(:?[-+])([^}]*))?\}")
            .unwrap_or_else(|e| unreachable!("placeholder regex is valid: {e}"))
    })
}

/// What one `${NAME<op>word}` placeholder becomes, given the current value of `NAME`.
///
/// `:-`/`:+` treat an empty variable like an unset one; `-`/`+` only look at
/// whether it is set.
fn substitute<'a>(value: Option<&'a str>, op: &str, word: &'a str) -> &'a str {
    let set = value.is_some();
    let filled = value.is_some_and(|v| !v.is_empty());
    let current = value.unwrap_or_default();
    match op {
        ":-" if filled => current,
        ":-" => word,
        "-" if set => current,
        "-" => word,
        ":+" if filled => word,
        "+" if set => word,
        ":+" | "+" => "",
        _ => current,
    }
}

pub fn expand_env_placeholders(input: &str) -> String {
    placeholder_regex()
        .replace_all(input, |caps: &regex::Captures| {
            let value = env::var(&caps[1]).ok();
            let op = caps.get(2).map_or("", |m| m.as_str());
            let word = caps.get(3).map_or("", |m| m.as_str());
            substitute(value.as_deref(), op, word).to_string()
        })
        .into_owned()
}

pub fn preprocess_config(path: &Path) -> anyhow::Result<String> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(expand_env_placeholders(&raw))
}
