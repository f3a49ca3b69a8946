use crate::config::{
    load_global_config, save_global_config, EnvironmentConfig, LoginConfig, RepoConfig,
};
use anyhow::{anyhow, Result};
use clap::Subcommand;
use dialoguer::{Input, Select};

#[derive(Subcommand, Debug)]
pub enum EnvCommands {
    /// List environments (global, external and project)
    List,
    /// Add a new global environment
    Add,
    /// Remove a global environment by name
    Remove { name: String },
}

fn prompt(msg: &str) -> Result<String> {
    let val: String = Input::new().with_prompt(msg).interact_text()?;
    let val = val.trim().to_string();
    if val.is_empty() {
        Err(anyhow!("{} cannot be empty", msg))
    } else {
        Ok(val)
    }
}

pub fn run(cmd: EnvCommands, cfg: &RepoConfig) -> Result<()> {
    let mut global = load_global_config()?;

    match cmd {
        EnvCommands::List => {
            let merged = cfg.merge_environments(global)?;
            if merged.is_empty() {
                println!("(no environments defined)");
            }
            for e in &merged {
                let login = match &e.login {
                    LoginConfig::None => "existing session".to_string(),
                    LoginConfig::Password { username, .. } => format!("password as {username}"),
                };
                match &e.params_file {
                    Some(params) => println!(" - {} (login: {login}, params: {params})", e.name),
                    None => println!(" - {} (login: {login})", e.name),
                }
            }
        }
        EnvCommands::Add => {
            let name = prompt("Environment name")?;
            if global.environments.iter().any(|e| e.name == name) {
                return Err(anyhow!("environment '{}' already exists", name));
            }

            let login_options = ["existing apictl session", "username + password env var"];
            let selection = Select::new()
                .with_prompt("Login")
                .items(&login_options)
                .default(0)
                .interact()?;
            let login = match selection {
                0 => LoginConfig::None,
                _ => LoginConfig::Password {
                    username: prompt("Username")?,
                    password_env: prompt("Password env var")?,
                },
            };

            let params: String = Input::new()
                .with_prompt("Default params file (empty for none)")
                .allow_empty(true)
                .interact_text()?;

            global.environments.push(EnvironmentConfig {
                name: name.clone(),
                login,
                params_file: Some(params.trim().to_string()).filter(|p| !p.is_empty()),
            });
            let path = save_global_config(&global)?;
            println!("✅ Added environment '{name}' to {}", path.display());
        }
        EnvCommands::Remove { name } => {
            let before = global.environments.len();
            global.environments.retain(|e| e.name != name);
            if global.environments.len() == before {
                println!("no such environment '{name}'");
            } else {
                save_global_config(&global)?;
                println!("removed '{name}'");
            }
        }
    }

    Ok(())
}
