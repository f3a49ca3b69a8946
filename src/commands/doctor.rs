use anyhow::{Context, Result};

use crate::{
    apictl::Apictl,
    config::{load_global_config, LoginConfig, RepoConfig},
};

use super::connect;

pub async fn run(cfg: &RepoConfig, env: Option<&str>) -> Result<()> {
    // 1) project file semantics
    cfg.validate()?;
    let merged = cfg.merge_environments(load_global_config()?)?;

    // 2) apictl runs
    let version = Apictl::new(cfg).version().await?;
    println!("✔️  {} → {}", cfg.apictl(), version.lines().next().unwrap_or("ok"));

    // 3) every configured login can resolve its password
    for e in &merged {
        if let LoginConfig::Password { password_env, .. } = &e.login {
            e.login
                .credentials()
                .with_context(|| format!("environment '{}'", e.name))?;
            println!("✔️  {}: password from {}", e.name, password_env);
        }
    }

    // 4) optional live check
    if let Some(name) = env {
        let env = cfg.environment(name)?;
        let apictl = connect(cfg, &env).await?;
        let apis = apictl.list_apis(&env.name, cfg.list_limit()).await?;
        println!("✔️  {}: {} APIs listed", env.name, apis.len());
    }

    println!("✅ doctor checks passed");
    Ok(())
}
