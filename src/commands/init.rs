use anyhow::Result;
use std::path::Path;

use crate::config::{save_repo_config, RepoConfig};
use crate::constants::{DEFAULT_APICTL, DEFAULT_LIST_LIMIT, DEFAULT_LOG_DIR};

pub fn run(path: &Path) -> Result<()> {
    if path.exists() {
        println!("Config already exists at {}", path.display());
        return Ok(());
    }

    let repo = RepoConfig {
        apictl: Some(DEFAULT_APICTL.into()),
        log_dir: Some(DEFAULT_LOG_DIR.into()),
        list_limit: Some(DEFAULT_LIST_LIMIT),
        external_environments_file: Some("${APIM_BULK_SHARED_ENVIRONMENTS:-}".into()),
        ..Default::default()
    };
    save_repo_config(&repo, path)?;
    println!("Created {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_repo_config;
    use tempfile::TempDir;

    #[test]
    fn test_init_writes_loadable_config_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("apim-bulk.yaml");

        run(&path).unwrap();
        let cfg = load_repo_config(&path).unwrap();
        assert_eq!(cfg.apictl(), DEFAULT_APICTL);
        assert_eq!(cfg.list_limit(), DEFAULT_LIST_LIMIT);

        std::fs::write(&path, "apictl: custom\n").unwrap();
        run(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "apictl: custom\n");
    }
}
