//! API entities participating in a batch.
//!
//! Entities come from two listers: the remote `apictl get apis` listing
//! (one JSON record per line) and the local archive directory used by
//! imports, where name and version are recovered from the file name.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{
    fmt,
    fs,
    path::{Path, PathBuf},
};

use crate::constants::ARCHIVE_EXTENSION;

/// One remote API or local archive.
///
/// `provider` and `status` are empty strings when the lister cannot know
/// them (local archives). Empty values never satisfy an equality filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub name: String,
    pub version: String,
    pub provider: String,
    pub status: String,
    /// Archive on disk, set only for entities discovered locally
    pub archive: Option<PathBuf>,
}

impl Entity {
    pub fn new(name: &str, version: &str, provider: &str, status: &str) -> Self {
        Entity {
            name: name.to_string(),
            version: version.to_string(),
            provider: provider.to_string(),
            status: status.to_string(),
            archive: None,
        }
    }

    /// `<name>_<version>.zip`, the file name apictl gives exported archives
    pub fn archive_file_name(&self) -> String {
        format!("{}_{}.{}", self.name, self.version, ARCHIVE_EXTENSION)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.version)?;
        if !self.provider.is_empty() {
            write!(f, " (provider={})", self.provider)?;
        }
        if !self.status.is_empty() {
            write!(f, " [{}]", self.status)?;
        }
        Ok(())
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListedApi {
    #[serde(default)]
    name: String,
    #[serde(default)]
    version: String,
    #[serde(default)]
    provider: String,
    #[serde(default, alias = "status")]
    life_cycle_status: String,
}

/// Parse the output of `apictl get apis --format "{{ json . }}"`.
///
/// Blank lines and banner text are ignored; records without a name or
/// version cannot take part in filtering and are dropped.
pub fn parse_listing(output: &str) -> Vec<Entity> {
    let mut entities = Vec::new();
    for line in output.lines().map(str::trim) {
        if !line.starts_with('{') {
            continue;
        }
        let api: ListedApi = match serde_json::from_str(line) {
            Ok(api) => api,
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring unparsable listing record: {}", line);
                continue;
            }
        };
        if api.name.is_empty() || api.version.is_empty() {
            tracing::warn!("Ignoring listing record without name or version: {}", line);
            continue;
        }
        entities.push(Entity::new(
            &api.name,
            &api.version,
            &api.provider,
            &api.life_cycle_status,
        ));
    }
    entities
}

/// Recover `(name, version)` from `<name>_<version>.zip`.
///
/// The split happens at the last underscore so API names may contain
/// underscores themselves.
pub fn parse_archive_name(file_name: &str) -> Option<(String, String)> {
    let stem = file_name.strip_suffix(&format!(".{ARCHIVE_EXTENSION}"))?;
    let (name, version) = stem.rsplit_once('_')?;
    if name.is_empty() || version.is_empty() {
        return None;
    }
    Some((name.to_string(), version.to_string()))
}

/// Discover importable archives in `dir` (not recursive), sorted by file name.
pub fn discover_archives(dir: &Path) -> Result<Vec<Entity>> {
    let read = fs::read_dir(dir)
        .with_context(|| format!("reading archive directory {}", dir.display()))?;

    let mut files = Vec::new();
    for entry in read {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) != Some(ARCHIVE_EXTENSION) {
            continue;
        }
        files.push(path);
    }
    files.sort();

    let mut entities = Vec::new();
    for path in files {
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        match parse_archive_name(file_name) {
            Some((name, version)) => entities.push(Entity {
                name,
                version,
                provider: String::new(),
                status: String::new(),
                archive: Some(path.clone()),
            }),
            None => {
                tracing::warn!(
                    "Ignoring {}: expected <name>_<version>.{}",
                    path.display(),
                    ARCHIVE_EXTENSION
                );
            }
        }
    }
    Ok(entities)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_listing_json_lines() {
        let out = r#"
{"id":"1","name":"PizzaShack","context":"/pizza","version":"1.0.0","provider":"admin","lifeCycleStatus":"PUBLISHED"}
{"id":"2","name":"Payments","context":"/pay","version":"2.1","provider":"alice","lifeCycleStatus":"CREATED"}
"#;
        let entities = parse_listing(out);
        assert_eq!(entities.len(), 2);
        assert_eq!(
            entities[0],
            Entity::new("PizzaShack", "1.0.0", "admin", "PUBLISHED")
        );
        assert_eq!(entities[1].status, "CREATED");
    }

    #[test]
    fn test_parse_listing_skips_noise_and_incomplete_records() {
        let out = "Environment: dev\n\n{not json}\n{\"name\":\"NoVersion\"}\n{\"name\":\"A\",\"version\":\"1\",\"status\":\"PUBLISHED\"}\n";
        let entities = parse_listing(out);
        assert_eq!(entities, vec![Entity::new("A", "1", "", "PUBLISHED")]);
    }

    #[test]
    fn test_parse_listing_keeps_duplicates_in_order() {
        let out = "{\"name\":\"B\",\"version\":\"1\"}\n{\"name\":\"A\",\"version\":\"1\"}\n{\"name\":\"B\",\"version\":\"1\"}";
        let names: Vec<_> = parse_listing(out).into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["B", "A", "B"]);
    }

    #[test]
    fn test_parse_archive_name() {
        assert_eq!(
            parse_archive_name("PizzaShack_1.0.0.zip"),
            Some(("PizzaShack".to_string(), "1.0.0".to_string()))
        );
        assert_eq!(
            parse_archive_name("order_service_v2.zip"),
            Some(("order_service".to_string(), "v2".to_string()))
        );
        assert_eq!(parse_archive_name("noversion.zip"), None);
        assert_eq!(parse_archive_name("_1.0.zip"), None);
        assert_eq!(parse_archive_name("Api_.zip"), None);
        assert_eq!(parse_archive_name("Api_1.0.tar"), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            Entity::new("A", "1.0", "p1", "PUBLISHED").to_string(),
            "A:1.0 (provider=p1) [PUBLISHED]"
        );
        assert_eq!(Entity::new("A", "1.0", "", "").to_string(), "A:1.0");
    }
}
