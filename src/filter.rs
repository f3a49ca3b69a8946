//! Inclusion filters for a batch run.
//!
//! A [`FilterSet`] is built once from the command-line flags and then only
//! read. Categories combine with AND; values inside a category combine
//! with OR. A category with no values imposes no constraint, so an empty
//! set includes every entity.

use anyhow::{bail, Context, Result};
use regex::Regex;
use std::fmt;

use crate::entity::Entity;

/// Explicit `name:version` or `name:version:provider` selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    pub name: String,
    pub version: String,
    pub provider: Option<String>,
}

impl Selector {
    /// Parse `name:version` or `name:version:provider`.
    ///
    /// Any other field count, or an empty field, is rejected.
    pub fn parse(input: &str) -> Result<Self> {
        let parts: Vec<&str> = input.trim().split(':').collect();
        if parts.iter().any(|p| p.is_empty()) {
            bail!(
                "invalid API selector '{}': fields must not be empty (expected name:version[:provider])",
                input
            );
        }
        match parts.as_slice() {
            [name, version] => Ok(Selector {
                name: name.to_string(),
                version: version.to_string(),
                provider: None,
            }),
            [name, version, provider] => Ok(Selector {
                name: name.to_string(),
                version: version.to_string(),
                provider: Some(provider.to_string()),
            }),
            _ => bail!(
                "invalid API selector '{}': expected name:version or name:version:provider, got {} fields",
                input,
                parts.len()
            ),
        }
    }

    pub fn matches(&self, entity: &Entity) -> bool {
        self.name == entity.name
            && self.version == entity.version
            && self
                .provider
                .as_ref()
                .map_or(true, |p| *p == entity.provider)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.version)?;
        if let Some(provider) = &self.provider {
            write!(f, ":{provider}")?;
        }
        Ok(())
    }
}

/// Shell-style name glob, compiled to an anchored regex.
///
/// `*` matches any run of characters (including none), `?` exactly one
/// character. Everything else is literal and matching is case-sensitive.
#[derive(Debug, Clone)]
pub struct NamePattern {
    raw: String,
    regex: Regex,
}

impl NamePattern {
    /// Surrounding whitespace is dropped, as left by `-n "Foo*, Bar*"`.
    pub fn new(pattern: &str) -> Result<Self> {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            bail!("empty name pattern");
        }
        let mut expr = String::from("(?s)^");
        let mut literal = String::new();
        for c in pattern.chars() {
            match c {
                '*' | '?' => {
                    expr.push_str(&regex::escape(&literal));
                    literal.clear();
                    expr.push_str(if c == '*' { ".*" } else { "." });
                }
                _ => literal.push(c),
            }
        }
        expr.push_str(&regex::escape(&literal));
        expr.push('$');

        let regex = Regex::new(&expr)
            .with_context(|| format!("invalid name pattern '{pattern}'"))?;
        Ok(NamePattern {
            raw: pattern.to_string(),
            regex,
        })
    }

    pub fn matches(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

/// All inclusion criteria for one run.
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    name_patterns: Vec<NamePattern>,
    selectors: Vec<Selector>,
    provider: Option<String>,
    status: Option<String>,
}

impl FilterSet {
    /// Build from raw flag values.
    ///
    /// Selectors and patterns are validated here so a malformed value
    /// fails the run before any entity is listed. Empty provider/status
    /// strings count as unset.
    pub fn from_args(
        name_patterns: &[String],
        selectors: &[String],
        provider: Option<&str>,
        status: Option<&str>,
    ) -> Result<Self> {
        let name_patterns = name_patterns
            .iter()
            .map(|p| NamePattern::new(p))
            .collect::<Result<Vec<_>>>()?;
        let selectors = selectors
            .iter()
            .map(|s| Selector::parse(s))
            .collect::<Result<Vec<_>>>()?;
        Ok(FilterSet {
            name_patterns,
            selectors,
            provider: provider.filter(|p| !p.is_empty()).map(str::to_string),
            status: status.filter(|s| !s.is_empty()).map(str::to_string),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.name_patterns.is_empty()
            && self.selectors.is_empty()
            && self.provider.is_none()
            && self.status.is_none()
    }

    /// Decide whether `entity` takes part in the batch.
    pub fn matches(&self, entity: &Entity) -> bool {
        if !self.selectors.is_empty() && !self.selectors.iter().any(|s| s.matches(entity)) {
            return false;
        }
        if let Some(provider) = &self.provider {
            if entity.provider != *provider {
                return false;
            }
        }
        if let Some(status) = &self.status {
            if entity.status != *status {
                return false;
            }
        }
        if !self.name_patterns.is_empty()
            && !self.name_patterns.iter().any(|p| p.matches(&entity.name))
        {
            return false;
        }
        true
    }

    /// One line per active category, for the run transcript
    pub fn describe(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if !self.selectors.is_empty() {
            let list: Vec<String> = self.selectors.iter().map(|s| s.to_string()).collect();
            lines.push(format!("APIs: {}", list.join(", ")));
        }
        if let Some(provider) = &self.provider {
            lines.push(format!("provider: {provider}"));
        }
        if let Some(status) = &self.status {
            lines.push(format!("status: {status}"));
        }
        if !self.name_patterns.is_empty() {
            let list: Vec<&str> = self.name_patterns.iter().map(|p| p.as_str()).collect();
            lines.push(format!("name patterns: {}", list.join(", ")));
        }
        lines
    }
}
