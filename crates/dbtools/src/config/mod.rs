//! Configuration loading, validation and command line value parsing.

mod types;
mod validation;

pub use types::*;
pub use validation::validate_connection;

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{DbToolsError, Result};

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }

    /// The target connection, required for copying.
    pub fn require_target(&self) -> Result<&ConnectionConfig> {
        self.target
            .as_ref()
            .ok_or_else(|| DbToolsError::Config("a target connection is required".into()))
    }
}

/// Split a comma-separated pattern list such as `"ORDERS,*_LOG"`.
///
/// Tokens are trimmed and empty tokens dropped; an empty list yields `["*"]`.
pub fn parse_table_name_patterns(value: &str) -> Vec<String> {
    let patterns: Vec<String> = value
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect();
    if patterns.is_empty() {
        vec!["*".to_string()]
    } else {
        patterns
    }
}

/// Parse a comma-separated `source=target` mapping list.
///
/// # Errors
///
/// Returns a configuration error for a token without `=` or with an empty side.
pub fn parse_table_name_mappings(value: &str) -> Result<BTreeMap<String, String>> {
    let mut mappings = BTreeMap::new();
    for token in value.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let (source, target) = token.split_once('=').ok_or_else(|| {
            DbToolsError::Config(format!(
                "invalid table name mapping '{}': expected SOURCE=TARGET",
                token
            ))
        })?;
        let (source, target) = (source.trim(), target.trim());
        if source.is_empty() || target.is_empty() {
            return Err(DbToolsError::Config(format!(
                "invalid table name mapping '{}': both names are required",
                token
            )));
        }
        mappings.insert(source.to_string(), target.to_string());
    }
    Ok(mappings)
}
