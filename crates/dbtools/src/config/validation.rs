//! Configuration validation.

use super::{Config, ConnectionConfig};
use crate::drivers::DialectImpl;
use crate::error::{DbToolsError, Result};

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    validate_connection("source", &config.source)?;
    if let Some(target) = &config.target {
        validate_connection("target", target)?;
    }

    if config.copy.table_name_patterns.is_empty() {
        return Err(DbToolsError::Config(
            "copy.table_name_patterns must contain at least one pattern".into(),
        ));
    }
    if config.copy.table_name_patterns.iter().any(|p| p.is_empty()) {
        return Err(DbToolsError::Config(
            "copy.table_name_patterns must not contain empty patterns".into(),
        ));
    }

    for (source, target) in &config.copy.table_name_mappings {
        if source.is_empty() || target.is_empty() {
            return Err(DbToolsError::Config(format!(
                "copy.table_name_mappings has an empty name: '{}' -> '{}'",
                source, target
            )));
        }
    }

    Ok(())
}

/// Validate one connection section.
pub fn validate_connection(section: &str, connection: &ConnectionConfig) -> Result<()> {
    DialectImpl::from_db_type(&connection.driver)
        .map_err(|e| DbToolsError::Config(format!("{}.driver: {}", section, e)))?;
    if connection.url.is_empty() {
        return Err(DbToolsError::Config(format!("{}.url is required", section)));
    }
    Ok(())
}
