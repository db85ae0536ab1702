//! Configuration type definitions.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Database to read from.
    pub source: ConnectionConfig,

    /// Database to copy into. Required by `copy` only.
    #[serde(default)]
    pub target: Option<ConnectionConfig>,

    /// Table selection and copy behavior.
    #[serde(default)]
    pub copy: CopyConfig,
}

/// Connection parameters for one database.
#[derive(Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Driver name: `sqlite` or `postgres` (aliases `postgresql`, `pg`).
    pub driver: String,

    /// Connection URL, e.g. `sqlite:data.db` or `postgres://host/db`.
    pub url: String,

    /// User name, overriding one in the URL.
    #[serde(default)]
    pub user: Option<String>,

    /// Password, overriding one in the URL.
    #[serde(default)]
    pub password: Option<String>,
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("driver", &self.driver)
            .field("url", &self.url)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Table selection and copy behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyConfig {
    /// Inclusion patterns; a table is read if any matches.
    #[serde(default = "default_patterns")]
    pub table_name_patterns: Vec<String>,

    /// Source table name to target table name.
    #[serde(default)]
    pub table_name_mappings: BTreeMap<String, String>,

    /// Delete all target rows of a table before copying into it.
    #[serde(default = "default_true")]
    pub delete_before_copy: bool,

    /// Schema/owner to read the source tables from. All visible schemas if unset.
    #[serde(default)]
    pub source_schema: Option<String>,
}

impl Default for CopyConfig {
    fn default() -> Self {
        Self {
            table_name_patterns: default_patterns(),
            table_name_mappings: BTreeMap::new(),
            delete_before_copy: true,
            source_schema: None,
        }
    }
}

fn default_patterns() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_true() -> bool {
    true
}
