//! Database driver implementations.
//!
//! Each driver provides a [`DbConnection`] over one `sqlx` connection plus the
//! matching [`Dialect`]:
//!
//! - [`sqlite`]: SQLite (file or in-memory)
//! - [`postgres`]: PostgreSQL
//!
//! # Adding New Databases
//!
//! 1. Create a new module under `drivers/` with a connection and a dialect
//! 2. Add an enum variant to `DialectImpl`
//! 3. Accept the driver name in `DialectImpl::from_db_type` and open it in `connect`

pub mod postgres;
pub mod sqlite;

pub use postgres::{PostgresConnection, PostgresDialect};
pub use sqlite::{SqliteConnection, SqliteDialect};

use crate::config::ConnectionConfig;
use crate::core::traits::{DbConnection, Dialect};
use crate::error::{DbToolsError, Result};

/// Enum-based static dispatch for dialects.
#[derive(Debug, Clone)]
pub enum DialectImpl {
    Sqlite(SqliteDialect),
    Postgres(PostgresDialect),
}

impl Dialect for DialectImpl {
    fn name(&self) -> &str {
        match self {
            DialectImpl::Sqlite(d) => d.name(),
            DialectImpl::Postgres(d) => d.name(),
        }
    }

    fn param_placeholder(&self, index: usize) -> String {
        match self {
            DialectImpl::Sqlite(d) => d.param_placeholder(index),
            DialectImpl::Postgres(d) => d.param_placeholder(index),
        }
    }
}

impl Default for DialectImpl {
    fn default() -> Self {
        DialectImpl::Sqlite(SqliteDialect::new())
    }
}

impl DialectImpl {
    /// Create a dialect implementation from a driver name.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver name is not recognized.
    pub fn from_db_type(db_type: &str) -> Result<Self> {
        match db_type.to_lowercase().as_str() {
            "sqlite" | "sqlite3" => Ok(DialectImpl::Sqlite(SqliteDialect::new())),
            "postgres" | "postgresql" | "pg" => Ok(DialectImpl::Postgres(PostgresDialect::new())),
            other => Err(DbToolsError::Config(format!(
                "Unknown database driver: '{}'. Supported drivers: sqlite, postgres",
                other
            ))),
        }
    }
}

/// Open a connection for the configured driver.
pub async fn connect(config: &ConnectionConfig) -> Result<Box<dyn DbConnection>> {
    match DialectImpl::from_db_type(&config.driver)? {
        DialectImpl::Sqlite(_) => Ok(Box::new(SqliteConnection::open(&config.url).await?)),
        DialectImpl::Postgres(_) => Ok(Box::new(
            PostgresConnection::open(
                &config.url,
                config.user.as_deref(),
                config.password.as_deref(),
            )
            .await?,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_db_type() {
        assert_eq!(DialectImpl::from_db_type("sqlite").unwrap().name(), "sqlite");
        assert_eq!(DialectImpl::from_db_type("PostgreSQL").unwrap().name(), "postgres");
        assert_eq!(DialectImpl::from_db_type("pg").unwrap().name(), "postgres");

        let err = DialectImpl::from_db_type("oracle").unwrap_err();
        assert!(err.to_string().contains("oracle"));
    }

    #[test]
    fn test_dispatch_placeholders() {
        assert_eq!(DialectImpl::default().param_placeholder(3), "?");
        let pg = DialectImpl::Postgres(PostgresDialect::new());
        assert_eq!(pg.param_placeholder(3), "$3");
    }

    #[tokio::test]
    async fn test_connect_sqlite_memory() {
        let config = ConnectionConfig {
            driver: "sqlite".into(),
            url: "sqlite::memory:".into(),
            user: None,
            password: None,
        };
        let mut conn = connect(&config).await.unwrap();
        assert_eq!(conn.db_type(), "sqlite");
        assert!(conn.list_tables(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_connect_unknown_driver() {
        let config = ConnectionConfig {
            driver: "db2".into(),
            url: "db2://localhost".into(),
            user: None,
            password: None,
        };
        let err = connect(&config).await.err().unwrap();
        assert!(matches!(err, DbToolsError::Config(_)));
    }
}
