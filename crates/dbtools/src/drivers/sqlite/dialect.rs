//! SQLite SQL dialect (Strategy pattern).

use crate::core::traits::Dialect;

/// SQLite dialect implementation.
///
/// Uses anonymous `?` parameter markers.
#[derive(Debug, Clone, Default)]
pub struct SqliteDialect;

impl SqliteDialect {
    /// Create a new SQLite dialect instance.
    pub fn new() -> Self {
        Self
    }
}

impl Dialect for SqliteDialect {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn param_placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }
}
