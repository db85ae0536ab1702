//! PostgreSQL SQL dialect (Strategy pattern).

use crate::core::traits::Dialect;

/// PostgreSQL dialect implementation.
///
/// Uses numbered `$n` parameter markers.
#[derive(Debug, Clone, Default)]
pub struct PostgresDialect;

impl PostgresDialect {
    /// Create a new PostgreSQL dialect instance.
    pub fn new() -> Self {
        Self
    }
}

impl Dialect for PostgresDialect {
    fn name(&self) -> &str {
        "postgres"
    }

    fn param_placeholder(&self, index: usize) -> String {
        format!("${}", index)
    }
}
