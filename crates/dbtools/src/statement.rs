//! SELECT and INSERT statement text for a table.
//!
//! Statements are built once per table and reused for every row. Identifiers
//! are emitted as read, without quoting.

use crate::core::schema::Table;
use crate::core::traits::Dialect;
use crate::drivers::DialectImpl;
use crate::error::{DbToolsError, Result};

/// Builds statement text using the parameter markers of one dialect.
#[derive(Debug, Clone, Default)]
pub struct StatementBuilder {
    dialect: DialectImpl,
}

impl StatementBuilder {
    /// Create a builder for the given dialect.
    pub fn new(dialect: DialectImpl) -> Self {
        Self { dialect }
    }

    /// `SELECT <col1>, <col2>, ... FROM <table>` in column order.
    ///
    /// # Errors
    ///
    /// Returns [`DbToolsError::Statement`] if the table has no columns.
    pub fn build_select(&self, table: &Table) -> Result<String> {
        let columns = column_list(table)?;
        Ok(format!("SELECT {} FROM {}", columns, table.name))
    }

    /// `INSERT INTO <name> (<col1>, ...) VALUES (<marker1>, ...)` in column order.
    ///
    /// `<name>` is `alternative_name` if given, else the table's own name.
    ///
    /// # Errors
    ///
    /// Returns [`DbToolsError::Statement`] if the table has no columns.
    pub fn build_insert(&self, table: &Table, alternative_name: Option<&str>) -> Result<String> {
        let columns = column_list(table)?;
        let placeholders = (1..=table.columns.len())
            .map(|i| self.dialect.param_placeholder(i))
            .collect::<Vec<_>>()
            .join(", ");
        Ok(format!(
            "INSERT INTO {} ({}) VALUES ({})",
            alternative_name.unwrap_or(&table.name),
            columns,
            placeholders
        ))
    }
}

fn column_list(table: &Table) -> Result<String> {
    if table.columns.is_empty() {
        return Err(DbToolsError::Statement(format!(
            "table '{}' has no columns",
            table.name
        )));
    }
    Ok(table.column_names().join(", "))
}
