//! Core traits for scheme reading and data copy.
//!
//! - [`DbConnection`]: the generic connectivity layer (metadata, statements, row streaming)
//! - [`ModelReader`]: anything that produces a [`DataScheme`]
//! - [`Dialect`]: SQL syntax differences between engines
//!
//! # Design Patterns
//!
//! - **Strategy**: `Dialect` provides interchangeable placeholder syntax
//! - **Abstract Factory**: `drivers::connect` creates the connection for a configured driver

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::drivers::DialectImpl;
use crate::error::Result;

use super::schema::DataScheme;
use super::value::{Row, SqlValue};

/// One table reported by table metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableInfo {
    /// Schema/owner the table lives in, if the driver reports one.
    pub schema: Option<String>,
    /// Table name.
    pub name: String,
}

impl TableInfo {
    /// `schema.name`, or just the name without a schema.
    pub fn qualified_name(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{}.{}", schema, self.name),
            None => self.name.clone(),
        }
    }
}

/// One column reported by column metadata.
///
/// Size and digit values are raw driver values; deciding whether they apply
/// to the type is left to the reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    /// Schema/owner of the table, if reported.
    pub schema: Option<String>,
    /// Column name.
    pub name: String,
    /// Native type name.
    pub type_name: String,
    /// Standard type code (see [`crate::core::types::sql_types`]).
    pub data_type: i32,
    /// Column size (length or precision), [`NOT_APPLICABLE`](crate::core::schema::NOT_APPLICABLE) if unknown.
    pub column_size: i32,
    /// Decimal digits (scale), [`NOT_APPLICABLE`](crate::core::schema::NOT_APPLICABLE) if unknown.
    pub decimal_digits: i32,
}

/// One (index, column) pair reported by index metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexColumnInfo {
    /// Index name.
    pub index_name: String,
    /// Column name.
    pub column_name: String,
    /// Whether the index allows duplicate values.
    pub non_unique: bool,
}

/// A live database connection.
///
/// Implementations wrap one driver connection. Calls are made sequentially by
/// a single task; the connection is borrowed mutably for each call and never
/// closed by the core.
#[async_trait]
pub trait DbConnection: Send {
    /// Get the database type identifier (e.g., "sqlite", "postgres").
    fn db_type(&self) -> &str;

    /// SQL dialect of this connection.
    fn dialect(&self) -> DialectImpl;

    /// List objects of kind TABLE, optionally restricted to one schema/owner.
    async fn list_tables(&mut self, owner: Option<&str>) -> Result<Vec<TableInfo>>;

    /// List the columns of a table in ordinal order.
    async fn list_columns(&mut self, owner: Option<&str>, table: &str) -> Result<Vec<ColumnInfo>>;

    /// List index members of a table: one entry per (index, column), in the
    /// order the driver delivers them.
    async fn list_index_columns(
        &mut self,
        owner: Option<&str>,
        table: &str,
    ) -> Result<Vec<IndexColumnInfo>>;

    /// Execute a statement with positional parameters.
    ///
    /// Returns the number of affected rows.
    async fn execute(&mut self, sql: &str, params: &[SqlValue<'_>]) -> Result<u64>;

    /// Run a query returning a single integer (e.g. `SELECT COUNT(*) ...`).
    async fn query_count(&mut self, sql: &str) -> Result<i64>;

    /// Stream the rows of a query one at a time.
    ///
    /// The cursor is released when the stream is dropped.
    fn fetch_rows<'a>(&'a mut self, sql: &'a str) -> BoxStream<'a, Result<Row>>;
}

/// Produces a [`DataScheme`].
///
/// Two variants exist: the live metadata reader and the changelog reader.
#[async_trait]
pub trait ModelReader: Send {
    /// Read the scheme.
    async fn read_model(&mut self) -> Result<DataScheme>;
}

/// SQL syntax strategy for different database engines.
pub trait Dialect: Send + Sync {
    /// Get the dialect identifier (e.g., "sqlite", "postgres").
    fn name(&self) -> &str;

    /// Get a parameter placeholder for the given 1-based index.
    ///
    /// - SQLite: `?`
    /// - PostgreSQL: `$1`, `$2`, etc.
    fn param_placeholder(&self, index: usize) -> String;
}
