//! Core abstractions shared by readers, the statement builder and the copier.
//!
//! - [`schema`]: tables, columns, indices, sequences and the data scheme
//! - [`types`]: portable type kinds and the standard type code converter
//! - [`value`]: SQL values for row transfer
//! - [`pattern`]: table name inclusion patterns
//! - [`traits`]: connection, model reader and dialect traits

pub mod pattern;
pub mod schema;
pub mod traits;
pub mod types;
pub mod value;

pub use pattern::{TableNameFilter, TableNamePattern};
pub use schema::{Column, DataScheme, Index, Sequence, Table, NOT_APPLICABLE};
pub use traits::{ColumnInfo, DbConnection, Dialect, IndexColumnInfo, ModelReader, TableInfo};
pub use types::{sql_types, DbType, TypeConverter};
pub use value::{Row, SqlNullType, SqlValue};
