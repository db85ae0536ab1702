//! # dbtools
//!
//! Schema introspection and table data copy between relational databases.
//!
//! This library provides:
//!
//! - **Model readers** that turn live database metadata or a YAML changelog
//!   tree into a [`DataScheme`] of tables, columns, indices and sequences
//! - **Statement building** of SELECT and INSERT text for a table
//! - **Data copy** of the rows of every matching table from one connection
//!   to another, with optional target table renaming
//! - **Drivers** for SQLite and PostgreSQL on top of `sqlx`
//!
//! ## Example
//!
//! ```rust,no_run
//! use dbtools::{drivers, Config, CopyOptions, DataCopier};
//!
//! #[tokio::main]
//! async fn main() -> dbtools::Result<()> {
//!     let config = Config::load("config.yaml")?;
//!     let mut source = drivers::connect(&config.source).await?;
//!     let mut target = drivers::connect(config.require_target()?).await?;
//!
//!     let summary = DataCopier::new()
//!         .copy(source.as_mut(), target.as_mut(), &CopyOptions::from(&config.copy))
//!         .await?;
//!     println!("Copied {} rows from {} tables", summary.rows, summary.tables);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod copier;
pub mod core;
pub mod drivers;
pub mod error;
pub mod reader;
pub mod statement;
pub mod typemap;

// Re-exports for convenient access
pub use config::{Config, ConnectionConfig, CopyConfig};
pub use copier::{CopyOptions, CopySummary, DataCopier, LogProgress, ProgressReporter, TableCount};
pub use crate::core::{
    Column, DataScheme, DbConnection, DbType, Index, ModelReader, Sequence, SqlValue, Table,
    TableNameFilter, TypeConverter,
};
pub use error::{DbToolsError, Result};
pub use reader::{ChangelogModelReader, MetadataModelReader};
pub use statement::StatementBuilder;
