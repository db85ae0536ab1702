//! Model readers: everything that produces a [`DataScheme`](crate::core::DataScheme).
//!
//! - [`metadata`]: reads live database metadata through a [`DbConnection`](crate::core::DbConnection)
//! - [`changelog`]: reads a tree of YAML changelog files

pub mod changelog;
pub mod metadata;

pub use changelog::ChangelogModelReader;
pub use metadata::MetadataModelReader;
