//! PostgreSQL driver.
//!
//! - [`PostgresDialect`]: SQL syntax strategy for PostgreSQL
//! - [`PostgresConnection`]: metadata, statements and row streaming over one `sqlx` connection

mod connection;
mod dialect;

pub use connection::PostgresConnection;
pub use dialect::PostgresDialect;
