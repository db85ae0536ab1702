//! SQLite driver.
//!
//! - [`SqliteDialect`]: SQL syntax strategy for SQLite
//! - [`SqliteConnection`]: metadata, statements and row streaming over one `sqlx` connection

mod connection;
mod dialect;

pub use connection::SqliteConnection;
pub use dialect::SqliteDialect;
