//! Error types for the dbtools library.

use thiserror::Error;

/// Exit code for configuration and input errors.
pub const EXIT_CONFIG_ERROR: u8 = 1;
/// Exit code for connection and statement execution errors.
pub const EXIT_DATABASE_ERROR: u8 = 2;
/// Exit code for failures while copying rows.
pub const EXIT_TRANSFER_ERROR: u8 = 3;
/// Exit code for scheme read and statement build failures.
pub const EXIT_SCHEME_ERROR: u8 = 4;
/// Exit code for file system errors.
pub const EXIT_IO_ERROR: u8 = 7;

/// Main error type for scheme reading and data copy operations.
#[derive(Error, Debug)]
pub enum DbToolsError {
    /// Configuration error (invalid YAML, bad table name mapping, unknown driver, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database error with context about the operation that failed
    #[error("Database error: {message}\n  Context: {context}")]
    Database { message: String, context: String },

    /// Driver error without additional context
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// A native type code has no portable type kind
    #[error("Unsupported type: there is no mapping for data type value: {code}")]
    UnsupportedType { code: i32 },

    /// Reading the data scheme failed
    #[error("Scheme read failed: {0}")]
    SchemeRead(String),

    /// A statement could not be built for a table
    #[error("Statement build failed: {0}")]
    Statement(String),

    /// Data transfer failed for a specific table
    #[error("Transfer failed for table {table}: {message}")]
    Transfer { table: String, message: String },

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl DbToolsError {
    /// Create a Database error with context about where it occurred
    pub fn database(message: impl std::fmt::Display, context: impl Into<String>) -> Self {
        DbToolsError::Database {
            message: message.to_string(),
            context: context.into(),
        }
    }

    /// Create a Transfer error
    pub fn transfer(table: impl Into<String>, message: impl std::fmt::Display) -> Self {
        DbToolsError::Transfer {
            table: table.into(),
            message: message.to_string(),
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            DbToolsError::Config(_) | DbToolsError::Yaml(_) => EXIT_CONFIG_ERROR,
            DbToolsError::Database { .. } | DbToolsError::Sqlx(_) => EXIT_DATABASE_ERROR,
            DbToolsError::Transfer { .. } => EXIT_TRANSFER_ERROR,
            DbToolsError::UnsupportedType { .. }
            | DbToolsError::SchemeRead(_)
            | DbToolsError::Statement(_) => EXIT_SCHEME_ERROR,
            DbToolsError::Io(_) => EXIT_IO_ERROR,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for dbtools operations.
pub type Result<T> = std::result::Result<T, DbToolsError>;
