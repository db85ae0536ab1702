//! Mapping from native type names to standard type codes.
//!
//! Drivers report type names in their own spelling ("int4", "character
//! varying", "VARCHAR(100)"). This module turns those names into the standard
//! codes in [`sql_types`] so that one converter serves every driver.

use crate::core::types::sql_types;

/// A parsed type declaration such as `DECIMAL(10,2)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDeclaration {
    /// Upper case base name without parameters (e.g. "DECIMAL").
    pub name: String,
    /// First parameter (length or precision).
    pub size: Option<i32>,
    /// Second parameter (scale).
    pub scale: Option<i32>,
}

/// Parse a declared type like `VARCHAR(100)`, `numeric(10, 2)` or `TEXT`.
///
/// Parameters that are not integers (e.g. `VARCHAR(MAX)`) are ignored.
pub fn parse_declaration(declared: &str) -> TypeDeclaration {
    let declared = declared.trim();
    let (base, params) = match declared.find('(') {
        Some(open) => {
            let close = declared.rfind(')').unwrap_or(declared.len());
            let inner = if close > open { &declared[open + 1..close] } else { "" };
            (&declared[..open], inner)
        }
        None => (declared, ""),
    };

    let mut numbers = params.split(',').map(|p| p.trim().parse::<i32>().ok());
    let size = numbers.next().flatten();
    let scale = numbers.next().flatten();

    TypeDeclaration {
        name: base.split_whitespace().collect::<Vec<_>>().join(" ").to_uppercase(),
        size,
        scale,
    }
}

/// Map a native type name (without parameters) to a standard type code.
///
/// Unknown names map to [`sql_types::OTHER`], which the converter rejects.
pub fn type_code_for(type_name: &str) -> i32 {
    match type_name.trim().to_lowercase().as_str() {
        // Boolean
        "bit" => sql_types::BIT,
        "bool" | "boolean" => sql_types::BOOLEAN,

        // Integer types
        "tinyint" => sql_types::TINYINT,
        "smallint" | "int2" => sql_types::SMALLINT,
        "int" | "integer" | "int4" | "mediumint" => sql_types::INTEGER,
        "bigint" | "int8" => sql_types::BIGINT,

        // Decimal/numeric
        "decimal" => sql_types::DECIMAL,
        "numeric" | "number" => sql_types::NUMERIC,

        // Floating point
        "float" => sql_types::FLOAT,
        "real" | "float4" => sql_types::REAL,
        "double" | "double precision" | "float8" => sql_types::DOUBLE,

        // String types
        "char" | "character" | "nchar" | "native character" | "bpchar" => sql_types::CHAR,
        "varchar" | "character varying" | "varying character" | "nvarchar" | "varchar2"
        | "nvarchar2" | "text" | "name" => sql_types::VARCHAR,
        "long" | "long varchar" | "longvarchar" | "mediumtext" | "longtext" => {
            sql_types::LONGVARCHAR
        }
        "clob" | "nclob" => sql_types::CLOB,

        // Binary types
        "varbinary" | "raw" | "bytea" => sql_types::VARBINARY,
        "binary" => sql_types::BINARY,
        "blob" | "longblob" | "mediumblob" => sql_types::BLOB,

        // Date/time types
        "date" => sql_types::DATE,
        "time" | "time without time zone" => sql_types::TIME,
        "timestamp" | "datetime" | "timestamp without time zone" => sql_types::TIMESTAMP,
        "timestamptz" | "timestamp with time zone" => sql_types::TIMESTAMP_WITH_TIMEZONE,

        "rowid" => sql_types::ROWID,

        _ => sql_types::OTHER,
    }
}
