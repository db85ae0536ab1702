//! Portable column type kinds and the converter from standard numeric type codes.
//!
//! Drivers report every column with a numeric type code taken from the
//! X/Open SQL CLI (and JDBC) code table in [`sql_types`]. The
//! [`TypeConverter`] maps the subset of codes the tool understands onto the
//! closed [`DbType`] enum; anything else is rejected with
//! [`DbToolsError::UnsupportedType`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{DbToolsError, Result};

/// Standard numeric type codes (X/Open SQL CLI, as used by ODBC and JDBC).
pub mod sql_types {
    pub const BIT: i32 = -7;
    pub const TINYINT: i32 = -6;
    pub const BIGINT: i32 = -5;
    pub const LONGVARBINARY: i32 = -4;
    pub const VARBINARY: i32 = -3;
    pub const BINARY: i32 = -2;
    pub const LONGVARCHAR: i32 = -1;
    pub const NULL: i32 = 0;
    pub const CHAR: i32 = 1;
    pub const NUMERIC: i32 = 2;
    pub const DECIMAL: i32 = 3;
    pub const INTEGER: i32 = 4;
    pub const SMALLINT: i32 = 5;
    pub const FLOAT: i32 = 6;
    pub const REAL: i32 = 7;
    pub const DOUBLE: i32 = 8;
    pub const VARCHAR: i32 = 12;
    pub const BOOLEAN: i32 = 16;
    pub const DATE: i32 = 91;
    pub const TIME: i32 = 92;
    pub const TIMESTAMP: i32 = 93;
    pub const OTHER: i32 = 1111;
    pub const BLOB: i32 = 2004;
    pub const CLOB: i32 = 2005;
    pub const ROWID: i32 = -8;
    pub const NCHAR: i32 = -15;
    pub const NVARCHAR: i32 = -9;
    pub const TIMESTAMP_WITH_TIMEZONE: i32 = 2014;
}

/// Portable column type kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DbType {
    BigInt,
    Bit,
    Blob,
    Boolean,
    Char,
    Clob,
    Date,
    Decimal,
    Integer,
    Long,
    Numeric,
    Raw,
    RowId,
    Timestamp,
    Varchar,
}

impl DbType {
    /// All portable type kinds, in declaration order.
    pub const ALL: [DbType; 15] = [
        DbType::BigInt,
        DbType::Bit,
        DbType::Blob,
        DbType::Boolean,
        DbType::Char,
        DbType::Clob,
        DbType::Date,
        DbType::Decimal,
        DbType::Integer,
        DbType::Long,
        DbType::Numeric,
        DbType::Raw,
        DbType::RowId,
        DbType::Timestamp,
        DbType::Varchar,
    ];

    /// The standard type code this kind is converted from.
    pub fn type_code(self) -> i32 {
        match self {
            DbType::BigInt => sql_types::BIGINT,
            DbType::Bit => sql_types::BIT,
            DbType::Blob => sql_types::BLOB,
            DbType::Boolean => sql_types::BOOLEAN,
            DbType::Char => sql_types::CHAR,
            DbType::Clob => sql_types::CLOB,
            DbType::Date => sql_types::DATE,
            DbType::Decimal => sql_types::DECIMAL,
            DbType::Integer => sql_types::INTEGER,
            DbType::Long => sql_types::LONGVARCHAR,
            DbType::Numeric => sql_types::NUMERIC,
            DbType::Raw => sql_types::VARBINARY,
            DbType::RowId => sql_types::ROWID,
            DbType::Timestamp => sql_types::TIMESTAMP,
            DbType::Varchar => sql_types::VARCHAR,
        }
    }

    /// Upper case name of the kind (e.g. "VARCHAR").
    pub fn as_str(self) -> &'static str {
        match self {
            DbType::BigInt => "BIGINT",
            DbType::Bit => "BIT",
            DbType::Blob => "BLOB",
            DbType::Boolean => "BOOLEAN",
            DbType::Char => "CHAR",
            DbType::Clob => "CLOB",
            DbType::Date => "DATE",
            DbType::Decimal => "DECIMAL",
            DbType::Integer => "INTEGER",
            DbType::Long => "LONG",
            DbType::Numeric => "NUMERIC",
            DbType::Raw => "RAW",
            DbType::RowId => "ROWID",
            DbType::Timestamp => "TIMESTAMP",
            DbType::Varchar => "VARCHAR",
        }
    }
}

impl fmt::Display for DbType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the column size is meaningful for the standard type code.
pub fn has_column_size(type_code: i32) -> bool {
    matches!(
        type_code,
        sql_types::CHAR
            | sql_types::DECIMAL
            | sql_types::FLOAT
            | sql_types::LONGVARCHAR
            | sql_types::NUMERIC
            | sql_types::VARBINARY
            | sql_types::VARCHAR
    )
}

/// Whether the decimal digit count is meaningful for the standard type code.
pub fn has_decimal_digits(type_code: i32) -> bool {
    matches!(type_code, sql_types::DECIMAL | sql_types::NUMERIC)
}

/// Converts standard numeric type codes to [`DbType`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeConverter;

impl TypeConverter {
    pub fn new() -> Self {
        Self
    }

    /// Convert a standard type code to its portable kind.
    ///
    /// # Errors
    ///
    /// Returns [`DbToolsError::UnsupportedType`] carrying the code when it has
    /// no mapping.
    pub fn convert(&self, type_code: i32) -> Result<DbType> {
        let db_type = match type_code {
            sql_types::BIGINT => DbType::BigInt,
            sql_types::BIT => DbType::Bit,
            sql_types::BLOB => DbType::Blob,
            sql_types::BOOLEAN => DbType::Boolean,
            sql_types::CHAR => DbType::Char,
            sql_types::CLOB => DbType::Clob,
            sql_types::DATE => DbType::Date,
            sql_types::DECIMAL => DbType::Decimal,
            sql_types::INTEGER => DbType::Integer,
            sql_types::LONGVARCHAR => DbType::Long,
            sql_types::NUMERIC => DbType::Numeric,
            sql_types::VARBINARY => DbType::Raw,
            sql_types::ROWID => DbType::RowId,
            sql_types::TIMESTAMP => DbType::Timestamp,
            sql_types::VARCHAR => DbType::Varchar,
            code => return Err(DbToolsError::UnsupportedType { code }),
        };
        Ok(db_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_convert_sql_standard_codes() {
        let converter = TypeConverter::new();
        assert_eq!(converter.convert(sql_types::BIGINT).unwrap(), DbType::BigInt);
        assert_eq!(converter.convert(sql_types::CHAR).unwrap(), DbType::Char);
        assert_eq!(converter.convert(sql_types::DECIMAL).unwrap(), DbType::Decimal);
        assert_eq!(converter.convert(sql_types::INTEGER).unwrap(), DbType::Integer);
        assert_eq!(converter.convert(sql_types::NUMERIC).unwrap(), DbType::Numeric);
        assert_eq!(converter.convert(sql_types::VARCHAR).unwrap(), DbType::Varchar);
    }

    #[test]
    fn test_convert_is_one_to_one_over_supported_codes() {
        let converter = TypeConverter::new();
        let mut seen = HashSet::new();
        for db_type in DbType::ALL {
            let converted = converter.convert(db_type.type_code()).unwrap();
            assert_eq!(converted, db_type);
            assert!(seen.insert(db_type.type_code()), "duplicate code for {db_type}");
        }
        assert_eq!(seen.len(), DbType::ALL.len());
    }

    #[test]
    fn test_convert_unknown_code_names_the_code() {
        let converter = TypeConverter::new();
        let err = converter.convert(i32::MIN).unwrap_err();
        assert!(matches!(err, DbToolsError::UnsupportedType { code } if code == i32::MIN));
        assert!(err.to_string().contains("-2147483648"));

        assert!(converter.convert(sql_types::SMALLINT).is_err());
        assert!(converter.convert(sql_types::DOUBLE).is_err());
        assert!(converter.convert(sql_types::OTHER).is_err());
    }

    #[test]
    fn test_size_bearing_codes() {
        assert!(has_column_size(sql_types::VARCHAR));
        assert!(has_column_size(sql_types::FLOAT));
        assert!(has_column_size(sql_types::VARBINARY));
        assert!(!has_column_size(sql_types::INTEGER));
        assert!(!has_column_size(sql_types::TIMESTAMP));

        assert!(has_decimal_digits(sql_types::NUMERIC));
        assert!(has_decimal_digits(sql_types::DECIMAL));
        assert!(!has_decimal_digits(sql_types::CHAR));
    }

    #[test]
    fn test_display_uses_upper_case_names() {
        assert_eq!(DbType::RowId.to_string(), "ROWID");
        assert_eq!(DbType::BigInt.to_string(), "BIGINT");
    }
}
