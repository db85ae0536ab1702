//! SQL values moved between source and target connections.
//!
//! Rows are read from the source as owned [`SqlValue`]s and bound positionally
//! into the target's INSERT statement, without any type coercion beyond what
//! the driver does on binding.

use std::borrow::Cow;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::types::DbType;

/// Type hint for NULL values.
///
/// Strictly typed targets (PostgreSQL) need to know the parameter type even
/// when the value is NULL, so NULLs carry the kind of the column they came
/// from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlNullType {
    Bool,
    I16,
    I32,
    I64,
    F32,
    F64,
    String,
    Bytes,
    Uuid,
    Decimal,
    DateTime,
    DateTimeOffset,
    Date,
    Time,
}

impl From<DbType> for SqlNullType {
    fn from(db_type: DbType) -> Self {
        match db_type {
            DbType::BigInt => SqlNullType::I64,
            DbType::Integer => SqlNullType::I32,
            DbType::Bit | DbType::Boolean => SqlNullType::Bool,
            DbType::Decimal | DbType::Numeric => SqlNullType::Decimal,
            DbType::Blob | DbType::Raw => SqlNullType::Bytes,
            DbType::Date => SqlNullType::Date,
            DbType::Timestamp => SqlNullType::DateTime,
            DbType::Char
            | DbType::Clob
            | DbType::Long
            | DbType::RowId
            | DbType::Varchar => SqlNullType::String,
        }
    }
}

/// SQL value for one cell of a row.
///
/// Uses `Cow` for string and byte data so callers can bind borrowed data
/// without copying; rows streamed from a connection are always owned.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue<'a> {
    /// NULL with type hint for correct parameter binding.
    Null(SqlNullType),

    /// Boolean value.
    Bool(bool),

    /// 16-bit signed integer (smallint).
    I16(i16),

    /// 32-bit signed integer (int).
    I32(i32),

    /// 64-bit signed integer (bigint).
    I64(i64),

    /// 32-bit floating point (real/float4).
    F32(f32),

    /// 64-bit floating point (double precision/float8).
    F64(f64),

    /// Text/string data.
    Text(Cow<'a, str>),

    /// Binary data.
    Bytes(Cow<'a, [u8]>),

    /// UUID value.
    Uuid(Uuid),

    /// Decimal value with arbitrary precision.
    Decimal(Decimal),

    /// Timestamp without timezone.
    DateTime(NaiveDateTime),

    /// Timestamp with timezone offset.
    DateTimeOffset(DateTime<FixedOffset>),

    /// Date without time component.
    Date(NaiveDate),

    /// Time without date component.
    Time(NaiveTime),
}

/// One result row, in SELECT column order.
pub type Row = Vec<SqlValue<'static>>;

impl<'a> SqlValue<'a> {
    /// Check if this value is NULL.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null(_))
    }

    /// Replace the type hint of a NULL; other values are returned unchanged.
    #[must_use]
    pub fn with_null_type(self, null_type: SqlNullType) -> Self {
        match self {
            SqlValue::Null(_) => SqlValue::Null(null_type),
            other => other,
        }
    }
}

impl From<bool> for SqlValue<'static> {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<i32> for SqlValue<'static> {
    fn from(v: i32) -> Self {
        SqlValue::I32(v)
    }
}

impl From<i64> for SqlValue<'static> {
    fn from(v: i64) -> Self {
        SqlValue::I64(v)
    }
}

impl From<f64> for SqlValue<'static> {
    fn from(v: f64) -> Self {
        SqlValue::F64(v)
    }
}

impl From<String> for SqlValue<'static> {
    fn from(v: String) -> Self {
        SqlValue::Text(Cow::Owned(v))
    }
}

impl<'a> From<&'a str> for SqlValue<'a> {
    fn from(v: &'a str) -> Self {
        SqlValue::Text(Cow::Borrowed(v))
    }
}

impl From<Vec<u8>> for SqlValue<'static> {
    fn from(v: Vec<u8>) -> Self {
        SqlValue::Bytes(Cow::Owned(v))
    }
}

impl From<Decimal> for SqlValue<'static> {
    fn from(v: Decimal) -> Self {
        SqlValue::Decimal(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_value_is_null() {
        assert!(SqlValue::<'static>::Null(SqlNullType::String).is_null());
        assert!(!SqlValue::I32(42).is_null());
    }

    #[test]
    fn test_with_null_type_only_retypes_nulls() {
        let null = SqlValue::Null(SqlNullType::String).with_null_type(SqlNullType::Decimal);
        assert_eq!(null, SqlValue::Null(SqlNullType::Decimal));

        let value = SqlValue::I64(7).with_null_type(SqlNullType::Decimal);
        assert_eq!(value, SqlValue::I64(7));
    }

    #[test]
    fn test_null_type_from_db_type() {
        assert_eq!(SqlNullType::from(DbType::Integer), SqlNullType::I32);
        assert_eq!(SqlNullType::from(DbType::BigInt), SqlNullType::I64);
        assert_eq!(SqlNullType::from(DbType::Numeric), SqlNullType::Decimal);
        assert_eq!(SqlNullType::from(DbType::Varchar), SqlNullType::String);
        assert_eq!(SqlNullType::from(DbType::Raw), SqlNullType::Bytes);
        assert_eq!(SqlNullType::from(DbType::Timestamp), SqlNullType::DateTime);
    }

    #[test]
    fn test_from_implementations() {
        let v: SqlValue<'static> = 42i32.into();
        assert_eq!(v, SqlValue::I32(42));

        let v: SqlValue<'static> = "hello".to_string().into();
        assert_eq!(v, SqlValue::Text(Cow::Owned("hello".to_string())));

        let v: SqlValue<'_> = "borrowed".into();
        assert!(matches!(v, SqlValue::Text(Cow::Borrowed("borrowed"))));
    }
}
