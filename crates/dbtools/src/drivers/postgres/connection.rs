//! PostgreSQL connection.
//!
//! Tables and columns come from `information_schema`, index members from
//! `pg_index`. Row values are decoded by the result column type.

use std::borrow::Cow;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use futures::stream::{BoxStream, StreamExt};
use rust_decimal::Decimal;
use sqlx::postgres::{PgArguments, PgConnectOptions, PgRow, Postgres};
use sqlx::query::Query;
use sqlx::{Column as _, ConnectOptions, Connection, Executor, Row as _, TypeInfo};
use tracing::{debug, info};
use uuid::Uuid;

use crate::core::traits::{ColumnInfo, DbConnection, IndexColumnInfo, TableInfo};
use crate::core::value::{Row, SqlNullType, SqlValue};
use crate::drivers::DialectImpl;
use crate::error::{DbToolsError, Result};
use crate::typemap::type_code_for;

use super::PostgresDialect;

const TABLES_QUERY: &str = r#"
    SELECT table_schema::text AS table_schema, table_name::text AS table_name
    FROM information_schema.tables
    WHERE table_type = 'BASE TABLE'
      AND (($1::text IS NULL AND table_schema NOT IN ('pg_catalog', 'information_schema'))
           OR table_schema = $1)
    ORDER BY table_schema, table_name
"#;

const COLUMNS_QUERY: &str = r#"
    SELECT
        table_schema::text AS table_schema,
        column_name::text AS column_name,
        data_type::text AS data_type,
        COALESCE(character_maximum_length, numeric_precision, -1)::int4 AS column_size,
        COALESCE(numeric_scale, -1)::int4 AS decimal_digits
    FROM information_schema.columns
    WHERE table_name = $1 AND ($2::text IS NULL OR table_schema = $2)
    ORDER BY table_schema, ordinal_position
"#;

const INDEX_COLUMNS_QUERY: &str = r#"
    SELECT
        i.relname::text AS index_name,
        a.attname::text AS column_name,
        NOT ix.indisunique AS non_unique
    FROM pg_index ix
    JOIN pg_class t ON t.oid = ix.indrelid
    JOIN pg_namespace n ON n.oid = t.relnamespace
    JOIN pg_class i ON i.oid = ix.indexrelid
    CROSS JOIN LATERAL unnest(ix.indkey::int2[]) WITH ORDINALITY AS k(attnum, ord)
    JOIN pg_attribute a ON a.attrelid = t.oid AND a.attnum = k.attnum
    WHERE t.relname = $1 AND ($2::text IS NULL OR n.nspname = $2)
    ORDER BY non_unique, index_name, k.ord
"#;

/// One open PostgreSQL connection.
pub struct PostgresConnection {
    conn: sqlx::PgConnection,
}

impl PostgresConnection {
    /// Connect using a `postgres://` URL; explicit credentials override the URL's.
    pub async fn open(url: &str, user: Option<&str>, password: Option<&str>) -> Result<Self> {
        let mut options = PgConnectOptions::from_str(url)
            .map_err(|e| DbToolsError::database(e, "parsing PostgreSQL URL"))?;
        if let Some(user) = user {
            options = options.username(user);
        }
        if let Some(password) = password {
            options = options.password(password);
        }

        let conn = options
            .connect()
            .await
            .map_err(|e| DbToolsError::database(e, "connecting to PostgreSQL"))?;

        info!(
            "Connected to PostgreSQL: {}:{}/{}",
            options.get_host(),
            options.get_port(),
            options.get_database().unwrap_or("")
        );

        Ok(Self { conn })
    }
}

#[async_trait]
impl DbConnection for PostgresConnection {
    fn db_type(&self) -> &str {
        "postgres"
    }

    fn dialect(&self) -> DialectImpl {
        DialectImpl::Postgres(PostgresDialect::new())
    }

    async fn list_tables(&mut self, owner: Option<&str>) -> Result<Vec<TableInfo>> {
        let rows = sqlx::query(TABLES_QUERY)
            .bind(owner)
            .fetch_all(&mut self.conn)
            .await
            .map_err(|e| DbToolsError::database(e, "listing PostgreSQL tables"))?;
        debug!("Found {} PostgreSQL tables", rows.len());

        rows.iter()
            .map(|row| -> Result<TableInfo> {
                Ok(TableInfo {
                    schema: Some(row.try_get("table_schema")?),
                    name: row.try_get("table_name")?,
                })
            })
            .collect()
    }

    async fn list_columns(&mut self, owner: Option<&str>, table: &str) -> Result<Vec<ColumnInfo>> {
        let rows = sqlx::query(COLUMNS_QUERY)
            .bind(table)
            .bind(owner)
            .fetch_all(&mut self.conn)
            .await
            .map_err(|e| DbToolsError::database(e, format!("loading columns of '{}'", table)))?;

        rows.iter()
            .map(|row| -> Result<ColumnInfo> {
                let type_name: String = row.try_get("data_type")?;
                Ok(ColumnInfo {
                    schema: Some(row.try_get("table_schema")?),
                    name: row.try_get("column_name")?,
                    data_type: type_code_for(&type_name),
                    type_name,
                    column_size: row.try_get("column_size")?,
                    decimal_digits: row.try_get("decimal_digits")?,
                })
            })
            .collect()
    }

    async fn list_index_columns(
        &mut self,
        owner: Option<&str>,
        table: &str,
    ) -> Result<Vec<IndexColumnInfo>> {
        let rows = sqlx::query(INDEX_COLUMNS_QUERY)
            .bind(table)
            .bind(owner)
            .fetch_all(&mut self.conn)
            .await
            .map_err(|e| DbToolsError::database(e, format!("loading indices of '{}'", table)))?;

        rows.iter()
            .map(|row| -> Result<IndexColumnInfo> {
                Ok(IndexColumnInfo {
                    index_name: row.try_get("index_name")?,
                    column_name: row.try_get("column_name")?,
                    non_unique: row.try_get("non_unique")?,
                })
            })
            .collect()
    }

    async fn execute(&mut self, sql: &str, params: &[SqlValue<'_>]) -> Result<u64> {
        let result = if params.is_empty() {
            // Simple query protocol; accepts scripts with several statements.
            (&mut self.conn).execute(sql).await
        } else {
            params
                .iter()
                .fold(sqlx::query(sql), bind_value)
                .execute(&mut self.conn)
                .await
        };
        result
            .map(|r| r.rows_affected())
            .map_err(|e| DbToolsError::database(e, format!("executing: {}", sql)))
    }

    async fn query_count(&mut self, sql: &str) -> Result<i64> {
        sqlx::query_scalar::<_, i64>(sql)
            .fetch_one(&mut self.conn)
            .await
            .map_err(|e| DbToolsError::database(e, format!("counting: {}", sql)))
    }

    fn fetch_rows<'a>(&'a mut self, sql: &'a str) -> BoxStream<'a, Result<Row>> {
        sqlx::query(sql)
            .fetch(&mut self.conn)
            .map(|row| row.map_err(DbToolsError::from).and_then(|row| decode_row(&row)))
            .boxed()
    }
}

/// Bind one value; NULLs are bound with the parameter type of their hint.
fn bind_value<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: &'q SqlValue<'_>,
) -> Query<'q, Postgres, PgArguments> {
    match value {
        SqlValue::Null(null_type) => match null_type {
            SqlNullType::Bool => query.bind(None::<bool>),
            SqlNullType::I16 => query.bind(None::<i16>),
            SqlNullType::I32 => query.bind(None::<i32>),
            SqlNullType::I64 => query.bind(None::<i64>),
            SqlNullType::F32 => query.bind(None::<f32>),
            SqlNullType::F64 => query.bind(None::<f64>),
            SqlNullType::String => query.bind(None::<String>),
            SqlNullType::Bytes => query.bind(None::<Vec<u8>>),
            SqlNullType::Uuid => query.bind(None::<Uuid>),
            SqlNullType::Decimal => query.bind(None::<Decimal>),
            SqlNullType::DateTime => query.bind(None::<NaiveDateTime>),
            SqlNullType::DateTimeOffset => query.bind(None::<DateTime<FixedOffset>>),
            SqlNullType::Date => query.bind(None::<NaiveDate>),
            SqlNullType::Time => query.bind(None::<NaiveTime>),
        },
        SqlValue::Bool(b) => query.bind(*b),
        SqlValue::I16(i) => query.bind(*i),
        SqlValue::I32(i) => query.bind(*i),
        SqlValue::I64(i) => query.bind(*i),
        SqlValue::F32(f) => query.bind(*f),
        SqlValue::F64(f) => query.bind(*f),
        SqlValue::Text(s) => query.bind(&**s),
        SqlValue::Bytes(b) => query.bind(&**b),
        SqlValue::Uuid(u) => query.bind(*u),
        SqlValue::Decimal(d) => query.bind(*d),
        SqlValue::DateTime(dt) => query.bind(*dt),
        SqlValue::DateTimeOffset(dto) => query.bind(*dto),
        SqlValue::Date(d) => query.bind(*d),
        SqlValue::Time(t) => query.bind(*t),
    }
}

/// Read one column as `Option<T>`, mapping `None` to a typed NULL.
fn get<'r, T>(
    row: &'r PgRow,
    idx: usize,
    null_type: SqlNullType,
    wrap: impl FnOnce(T) -> SqlValue<'static>,
) -> Result<SqlValue<'static>>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    Ok(row
        .try_get::<Option<T>, _>(idx)?
        .map(wrap)
        .unwrap_or(SqlValue::Null(null_type)))
}

/// Decode all values of a row by column type.
fn decode_row(row: &PgRow) -> Result<Row> {
    let mut values = Vec::with_capacity(row.len());
    for (idx, column) in row.columns().iter().enumerate() {
        let value = match column.type_info().name() {
            "BOOL" => get(row, idx, SqlNullType::Bool, SqlValue::Bool)?,
            "INT2" => get(row, idx, SqlNullType::I16, SqlValue::I16)?,
            "INT4" => get(row, idx, SqlNullType::I32, SqlValue::I32)?,
            "INT8" => get(row, idx, SqlNullType::I64, SqlValue::I64)?,
            "FLOAT4" => get(row, idx, SqlNullType::F32, SqlValue::F32)?,
            "FLOAT8" => get(row, idx, SqlNullType::F64, SqlValue::F64)?,
            "NUMERIC" => get(row, idx, SqlNullType::Decimal, SqlValue::Decimal)?,
            "UUID" => get(row, idx, SqlNullType::Uuid, SqlValue::Uuid)?,
            "DATE" => get(row, idx, SqlNullType::Date, SqlValue::Date)?,
            "TIME" => get(row, idx, SqlNullType::Time, SqlValue::Time)?,
            "TIMESTAMP" => get(row, idx, SqlNullType::DateTime, SqlValue::DateTime)?,
            "TIMESTAMPTZ" => {
                get(row, idx, SqlNullType::DateTimeOffset, SqlValue::DateTimeOffset)?
            }
            "BYTEA" => get(row, idx, SqlNullType::Bytes, |b: Vec<u8>| {
                SqlValue::Bytes(Cow::Owned(b))
            })?,
            _ => get(row, idx, SqlNullType::String, |s: String| {
                SqlValue::Text(Cow::Owned(s))
            })?,
        };
        values.push(value);
    }
    Ok(values)
}
