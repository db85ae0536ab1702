//! SQLite connection.
//!
//! Metadata comes from `sqlite_master` and the table-valued pragma functions.
//! Row values are decoded by their runtime storage class, since SQLite column
//! declarations are advisory only.

use std::borrow::Cow;
use std::str::FromStr;

use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqliteConnectOptions, SqliteRow};
use sqlx::{ConnectOptions, Connection, Executor, Row as _, TypeInfo, ValueRef};
use tracing::{debug, info};

use crate::core::schema::NOT_APPLICABLE;
use crate::core::traits::{ColumnInfo, DbConnection, IndexColumnInfo, TableInfo};
use crate::core::value::{Row, SqlNullType, SqlValue};
use crate::drivers::DialectImpl;
use crate::error::{DbToolsError, Result};
use crate::typemap::{parse_declaration, type_code_for};

use super::SqliteDialect;

/// One open SQLite database connection.
pub struct SqliteConnection {
    conn: sqlx::SqliteConnection,
}

impl SqliteConnection {
    /// Open a connection from a URL such as `sqlite:data.db` or `sqlite::memory:`.
    pub async fn open(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| DbToolsError::database(e, format!("parsing SQLite URL '{}'", url)))?;
        let conn = Self::connect_with(&options).await?;
        info!("Connected to SQLite database: {}", url);
        Ok(conn)
    }

    /// Open a connection from prepared options.
    pub async fn connect_with(options: &SqliteConnectOptions) -> Result<Self> {
        let conn = options
            .connect()
            .await
            .map_err(|e| DbToolsError::database(e, "opening SQLite database"))?;
        Ok(Self { conn })
    }

    /// Close the connection, flushing pending work.
    pub async fn close(self) -> Result<()> {
        self.conn
            .close()
            .await
            .map_err(|e| DbToolsError::database(e, "closing SQLite connection"))
    }

    /// Names of all attached databases (`main`, `temp`, attached aliases).
    async fn database_names(&mut self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT name FROM pragma_database_list ORDER BY seq")
            .fetch_all(&mut self.conn)
            .await
            .map_err(|e| DbToolsError::database(e, "listing SQLite databases"))?;
        rows.iter()
            .map(|row| row.try_get::<String, _>("name").map_err(DbToolsError::from))
            .collect()
    }
}

#[async_trait]
impl DbConnection for SqliteConnection {
    fn db_type(&self) -> &str {
        "sqlite"
    }

    fn dialect(&self) -> DialectImpl {
        DialectImpl::Sqlite(SqliteDialect::new())
    }

    async fn list_tables(&mut self, owner: Option<&str>) -> Result<Vec<TableInfo>> {
        let schemas = match owner {
            Some(owner) => vec![owner.to_string()],
            None => self.database_names().await?,
        };

        let mut tables = Vec::new();
        for schema in schemas {
            let query = format!(
                "SELECT name FROM {}.sqlite_master \
                 WHERE type = 'table' AND name NOT LIKE 'sqlite_%' \
                 ORDER BY name",
                quote_ident(&schema)
            );
            let names: Vec<String> = sqlx::query_scalar(&query)
                .fetch_all(&mut self.conn)
                .await
                .map_err(|e| DbToolsError::database(e, format!("listing tables of '{}'", schema)))?;
            debug!("Found {} tables in SQLite database '{}'", names.len(), schema);
            tables.extend(names.into_iter().map(|name| TableInfo {
                schema: Some(schema.clone()),
                name,
            }));
        }
        Ok(tables)
    }

    async fn list_columns(&mut self, owner: Option<&str>, table: &str) -> Result<Vec<ColumnInfo>> {
        let query = match owner {
            Some(_) => "SELECT name, type FROM pragma_table_info(?1, ?2) ORDER BY cid",
            None => "SELECT name, type FROM pragma_table_info(?1) ORDER BY cid",
        };
        let mut q = sqlx::query(query).bind(table);
        if let Some(owner) = owner {
            q = q.bind(owner);
        }
        let rows = q
            .fetch_all(&mut self.conn)
            .await
            .map_err(|e| DbToolsError::database(e, format!("loading columns of '{}'", table)))?;

        let mut columns = Vec::with_capacity(rows.len());
        for row in rows {
            let declared: String = row.try_get::<Option<String>, _>("type")?.unwrap_or_default();
            let decl = parse_declaration(&declared);
            columns.push(ColumnInfo {
                schema: owner.map(str::to_string),
                name: row.try_get("name")?,
                data_type: type_code_for(&decl.name),
                type_name: decl.name,
                column_size: decl.size.unwrap_or(NOT_APPLICABLE),
                decimal_digits: decl.scale.unwrap_or(NOT_APPLICABLE),
            });
        }
        Ok(columns)
    }

    async fn list_index_columns(
        &mut self,
        owner: Option<&str>,
        table: &str,
    ) -> Result<Vec<IndexColumnInfo>> {
        let query = match owner {
            Some(_) => {
                r#"SELECT il.name AS index_name, ii.name AS column_name, il."unique" AS is_unique
                   FROM pragma_index_list(?1, ?2) AS il
                   JOIN pragma_index_info(il.name, ?2) AS ii
                   ORDER BY il."unique", il.name, ii.seqno"#
            }
            None => {
                r#"SELECT il.name AS index_name, ii.name AS column_name, il."unique" AS is_unique
                   FROM pragma_index_list(?1) AS il
                   JOIN pragma_index_info(il.name) AS ii
                   ORDER BY il."unique", il.name, ii.seqno"#
            }
        };
        let mut q = sqlx::query(query).bind(table);
        if let Some(owner) = owner {
            q = q.bind(owner);
        }
        let rows = q
            .fetch_all(&mut self.conn)
            .await
            .map_err(|e| DbToolsError::database(e, format!("loading indices of '{}'", table)))?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            // Expression index members have no column name.
            let Some(column_name) = row.try_get::<Option<String>, _>("column_name")? else {
                continue;
            };
            entries.push(IndexColumnInfo {
                index_name: row.try_get("index_name")?,
                column_name,
                non_unique: row.try_get::<i64, _>("is_unique")? == 0,
            });
        }
        Ok(entries)
    }

    async fn execute(&mut self, sql: &str, params: &[SqlValue<'_>]) -> Result<u64> {
        let result = if params.is_empty() {
            // Unprepared execution accepts scripts with several statements.
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

/// Quote an identifier with double quotes.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Bind one value. SQLite has no decimal or UUID storage, so those travel as text.
fn bind_value<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: &'q SqlValue<'_>,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        SqlValue::Null(_) => query.bind(None::<String>),
        SqlValue::Bool(b) => query.bind(*b),
        SqlValue::I16(i) => query.bind(*i),
        SqlValue::I32(i) => query.bind(*i),
        SqlValue::I64(i) => query.bind(*i),
        SqlValue::F32(f) => query.bind(*f),
        SqlValue::F64(f) => query.bind(*f),
        SqlValue::Text(s) => query.bind(&**s),
        SqlValue::Bytes(b) => query.bind(&**b),
        SqlValue::Uuid(u) => query.bind(u.to_string()),
        SqlValue::Decimal(d) => query.bind(d.to_string()),
        SqlValue::DateTime(dt) => query.bind(*dt),
        SqlValue::DateTimeOffset(dto) => query.bind(*dto),
        SqlValue::Date(d) => query.bind(*d),
        SqlValue::Time(t) => query.bind(*t),
    }
}

/// Decode all values of a row by storage class.
fn decode_row(row: &SqliteRow) -> Result<Row> {
    let mut values = Vec::with_capacity(row.len());
    for idx in 0..row.len() {
        let raw = row.try_get_raw(idx)?;
        if raw.is_null() {
            values.push(SqlValue::Null(SqlNullType::String));
            continue;
        }
        let storage = raw.type_info().name().to_string();
        let value = match storage.as_str() {
            "INTEGER" | "BOOLEAN" => SqlValue::I64(row.try_get_unchecked::<i64, _>(idx)?),
            "REAL" | "NUMERIC" => SqlValue::F64(row.try_get_unchecked::<f64, _>(idx)?),
            "BLOB" => SqlValue::Bytes(Cow::Owned(row.try_get_unchecked::<Vec<u8>, _>(idx)?)),
            _ => SqlValue::Text(Cow::Owned(row.try_get_unchecked::<String, _>(idx)?)),
        };
        values.push(value);
    }
    Ok(values)
}
