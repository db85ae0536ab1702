//! Model reader over live database metadata.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::core::pattern::TableNameFilter;
use crate::core::schema::{Column, DataScheme, Table, NOT_APPLICABLE};
use crate::core::traits::{DbConnection, ModelReader};
use crate::core::types::{has_column_size, has_decimal_digits, TypeConverter};
use crate::error::Result;

/// Reads a [`DataScheme`] from the metadata of a live connection.
///
/// Tables are filtered by name pattern and, optionally, by schema/owner.
/// Columns with unsupported types and index members that cannot be resolved
/// are skipped with a warning. Unique indices are not read. Sequences are
/// never populated by this reader.
pub struct MetadataModelReader<'c> {
    connection: &'c mut dyn DbConnection,
    owner: Option<String>,
    filter: TableNameFilter,
    converter: TypeConverter,
}

impl<'c> MetadataModelReader<'c> {
    /// Create a reader matching every table of every visible schema.
    pub fn new(connection: &'c mut dyn DbConnection) -> Self {
        Self {
            connection,
            owner: None,
            filter: TableNameFilter::match_all(),
            converter: TypeConverter::new(),
        }
    }

    /// Restrict the read to one schema/owner. `None` reads all visible objects.
    pub fn with_owner(mut self, owner: Option<String>) -> Self {
        self.owner = owner;
        self
    }

    /// Keep only tables matching the filter.
    pub fn with_filter(mut self, filter: TableNameFilter) -> Self {
        self.filter = filter;
        self
    }

    async fn load_columns(&mut self, schema: Option<&str>, table: &mut Table) -> Result<()> {
        let infos = self.connection.list_columns(schema, &table.name).await?;
        let mut columns = Vec::with_capacity(infos.len());

        for info in infos {
            let db_type = match self.converter.convert(info.data_type) {
                Ok(db_type) => db_type,
                Err(e) => {
                    warn!(
                        "Column not added: {}.{}.{} ({}): {}",
                        schema.unwrap_or(""),
                        table.name,
                        info.name,
                        info.type_name,
                        e
                    );
                    continue;
                }
            };
            let column_size = if has_column_size(info.data_type) {
                info.column_size
            } else {
                NOT_APPLICABLE
            };
            let decimal_digits = if has_decimal_digits(info.data_type) {
                info.decimal_digits
            } else {
                NOT_APPLICABLE
            };
            columns.push(Column::new(
                info.name,
                info.type_name,
                db_type,
                column_size,
                decimal_digits,
            ));
        }

        debug!("Read {} columns for table {}", columns.len(), table.name);
        table.append_columns(columns);
        Ok(())
    }

    async fn load_indices(&mut self, schema: Option<&str>, table: &mut Table) -> Result<()> {
        info!("Reading indices for table: {}", table.name);
        let entries = self.connection.list_index_columns(schema, &table.name).await?;

        for entry in entries.into_iter().filter(|e| e.non_unique) {
            let column = table.find_column_by_name(&entry.column_name).cloned();
            let index = table.find_or_create_index_by_name(&entry.index_name);
            if let Some(column) = column {
                index.columns.push(column);
                continue;
            }
            warn!(
                "Index '{}' not added for column '{}' of table {}: no such column",
                entry.index_name, entry.column_name, table.name
            );
        }

        // An index none of whose columns could be resolved is dropped.
        table.indices.retain(|index| !index.columns.is_empty());
        Ok(())
    }
}

#[async_trait]
impl ModelReader for MetadataModelReader<'_> {
    async fn read_model(&mut self) -> Result<DataScheme> {
        let owner = self.owner.clone();
        let mut tables: Vec<(Option<String>, Table)> = Vec::new();

        for info in self.connection.list_tables(owner.as_deref()).await? {
            if self.filter.is_included(&info.name) {
                info!("Table added: {}", info.qualified_name());
                // Per-table lookups stay in the schema the table was found in.
                let schema = owner.clone().or(info.schema);
                tables.push((schema, Table::new(info.name)));
            } else {
                debug!("Table ignored: {}", info.name);
            }
        }

        for (schema, table) in tables.iter_mut() {
            self.load_columns(schema.as_deref(), table).await?;
        }
        for (schema, table) in tables.iter_mut() {
            self.load_indices(schema.as_deref(), table).await?;
        }

        Ok(DataScheme::new(
            tables.into_iter().map(|(_, table)| table).collect(),
            Vec::new(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::traits::{ColumnInfo, IndexColumnInfo, TableInfo};
    use crate::core::types::{sql_types, DbType};
    use crate::core::value::{Row, SqlValue};
    use crate::drivers::{DialectImpl, SqliteConnection};
    use crate::error::DbToolsError;
    use futures::stream::{self, BoxStream, StreamExt};
    use std::collections::HashMap;

    /// Connection serving canned metadata in a fixed order.
    #[derive(Default)]
    struct MockConnection {
        tables: Vec<TableInfo>,
        columns: HashMap<String, Vec<ColumnInfo>>,
        indices: HashMap<String, Vec<IndexColumnInfo>>,
        fail_tables: bool,
        owners_seen: Vec<Option<String>>,
    }

    impl MockConnection {
        fn table(mut self, name: &str, columns: Vec<ColumnInfo>) -> Self {
            self.tables.push(TableInfo {
                schema: Some("PUBLIC".into()),
                name: name.into(),
            });
            self.columns.insert(name.into(), columns);
            self
        }

        fn index(mut self, table: &str, index: &str, column: &str, non_unique: bool) -> Self {
            self.indices
                .entry(table.into())
                .or_default()
                .push(IndexColumnInfo {
                    index_name: index.into(),
                    column_name: column.into(),
                    non_unique,
                });
            self
        }
    }

    fn column(name: &str, type_name: &str, data_type: i32, size: i32, digits: i32) -> ColumnInfo {
        ColumnInfo {
            schema: Some("PUBLIC".into()),
            name: name.into(),
            type_name: type_name.into(),
            data_type,
            column_size: size,
            decimal_digits: digits,
        }
    }

    #[async_trait]
    impl DbConnection for MockConnection {
        fn db_type(&self) -> &str {
            "mock"
        }

        fn dialect(&self) -> DialectImpl {
            DialectImpl::default()
        }

        async fn list_tables(&mut self, owner: Option<&str>) -> Result<Vec<TableInfo>> {
            self.owners_seen.push(owner.map(str::to_string));
            if self.fail_tables {
                return Err(DbToolsError::database("permission denied", "listing tables"));
            }
            Ok(self.tables.clone())
        }

        async fn list_columns(
            &mut self,
            owner: Option<&str>,
            table: &str,
        ) -> Result<Vec<ColumnInfo>> {
            self.owners_seen.push(owner.map(str::to_string));
            Ok(self.columns.get(table).cloned().unwrap_or_default())
        }

        async fn list_index_columns(
            &mut self,
            _owner: Option<&str>,
            table: &str,
        ) -> Result<Vec<IndexColumnInfo>> {
            Ok(self.indices.get(table).cloned().unwrap_or_default())
        }

        async fn execute(&mut self, _sql: &str, _params: &[SqlValue<'_>]) -> Result<u64> {
            Ok(0)
        }

        async fn query_count(&mut self, _sql: &str) -> Result<i64> {
            Ok(0)
        }

        fn fetch_rows<'a>(&'a mut self, _sql: &'a str) -> BoxStream<'a, Result<Row>> {
            stream::empty().boxed()
        }
    }

    fn test_table_columns() -> Vec<ColumnInfo> {
        vec![
            column("Id", "INTEGER", sql_types::INTEGER, 32, 0),
            column("Name", "VARCHAR", sql_types::VARCHAR, 100, 0),
            column("Salary", "NUMERIC", sql_types::NUMERIC, 10, 2),
        ]
    }

    #[tokio::test]
    async fn test_read_empty_database() {
        let mut conn = MockConnection::default();
        let scheme = MetadataModelReader::new(&mut conn).read_model().await.unwrap();
        assert!(scheme.tables.is_empty());
        assert!(scheme.sequences.is_empty());
    }

    #[tokio::test]
    async fn test_sentinels_apply_only_to_size_bearing_types() {
        let mut conn = MockConnection::default().table("TestTable", test_table_columns());
        let scheme = MetadataModelReader::new(&mut conn).read_model().await.unwrap();

        let table = scheme.find_table_by_name("TestTable").unwrap();
        assert_eq!(table.column_names(), vec!["Id", "Name", "Salary"]);

        let id = &table.columns[0];
        assert_eq!(id.db_type, DbType::Integer);
        assert_eq!(id.column_size, NOT_APPLICABLE);
        assert_eq!(id.decimal_digits, NOT_APPLICABLE);

        let name = &table.columns[1];
        assert_eq!(name.db_type, DbType::Varchar);
        assert_eq!(name.column_size, 100);
        assert_eq!(name.decimal_digits, NOT_APPLICABLE);

        let salary = &table.columns[2];
        assert_eq!(salary.db_type, DbType::Numeric);
        assert_eq!(salary.column_size, 10);
        assert_eq!(salary.decimal_digits, 2);
    }

    #[tokio::test]
    async fn test_unsupported_column_is_skipped() {
        let mut conn = MockConnection::default().table(
            "T",
            vec![
                column("A", "INTEGER", sql_types::INTEGER, 0, 0),
                column("B", "DOUBLE", sql_types::DOUBLE, 0, 0),
                column("C", "VARCHAR", sql_types::VARCHAR, 10, 0),
            ],
        );
        let scheme = MetadataModelReader::new(&mut conn).read_model().await.unwrap();
        assert_eq!(scheme.tables[0].column_names(), vec!["A", "C"]);
    }

    #[tokio::test]
    async fn test_filter_keeps_matching_tables_in_driver_order() {
        let mut conn = MockConnection::default()
            .table("ORDERS", vec![])
            .table("AUDIT_LOG", vec![])
            .table("CUSTOMERS", vec![])
            .table("ORDERS_TMP", vec![]);
        let scheme = MetadataModelReader::new(&mut conn)
            .with_filter(TableNameFilter::new(["*_LOG", "ORDERS*"]))
            .read_model()
            .await
            .unwrap();
        assert_eq!(scheme.table_names(), vec!["ORDERS", "AUDIT_LOG", "ORDERS_TMP"]);
    }

    #[tokio::test]
    async fn test_owner_is_passed_to_metadata_calls() {
        let mut conn = MockConnection::default().table("T", test_table_columns());
        MetadataModelReader::new(&mut conn)
            .with_owner(Some("SALES".into()))
            .read_model()
            .await
            .unwrap();
        assert_eq!(
            conn.owners_seen,
            vec![Some("SALES".to_string()), Some("SALES".to_string())]
        );
    }

    #[tokio::test]
    async fn test_without_owner_uses_reported_schema() {
        let mut conn = MockConnection::default().table("T", test_table_columns());
        MetadataModelReader::new(&mut conn).read_model().await.unwrap();
        assert_eq!(conn.owners_seen, vec![None, Some("PUBLIC".to_string())]);
    }

    #[tokio::test]
    async fn test_indices_accumulate_and_exclude_unique() {
        let mut conn = MockConnection::default()
            .table("TestTable", test_table_columns())
            .index("TestTable", "Index1", "Id", true)
            .index("TestTable", "UIndex1", "Name", false)
            .index("TestTable", "Index1", "Name", true)
            .index("TestTable", "Index2", "Salary", true)
            .index("TestTable", "Index2", "Id", true);
        let scheme = MetadataModelReader::new(&mut conn).read_model().await.unwrap();

        let table = &scheme.tables[0];
        assert_eq!(table.indices.len(), 2);
        assert!(table.find_index_by_name("UIndex1").is_none());
        assert_eq!(
            table.find_index_by_name("Index1").unwrap().column_names(),
            vec!["Id", "Name"]
        );
        // Driver order is kept, not sorted.
        assert_eq!(
            table.find_index_by_name("Index2").unwrap().column_names(),
            vec!["Salary", "Id"]
        );
    }

    #[tokio::test]
    async fn test_index_columns_share_table_columns() {
        let mut conn = MockConnection::default()
            .table("T", test_table_columns())
            .index("T", "IX", "Name", true);
        let scheme = MetadataModelReader::new(&mut conn).read_model().await.unwrap();

        let table = &scheme.tables[0];
        let index = table.find_index_by_name("IX").unwrap();
        assert!(std::sync::Arc::ptr_eq(&index.columns[0], &table.columns[1]));
    }

    #[tokio::test]
    async fn test_unknown_index_column_is_skipped() {
        let mut conn = MockConnection::default()
            .table(
                "T",
                vec![
                    column("A", "INTEGER", sql_types::INTEGER, 0, 0),
                    column("G", "GEOMETRY", sql_types::OTHER, 0, 0),
                ],
            )
            .index("T", "IX_AG", "A", true)
            .index("T", "IX_AG", "G", true)
            .index("T", "IX_G", "G", true);
        let scheme = MetadataModelReader::new(&mut conn).read_model().await.unwrap();

        let table = &scheme.tables[0];
        assert_eq!(table.column_names(), vec!["A"]);
        assert_eq!(
            table.find_index_by_name("IX_AG").unwrap().column_names(),
            vec!["A"]
        );
        assert!(table.find_index_by_name("IX_G").is_none());
    }

    #[tokio::test]
    async fn test_ambiguous_index_column_is_skipped() {
        let mut conn = MockConnection::default()
            .table(
                "T",
                vec![
                    column("A", "INTEGER", sql_types::INTEGER, 0, 0),
                    column("A", "INTEGER", sql_types::INTEGER, 0, 0),
                ],
            )
            .index("T", "IX", "A", true);
        let scheme = MetadataModelReader::new(&mut conn).read_model().await.unwrap();
        assert!(scheme.tables[0].indices.is_empty());
    }

    #[tokio::test]
    async fn test_metadata_failure_aborts_read() {
        let mut conn = MockConnection {
            fail_tables: true,
            ..Default::default()
        };
        let result = MetadataModelReader::new(&mut conn).read_model().await;
        assert!(matches!(result, Err(DbToolsError::Database { .. })));
    }

    #[tokio::test]
    async fn test_read_sqlite_scheme() {
        let mut conn = SqliteConnection::open("sqlite::memory:").await.unwrap();
        conn.execute(
            "CREATE TABLE TestTable (Id INTEGER, Name VARCHAR(100), Salary NUMERIC(10,2)); \
             CREATE INDEX Index1 ON TestTable (Id, Name); \
             CREATE INDEX Index2 ON TestTable (Salary); \
             CREATE UNIQUE INDEX UIndex1 ON TestTable (Name); \
             CREATE TABLE Other (Id INTEGER);",
            &[],
        )
        .await
        .unwrap();

        let scheme = MetadataModelReader::new(&mut conn)
            .with_filter(TableNameFilter::new(["Test*"]))
            .read_model()
            .await
            .unwrap();

        assert_eq!(scheme.table_names(), vec!["TestTable"]);
        let table = &scheme.tables[0];
        assert_eq!(table.columns[1].to_string(), "Name VARCHAR(100)");
        assert_eq!(table.columns[2].to_string(), "Salary NUMERIC(10,2)");

        let mut index_names: Vec<_> = table.indices.iter().map(|i| i.name.as_str()).collect();
        index_names.sort_unstable();
        assert_eq!(index_names, vec!["Index1", "Index2"]);
        assert_eq!(
            table.find_index_by_name("Index1").unwrap().column_names(),
            vec!["Id", "Name"]
        );
    }
}
