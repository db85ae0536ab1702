//! Table listing, counting and row copy between two connections.
//!
//! Tables are processed one after another; each table's source cursor is
//! drained and released before the next table starts. There is no transaction
//! around a table or a run: every INSERT commits under the target connection's
//! own settings, so a failure mid-table leaves the rows copied so far.

pub mod progress;

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::TryStreamExt;
use serde::Serialize;
use tracing::info;

use crate::config::CopyConfig;
use crate::core::pattern::TableNameFilter;
use crate::core::schema::{DataScheme, Table};
use crate::core::traits::{DbConnection, ModelReader};
use crate::core::value::SqlNullType;
use crate::error::{DbToolsError, Result};
use crate::reader::MetadataModelReader;
use crate::statement::StatementBuilder;

pub use progress::{LogProgress, ProgressReporter, RowProgress, TableProgress};

/// Options for one copy run.
#[derive(Debug, Clone)]
pub struct CopyOptions {
    /// Execute `DELETE FROM <target>` before copying each table.
    pub delete_before_copy: bool,
    /// Tables to copy.
    pub filter: TableNameFilter,
    /// Source table name to target table name.
    pub table_name_mappings: BTreeMap<String, String>,
    /// Schema/owner of the source tables. All visible schemas if `None`.
    pub owner: Option<String>,
}

impl Default for CopyOptions {
    fn default() -> Self {
        Self {
            delete_before_copy: true,
            filter: TableNameFilter::match_all(),
            table_name_mappings: BTreeMap::new(),
            owner: None,
        }
    }
}

impl From<&CopyConfig> for CopyOptions {
    fn from(config: &CopyConfig) -> Self {
        Self {
            delete_before_copy: config.delete_before_copy,
            filter: TableNameFilter::new(&config.table_name_patterns),
            table_name_mappings: config.table_name_mappings.clone(),
            owner: config.source_schema.clone(),
        }
    }
}

/// Totals of a copy run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CopySummary {
    /// Tables copied.
    pub tables: usize,
    /// Rows inserted into the target.
    pub rows: u64,
}

/// Row count of one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableCount {
    pub table: String,
    pub rows: i64,
}

/// Lists, counts and copies the tables of a source connection.
///
/// Connections are borrowed for the duration of a call and never closed here.
pub struct DataCopier {
    reporter: Arc<dyn ProgressReporter>,
}

impl Default for DataCopier {
    fn default() -> Self {
        Self::new()
    }
}

impl DataCopier {
    /// Create a copier reporting progress through `tracing`.
    pub fn new() -> Self {
        Self::with_reporter(Arc::new(LogProgress::default()))
    }

    /// Create a copier reporting progress to the given sink.
    pub fn with_reporter(reporter: Arc<dyn ProgressReporter>) -> Self {
        Self { reporter }
    }

    /// Report and return the names of the source tables passing the filter.
    pub async fn list(
        &self,
        source: &mut dyn DbConnection,
        filter: &TableNameFilter,
        owner: Option<&str>,
    ) -> Result<Vec<String>> {
        let scheme = read_scheme(source, filter, owner).await?;
        Ok(self.list_scheme(&scheme))
    }

    /// Report and return the table names of an already read scheme.
    pub fn list_scheme(&self, scheme: &DataScheme) -> Vec<String> {
        scheme
            .tables
            .iter()
            .map(|table| {
                self.reporter.table_listed(&table.name);
                table.name.clone()
            })
            .collect()
    }

    /// Count the rows of every source table passing the filter.
    pub async fn count(
        &self,
        source: &mut dyn DbConnection,
        filter: &TableNameFilter,
        owner: Option<&str>,
    ) -> Result<Vec<TableCount>> {
        let scheme = read_scheme(source, filter, owner).await?;
        let mut counts = Vec::with_capacity(scheme.tables.len());
        for table in &scheme.tables {
            let rows = source.query_count(&count_query(&table.name)).await?;
            info!("{}: {} rows", table.name, rows);
            counts.push(TableCount {
                table: table.name.clone(),
                rows,
            });
        }
        Ok(counts)
    }

    /// Copy the rows of every source table passing the filter into the target.
    ///
    /// The target tables must exist with the same column layout. Any failure
    /// aborts the run.
    pub async fn copy(
        &self,
        source: &mut dyn DbConnection,
        target: &mut dyn DbConnection,
        options: &CopyOptions,
    ) -> Result<CopySummary> {
        let scheme = read_scheme(source, &options.filter, options.owner.as_deref()).await?;

        let mut summary = CopySummary::default();
        for table in &scheme.tables {
            summary.rows += self.copy_table(source, target, table, options).await?;
            summary.tables += 1;
        }

        info!(
            "Copy finished: {} tables, {} rows",
            summary.tables, summary.rows
        );
        Ok(summary)
    }

    async fn copy_table(
        &self,
        source: &mut dyn DbConnection,
        target: &mut dyn DbConnection,
        table: &Table,
        options: &CopyOptions,
    ) -> Result<u64> {
        let target_table = options
            .table_name_mappings
            .get(&table.name)
            .map(String::as_str);
        let effective_name = target_table.unwrap_or(&table.name);

        if options.delete_before_copy {
            let deleted = target
                .execute(&format!("DELETE FROM {}", effective_name), &[])
                .await?;
            info!("Deleted {} rows from {}", deleted, effective_name);
        }

        let select = StatementBuilder::default().build_select(table)?;
        let insert = StatementBuilder::new(target.dialect()).build_insert(table, target_table)?;
        let total = source.query_count(&count_query(&table.name)).await?;

        let progress = TableProgress {
            table: &table.name,
            target_table,
            total_rows: u64::try_from(total).unwrap_or(0),
        };
        self.reporter.table_started(&progress);

        let null_types: Vec<SqlNullType> = table
            .columns
            .iter()
            .map(|column| SqlNullType::from(column.db_type))
            .collect();

        let mut copied = 0u64;
        let mut rows = source.fetch_rows(&select);
        while let Some(row) = rows
            .try_next()
            .await
            .map_err(|e| DbToolsError::transfer(&table.name, e))?
        {
            if row.len() != null_types.len() {
                return Err(DbToolsError::transfer(
                    &table.name,
                    format!(
                        "row has {} values, expected {}",
                        row.len(),
                        null_types.len()
                    ),
                ));
            }
            let values: Vec<_> = row
                .into_iter()
                .zip(&null_types)
                .map(|(value, null_type)| value.with_null_type(*null_type))
                .collect();
            target
                .execute(&insert, &values)
                .await
                .map_err(|e| DbToolsError::transfer(&table.name, e))?;

            copied += 1;
            self.reporter.row_copied(&RowProgress {
                table: &table.name,
                target_table,
                current: copied,
                total: progress.total_rows,
            });
        }
        drop(rows);

        self.reporter.table_finished(&progress, copied);
        Ok(copied)
    }
}

fn count_query(table: &str) -> String {
    format!("SELECT COUNT(*) FROM {}", table)
}

async fn read_scheme(
    source: &mut dyn DbConnection,
    filter: &TableNameFilter,
    owner: Option<&str>,
) -> Result<DataScheme> {
    MetadataModelReader::new(source)
        .with_owner(owner.map(str::to_string))
        .with_filter(filter.clone())
        .read_model()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::SqliteConnection;
    use std::sync::Mutex;

    /// Records every event as a line of text.
    #[derive(Default)]
    struct RecordingProgress {
        events: Mutex<Vec<String>>,
    }

    impl RecordingProgress {
        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }

        fn push(&self, event: String) {
            self.events.lock().unwrap().push(event);
        }
    }

    impl ProgressReporter for RecordingProgress {
        fn table_listed(&self, name: &str) {
            self.push(format!("listed {}", name));
        }

        fn table_started(&self, p: &TableProgress<'_>) {
            self.push(format!("started {} {:?} {}", p.table, p.target_table, p.total_rows));
        }

        fn row_copied(&self, p: &RowProgress<'_>) {
            self.push(format!("row {} {:?} {}/{}", p.table, p.target_table, p.current, p.total));
        }

        fn table_finished(&self, p: &TableProgress<'_>, rows: u64) {
            self.push(format!("finished {} {}", p.table, rows));
        }
    }

    async fn database(script: &str) -> SqliteConnection {
        let mut conn = SqliteConnection::open("sqlite::memory:").await.unwrap();
        conn.execute(script, &[]).await.unwrap();
        conn
    }

    const SOURCE: &str = "CREATE TABLE TestTable (Id INTEGER, Name VARCHAR(100), Salary NUMERIC(10,2)); \
        INSERT INTO TestTable VALUES (1, 'Alice', 1234.5); \
        INSERT INTO TestTable VALUES (2, NULL, NULL); \
        CREATE TABLE Other (Id INTEGER);";

    const TARGET: &str = "CREATE TABLE TestTable (Id INTEGER, Name VARCHAR(100), Salary NUMERIC(10,2)); \
        CREATE TABLE Other (Id INTEGER);";

    #[tokio::test]
    async fn test_list_reports_filtered_tables() {
        let mut source = database(SOURCE).await;
        let recorder = Arc::new(RecordingProgress::default());
        let copier = DataCopier::with_reporter(recorder.clone());

        let names = copier
            .list(&mut source, &TableNameFilter::new(["Test*"]), None)
            .await
            .unwrap();
        assert_eq!(names, vec!["TestTable"]);
        assert_eq!(recorder.events(), vec!["listed TestTable"]);
    }

    #[tokio::test]
    async fn test_count() {
        let mut source = database(SOURCE).await;
        let counts = DataCopier::new()
            .count(&mut source, &TableNameFilter::match_all(), None)
            .await
            .unwrap();
        assert_eq!(
            counts,
            vec![
                TableCount {
                    table: "Other".into(),
                    rows: 0
                },
                TableCount {
                    table: "TestTable".into(),
                    rows: 2
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_copy_reports_progress_per_row() {
        let mut source = database(SOURCE).await;
        let mut target = database(TARGET).await;
        let recorder = Arc::new(RecordingProgress::default());
        let copier = DataCopier::with_reporter(recorder.clone());

        let options = CopyOptions {
            filter: TableNameFilter::new(["TestTable"]),
            ..Default::default()
        };
        let summary = copier.copy(&mut source, &mut target, &options).await.unwrap();
        assert_eq!(summary, CopySummary { tables: 1, rows: 2 });
        assert_eq!(
            recorder.events(),
            vec![
                "started TestTable None 2",
                "row TestTable None 1/2",
                "row TestTable None 2/2",
                "finished TestTable 2",
            ]
        );
        assert_eq!(
            target.query_count("SELECT COUNT(*) FROM TestTable").await.unwrap(),
            2
        );
        assert_eq!(
            target
                .query_count("SELECT COUNT(*) FROM TestTable WHERE Name IS NULL AND Salary IS NULL")
                .await
                .unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_copy_with_mapping_reports_target_name() {
        let mut source = database(SOURCE).await;
        let mut target = database(
            "CREATE TABLE Archive (Id INTEGER, Name VARCHAR(100), Salary NUMERIC(10,2));",
        )
        .await;
        let recorder = Arc::new(RecordingProgress::default());
        let copier = DataCopier::with_reporter(recorder.clone());

        let options = CopyOptions {
            filter: TableNameFilter::new(["TestTable"]),
            table_name_mappings: BTreeMap::from([("TestTable".to_string(), "Archive".to_string())]),
            ..Default::default()
        };
        copier.copy(&mut source, &mut target, &options).await.unwrap();

        assert!(recorder
            .events()
            .contains(&"row TestTable Some(\"Archive\") 2/2".to_string()));
        assert_eq!(
            target.query_count("SELECT COUNT(*) FROM Archive").await.unwrap(),
            2
        );
    }

    #[tokio::test]
    async fn test_copy_without_delete_appends() {
        let mut source = database(SOURCE).await;
        let mut target = database(TARGET).await;
        let options = CopyOptions {
            delete_before_copy: false,
            ..Default::default()
        };
        let copier = DataCopier::new();
        copier.copy(&mut source, &mut target, &options).await.unwrap();
        copier.copy(&mut source, &mut target, &options).await.unwrap();
        assert_eq!(
            target.query_count("SELECT COUNT(*) FROM TestTable").await.unwrap(),
            4
        );
    }

    #[tokio::test]
    async fn test_missing_target_table_aborts_copy() {
        let mut source = database(SOURCE).await;
        let mut target = database("CREATE TABLE Other (Id INTEGER);").await;
        let result = DataCopier::new()
            .copy(&mut source, &mut target, &CopyOptions::default())
            .await;
        assert!(matches!(result, Err(DbToolsError::Database { .. })));
    }

    #[tokio::test]
    async fn test_insert_failure_is_a_transfer_error() {
        let mut source = database(SOURCE).await;
        let mut target = database(
            "CREATE TABLE TestTable (Id INTEGER, Name VARCHAR(100) NOT NULL, Salary NUMERIC(10,2));",
        )
        .await;
        let options = CopyOptions {
            filter: TableNameFilter::new(["TestTable"]),
            ..Default::default()
        };
        let err = DataCopier::new()
            .copy(&mut source, &mut target, &options)
            .await
            .unwrap_err();
        assert!(matches!(err, DbToolsError::Transfer { ref table, .. } if table == "TestTable"));
        // The first row stays: there is no transaction around the table.
        assert_eq!(
            target.query_count("SELECT COUNT(*) FROM TestTable").await.unwrap(),
            1
        );
    }

    #[test]
    fn test_options_from_config() {
        let config = CopyConfig {
            table_name_patterns: vec!["A*".into()],
            table_name_mappings: BTreeMap::from([("A1".to_string(), "B1".to_string())]),
            delete_before_copy: false,
            source_schema: Some("main".into()),
        };
        let options = CopyOptions::from(&config);
        assert!(!options.delete_before_copy);
        assert!(options.filter.is_included("A1"));
        assert!(!options.filter.is_included("B1"));
        assert_eq!(options.table_name_mappings["A1"], "B1");
        assert_eq!(options.owner.as_deref(), Some("main"));
    }
}
