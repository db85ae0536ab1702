//! Model reader over a tree of YAML changelog files.
//!
//! The root file holds a `databaseChangeLog` list. Its entries are change sets,
//! whose changes are applied in order, and `include`/`includeAll` entries that
//! pull in further files:
//!
//! ```yaml
//! databaseChangeLog:
//!   - changeSet:
//!       id: 1
//!       author: dev
//!       changes:
//!         - createTable:
//!             tableName: ORDERS
//!             columns:
//!               - column: { name: Id, type: bigint }
//!               - column: { name: Amount, type: "decimal(10,2)" }
//!   - include:
//!       file: customers.yaml
//!       relativeToChangelogFile: true
//!   - includeAll:
//!       path: later/
//! ```
//!
//! `createTable`, `addColumn`, `createIndex` (non-unique only) and
//! `createSequence` build the scheme; every other change is logged and ignored.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use serde_yaml::Value;
use tracing::{debug, info, warn};

use crate::core::schema::{Column, DataScheme, Sequence, Table, NOT_APPLICABLE};
use crate::core::traits::ModelReader;
use crate::core::types::{sql_types, TypeConverter};
use crate::error::{DbToolsError, Result};
use crate::typemap::parse_declaration;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChangelogDocument {
    #[serde(default)]
    database_change_log: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct ChangeSet {
    #[serde(default)]
    changes: Vec<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Include {
    file: String,
    #[serde(default)]
    relative_to_changelog_file: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IncludeAll {
    path: String,
    #[serde(default)]
    relative_to_changelog_file: bool,
}

#[derive(Debug, Deserialize)]
struct ColumnEntry {
    column: ColumnDef,
}

#[derive(Debug, Deserialize)]
struct ColumnDef {
    name: String,
    #[serde(rename = "type", default)]
    column_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateTable {
    table_name: String,
    #[serde(default)]
    columns: Vec<ColumnEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddColumn {
    table_name: String,
    #[serde(default)]
    columns: Vec<ColumnEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateIndex {
    index_name: String,
    table_name: String,
    #[serde(default)]
    unique: bool,
    #[serde(default)]
    columns: Vec<ColumnEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateSequence {
    sequence_name: String,
    #[serde(default = "one")]
    start_value: i64,
    #[serde(default = "one")]
    increment_by: i64,
}

fn one() -> i64 {
    1
}

/// Column type as described in a changelog.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ChangelogType {
    name: &'static str,
    type_code: i32,
    column_size: i32,
    decimal_digits: i32,
}

impl ChangelogType {
    fn new(name: &'static str, type_code: i32) -> Self {
        Self {
            name,
            type_code,
            column_size: NOT_APPLICABLE,
            decimal_digits: NOT_APPLICABLE,
        }
    }

    fn sized(mut self, size: Option<i32>) -> Self {
        self.column_size = size.unwrap_or(NOT_APPLICABLE);
        self
    }

    fn scaled(mut self, digits: Option<i32>) -> Self {
        self.decimal_digits = digits.unwrap_or(NOT_APPLICABLE);
        self
    }

    /// Interpret a changelog type such as `varchar(100)` or `currency`.
    fn parse(declared: &str) -> Option<Self> {
        let decl = parse_declaration(declared);
        let parsed = match decl.name.as_str() {
            "BIGINT" => Self::new("BIGINT", sql_types::BIGINT),
            "BLOB" => Self::new("BLOB", sql_types::BLOB),
            "BOOL" | "BOOLEAN" => Self::new("BOOLEAN", sql_types::BOOLEAN),
            "CHAR" => Self::new("CHAR", sql_types::CHAR).sized(decl.size),
            "CLOB" => Self::new("CLOB", sql_types::CLOB),
            "CURRENCY" => Self::new("NUMERIC", sql_types::NUMERIC)
                .sized(Some(15))
                .scaled(Some(2)),
            "DATE" => Self::new("DATE", sql_types::DATE),
            "DATETIME" | "TIMESTAMP" => Self::new("TIMESTAMP", sql_types::TIMESTAMP),
            "DECIMAL" => Self::new("DECIMAL", sql_types::DECIMAL)
                .sized(decl.size)
                .scaled(decl.scale),
            "INT" | "INTEGER" => Self::new("INTEGER", sql_types::INTEGER),
            "NUMBER" | "NUMERIC" => Self::new("NUMERIC", sql_types::NUMERIC)
                .sized(decl.size)
                .scaled(decl.scale),
            "VARCHAR" | "VARCHAR2" => Self::new("VARCHAR", sql_types::VARCHAR).sized(decl.size),
            _ => return None,
        };
        Some(parsed)
    }
}

/// Split a single-key mapping like `{createTable: {...}}` into key and body.
fn single_entry(value: Value) -> Result<(String, Value)> {
    let Value::Mapping(map) = value else {
        return Err(DbToolsError::SchemeRead(format!(
            "expected a mapping entry, found: {:?}",
            value
        )));
    };
    if map.len() != 1 {
        return Err(DbToolsError::SchemeRead(format!(
            "expected exactly one key per entry, found {}",
            map.len()
        )));
    }
    match map.into_iter().next() {
        Some((Value::String(key), body)) => Ok((key, body)),
        _ => Err(DbToolsError::SchemeRead(
            "entry key must be a string".to_string(),
        )),
    }
}

/// Reads a [`DataScheme`] from a root changelog file and the files it includes.
#[derive(Debug, Clone)]
pub struct ChangelogModelReader {
    root_file: PathBuf,
    converter: TypeConverter,
}

impl ChangelogModelReader {
    /// Create a reader for the given root changelog file.
    ///
    /// Non-relative includes resolve against the root file's directory.
    pub fn new(root_file: impl Into<PathBuf>) -> Self {
        Self {
            root_file: root_file.into(),
            converter: TypeConverter::new(),
        }
    }

    /// Read the scheme synchronously.
    pub fn read(&self) -> Result<DataScheme> {
        let base_dir = self
            .root_file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let mut scheme = DataScheme::default();
        let mut visited = HashSet::new();
        self.read_file(&self.root_file, &base_dir, &mut scheme, &mut visited)?;
        info!(
            "Read {} tables and {} sequences from changelog {}",
            scheme.tables.len(),
            scheme.sequences.len(),
            self.root_file.display()
        );
        Ok(scheme)
    }

    fn read_file(
        &self,
        path: &Path,
        base_dir: &Path,
        scheme: &mut DataScheme,
        visited: &mut HashSet<PathBuf>,
    ) -> Result<()> {
        let canonical = path.canonicalize().map_err(|e| {
            DbToolsError::SchemeRead(format!("cannot open changelog '{}': {}", path.display(), e))
        })?;
        if !visited.insert(canonical) {
            warn!("Changelog already read, skipped: {}", path.display());
            return Ok(());
        }

        debug!("Reading changelog: {}", path.display());
        let content = fs::read_to_string(path)?;
        let document: ChangelogDocument = serde_yaml::from_str(&content)?;
        let file_dir = path.parent().unwrap_or(base_dir);

        for entry in document.database_change_log {
            let (kind, body) = single_entry(entry)?;
            match kind.as_str() {
                "changeSet" => {
                    let change_set: ChangeSet = serde_yaml::from_value(body)?;
                    for change in change_set.changes {
                        let (kind, body) = single_entry(change)?;
                        self.apply_change(&kind, body, scheme)?;
                    }
                }
                "include" => {
                    let include: Include = serde_yaml::from_value(body)?;
                    let dir = if include.relative_to_changelog_file {
                        file_dir
                    } else {
                        base_dir
                    };
                    self.read_file(&dir.join(&include.file), base_dir, scheme, visited)?;
                }
                "includeAll" => {
                    let include: IncludeAll = serde_yaml::from_value(body)?;
                    let dir = if include.relative_to_changelog_file {
                        file_dir
                    } else {
                        base_dir
                    };
                    for file in changelog_files(&dir.join(&include.path))? {
                        self.read_file(&file, base_dir, scheme, visited)?;
                    }
                }
                other => warn!("Changelog entry ignored: {}", other),
            }
        }
        Ok(())
    }

    fn apply_change(&self, kind: &str, body: Value, scheme: &mut DataScheme) -> Result<()> {
        match kind {
            "createTable" => {
                let change: CreateTable = serde_yaml::from_value(body)?;
                let mut table = Table::new(&change.table_name);
                table.append_columns(self.columns(&change.table_name, &change.columns));
                debug!("Table created: {}", table.name);
                scheme.append_tables([table]);
            }
            "addColumn" => {
                let change: AddColumn = serde_yaml::from_value(body)?;
                let columns = self.columns(&change.table_name, &change.columns);
                let table = scheme
                    .find_table_by_name_mut(&change.table_name)
                    .ok_or_else(|| {
                        DbToolsError::SchemeRead(format!(
                            "table '{}' not found for adding columns: {}",
                            change.table_name,
                            columns
                                .iter()
                                .map(|c| c.name.as_str())
                                .collect::<Vec<_>>()
                                .join(", ")
                        ))
                    })?;
                table.append_columns(columns);
            }
            "createIndex" => {
                let change: CreateIndex = serde_yaml::from_value(body)?;
                if change.unique {
                    debug!("Unique index ignored: {}", change.index_name);
                    return Ok(());
                }
                let Some(table) = scheme.find_table_by_name_mut(&change.table_name) else {
                    warn!(
                        "Index '{}' not added: table '{}' not found",
                        change.index_name, change.table_name
                    );
                    return Ok(());
                };
                for entry in &change.columns {
                    let column = table.find_column_by_name(&entry.column.name).cloned();
                    let index = table.find_or_create_index_by_name(&change.index_name);
                    if let Some(column) = column {
                        index.columns.push(column);
                        continue;
                    }
                    warn!(
                        "Index '{}' not added for column '{}' of table {}: no such column",
                        change.index_name, entry.column.name, table.name
                    );
                }
                table.indices.retain(|index| !index.columns.is_empty());
            }
            "createSequence" => {
                let change: CreateSequence = serde_yaml::from_value(body)?;
                scheme.sequences.push(Sequence::new(
                    change.sequence_name,
                    change.start_value,
                    change.increment_by,
                ));
            }
            other => warn!("Change ignored: {}", other),
        }
        Ok(())
    }

    /// Build columns, skipping those with types that cannot be interpreted.
    fn columns(&self, table: &str, entries: &[ColumnEntry]) -> Vec<Column> {
        let mut columns = Vec::with_capacity(entries.len());
        for entry in entries {
            let declared = entry.column.column_type.as_deref().unwrap_or("");
            let parsed = ChangelogType::parse(declared)
                .ok_or_else(|| format!("unknown type '{}'", declared))
                .and_then(|t| {
                    self.converter
                        .convert(t.type_code)
                        .map(|db_type| (t, db_type))
                        .map_err(|e| e.to_string())
                });
            match parsed {
                Ok((t, db_type)) => columns.push(Column::new(
                    &entry.column.name,
                    t.name,
                    db_type,
                    t.column_size,
                    t.decimal_digits,
                )),
                Err(reason) => warn!(
                    "Column not added: {}.{}: {}",
                    table, entry.column.name, reason
                ),
            }
        }
        columns
    }
}

#[async_trait]
impl ModelReader for ChangelogModelReader {
    async fn read_model(&mut self) -> Result<DataScheme> {
        self.read()
    }
}

/// YAML files of a directory in file name order.
fn changelog_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));
        if path.is_file() && is_yaml {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
