//! Data scheme model: tables, columns, indices and sequences.
//!
//! Columns are shared between a table and its indices through [`Arc`], so an
//! index always refers to the exact column instance owned by its table.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::types::DbType;

/// Sentinel for size and decimal digit values that do not apply to a type.
pub const NOT_APPLICABLE: i32 = -1;

/// Column metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name, as reported by the driver.
    pub name: String,

    /// Native type name (e.g. "VARCHAR", "int4").
    pub type_name: String,

    /// Portable type kind.
    pub db_type: DbType,

    /// Column size, or [`NOT_APPLICABLE`].
    pub column_size: i32,

    /// Decimal digits, or [`NOT_APPLICABLE`].
    pub decimal_digits: i32,
}

impl Column {
    pub fn new(
        name: impl Into<String>,
        type_name: impl Into<String>,
        db_type: DbType,
        column_size: i32,
        decimal_digits: i32,
    ) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            db_type,
            column_size,
            decimal_digits,
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.type_name)?;
        match (self.column_size, self.decimal_digits) {
            (NOT_APPLICABLE, _) => Ok(()),
            (size, NOT_APPLICABLE) => write!(f, "({})", size),
            (size, digits) => write!(f, "({},{})", size, digits),
        }
    }
}

/// Non-unique index metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    /// Index name.
    pub name: String,

    /// Member columns in driver-reported order.
    pub columns: Vec<Arc<Column>>,
}

impl Index {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    /// Names of the member columns, in order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

/// Table metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Table name.
    pub name: String,

    /// Columns in read order.
    pub columns: Vec<Arc<Column>>,

    /// Non-unique indices in read order.
    pub indices: Vec<Index>,
}

impl Table {
    /// Create an empty table.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            indices: Vec::new(),
        }
    }

    /// Append columns in the given order. No duplicate checks are made here.
    pub fn append_columns<I>(&mut self, columns: I)
    where
        I: IntoIterator<Item = Column>,
    {
        self.columns.extend(columns.into_iter().map(Arc::new));
    }

    /// Find the column with the given name.
    ///
    /// Returns `None` when no column carries the name, and also when more than
    /// one does: duplicate names make the lookup ambiguous.
    pub fn find_column_by_name(&self, name: &str) -> Option<&Arc<Column>> {
        let mut matches = self.columns.iter().filter(|c| c.name == name);
        let found = matches.next()?;
        if matches.next().is_some() {
            return None;
        }
        Some(found)
    }

    /// Return the index with the given name, creating and appending an empty
    /// one if the table has none yet.
    pub fn find_or_create_index_by_name(&mut self, name: &str) -> &mut Index {
        let pos = match self.indices.iter().position(|i| i.name == name) {
            Some(pos) => pos,
            None => {
                self.indices.push(Index::new(name));
                self.indices.len() - 1
            }
        };
        &mut self.indices[pos]
    }

    /// Find an index by name.
    pub fn find_index_by_name(&self, name: &str) -> Option<&Index> {
        self.indices.iter().find(|i| i.name == name)
    }

    /// Column names in table order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

/// Sequence metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequence {
    /// Sequence name.
    pub name: String,

    /// First value handed out.
    pub start_value: i64,

    /// Step between values.
    pub increment: i64,
}

impl Sequence {
    pub fn new(name: impl Into<String>, start_value: i64, increment: i64) -> Self {
        Self {
            name: name.into(),
            start_value,
            increment,
        }
    }
}

/// The tables and sequences read from one database or changelog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataScheme {
    /// Tables in read order.
    pub tables: Vec<Table>,

    /// Sequences in read order.
    pub sequences: Vec<Sequence>,
}

impl DataScheme {
    pub fn new(tables: Vec<Table>, sequences: Vec<Sequence>) -> Self {
        Self { tables, sequences }
    }

    /// Append tables in the given order. No duplicate checks are made here.
    pub fn append_tables<I>(&mut self, tables: I)
    where
        I: IntoIterator<Item = Table>,
    {
        self.tables.extend(tables);
    }

    /// Find a table by name.
    pub fn find_table_by_name(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Find a table by name for modification.
    pub fn find_table_by_name_mut(&mut self, name: &str) -> Option<&mut Table> {
        self.tables.iter_mut().find(|t| t.name == name)
    }

    /// Table names in read order.
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }

    /// Whether the scheme has neither tables nor sequences.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty() && self.sequences.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_column(name: &str, db_type: DbType) -> Column {
        Column::new(name, db_type.as_str(), db_type, NOT_APPLICABLE, NOT_APPLICABLE)
    }

    fn make_table() -> Table {
        let mut table = Table::new("TestTable");
        table.append_columns([
            make_column("Id", DbType::Integer),
            Column::new("Name", "VARCHAR", DbType::Varchar, 100, NOT_APPLICABLE),
            Column::new("Salary", "NUMERIC", DbType::Numeric, 10, 2),
        ]);
        table
    }

    #[test]
    fn test_append_columns_keeps_order() {
        let table = make_table();
        assert_eq!(table.column_names(), vec!["Id", "Name", "Salary"]);
    }

    #[test]
    fn test_find_column_by_name() {
        let table = make_table();
        let column = table.find_column_by_name("Name").unwrap();
        assert_eq!(column.db_type, DbType::Varchar);
        assert_eq!(column.column_size, 100);

        assert!(table.find_column_by_name("name").is_none());
        assert!(table.find_column_by_name("Missing").is_none());
    }

    #[test]
    fn test_find_column_by_name_ambiguous() {
        let mut table = make_table();
        table.append_columns([make_column("Id", DbType::BigInt)]);
        assert!(table.find_column_by_name("Id").is_none());
        assert!(table.find_column_by_name("Name").is_some());
    }

    #[test]
    fn test_find_or_create_index_accumulates() {
        let mut table = make_table();
        let id = table.find_column_by_name("Id").cloned().unwrap();
        let name = table.find_column_by_name("Name").cloned().unwrap();

        table.find_or_create_index_by_name("IX1").columns.push(id);
        table.find_or_create_index_by_name("IX1").columns.push(name);
        table.find_or_create_index_by_name("IX2");

        assert_eq!(table.indices.len(), 2);
        let ix1 = table.find_index_by_name("IX1").unwrap();
        assert_eq!(ix1.column_names(), vec!["Id", "Name"]);
        assert!(table.find_index_by_name("IX2").unwrap().columns.is_empty());
    }

    #[test]
    fn test_index_shares_table_columns() {
        let mut table = make_table();
        let salary = table.find_column_by_name("Salary").cloned().unwrap();
        table.find_or_create_index_by_name("IX").columns.push(salary);

        assert!(Arc::ptr_eq(&table.indices[0].columns[0], &table.columns[2]));
    }

    #[test]
    fn test_data_scheme_lookup() {
        let mut scheme = DataScheme::default();
        assert!(scheme.is_empty());

        scheme.append_tables([Table::new("A"), make_table()]);
        assert_eq!(scheme.table_names(), vec!["A", "TestTable"]);
        assert!(scheme.find_table_by_name("TestTable").is_some());
        assert!(scheme.find_table_by_name("TESTTABLE").is_none());

        scheme
            .find_table_by_name_mut("A")
            .unwrap()
            .append_columns([make_column("X", DbType::Date)]);
        assert_eq!(scheme.find_table_by_name("A").unwrap().columns.len(), 1);
    }

    #[test]
    fn test_column_display() {
        let table = make_table();
        assert_eq!(table.columns[0].to_string(), "Id INTEGER");
        assert_eq!(table.columns[1].to_string(), "Name VARCHAR(100)");
        assert_eq!(table.columns[2].to_string(), "Salary NUMERIC(10,2)");
    }
}
