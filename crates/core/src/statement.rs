//! Typed statements issued by the probe
//!
//! The probe only ever sends five statements. Keeping them typed lets each
//! backend render its own dialect while the race logic stays engine-agnostic.
//! `Display` renders the MySQL spelling.

use crate::error::{Error, Result};
use crate::types::TableName;
use std::fmt;

/// Name of the single integer column of the probe table
pub const VALUE_COLUMN: &str = "num";

/// Value the racing inserts try to make unique
pub const PROBE_VALUE: i64 = 1;

/// A statement against the probe table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// `drop table if exists <table>`
    DropTableIfExists {
        /// Target table
        table: TableName,
    },
    /// `create table <table> (num int)`
    CreateTable {
        /// Target table
        table: TableName,
    },
    /// `truncate <table>`
    Truncate {
        /// Target table
        table: TableName,
    },
    /// `insert into <table> select <value> where not exists (select * from <table> where num = <value>)`
    ///
    /// The existence check and the insert form one statement, so a duplicate
    /// can only appear if the check misses a concurrent insert.
    InsertIfAbsent {
        /// Target table
        table: TableName,
        /// Value to insert
        value: i64,
    },
    /// `select count(*) from <table> where num = <value>`
    CountEqual {
        /// Target table
        table: TableName,
        /// Value to count
        value: i64,
    },
}

impl Statement {
    /// Drop the table if present
    pub fn drop_table_if_exists(table: &TableName) -> Self {
        Statement::DropTableIfExists {
            table: table.clone(),
        }
    }

    /// Create the single-column table
    pub fn create_table(table: &TableName) -> Self {
        Statement::CreateTable {
            table: table.clone(),
        }
    }

    /// Remove every row
    pub fn truncate(table: &TableName) -> Self {
        Statement::Truncate {
            table: table.clone(),
        }
    }

    /// The critical conditional insert of [`PROBE_VALUE`]
    pub fn insert_probe(table: &TableName) -> Self {
        Statement::InsertIfAbsent {
            table: table.clone(),
            value: PROBE_VALUE,
        }
    }

    /// Count rows carrying [`PROBE_VALUE`]
    pub fn count_probe(table: &TableName) -> Self {
        Statement::CountEqual {
            table: table.clone(),
            value: PROBE_VALUE,
        }
    }

    /// Table the statement targets
    pub fn table(&self) -> &TableName {
        match self {
            Statement::DropTableIfExists { table }
            | Statement::CreateTable { table }
            | Statement::Truncate { table }
            | Statement::InsertIfAbsent { table, .. }
            | Statement::CountEqual { table, .. } => table,
        }
    }

    /// True for statements that return a scalar rather than modify data
    pub fn is_query(&self) -> bool {
        matches!(self, Statement::CountEqual { .. })
    }

    /// Fail with `UnsupportedStatement` unless this is a query
    pub fn require_query(&self) -> Result<()> {
        if self.is_query() {
            Ok(())
        } else {
            Err(Error::UnsupportedStatement(format!("not a query: {}", self)))
        }
    }

    /// True for schema statements, which take effect immediately
    pub fn is_ddl(&self) -> bool {
        matches!(
            self,
            Statement::DropTableIfExists { .. }
                | Statement::CreateTable { .. }
                | Statement::Truncate { .. }
        )
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::DropTableIfExists { table } => write!(f, "drop table if exists {}", table),
            Statement::CreateTable { table } => {
                write!(f, "create table {} ({} int)", table, VALUE_COLUMN)
            }
            Statement::Truncate { table } => write!(f, "truncate {}", table),
            Statement::InsertIfAbsent { table, value } => write!(
                f,
                "insert into {t} select {v} where not exists (select * from {t} where {c} = {v})",
                t = table,
                v = value,
                c = VALUE_COLUMN
            ),
            Statement::CountEqual { table, value } => write!(
                f,
                "select count(*) from {} where {} = {}",
                table, VALUE_COLUMN, value
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t() -> TableName {
        TableName::default()
    }

    #[test]
    fn test_insert_probe_sql() {
        assert_eq!(
            Statement::insert_probe(&t()).to_string(),
            "insert into t select 1 where not exists (select * from t where num = 1)"
        );
    }

    #[test]
    fn test_fixture_sql() {
        assert_eq!(
            Statement::drop_table_if_exists(&t()).to_string(),
            "drop table if exists t"
        );
        assert_eq!(
            Statement::create_table(&t()).to_string(),
            "create table t (num int)"
        );
        assert_eq!(Statement::truncate(&t()).to_string(), "truncate t");
    }

    #[test]
    fn test_count_probe_sql() {
        assert_eq!(
            Statement::count_probe(&t()).to_string(),
            "select count(*) from t where num = 1"
        );
    }

    #[test]
    fn test_statement_classes() {
        let table = t();
        assert!(Statement::count_probe(&table).is_query());
        assert!(!Statement::insert_probe(&table).is_query());
        assert!(Statement::truncate(&table).is_ddl());
        assert!(!Statement::insert_probe(&table).is_ddl());
        assert_eq!(Statement::insert_probe(&table).table(), &table);
        assert!(Statement::count_probe(&table).require_query().is_ok());
        assert!(Statement::truncate(&table).require_query().is_err());
    }
}
