//! MemoryStore: catalog of probe tables behind a RwLock
//!
//! Each call takes the lock for its own duration only. A statement that
//! checks and then inserts therefore makes two calls, and another transaction
//! can interleave between them unless the caller holds a predicate lock.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tracing::trace;

use isoprobe_core::{Error, Result, TableName};

use crate::table::{RowId, Table, TxnId, Visibility};

/// Thread-safe in-memory catalog
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<TableName, Table>>,
    /// Commit version counter, incremented once per committing transaction
    version: AtomicU64,
}

impl MemoryStore {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty table
    ///
    /// # Errors
    /// Returns `TableExists` if the name is taken.
    pub fn create_table(&self, name: &TableName) -> Result<()> {
        let mut tables = self.tables.write();
        if tables.contains_key(name) {
            return Err(Error::TableExists(name.to_string()));
        }
        tables.insert(name.clone(), Table::new());
        Ok(())
    }

    /// Drop a table, returning whether it existed
    pub fn drop_table_if_exists(&self, name: &TableName) -> bool {
        self.tables.write().remove(name).is_some()
    }

    /// Whether the table exists
    pub fn table_exists(&self, name: &TableName) -> bool {
        self.tables.read().contains_key(name)
    }

    /// Remove every row of a table
    pub fn truncate(&self, name: &TableName) -> Result<usize> {
        let mut tables = self.tables.write();
        let table = tables
            .get_mut(name)
            .ok_or_else(|| Error::TableNotFound(name.to_string()))?;
        Ok(table.truncate())
    }

    /// Insert a pending row owned by `txn`
    pub fn insert(&self, name: &TableName, value: i64, txn: TxnId) -> Result<RowId> {
        let mut tables = self.tables.write();
        let table = tables
            .get_mut(name)
            .ok_or_else(|| Error::TableNotFound(name.to_string()))?;
        let row = table.insert(value, txn);
        trace!(target: "isoprobe::storage", table = %name, value, txn, row, "Row inserted");
        Ok(row)
    }

    /// Whether a row holding `value` is visible
    pub fn contains(&self, name: &TableName, value: i64, visibility: Visibility) -> Result<bool> {
        let tables = self.tables.read();
        let table = tables
            .get(name)
            .ok_or_else(|| Error::TableNotFound(name.to_string()))?;
        Ok(table.contains(value, visibility))
    }

    /// Number of visible rows holding `value`
    pub fn count(&self, name: &TableName, value: i64, visibility: Visibility) -> Result<usize> {
        let tables = self.tables.read();
        let table = tables
            .get(name)
            .ok_or_else(|| Error::TableNotFound(name.to_string()))?;
        Ok(table.count(value, visibility))
    }

    /// Commit every pending row of `txn` across all tables
    ///
    /// Returns the commit version assigned to the transaction.
    pub fn commit(&self, txn: TxnId) -> u64 {
        let mut tables = self.tables.write();
        let version = self.version.fetch_add(1, Ordering::SeqCst) + 1;
        let rows: usize = tables.values_mut().map(|t| t.commit(txn, version)).sum();
        trace!(target: "isoprobe::storage", txn, version, rows, "Rows committed");
        version
    }

    /// Discard every pending row of `txn` across all tables
    pub fn rollback(&self, txn: TxnId) -> usize {
        let mut tables = self.tables.write();
        let rows = tables.values_mut().map(|t| t.rollback(txn)).sum();
        trace!(target: "isoprobe::storage", txn, rows, "Rows rolled back");
        rows
    }

    /// Highest commit version assigned so far
    pub fn current_version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    static_assertions::assert_impl_all!(MemoryStore: Send, Sync);

    fn t() -> TableName {
        TableName::default()
    }

    #[test]
    fn test_create_then_drop() {
        let store = MemoryStore::new();
        assert!(!store.drop_table_if_exists(&t()));

        store.create_table(&t()).unwrap();
        assert!(store.table_exists(&t()));
        assert!(matches!(store.create_table(&t()), Err(Error::TableExists(_))));

        assert!(store.drop_table_if_exists(&t()));
        assert!(!store.table_exists(&t()));
    }

    #[test]
    fn test_missing_table_errors() {
        let store = MemoryStore::new();
        assert!(matches!(store.truncate(&t()), Err(Error::TableNotFound(_))));
        assert!(matches!(store.insert(&t(), 1, 1), Err(Error::TableNotFound(_))));
        assert!(matches!(
            store.count(&t(), 1, Visibility::Committed),
            Err(Error::TableNotFound(_))
        ));
    }

    #[test]
    fn test_commit_spans_versions() {
        let store = MemoryStore::new();
        store.create_table(&t()).unwrap();
        store.insert(&t(), 1, 7).unwrap();

        let v1 = store.commit(7);
        let v2 = store.commit(8);
        assert_eq!(v1, 1);
        assert_eq!(v2, 2);
        assert_eq!(store.current_version(), 2);
        assert_eq!(store.count(&t(), 1, Visibility::Committed).unwrap(), 1);
    }

    #[test]
    fn test_rollback_across_tables() {
        let store = MemoryStore::new();
        let other = TableName::new("u").unwrap();
        store.create_table(&t()).unwrap();
        store.create_table(&other).unwrap();
        store.insert(&t(), 1, 3).unwrap();
        store.insert(&other, 1, 3).unwrap();

        assert_eq!(store.rollback(3), 2);
        assert_eq!(store.count(&t(), 1, Visibility::Uncommitted).unwrap(), 0);
        assert_eq!(store.count(&other, 1, Visibility::Uncommitted).unwrap(), 0);
    }

    proptest! {
        /// Only inserts of committed transactions survive once every
        /// transaction has either committed or rolled back.
        #[test]
        fn prop_committed_rows_survive(outcomes in proptest::collection::vec(any::<bool>(), 1..20)) {
            let store = MemoryStore::new();
            store.create_table(&t()).unwrap();
            for (txn, _) in outcomes.iter().enumerate() {
                store.insert(&t(), 1, txn as TxnId).unwrap();
            }
            for (txn, commit) in outcomes.iter().enumerate() {
                if *commit {
                    store.commit(txn as TxnId);
                } else {
                    store.rollback(txn as TxnId);
                }
            }
            let expected = outcomes.iter().filter(|c| **c).count();
            prop_assert_eq!(store.count(&t(), 1, Visibility::Committed).unwrap(), expected);
            prop_assert_eq!(store.count(&t(), 1, Visibility::Uncommitted).unwrap(), expected);
        }
    }
}
