//! Single-column row table with per-transaction pending rows
//!
//! Inserted rows stay `Pending` until their transaction commits. A rollback
//! removes them. Readers decide what they may see through [`Visibility`].

use std::collections::BTreeMap;

/// Transaction identifier, allocated by the transaction manager
pub type TxnId = u64;

/// Identifier of a row within its table
pub type RowId = u64;

/// Lifecycle of a stored row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowState {
    /// Inserted by a transaction that has not committed yet
    Pending(TxnId),
    /// Visible to every committed reader
    Committed {
        /// Commit version of the inserting transaction
        version: u64,
    },
}

/// A stored row of the single integer column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Row {
    /// Column value
    pub value: i64,
    /// Commit state
    pub state: RowState,
}

impl Row {
    /// Whether the row has been committed
    pub fn is_committed(&self) -> bool {
        matches!(self.state, RowState::Committed { .. })
    }
}

/// Which rows a read may observe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Committed rows only
    Committed,
    /// Committed rows plus the reader's own pending rows
    CommittedAndOwn(TxnId),
    /// Every row, committed or not
    Uncommitted,
}

impl Visibility {
    /// Whether `row` is visible under this rule
    pub fn sees(&self, row: &Row) -> bool {
        if row.is_committed() {
            return true;
        }
        match (self, row.state) {
            (Visibility::Uncommitted, _) => true,
            (Visibility::CommittedAndOwn(reader), RowState::Pending(writer)) => *reader == writer,
            _ => false,
        }
    }
}

/// Rows of one table, keyed by insertion order
#[derive(Debug, Default)]
pub struct Table {
    rows: BTreeMap<RowId, Row>,
    next_row_id: RowId,
}

impl Table {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a pending row owned by `txn`
    pub fn insert(&mut self, value: i64, txn: TxnId) -> RowId {
        let id = self.next_row_id;
        self.next_row_id += 1;
        self.rows.insert(
            id,
            Row {
                value,
                state: RowState::Pending(txn),
            },
        );
        id
    }

    /// Number of visible rows holding `value`
    pub fn count(&self, value: i64, visibility: Visibility) -> usize {
        self.rows
            .values()
            .filter(|row| row.value == value && visibility.sees(row))
            .count()
    }

    /// Whether a visible row holds `value`
    pub fn contains(&self, value: i64, visibility: Visibility) -> bool {
        self.rows
            .values()
            .any(|row| row.value == value && visibility.sees(row))
    }

    /// Remove every row, pending or committed
    pub fn truncate(&mut self) -> usize {
        let removed = self.rows.len();
        self.rows.clear();
        removed
    }

    /// Mark rows of `txn` committed at `version`
    ///
    /// Returns the number of rows committed.
    pub fn commit(&mut self, txn: TxnId, version: u64) -> usize {
        let mut committed = 0;
        for row in self.rows.values_mut() {
            if row.state == RowState::Pending(txn) {
                row.state = RowState::Committed { version };
                committed += 1;
            }
        }
        committed
    }

    /// Remove pending rows of `txn`
    ///
    /// Returns the number of rows discarded.
    pub fn rollback(&mut self, txn: TxnId) -> usize {
        let before = self.rows.len();
        self.rows.retain(|_, row| row.state != RowState::Pending(txn));
        before - self.rows.len()
    }
}

#[cfg(test)]
impl Table {
    fn len(&self) -> usize {
        self.rows.len()
    }

    fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn rows(&self) -> impl Iterator<Item = &Row> {
        self.rows.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_row_visibility() {
        let mut table = Table::new();
        table.insert(1, 10);

        assert!(!table.contains(1, Visibility::Committed));
        assert!(table.contains(1, Visibility::CommittedAndOwn(10)));
        assert!(!table.contains(1, Visibility::CommittedAndOwn(11)));
        assert!(table.contains(1, Visibility::Uncommitted));
    }

    #[test]
    fn test_commit_makes_rows_visible() {
        let mut table = Table::new();
        table.insert(1, 10);
        table.insert(1, 11);

        assert_eq!(table.commit(10, 5), 1);
        assert_eq!(table.count(1, Visibility::Committed), 1);
        assert_eq!(table.count(1, Visibility::Uncommitted), 2);
        assert!(table
            .rows()
            .any(|row| row.state == RowState::Committed { version: 5 }));
    }

    #[test]
    fn test_rollback_discards_only_own_rows() {
        let mut table = Table::new();
        table.insert(1, 10);
        table.insert(1, 11);
        table.commit(11, 1);

        assert_eq!(table.rollback(10), 1);
        assert_eq!(table.len(), 1);
        assert!(table.rows().all(Row::is_committed));
    }

    #[test]
    fn test_truncate_clears_pending_and_committed() {
        let mut table = Table::new();
        table.insert(1, 10);
        table.commit(10, 1);
        table.insert(2, 11);

        assert_eq!(table.truncate(), 2);
        assert!(table.is_empty());
    }

    #[test]
    fn test_count_filters_by_value() {
        let mut table = Table::new();
        table.insert(1, 10);
        table.insert(2, 10);
        table.commit(10, 1);

        assert_eq!(table.count(1, Visibility::Committed), 1);
        assert_eq!(table.count(3, Visibility::Committed), 0);
    }
}
