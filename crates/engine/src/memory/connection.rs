//! Connection to the in-memory engine

use std::sync::Arc;
use std::thread;

use tracing::{debug, warn};

use isoprobe_concurrency::{LockMode, LockTarget, Transaction};
use isoprobe_core::{Connection, Error, IsolationLevel, Result, Statement, TableName};
use isoprobe_storage::Visibility;

use super::Shared;

/// A session on a [`MemoryDatabase`](super::MemoryDatabase)
///
/// Dropping a connection with an open transaction rolls it back.
#[derive(Debug)]
pub struct MemoryConnection {
    shared: Arc<Shared>,
    txn: Option<Transaction>,
}

impl MemoryConnection {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        Self { shared, txn: None }
    }

    /// The open explicit transaction, if any
    pub fn transaction(&self) -> Option<&Transaction> {
        self.txn.as_ref()
    }

    fn execute_ddl(&mut self, statement: &Statement) -> Result<u64> {
        if self.txn.is_some() {
            debug!(target: "isoprobe::engine", %statement, "Schema statement commits open transaction");
            self.commit()?;
        }
        let store = &self.shared.store;
        match statement {
            Statement::DropTableIfExists { table } => {
                store.drop_table_if_exists(table);
                Ok(0)
            }
            Statement::CreateTable { table } => store.create_table(table).map(|()| 0),
            Statement::Truncate { table } => store.truncate(table).map(|_| 0),
            other => Err(Error::UnsupportedStatement(other.to_string())),
        }
    }

    /// Check-then-insert under `txn`'s isolation level
    ///
    /// At repeatable read and above the predicate is locked shared before the
    /// check and exclusive before the insert; both locks are held to commit.
    fn insert_if_absent(&self, txn: &Transaction, table: &TableName, value: i64) -> Result<u64> {
        let shared = &self.shared;
        let timeout = shared.config.lock_wait_timeout();
        let target = LockTarget::new(table, value);
        let locking = txn.isolation.locks_ranges();

        if locking {
            shared.locks.acquire(txn.id, &target, LockMode::Shared, timeout)?;
        }
        let present = shared.store.contains(table, value, txn.visibility())?;

        let gap = shared.config.read_write_gap();
        if !gap.is_zero() {
            thread::sleep(gap);
        }

        if present {
            return Ok(0);
        }
        if locking {
            shared
                .locks
                .acquire(txn.id, &target, LockMode::Exclusive, timeout)?;
        }
        shared.store.insert(table, value, txn.id)?;
        Ok(1)
    }

    fn run_dml(&self, txn: &Transaction, statement: &Statement) -> Result<u64> {
        txn.ensure_active()?;
        match statement {
            Statement::InsertIfAbsent { table, value } => self.insert_if_absent(txn, table, *value),
            other => Err(Error::UnsupportedStatement(other.to_string())),
        }
    }

    fn finish_commit(&self, mut txn: Transaction) -> Result<()> {
        txn.mark_committed()?;
        let version = self.shared.store.commit(txn.id);
        self.shared.locks.release_all(txn.id);
        self.shared.txns.record_commit(&txn);
        debug!(target: "isoprobe::engine", txn = txn.id, version, "Commit applied");
        Ok(())
    }

    fn finish_abort(&self, mut txn: Transaction, reason: String) {
        let rows = self.shared.store.rollback(txn.id);
        self.shared.locks.release_all(txn.id);
        txn.mark_aborted(reason);
        self.shared.txns.record_abort(&txn);
        debug!(target: "isoprobe::engine", txn = txn.id, rows, "Rollback applied");
    }
}

impl Connection for MemoryConnection {
    fn execute(&mut self, statement: &Statement) -> Result<u64> {
        if statement.is_query() {
            return Err(Error::UnsupportedStatement(format!(
                "query passed to execute: {}",
                statement
            )));
        }
        if statement.is_ddl() {
            return self.execute_ddl(statement);
        }

        match self.txn.take() {
            Some(txn) => match self.run_dml(&txn, statement) {
                Ok(rows) => {
                    self.txn = Some(txn);
                    Ok(rows)
                }
                Err(err) if err.is_lock_contention() => {
                    // Like InnoDB: a deadlock or lock wait timeout rolls back the whole transaction
                    warn!(target: "isoprobe::engine", txn = txn.id, error = %err, "Transaction aborted");
                    self.finish_abort(txn, err.to_string());
                    Err(err)
                }
                Err(err) => {
                    self.txn = Some(txn);
                    Err(err)
                }
            },
            None => {
                let txn = self
                    .shared
                    .txns
                    .begin(self.shared.config.default_isolation, true);
                match self.run_dml(&txn, statement) {
                    Ok(rows) => {
                        self.finish_commit(txn)?;
                        Ok(rows)
                    }
                    Err(err) => {
                        if err.is_lock_contention() {
                            warn!(target: "isoprobe::engine", txn = txn.id, error = %err, "Statement aborted");
                        }
                        self.finish_abort(txn, err.to_string());
                        Err(err)
                    }
                }
            }
        }
    }

    fn query_scalar(&mut self, statement: &Statement) -> Result<i64> {
        statement.require_query()?;
        let visibility = match &self.txn {
            Some(txn) => {
                txn.ensure_active()?;
                txn.visibility()
            }
            None if self.shared.config.default_isolation == IsolationLevel::ReadUncommitted => {
                Visibility::Uncommitted
            }
            None => Visibility::Committed,
        };
        match statement {
            Statement::CountEqual { table, value } => {
                let count = self.shared.store.count(table, *value, visibility)?;
                Ok(count as i64)
            }
            other => Err(Error::UnsupportedStatement(other.to_string())),
        }
    }

    fn begin(&mut self, isolation: Option<IsolationLevel>) -> Result<()> {
        if self.txn.is_some() {
            return Err(Error::TransactionActive);
        }
        let level = isolation.unwrap_or(self.shared.config.default_isolation);
        self.txn = Some(self.shared.txns.begin(level, false));
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        let txn = self.txn.take().ok_or(Error::NoActiveTransaction)?;
        self.finish_commit(txn)
    }

    fn rollback(&mut self) -> Result<()> {
        if let Some(txn) = self.txn.take() {
            self.finish_abort(txn, "rollback".to_string());
        }
        Ok(())
    }

    fn in_transaction(&self) -> bool {
        self.txn.is_some()
    }
}

impl Drop for MemoryConnection {
    fn drop(&mut self) {
        if let Some(txn) = self.txn.take() {
            self.finish_abort(txn, "connection closed".to_string());
        }
    }
}
